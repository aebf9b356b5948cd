//! Supervision of one run of the external executable.
//!
//! A session launches the executable detached, waits (bounded) for it to show
//! up in the process table, then polls until it disappears, running an
//! autosave check on a coarser cadence. Every wait goes through [`Clock`], so
//! tests drive the loop on virtual time.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use tracing::{debug, error, info, instrument, warn};

use crate::autosave::{AutosaveEngine, CheckOutcome};
use crate::core::lifecycle::{Lifecycle, LifecycleLimits, PollAction, ProcessState};
use crate::io::clock::Clock;
use crate::io::monitor::{ProcessMonitor, ProcessQuery};
use crate::io::process::{LaunchRequest, Launcher};

/// Reported to the caller after every liveness poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollReport {
    /// 1-based poll number across the whole session.
    pub poll: u32,
    /// State after the poll was applied.
    pub state: ProcessState,
    /// Autosave check performed on this poll, if any.
    pub autosave: Option<CheckOutcome>,
}

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The process ran and then exited.
    Exited,
    /// The process never appeared within the start budget.
    NeverStarted,
    /// A process query failed, so the process may still be running.
    MonitorFailed,
}

/// Summary of a supervised session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOutcome {
    pub end: SessionEnd,
    pub polls: u32,
    pub autosaves: u32,
}

/// Drives one [`Lifecycle`] from launch to exit.
pub struct SessionSupervisor<'a, Q: ProcessQuery, C: Clock, L: Launcher> {
    monitor: &'a ProcessMonitor<Q>,
    clock: &'a C,
    launcher: &'a L,
    poll_interval: Duration,
    lifecycle: Lifecycle,
}

impl<'a, Q: ProcessQuery, C: Clock, L: Launcher> SessionSupervisor<'a, Q, C, L> {
    pub fn new(
        monitor: &'a ProcessMonitor<Q>,
        clock: &'a C,
        launcher: &'a L,
        poll_interval: Duration,
        limits: LifecycleLimits,
    ) -> Self {
        Self {
            monitor,
            clock,
            launcher,
            poll_interval,
            lifecycle: Lifecycle::new(limits),
        }
    }

    pub fn state(&self) -> ProcessState {
        self.lifecycle.state()
    }

    /// Launch `request`, supervise it until it exits, and autosave along the way.
    ///
    /// `process_name` is the name looked up in the process table. Every poll
    /// is preceded by one `poll_interval` sleep. Autosave failures are
    /// absorbed by the engine. A launch failure is an error; a query failure
    /// after launch ends the session with [`SessionEnd::MonitorFailed`].
    #[instrument(skip_all, fields(process = process_name))]
    pub fn supervise<F: FnMut(&PollReport)>(
        &mut self,
        request: &LaunchRequest,
        process_name: &str,
        engine: &mut AutosaveEngine<'_>,
        mut on_poll: F,
    ) -> Result<SessionOutcome> {
        self.launcher
            .spawn_detached(request)
            .context("launch executable")?;
        self.lifecycle.launched();
        info!("waiting for process to start");

        let mut polls = 0u32;
        let mut autosaves = 0u32;
        loop {
            self.clock.sleep(self.poll_interval);
            let alive = match self.monitor.is_running(process_name) {
                Ok(alive) => alive,
                Err(err) => {
                    error!(
                        err = %format!("{err:#}"),
                        poll = polls + 1,
                        "process query failed; the game may still be running"
                    );
                    return Ok(SessionOutcome {
                        end: SessionEnd::MonitorFailed,
                        polls,
                        autosaves,
                    });
                }
            };
            polls += 1;

            let mut autosave = None;
            let action = self.lifecycle.observe(alive);
            match action {
                PollAction::NotLaunched => bail!("process polled before launch"),
                PollAction::Wait => {
                    if self.lifecycle.state() == ProcessState::AwaitingStart {
                        debug!(poll = polls, "process not seen yet");
                    }
                }
                PollAction::Started => {
                    info!(poll = polls, "process running");
                    engine.prime();
                }
                PollAction::CheckAutosave => {
                    let outcome = engine.check();
                    if matches!(outcome, CheckOutcome::Saved { .. }) {
                        autosaves += 1;
                    }
                    autosave = Some(outcome);
                }
                PollAction::Exited => info!(poll = polls, "process exited"),
                PollAction::StartTimedOut => warn!(
                    polls,
                    "process did not start in time; autosave is not active for this run"
                ),
            }
            on_poll(&PollReport {
                poll: polls,
                state: self.lifecycle.state(),
                autosave,
            });

            let end = match action {
                PollAction::Exited => SessionEnd::Exited,
                PollAction::StartTimedOut => SessionEnd::NeverStarted,
                _ => continue,
            };
            return Ok(SessionOutcome {
                end,
                polls,
                autosaves,
            });
        }
    }
}
