//! The select → swap-in → supervise → persist loop behind the CLI.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{error, info, instrument};

use crate::autosave::AutosaveEngine;
use crate::core::layout::SaveLayout;
use crate::core::lifecycle::LifecycleLimits;
use crate::io::clock::Clock;
use crate::io::monitor::{ProcessMonitor, ProcessQuery};
use crate::io::process::{LaunchRequest, Launcher};
use crate::io::prompt::{Choice, Namer, Selector};
use crate::io::save_store::{SaveFolder, ensure_dir, list_saves};
use crate::session::{SessionEnd, SessionOutcome, SessionSupervisor};
use crate::swap::{PersistOutcome, SaveSwapCoordinator};

/// Everything one warden needs besides the prompts.
pub struct Warden<Q: ProcessQuery, C: Clock, L: Launcher> {
    pub layout: SaveLayout,
    pub request: LaunchRequest,
    pub process_name: String,
    pub monitor: ProcessMonitor<Q>,
    pub clock: C,
    pub launcher: L,
    pub poll_interval: Duration,
    pub limits: LifecycleLimits,
}

/// Outcome of one completed play-through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IterationReport {
    pub chosen: String,
    pub session: SessionOutcome,
    pub persist: PersistOutcome,
}

impl<Q: ProcessQuery, C: Clock, L: Launcher> Warden<Q, C, L> {
    /// Keep offering saves until the user cancels the selection.
    ///
    /// A failed iteration (swap-in, launch, or persist error) is logged and the
    /// user is asked again. A session whose process query failed still gets
    /// the post-exit persist offer, then ends the loop with an error, as do
    /// selection failures.
    pub fn run<P: Selector + Namer, F: FnMut(&IterationReport)>(
        &self,
        prompt: &mut P,
        mut on_iteration: F,
    ) -> Result<()> {
        loop {
            let Some(chosen) = self.choose(prompt)? else {
                info!("selection cancelled; exiting");
                return Ok(());
            };
            match self.play(&chosen, prompt) {
                Ok(report) => {
                    on_iteration(&report);
                    if report.session.end == SessionEnd::MonitorFailed {
                        return Err(anyhow!(
                            "lost track of {}; stopping so no save is swapped under a running game",
                            self.process_name
                        ));
                    }
                }
                Err(err) => {
                    error!(err = %format!("{err:#}"), chosen = %chosen, "session aborted");
                    eprintln!("error: {err:#}");
                }
            }
        }
    }

    /// Offer the saves on disk and return the chosen folder name.
    pub fn choose<S: Selector>(&self, selector: &mut S) -> Result<Option<String>> {
        let mut saves = list_saves(&self.layout)?;
        if saves.is_empty() {
            info!(root = %self.layout.root.display(), "no saves yet; creating empty active save");
            ensure_dir(&self.layout.active_path())?;
            saves = list_saves(&self.layout)?;
        }
        let choices = build_choices(&self.layout, &saves);
        let chosen = selector.select(&choices).context("select save")?;
        match chosen {
            Some(name) if saves.iter().any(|save| save.name == name) => Ok(Some(name)),
            Some(name) => Err(anyhow!("selected save {name} is not on disk")),
            None => Ok(None),
        }
    }

    /// One iteration for an already chosen save.
    #[instrument(skip(self, namer))]
    pub fn play<N: Namer>(&self, chosen: &str, namer: &mut N) -> Result<IterationReport> {
        let coordinator = SaveSwapCoordinator::new(&self.layout);
        coordinator.swap_in(chosen)?;

        let mut engine = AutosaveEngine::new(&self.layout);
        let mut supervisor = SessionSupervisor::new(
            &self.monitor,
            &self.clock,
            &self.launcher,
            self.poll_interval,
            self.limits,
        );
        let session = supervisor.supervise(&self.request, &self.process_name, &mut engine, |_| {})?;
        info!(polls = session.polls, autosaves = session.autosaves, end = ?session.end, "session over");

        let persist = match coordinator.finish(chosen, namer) {
            Ok(persist) => persist,
            // The loop stops after a lost session either way; keep the report.
            Err(err) if session.end == SessionEnd::MonitorFailed => {
                error!(err = %format!("{err:#}"), "failed to keep run");
                PersistOutcome::Skipped
            }
            Err(err) => return Err(err),
        };
        Ok(IterationReport {
            chosen: chosen.to_string(),
            session,
            persist,
        })
    }
}

/// Selection entries for `saves`, in the order given; the active save is marked.
pub fn build_choices(layout: &SaveLayout, saves: &[SaveFolder]) -> Vec<Choice> {
    saves
        .iter()
        .map(|save| Choice {
            label: if save.name == layout.active_name {
                format!("{} (active)", save.name)
            } else {
                save.name.clone()
            },
            value: save.name.clone(),
        })
        .collect()
}
