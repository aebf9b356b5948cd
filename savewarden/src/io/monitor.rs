//! Process liveness checks for the supervised executable.
//!
//! The [`ProcessQuery`] trait decouples supervision from the platform's
//! process lister (`pgrep` or `tasklist`). Tests use scripted queries that
//! return predetermined output without touching the process table.

use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, instrument};

use crate::core::liveness::is_alive;
use crate::io::process::run_command_with_timeout;

/// Source of raw process-table output for a process name.
pub trait ProcessQuery {
    /// Return whatever the lister printed for `name`; empty output means no match.
    fn query(&self, name: &str) -> Result<String>;
}

/// Query backed by the platform process lister.
#[derive(Debug, Clone)]
pub struct SystemProcessQuery {
    pub timeout: Duration,
    pub output_limit_bytes: usize,
}

impl ProcessQuery for SystemProcessQuery {
    #[instrument(skip(self))]
    fn query(&self, name: &str) -> Result<String> {
        let output =
            run_command_with_timeout(lister_command(name), self.timeout, self.output_limit_bytes)
                .context("run process lister")?;
        if output.timed_out {
            return Err(anyhow!(
                "process lister timed out after {:?}",
                self.timeout
            ));
        }
        // pgrep exits 1 when nothing matched; that is an answer, not a failure.
        debug!(exit_code = ?output.status.code(), "process lister finished");
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(windows)]
fn lister_command(name: &str) -> Command {
    let mut cmd = Command::new("tasklist");
    cmd.arg("/FI").arg(format!("IMAGENAME eq {name}")).arg("/NH");
    cmd
}

#[cfg(not(windows))]
fn lister_command(name: &str) -> Command {
    let mut cmd = Command::new("pgrep");
    cmd.arg("-x").arg("--").arg(comm_name(name));
    cmd
}

/// Linux truncates a process's `comm` to 15 bytes, and `pgrep -x` matches on it.
#[cfg(not(windows))]
fn comm_name(name: &str) -> &str {
    const COMM_LEN: usize = 15;
    if !cfg!(target_os = "linux") || name.len() <= COMM_LEN {
        return name;
    }
    let mut end = COMM_LEN;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    &name[..end]
}

/// Boolean view over a [`ProcessQuery`].
pub struct ProcessMonitor<Q: ProcessQuery> {
    query: Q,
}

impl<Q: ProcessQuery> ProcessMonitor<Q> {
    pub fn new(query: Q) -> Self {
        Self { query }
    }

    /// Whether a process called `name` is currently running.
    ///
    /// Blocks for as long as the underlying query does.
    pub fn is_running(&self, name: &str) -> Result<bool> {
        let raw = self
            .query
            .query(name)
            .with_context(|| format!("query process {name}"))?;
        Ok(is_alive(&raw))
    }
}
