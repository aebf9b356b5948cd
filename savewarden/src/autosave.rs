//! Change-driven autosaves into a fixed ring of slots.
//!
//! The engine remembers the last state artifact it saw. When the active save's
//! artifact differs from it, the whole active folder is copied into the slot
//! chosen by [`acquire`]. Failures are logged and never end the session.

use anyhow::Result;
use tracing::{debug, info, instrument, warn};

use crate::core::layout::SaveLayout;
use crate::core::slots::acquire;
use crate::core::snapshot::{SnapshotChange, classify};
use crate::io::save_store::{copy, delete, read_artifact, slot_states};

/// Result of a single autosave check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    /// Artifact absent on both sides, or byte-identical.
    Unchanged,
    /// Artifact disappeared since the last snapshot; nothing was saved.
    Vanished,
    /// Active save copied into `slot`.
    Saved { slot: u32 },
    /// Reading or copying failed; the baseline is unchanged.
    Failed,
}

pub struct AutosaveEngine<'a> {
    layout: &'a SaveLayout,
    last_snapshot: Option<Vec<u8>>,
}

impl<'a> AutosaveEngine<'a> {
    pub fn new(layout: &'a SaveLayout) -> Self {
        Self {
            layout,
            last_snapshot: None,
        }
    }

    /// Start from a known baseline instead of reading one from disk.
    pub fn with_snapshot(layout: &'a SaveLayout, snapshot: Option<Vec<u8>>) -> Self {
        Self {
            layout,
            last_snapshot: snapshot,
        }
    }

    pub fn last_snapshot(&self) -> Option<&[u8]> {
        self.last_snapshot.as_deref()
    }

    /// Remember the active save's current artifact as the baseline.
    ///
    /// A read failure leaves the baseline absent, so the first readable
    /// artifact afterwards is treated as new progress.
    pub fn prime(&mut self) {
        match read_artifact(self.layout, &self.layout.active_path()) {
            Ok(snapshot) => {
                debug!(present = snapshot.is_some(), "autosave baseline taken");
                self.last_snapshot = snapshot;
            }
            Err(err) => {
                warn!(err = %format!("{err:#}"), "failed to read autosave baseline");
                self.last_snapshot = None;
            }
        }
    }

    /// Compare the active artifact with the baseline and autosave on change.
    #[instrument(skip_all)]
    pub fn check(&mut self) -> CheckOutcome {
        let current = match read_artifact(self.layout, &self.layout.active_path()) {
            Ok(current) => current,
            Err(err) => {
                warn!(err = %format!("{err:#}"), "autosave skipped: artifact unreadable");
                return CheckOutcome::Failed;
            }
        };

        match classify(self.last_snapshot.as_deref(), current.as_deref()) {
            SnapshotChange::Unchanged => {
                debug!("no change since last snapshot");
                CheckOutcome::Unchanged
            }
            SnapshotChange::Vanished => {
                debug!("state artifact vanished; keeping previous snapshot");
                CheckOutcome::Vanished
            }
            SnapshotChange::Changed => match self.write_slot() {
                Ok(slot) => {
                    info!(slot, "autosaved");
                    self.last_snapshot = current;
                    CheckOutcome::Saved { slot }
                }
                Err(err) => {
                    warn!(err = %format!("{err:#}"), "autosave failed");
                    CheckOutcome::Failed
                }
            },
        }
    }

    fn write_slot(&self) -> Result<u32> {
        let existing = slot_states(self.layout)?;
        let slot = acquire(&existing, self.layout.slot_capacity);
        let target = self.layout.slot_path(slot);
        delete(&target)?;
        copy(&self.layout.active_path(), &target)?;
        Ok(slot)
    }
}
