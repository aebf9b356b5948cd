//! Staging a chosen save before launch and persisting progress after exit.

use anyhow::{Context, Result, anyhow};
use tracing::{debug, info, instrument, warn};

use crate::core::layout::{SaveLayout, validate_label};
use crate::core::snapshot::same_content;
use crate::io::prompt::Namer;
use crate::io::save_store::{read_artifact, replace};

/// Result of offering to keep a finished run under a new name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistOutcome {
    /// The run left nothing worth keeping (no artifact, or identical to the chosen save).
    Unchanged,
    /// The user declined to name the run.
    Skipped,
    /// The active save was copied into a new folder.
    Saved { name: String },
}

pub struct SaveSwapCoordinator<'a> {
    layout: &'a SaveLayout,
}

impl<'a> SaveSwapCoordinator<'a> {
    pub fn new(layout: &'a SaveLayout) -> Self {
        Self { layout }
    }

    /// Make `chosen` the active save. Choosing the active save is a no-op.
    #[instrument(skip(self))]
    pub fn swap_in(&self, chosen: &str) -> Result<()> {
        if chosen == self.layout.active_name {
            debug!("active save chosen; nothing to swap");
            return Ok(());
        }
        let source = self.layout.folder_path(chosen);
        if !source.is_dir() {
            return Err(anyhow!("save {chosen} not found at {}", source.display()));
        }
        replace(&source, &self.layout.active_path())
            .with_context(|| format!("swap {chosen} into {}", self.layout.active_name))?;
        info!("save swapped in");
        Ok(())
    }

    /// Whether the active save's artifact differs from `chosen`'s artifact.
    ///
    /// The chosen save's artifact is read from disk now, not remembered from
    /// selection time. A missing active artifact means nothing to persist;
    /// any read failure, or a chosen save without an artifact, counts as
    /// different.
    pub fn needs_persist(&self, chosen: &str) -> bool {
        let active = match read_artifact(self.layout, &self.layout.active_path()) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                debug!("no state artifact in active save");
                return false;
            }
            Err(err) => {
                warn!(err = %format!("{err:#}"), "active artifact unreadable; treating as changed");
                return true;
            }
        };
        let original = match read_artifact(self.layout, &self.layout.folder_path(chosen)) {
            Ok(original) => original,
            Err(err) => {
                warn!(err = %format!("{err:#}"), "chosen artifact unreadable; treating as changed");
                return true;
            }
        };
        !same_content(Some(active.as_slice()), original.as_deref())
    }

    /// Copy the active save into `<active> - <label>`. A blank label skips.
    #[instrument(skip(self))]
    pub fn persist(&self, label: &str) -> Result<PersistOutcome> {
        let label = label.trim();
        if label.is_empty() {
            return Ok(PersistOutcome::Skipped);
        }
        validate_label(label).map_err(|reason| anyhow!("invalid save name `{label}`: {reason}"))?;
        let name = self.layout.labelled_name(label);
        let destination = self.layout.folder_path(&name);
        if destination.exists() {
            warn!(name = %name, "overwriting existing save");
        }
        replace(&self.layout.active_path(), &destination)
            .with_context(|| format!("save run as {name}"))?;
        info!(name = %name, "run saved");
        Ok(PersistOutcome::Saved { name })
    }

    /// Post-exit step: offer to keep the run when it changed `chosen`.
    pub fn finish<N: Namer>(&self, chosen: &str, namer: &mut N) -> Result<PersistOutcome> {
        if !self.needs_persist(chosen) {
            debug!("run matches the chosen save; not prompting");
            return Ok(PersistOutcome::Unchanged);
        }
        match namer.name()? {
            Some(label) => self.persist(&label),
            None => Ok(PersistOutcome::Skipped),
        }
    }
}
