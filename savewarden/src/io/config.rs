//! Warden configuration stored next to the supervised executable
//! (`savewarden.toml`).

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;

use crate::core::layout::SaveLayout;
use crate::core::lifecycle::LifecycleLimits;

/// File name looked up in the executable's directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "savewarden.toml";

/// Warden configuration (TOML).
///
/// Missing fields default to the values the tool ships with.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WardenConfig {
    /// Directory holding every save folder. Relative paths resolve against
    /// the supervised executable's working directory.
    pub saves_root: PathBuf,

    /// Name of the folder the game reads and writes during a run.
    pub active_name: String,

    /// File inside each save whose bytes decide whether progress happened.
    pub state_artifact: String,

    /// Size of the autosave ring.
    pub autosave_slots: u32,

    /// Seconds between liveness polls.
    pub poll_interval_secs: u64,

    /// Polls to wait for the process to appear after launch.
    pub start_attempts: u32,

    /// Run an autosave check every n-th poll while the process is running.
    pub autosave_every_polls: u32,

    /// Ceiling on a single process-table query.
    pub process_query_timeout_secs: u64,

    /// Truncate process-query output beyond this many bytes.
    pub query_output_limit_bytes: usize,
}

impl Default for WardenConfig {
    fn default() -> Self {
        Self {
            saves_root: PathBuf::from("saves"),
            active_name: "save".to_string(),
            state_artifact: "world.dat".to_string(),
            autosave_slots: 10,
            poll_interval_secs: 2,
            start_attempts: 15,
            autosave_every_polls: 15,
            process_query_timeout_secs: 60,
            query_output_limit_bytes: 64 * 1024,
        }
    }
}

impl WardenConfig {
    pub fn validate(&self) -> Result<()> {
        if self.saves_root.as_os_str().is_empty() {
            return Err(anyhow!("saves_root must not be empty"));
        }
        if self.active_name.trim().is_empty() {
            return Err(anyhow!("active_name must not be empty"));
        }
        if self.active_name.contains(['/', '\\']) || self.active_name.starts_with('.') {
            return Err(anyhow!(
                "active_name must be a plain folder name without separators or leading '.'"
            ));
        }
        if self.state_artifact.trim().is_empty() || self.state_artifact.contains(['/', '\\']) {
            return Err(anyhow!("state_artifact must be a plain file name"));
        }
        if self.autosave_slots == 0 {
            return Err(anyhow!("autosave_slots must be > 0"));
        }
        if self.poll_interval_secs == 0 {
            return Err(anyhow!("poll_interval_secs must be > 0"));
        }
        if self.start_attempts == 0 {
            return Err(anyhow!("start_attempts must be > 0"));
        }
        if self.autosave_every_polls == 0 {
            return Err(anyhow!("autosave_every_polls must be > 0"));
        }
        if self.process_query_timeout_secs == 0 {
            return Err(anyhow!("process_query_timeout_secs must be > 0"));
        }
        if self.query_output_limit_bytes == 0 {
            return Err(anyhow!("query_output_limit_bytes must be > 0"));
        }
        Ok(())
    }

    /// Build the save layout, resolving a relative `saves_root` against `workdir`.
    pub fn layout(&self, workdir: &Path) -> SaveLayout {
        let root = if self.saves_root.is_absolute() {
            self.saves_root.clone()
        } else {
            workdir.join(&self.saves_root)
        };
        SaveLayout::new(
            root,
            self.active_name.clone(),
            self.state_artifact.clone(),
            self.autosave_slots,
        )
    }

    pub fn lifecycle_limits(&self) -> LifecycleLimits {
        LifecycleLimits {
            start_attempts: self.start_attempts,
            autosave_every: self.autosave_every_polls,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn process_query_timeout(&self) -> Duration {
        Duration::from_secs(self.process_query_timeout_secs)
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `WardenConfig::default()`.
pub fn load_config(path: &Path) -> Result<WardenConfig> {
    if !path.exists() {
        let cfg = WardenConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: WardenConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(cfg)
}
