//! Naming conventions for the save folders under the saves root.

use std::path::{Path, PathBuf};

/// Separator between the active save name and a folder label.
const LABEL_SEPARATOR: &str = " - ";
/// Label stem reserved for autosave slots (`<active> - autosave <n>`).
const AUTOSAVE_STEM: &str = "autosave ";

/// Canonical paths and names for one saves root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveLayout {
    pub root: PathBuf,
    pub active_name: String,
    pub state_artifact: String,
    pub slot_capacity: u32,
}

impl SaveLayout {
    pub fn new(
        root: impl Into<PathBuf>,
        active_name: impl Into<String>,
        state_artifact: impl Into<String>,
        slot_capacity: u32,
    ) -> Self {
        Self {
            root: root.into(),
            active_name: active_name.into(),
            state_artifact: state_artifact.into(),
            slot_capacity,
        }
    }

    pub fn active_path(&self) -> PathBuf {
        self.root.join(&self.active_name)
    }

    pub fn folder_path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Path of the state artifact inside `dir`.
    pub fn artifact_in(&self, dir: &Path) -> PathBuf {
        dir.join(&self.state_artifact)
    }

    pub fn slot_name(&self, index: u32) -> String {
        format!(
            "{}{LABEL_SEPARATOR}{AUTOSAVE_STEM}{index}",
            self.active_name
        )
    }

    pub fn slot_path(&self, index: u32) -> PathBuf {
        self.root.join(self.slot_name(index))
    }

    /// Folder name for a user-labelled save.
    pub fn labelled_name(&self, label: &str) -> String {
        format!("{}{LABEL_SEPARATOR}{label}", self.active_name)
    }

    /// True for the active folder and every `<active> - <label>` folder.
    pub fn is_save_name(&self, name: &str) -> bool {
        if name == self.active_name {
            return true;
        }
        name.strip_prefix(&self.active_name)
            .and_then(|rest| rest.strip_prefix(LABEL_SEPARATOR))
            .is_some_and(|label| !label.is_empty())
    }

    /// Parse the slot index out of an autosave folder name.
    ///
    /// Returns `None` for anything that is not `<active> - autosave <n>` with `n`
    /// inside `1..=slot_capacity`.
    pub fn slot_index(&self, name: &str) -> Option<u32> {
        let label = name
            .strip_prefix(&self.active_name)?
            .strip_prefix(LABEL_SEPARATOR)?;
        let index: u32 = label.strip_prefix(AUTOSAVE_STEM)?.parse().ok()?;
        (1..=self.slot_capacity).contains(&index).then_some(index)
    }
}

/// Reasons a user-supplied label cannot become a folder name.
pub fn validate_label(label: &str) -> Result<(), String> {
    let label = label.trim();
    if label.is_empty() {
        return Err("label must not be empty".to_string());
    }
    if label.contains(['/', '\\']) {
        return Err("label must not contain path separators".to_string());
    }
    if label == "." || label == ".." {
        return Err("label must not be a relative path component".to_string());
    }
    if label
        .strip_prefix(AUTOSAVE_STEM)
        .is_some_and(|rest| rest.parse::<u32>().is_ok())
    {
        return Err(format!("label `{label}` is reserved for autosave slots"));
    }
    Ok(())
}
