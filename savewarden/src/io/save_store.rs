//! Filesystem primitives over save directories.
//!
//! None of these operations are transactional: an interrupted `copy` leaves a
//! partially populated destination, and `delete` followed by `copy` leaves the
//! destination absent if interrupted in between. `replace` narrows that window
//! by staging next to the destination and renaming into place.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::time::SystemTime;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, instrument, warn};
use walkdir::WalkDir;

use crate::core::layout::SaveLayout;
use crate::core::slots::SlotState;

/// A save directory found under the saves root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveFolder {
    pub name: String,
    pub mtime: SystemTime,
}

/// Recursively duplicate the directory tree at `source` into `destination`.
///
/// Existing files at `destination` are overwritten; extra files are kept.
#[instrument(skip_all, fields(source = %source.display(), destination = %destination.display()))]
pub fn copy(source: &Path, destination: &Path) -> Result<()> {
    if !source.is_dir() {
        return Err(anyhow!("save folder {} does not exist", source.display()));
    }
    fs::create_dir_all(destination)
        .with_context(|| format!("create directory {}", destination.display()))?;

    let mut files = 0usize;
    for entry in WalkDir::new(source).min_depth(1).follow_links(false) {
        let entry = entry.with_context(|| format!("walk {}", source.display()))?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .with_context(|| format!("relativize {}", entry.path().display()))?;
        let target = destination.join(relative);
        let file_type = entry.file_type();
        if file_type.is_dir() {
            fs::create_dir_all(&target)
                .with_context(|| format!("create directory {}", target.display()))?;
        } else if file_type.is_file() {
            fs::copy(entry.path(), &target).with_context(|| {
                format!("copy {} to {}", entry.path().display(), target.display())
            })?;
            files += 1;
        } else {
            debug!(path = %entry.path().display(), "skipping non-regular entry");
        }
    }
    debug!(files, "copy finished");
    Ok(())
}

/// Recursively remove `path`. A missing path is not an error.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn delete(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => {
            debug!("deleted");
            Ok(())
        }
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err).with_context(|| format!("delete {}", path.display())),
    }
}

/// Create an empty save directory at `path` if none exists.
pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).with_context(|| format!("create directory {}", path.display()))
}

/// Replace `destination` with a copy of `source`.
///
/// The copy is staged in a hidden temporary directory beside `destination`,
/// then renamed into place, so an interrupted copy never leaves a half
/// populated destination behind.
#[instrument(skip_all, fields(source = %source.display(), destination = %destination.display()))]
pub fn replace(source: &Path, destination: &Path) -> Result<()> {
    let parent = destination
        .parent()
        .with_context(|| format!("save path missing parent {}", destination.display()))?;
    let name = destination
        .file_name()
        .with_context(|| format!("save path missing name {}", destination.display()))?
        .to_string_lossy()
        .into_owned();
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;

    let staging = tempfile::Builder::new()
        .prefix(&format!(".{name}.staging"))
        .tempdir_in(parent)
        .with_context(|| format!("create staging directory in {}", parent.display()))?;
    copy(source, staging.path())?;

    let retired = parent.join(format!(".{name}.retired"));
    delete(&retired)?;
    let had_destination = destination.exists();
    if had_destination {
        fs::rename(destination, &retired)
            .with_context(|| format!("move aside {}", destination.display()))?;
    }
    if let Err(err) = fs::rename(staging.path(), destination) {
        if had_destination && let Err(restore) = fs::rename(&retired, destination) {
            warn!(
                err = %restore,
                retired = %retired.display(),
                "failed to restore previous save; it remains at the retired path"
            );
        }
        return Err(err)
            .with_context(|| format!("move staged save into {}", destination.display()));
    }
    debug!("staged save moved into place");
    delete(&retired)
}

/// Enumerate save folders under the layout's root, newest first.
///
/// Only directories named like saves are returned; hidden staging
/// directories and plain files are skipped. A missing root yields no saves.
pub fn list_saves(layout: &SaveLayout) -> Result<Vec<SaveFolder>> {
    let entries = match fs::read_dir(&layout.root) {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => {
            return Err(err).with_context(|| format!("read {}", layout.root.display()));
        }
    };

    let mut saves = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("read entry in {}", layout.root.display()))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') || !layout.is_save_name(&name) {
            continue;
        }
        let metadata = entry
            .metadata()
            .with_context(|| format!("stat {}", entry.path().display()))?;
        if !metadata.is_dir() {
            continue;
        }
        let mtime = metadata
            .modified()
            .with_context(|| format!("read mtime {}", entry.path().display()))?;
        saves.push(SaveFolder { name, mtime });
    }
    saves.sort_by(|a, b| b.mtime.cmp(&a.mtime).then_with(|| a.name.cmp(&b.name)));
    Ok(saves)
}

/// Stat every autosave slot directory under the layout's root.
///
/// Only names that parse as a slot inside the ring count; a missing root
/// yields no slots.
pub fn slot_states(layout: &SaveLayout) -> Result<Vec<SlotState>> {
    let entries = match fs::read_dir(&layout.root) {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => {
            return Err(err).with_context(|| format!("read {}", layout.root.display()));
        }
    };

    let mut slots = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("read entry in {}", layout.root.display()))?;
        let Some(index) = layout.slot_index(&entry.file_name().to_string_lossy()) else {
            continue;
        };
        let metadata = entry
            .metadata()
            .with_context(|| format!("stat {}", entry.path().display()))?;
        if !metadata.is_dir() {
            continue;
        }
        let mtime = metadata
            .modified()
            .with_context(|| format!("read mtime {}", entry.path().display()))?;
        slots.push(SlotState { index, mtime });
    }
    slots.sort_by_key(|slot| slot.index);
    Ok(slots)
}

/// Read the state artifact inside `dir`.
///
/// Returns `Ok(None)` when the artifact does not exist; any other read
/// failure is an error.
pub fn read_artifact(layout: &SaveLayout, dir: &Path) -> Result<Option<Vec<u8>>> {
    let path = layout.artifact_in(dir);
    match fs::read(&path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err).with_context(|| format!("read artifact {}", path.display())),
    }
}
