//! Byte-exact classification of state artifact snapshots.

/// How the current state artifact relates to the remembered snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotChange {
    /// Nothing new: both absent, or byte-identical content.
    Unchanged,
    /// Artifact appeared or its bytes differ; an autosave is warranted.
    Changed,
    /// Artifact disappeared; there is nothing new to remember.
    Vanished,
}

/// Classify `current` against `last`. `None` means the artifact is absent,
/// which is distinct from present-but-empty.
pub fn classify(last: Option<&[u8]>, current: Option<&[u8]>) -> SnapshotChange {
    match (last, current) {
        (None, None) => SnapshotChange::Unchanged,
        (None, Some(_)) => SnapshotChange::Changed,
        (Some(_), None) => SnapshotChange::Vanished,
        (Some(last), Some(current)) if last == current => SnapshotChange::Unchanged,
        (Some(_), Some(_)) => SnapshotChange::Changed,
    }
}

/// True when both sides are present and byte-identical.
pub fn same_content(a: Option<&[u8]>, b: Option<&[u8]>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a == b)
}
