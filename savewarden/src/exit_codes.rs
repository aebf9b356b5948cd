//! Stable exit codes for the savewarden CLI.

/// The user finished (cancelled the save selection).
pub const OK: i32 = 0;
/// Startup failed: missing/invalid executable, bad config, or unreadable saves root.
pub const INVALID: i32 = 1;
