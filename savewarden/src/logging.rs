//! Diagnostic tracing for the save warden.
//!
//! Prompts go to stdout; tracing output goes to stderr so the two never
//! interleave on the same stream.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// Reads `RUST_LOG`. Defaults to `info` if unset, so autosaves and session
/// transitions are visible without configuration.
///
/// # Example
/// ```bash
/// RUST_LOG=savewarden=debug savewarden ./game
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
