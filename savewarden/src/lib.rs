//! Save warden: supervises one game executable and keeps its saves safe.
//!
//! Before each run the player picks a save, which is swapped into the active
//! save folder. While the game runs, its state artifact is polled and copied
//! into a rotating ring of autosave slots whenever it changes. After exit, a
//! run that diverged from the chosen save can be kept under a new name.
//!
//! - **[`core`]**: Pure, deterministic logic (slot allocation, snapshot
//!   comparison, lifecycle state machine). No I/O.
//! - **[`io`]**: Side-effecting adapters (save directories, process table,
//!   clock, prompts, config).
//!
//! Orchestration modules ([`autosave`], [`session`], [`swap`], [`app`]) combine
//! the two.

pub mod app;
pub mod autosave;
pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod session;
pub mod swap;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
