//! I/O adapters for the save warden.

pub mod clock;
pub mod config;
pub mod monitor;
pub mod process;
pub mod prompt;
pub mod save_store;
