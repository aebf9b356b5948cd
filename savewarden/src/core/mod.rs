//! Deterministic, pure logic shared by the save warden.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data and return deterministic outputs suitable for tests.

pub mod layout;
pub mod lifecycle;
pub mod liveness;
pub mod slots;
pub mod snapshot;
