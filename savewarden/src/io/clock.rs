//! Time source for polling loops.

use std::thread;
use std::time::Duration;

/// Suspension point used by the supervisor between polls.
pub trait Clock {
    fn sleep(&self, duration: Duration);
}

/// Clock that blocks the current thread.
pub struct SystemClock;

impl Clock for SystemClock {
    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}
