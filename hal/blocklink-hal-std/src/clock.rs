//! Monotonic clock for host builds

use std::thread;
use std::time::{Duration, Instant};

use blocklink_hal::Clock;

/// Clock backed by [`Instant`]
///
/// Milliseconds are counted from the moment the clock was created.
#[derive(Debug, Clone, Copy)]
pub struct StdClock {
    origin: Instant,
}

impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

impl StdClock {
    /// Create a clock starting at zero now
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Clock for StdClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }

    fn idle(&mut self, micros: u32) {
        if micros == 0 {
            thread::yield_now();
        } else {
            thread::sleep(Duration::from_micros(micros as u64));
        }
    }
}
