//! Time management for the bench
//!
//! Provides concrete clocks:
//! - `SimulatedClock`: delays advance a virtual counter (tests, host demos)
//! - `StdClock`: `std::time::Instant` plus thread sleep (host builds)
//!
//! On a microcontroller use [`crate::adapters::HalClock`] to pair a hardware
//! tick counter with an `embedded-hal` delay.

use crate::constants::time::US_PER_MS;
use crate::traits::{Clock, TimeSource};

/// Timestamp in milliseconds since an arbitrary epoch (usually boot)
pub type Timestamp = u64;

/// Virtual clock with microsecond resolution
///
/// `now()` truncates to whole milliseconds, like a hardware `millis()` counter,
/// so sub-millisecond delays accumulate until they cross a tick.
#[derive(Debug, Clone, Default)]
pub struct SimulatedClock {
    micros: u64,
}

impl SimulatedClock {
    /// Start the clock at `start_ms`
    pub fn new(start_ms: Timestamp) -> Self {
        Self {
            micros: start_ms * US_PER_MS,
        }
    }

    /// Jump forward without going through a delay
    pub fn advance_ms(&mut self, ms: u64) {
        self.micros += ms * US_PER_MS;
    }

    /// Elapsed virtual time in microseconds
    pub fn micros(&self) -> u64 {
        self.micros
    }
}

impl TimeSource for SimulatedClock {
    fn now(&self) -> Timestamp {
        self.micros / US_PER_MS
    }
}

impl Clock for SimulatedClock {
    fn delay_ms(&mut self, ms: u32) {
        self.advance_ms(u64::from(ms));
    }

    fn delay_us(&mut self, us: u32) {
        self.micros += u64::from(us);
    }
}

/// Wall-time clock for host builds (requires std)
#[cfg(feature = "std")]
#[derive(Debug, Clone)]
pub struct StdClock {
    start: std::time::Instant,
}

#[cfg(feature = "std")]
impl StdClock {
    /// Start counting from now
    pub fn new() -> Self {
        Self {
            start: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl TimeSource for StdClock {
    fn now(&self) -> Timestamp {
        self.start.elapsed().as_millis() as Timestamp
    }
}

#[cfg(feature = "std")]
impl Clock for StdClock {
    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(std::time::Duration::from_millis(u64::from(ms)));
    }

    fn delay_us(&mut self, us: u32) {
        std::thread::sleep(std::time::Duration::from_micros(u64::from(us)));
    }
}
