//! Time Source Abstraction
//!
//! The integrator needs a monotonic millisecond clock and two blocking delays.
//! Both live behind traits so tests can advance time without sleeping.

use crate::time::Timestamp;

/// Monotonic millisecond clock
///
/// Timestamps must never go backwards during a discharge run. The epoch is
/// arbitrary (usually boot).
pub trait TimeSource {
    /// Current timestamp in milliseconds
    fn now(&self) -> Timestamp;
}

/// Time source that can also block
///
/// Delays are busy-waits on most targets. On a simulated clock they simply
/// advance time.
pub trait Clock: TimeSource {
    /// Block for `ms` milliseconds
    fn delay_ms(&mut self, ms: u32);

    /// Block for `us` microseconds
    fn delay_us(&mut self, us: u32);
}
