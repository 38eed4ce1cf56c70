//! Time-Related Constants
//!
//! Pacing for the discharge loop and conversion factors for the integrator.

// ===== TIME UNIT CONVERSIONS =====

/// Milliseconds per second.
pub const MS_PER_SECOND: u64 = 1000;

/// Microseconds per millisecond.
pub const US_PER_MS: u64 = 1000;

/// Seconds per hour.
pub const SECONDS_PER_HOUR: u64 = 3600;

/// Milliseconds per hour.
pub const MS_PER_HOUR: u64 = MS_PER_SECOND * SECONDS_PER_HOUR;

/// Milliamperes per ampere.
pub const MA_PER_A: u64 = 1000;

/// Divisor turning `(I_prev + I_cur)[A] × Δt[ms]` into mAh.
///
/// Halve for the trapezoid average, divide by `MS_PER_HOUR` for A·h and
/// scale by `MA_PER_A`: `2 × 3 600 000 / 1000 = 7200`.
pub const TRAPEZOID_MAH_DIVISOR: f64 = 2.0 * MS_PER_HOUR as f64 / MA_PER_A as f64;

// ===== PACING =====

/// Wait after enabling the load before trusting current readings (ms).
pub const SETTLE_DELAY_MS: u32 = 10;

/// Discharge loop sample period (ms).
pub const SAMPLE_PERIOD_MS: u32 = 100;

/// Gap between the voltage and current conversions of one sample (µs).
pub const CHANNEL_GAP_US: u32 = 100;

/// Idle time between supervised cycles (ms).
pub const CYCLE_DELAY_MS: u32 = 1000;

/// Progress line cadence, in trapezoid additions.
pub const REPORT_EVERY_STEPS: u32 = 10;
