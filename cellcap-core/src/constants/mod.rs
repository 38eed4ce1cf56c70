//! Constants for CellCap Core
//!
//! Centralised numeric values for the tester. Every constant names its unit.
//!
//! ## Organization
//!
//! - **Circuit**: resistor network, reference voltage and ADC defaults for the
//!   reference bench (Li-ion 18650 tester with a 4 Ω load)
//! - **Battery**: classification thresholds and the discharge cut-off
//! - **Time**: pacing intervals and unit conversions
//!
//! Circuit values are defaults only. Every physical unit must be measured and
//! its correction factors entered through [`crate::CalibrationConstants`].

/// Resistor network, reference voltage and ADC defaults.
pub mod circuit;

/// Battery classification thresholds and discharge floor.
pub mod battery;

/// Pacing intervals and time unit conversions.
pub mod time;

// Re-export commonly used constants for convenience
pub use battery::{CUTOFF_VOLTAGE_V, INVERTED_BELOW_V, READY_ABOVE_V};

pub use circuit::{ADC_RESOLUTION_COUNTS, REFERENCE_VOLTAGE_V, SHUNT_RESISTANCE_OHM};

pub use time::{
    CHANNEL_GAP_US, CYCLE_DELAY_MS, MS_PER_HOUR, SAMPLE_PERIOD_MS, SETTLE_DELAY_MS,
    TRAPEZOID_MAH_DIVISOR,
};
