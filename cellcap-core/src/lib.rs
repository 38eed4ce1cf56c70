//! Core engine for CellCap - rechargeable cell discharge capacity testing
//!
//! Reads battery voltage and shunt current through an ADC, decides whether the
//! cell is ready to test, and drains it through a fixed load while integrating
//! current over time with the trapezoidal rule.
//!
//! Key constraints:
//! - Runs on 8/32-bit MCUs with a few KB of RAM
//! - No heap allocation anywhere in the measurement path
//! - Single control thread, explicit blocking for operator acknowledgment
//!
//! ```no_run
//! use cellcap_core::{classify, BatteryState, BatteryThresholds};
//!
//! let thresholds = BatteryThresholds::default();
//!
//! match classify(3.9, &thresholds) {
//!     BatteryState::Ready => {},        // Start the discharge
//!     BatteryState::Undercharged => {}, // Ask for a charge first
//!     BatteryState::Inverted => {},     // Check polarity
//! }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

#[macro_use]
mod logging;

pub mod adapters;
pub mod bench;
pub mod calibration;
pub mod checker;
pub mod config;
pub mod constants;
pub mod converter;
pub mod errors;
pub mod integrator;
pub mod report;
pub mod tester;
pub mod time;
pub mod traits;

// Public API
pub use bench::Bench;
pub use calibration::{CalibrationConstants, DerivedFactors, ReferenceCalibrator};
pub use checker::{classify, BatteryState, BatteryThresholds, PreconditionChecker};
pub use config::{AcquisitionSettings, DischargeTiming, TesterConfig};
pub use converter::SampleConverter;
pub use errors::{CalibrationError, CalibrationResult, TesterError, TesterResult};
pub use integrator::{CapacityAccumulator, CapacityIntegrator, DischargeReport, TrapezoidState};
pub use tester::{CapacityTester, CheckOutcome};
pub use traits::{AnalogInput, Channel, Clock, Console, GateOutput, TimeSource};

/// Crate version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
