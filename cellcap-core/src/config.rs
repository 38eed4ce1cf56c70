//! Tester Configuration
//!
//! All tunables of a tester in one value:
//!
//! - [`CalibrationConstants`]: circuit values and empirical corrections
//! - [`BatteryThresholds`]: classification and cut-off voltages
//! - [`DischargeTiming`]: settle, pacing and report cadence
//! - [`AcquisitionSettings`]: optional oversampling
//!
//! Defaults reproduce the reference bench. With the `serde` feature the whole
//! tree (de)serializes and missing fields fall back to those defaults, so a
//! per-unit file only needs the values that were actually measured:
//!
//! ```rust
//! # #[cfg(feature = "serde")]
//! # {
//! use cellcap_core::TesterConfig;
//!
//! let json = r#"{ "calibration": { "reference_voltage": 1.084 } }"#;
//! let config: TesterConfig = serde_json::from_str(json).unwrap();
//!
//! assert_eq!(config.calibration.reference_voltage, 1.084);
//! assert_eq!(config.thresholds.cutoff, 2.8);
//! # }
//! ```

use crate::{
    calibration::CalibrationConstants,
    checker::BatteryThresholds,
    constants::time::{
        CHANNEL_GAP_US, CYCLE_DELAY_MS, REPORT_EVERY_STEPS, SAMPLE_PERIOD_MS, SETTLE_DELAY_MS,
    },
    errors::{TesterError, TesterResult},
};

/// Pacing of the discharge loop and the supervised cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DischargeTiming {
    /// Wait after enabling the load (ms)
    pub settle_ms: u32,
    /// Delay preceding each discharge sample (ms)
    pub sample_period_ms: u32,
    /// Gap between the voltage and current conversions (µs)
    pub channel_gap_us: u32,
    /// Emit a progress line every this many trapezoid additions
    pub report_every: u32,
    /// Idle time before each supervised cycle (ms)
    pub cycle_delay_ms: u32,
}

impl Default for DischargeTiming {
    fn default() -> Self {
        Self {
            settle_ms: SETTLE_DELAY_MS,
            sample_period_ms: SAMPLE_PERIOD_MS,
            channel_gap_us: CHANNEL_GAP_US,
            report_every: REPORT_EVERY_STEPS,
            cycle_delay_ms: CYCLE_DELAY_MS,
        }
    }
}

/// How each reading is acquired
///
/// `oversampling = 1` is a single conversion per reading. Larger values average
/// that many back-to-back conversions, trading time for noise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AcquisitionSettings {
    /// Conversions averaged per reading
    pub oversampling: u8,
}

impl Default for AcquisitionSettings {
    fn default() -> Self {
        Self { oversampling: 1 }
    }
}

/// Complete configuration of one tester
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TesterConfig {
    /// Circuit constants
    pub calibration: CalibrationConstants,
    /// Classification and cut-off voltages
    pub thresholds: BatteryThresholds,
    /// Loop pacing
    pub timing: DischargeTiming,
    /// Reading acquisition
    pub acquisition: AcquisitionSettings,
}

impl TesterConfig {
    /// Replace the calibration constants
    pub fn with_calibration(mut self, calibration: CalibrationConstants) -> Self {
        self.calibration = calibration;
        self
    }

    /// Replace the voltage thresholds
    pub fn with_thresholds(mut self, thresholds: BatteryThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Replace the loop pacing
    pub fn with_timing(mut self, timing: DischargeTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Average `count` conversions per reading
    pub fn with_oversampling(mut self, count: u8) -> Self {
        self.acquisition.oversampling = count;
        self
    }

    /// Check every section
    pub fn validate(&self) -> TesterResult<()> {
        self.calibration.validate()?;
        self.thresholds.validate()?;

        if self.timing.report_every == 0 {
            return Err(TesterError::InvalidConfig {
                reason: "report_every must be at least 1",
            });
        }

        if self.acquisition.oversampling == 0 {
            return Err(TesterError::InvalidConfig {
                reason: "oversampling must be at least 1",
            });
        }

        Ok(())
    }
}
