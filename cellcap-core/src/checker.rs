//! Precondition Checker
//!
//! Classifies the resting cell voltage before a discharge may start.
//!
//! ## State Rules
//!
//! ```text
//! voltage <  1.0 V          → Inverted      (re-check after acknowledgment)
//! 1.0 V ≤ voltage ≤ 3.6 V   → Undercharged  (re-check after acknowledgment)
//! voltage >  3.6 V          → Ready         (discharge after acknowledgment)
//! ```
//!
//! Both boundaries belong to Undercharged. A reading that is not a number is
//! treated like a reversed cell, it never unlocks a discharge.
//!
//! ## Load Isolation
//!
//! The gate is forced inactive *before* the voltage is sampled. Under load the
//! terminal voltage sags by `I × R_internal`, which would push a healthy cell
//! into Undercharged.
//!
//! Each check is a single step with no memory. Two checks of an unchanged cell
//! always classify the same way.

use crate::{
    bench::Bench,
    constants::battery::{CUTOFF_VOLTAGE_V, INVERTED_BELOW_V, READY_ABOVE_V},
    converter::SampleConverter,
    errors::{TesterError, TesterResult},
    report::LineBuffer,
    traits::{AnalogInput, Clock, Console, GateOutput},
};

use core::fmt::Write;

/// Readiness of the connected cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BatteryState {
    /// Voltage too low to be a cell, polarity probably reversed
    Inverted,
    /// Cell present but not fully charged
    Undercharged,
    /// Fully charged, discharge may start
    Ready,
}

#[cfg(feature = "defmt")]
impl defmt::Format for BatteryState {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::Inverted => defmt::write!(fmt, "Inverted"),
            Self::Undercharged => defmt::write!(fmt, "Undercharged"),
            Self::Ready => defmt::write!(fmt, "Ready"),
        }
    }
}

/// Classification and cut-off voltages
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BatteryThresholds {
    /// Below this the cell is Inverted (V)
    pub inverted_below: f32,
    /// Above this the cell is Ready (V)
    pub ready_above: f32,
    /// Discharge stops below this (V)
    pub cutoff: f32,
}

impl Default for BatteryThresholds {
    fn default() -> Self {
        Self {
            inverted_below: INVERTED_BELOW_V,
            ready_above: READY_ABOVE_V,
            cutoff: CUTOFF_VOLTAGE_V,
        }
    }
}

impl BatteryThresholds {
    /// Thresholds must be ordered `0 < cutoff <= ready_above` and
    /// `inverted_below < ready_above`
    pub fn validate(&self) -> TesterResult<()> {
        if !(self.inverted_below < self.ready_above) {
            return Err(TesterError::InvalidConfig {
                reason: "inverted_below must be below ready_above",
            });
        }

        if !(self.cutoff > 0.0 && self.cutoff <= self.ready_above) {
            return Err(TesterError::InvalidConfig {
                reason: "cutoff must be positive and not above ready_above",
            });
        }

        Ok(())
    }
}

/// Classify a resting voltage
pub fn classify(voltage: f32, thresholds: &BatteryThresholds) -> BatteryState {
    if !voltage.is_finite() || voltage < thresholds.inverted_below {
        BatteryState::Inverted
    } else if voltage <= thresholds.ready_above {
        BatteryState::Undercharged
    } else {
        BatteryState::Ready
    }
}

/// One precondition step against the bench
#[derive(Debug, Clone, Copy)]
pub struct PreconditionChecker {
    thresholds: BatteryThresholds,
}

impl PreconditionChecker {
    /// Checker with the given thresholds
    pub fn new(thresholds: BatteryThresholds) -> Self {
        Self { thresholds }
    }

    /// Thresholds in use
    pub fn thresholds(&self) -> &BatteryThresholds {
        &self.thresholds
    }

    /// Isolate the load, sample the voltage, classify, tell the operator and
    /// wait for their acknowledgment
    ///
    /// Returns the state and the voltage it was derived from. On
    /// [`BatteryState::Ready`] the caller starts the discharge.
    pub fn check<A, G, C, K>(
        &self,
        bench: &mut Bench<A, G, C, K>,
        converter: &SampleConverter,
    ) -> TesterResult<(BatteryState, f32)>
    where
        A: AnalogInput,
        G: GateOutput,
        C: Console,
        K: Clock,
    {
        bench.gate_off()?;

        let voltage = bench.read_voltage(converter)?;
        let state = classify(voltage, &self.thresholds);
        log_info!("resting voltage {} V classified as {:?}", voltage, state);

        match state {
            BatteryState::Inverted => {
                bench.say("Battery reversed! Please check the polarity.")?;
                bench.say("Press enter to check again.")?;
            }
            BatteryState::Undercharged => {
                let mut line = LineBuffer::new();
                write!(
                    line,
                    "Battery is not fully charged! Current voltage: {:.2} volts.",
                    voltage
                )
                .map_err(|_| TesterError::LineOverflow)?;
                bench.say(&line)?;
                bench.say("Once it is charged, press enter to check again.")?;
            }
            BatteryState::Ready => {
                bench.say("Battery charged and ready for the test!")?;
                bench.say("The test may take several minutes, press enter when ready.")?;
            }
        }

        bench.acknowledge()?;
        Ok((state, voltage))
    }
}

impl Default for PreconditionChecker {
    fn default() -> Self {
        Self::new(BatteryThresholds::default())
    }
}
