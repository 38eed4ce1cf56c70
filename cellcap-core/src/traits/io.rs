//! Analog input, gate output and operator console
//!
//! Each trait has its own associated error type. The bench logs the detail and
//! folds it into [`crate::TesterError`], so implementations are free to use
//! whatever their HAL returns.

use core::fmt::Debug;

/// Logical ADC channels consumed by the tester
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Channel {
    /// Buffered battery terminal voltage, after the divider
    BatteryVoltage,
    /// Amplified shunt voltage
    ShuntCurrent,
    /// Known signal used for reference self-calibration
    Reference,
}

#[cfg(feature = "defmt")]
impl defmt::Format for Channel {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::BatteryVoltage => defmt::write!(fmt, "BatteryVoltage"),
            Self::ShuntCurrent => defmt::write!(fmt, "ShuntCurrent"),
            Self::Reference => defmt::write!(fmt, "Reference"),
        }
    }
}

/// Source of raw ADC counts
///
/// Follows the `nb` convention: return `Err(nb::Error::WouldBlock)` while a
/// conversion is in flight. Counts must be in `[0, adc_resolution)`; the bench
/// clamps anything above full scale.
pub trait AnalogInput {
    /// Error reported by the converter
    type Error: Debug;

    /// Start or poll a conversion on `channel`
    fn read_raw(&mut self, channel: Channel) -> nb::Result<u16, Self::Error>;
}

/// Discharge-enabling output line
///
/// `true` connects the load, `false` disconnects it. Polarity of the physical
/// pin is the implementation's concern.
pub trait GateOutput {
    /// Error reported by the pin driver
    type Error: Debug;

    /// Drive the gate
    fn set_gate(&mut self, active: bool) -> Result<(), Self::Error>;
}

/// Line-oriented operator console
pub trait Console {
    /// Error reported by the transport
    type Error: Debug;

    /// Print one line of status text
    fn emit_line(&mut self, line: &str) -> Result<(), Self::Error>;

    /// Block until the operator signals "continue"
    ///
    /// No timeout. A benchtop test is supervised and waiting forever is fine.
    fn await_acknowledgment(&mut self) -> Result<(), Self::Error>;
}
