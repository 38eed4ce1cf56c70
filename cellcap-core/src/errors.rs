//! Error Types for Calibration and Bench Failures
//!
//! ## Design Philosophy
//!
//! Errors follow the same rules as everything else on the measurement path:
//!
//! 1. **Small Size**: variants carry at most a parameter name and a value.
//! 2. **No Heap Allocation**: messages are `&'static str`, never `String`.
//! 3. **Copy Semantics**: errors are returned by value from the control loop.
//!
//! ## Error Categories
//!
//! ### Configuration
//! - `CalibrationError`: a circuit constant that would make the derived scale
//!   factors meaningless (zero resistance, zero ADC resolution, dead reference
//!   channel).
//!
//! ### Collaborator Faults
//! - `TesterError::Acquisition`: the analog input refused a conversion
//! - `TesterError::Gate`: the discharge gate could not be driven
//! - `TesterError::Console`: the operator console failed to write or read
//!
//! Battery classification is *not* an error. Reversed or undercharged cells
//! are normal outcomes of a precondition check and are handled by re-prompting
//! the operator, see [`crate::checker`].
//!
//! ```rust
//! use cellcap_core::{CalibrationConstants, CalibrationError};
//!
//! let constants = CalibrationConstants::default().with_shunt_resistance(0.0);
//! match constants.derive() {
//!     Err(CalibrationError::NonPositive { parameter, .. }) => {
//!         assert_eq!(parameter, "shunt_resistance");
//!     }
//!     _ => unreachable!(),
//! }
//! ```

use thiserror_no_std::Error;

use crate::traits::Channel;

/// Result type for calibration operations
pub type CalibrationResult<T> = Result<T, CalibrationError>;

/// Result type for bench operations
pub type TesterResult<T> = Result<T, TesterError>;

/// Calibration errors - invalid circuit constants or a dead reference signal
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum CalibrationError {
    /// A resistance, voltage or correction factor that must be strictly positive
    #[error("Calibration parameter {parameter} must be > 0, got {value}")]
    NonPositive {
        /// Name of the offending constant
        parameter: &'static str,
        /// Value that was rejected
        value: f32,
    },

    /// ADC resolution of zero counts
    #[error("ADC resolution must be non-zero")]
    ZeroResolution,

    /// Reference channel averaged to zero counts, nothing to scale against
    #[error("Reference channel read zero counts, is the known signal connected?")]
    NoSignal,
}

/// Bench errors - a collaborator failed or the configuration was rejected
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum TesterError {
    /// Configuration rejected before any hardware was touched
    #[error("Invalid calibration: {0}")]
    Calibration(CalibrationError),

    /// Invalid threshold or timing configuration
    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        /// What is wrong with it
        reason: &'static str,
    },

    /// Analog input failed to convert
    #[error("ADC read failed on channel {channel:?}")]
    Acquisition {
        /// Channel that was being sampled
        channel: Channel,
    },

    /// Discharge gate could not be driven
    #[error("Failed to drive discharge gate")]
    Gate,

    /// Operator console failed
    #[error("Console I/O failed")]
    Console,

    /// A status line did not fit the line buffer
    #[error("Status line exceeded buffer capacity")]
    LineOverflow,
}

impl From<CalibrationError> for TesterError {
    fn from(err: CalibrationError) -> Self {
        TesterError::Calibration(err)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for CalibrationError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::NonPositive { parameter, value } =>
                defmt::write!(fmt, "{} must be > 0, got {}", parameter, value),
            Self::ZeroResolution =>
                defmt::write!(fmt, "ADC resolution is zero"),
            Self::NoSignal =>
                defmt::write!(fmt, "Reference channel reads zero"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for TesterError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::Calibration(err) =>
                defmt::write!(fmt, "Calibration: {}", err),
            Self::InvalidConfig { reason } =>
                defmt::write!(fmt, "Config: {}", reason),
            Self::Acquisition { channel } =>
                defmt::write!(fmt, "ADC read failed on {}", channel),
            Self::Gate =>
                defmt::write!(fmt, "Gate drive failed"),
            Self::Console =>
                defmt::write!(fmt, "Console I/O failed"),
            Self::LineOverflow =>
                defmt::write!(fmt, "Status line overflow"),
        }
    }
}
