//! Battery Thresholds
//!
//! Classification and cut-off voltages for a single Li-ion cell (18650).

/// Below this the cell is assumed to be connected backwards (V).
///
/// A reversed cell drives the sense node negative, which the ADC reads as
/// zero or close to it.
pub const INVERTED_BELOW_V: f32 = 1.0;

/// Cells at or below this are not fully charged (V).
///
/// Both thresholds are inclusive on the Undercharged side: exactly 1.0 V and
/// exactly 3.6 V classify as Undercharged.
pub const READY_ABOVE_V: f32 = 3.6;

/// Discharge stops once the terminal voltage drops below this (V).
///
/// Typical minimum discharge voltage for 18650 cells.
pub const CUTOFF_VOLTAGE_V: f32 = 2.8;
