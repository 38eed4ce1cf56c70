//! Circuit Defaults
//!
//! Values of the reference bench: a buffered divider on the battery terminal,
//! a 0.1 Ω shunt read through a differential amplifier, and the MCU's internal
//! 1.1 V reference.

// ===== ADC =====

/// Internal ADC reference voltage (V).
///
/// Nominal value only. The real reference of a given chip can be off by
/// several percent; measure it with [`crate::ReferenceCalibrator`].
pub const REFERENCE_VOLTAGE_V: f32 = 1.1;

/// ADC full-scale count (10-bit converter).
///
/// Counts are in `[0, ADC_RESOLUTION_COUNTS)`.
pub const ADC_RESOLUTION_COUNTS: u16 = 1024;

/// Known signal applied to the reference channel during self-calibration (V).
pub const REFERENCE_SIGNAL_V: f32 = 0.55;

/// Samples averaged by the reference self-calibration.
pub const REFERENCE_SAMPLES: u8 = 10;

/// Spacing between reference samples (µs).
pub const REFERENCE_SAMPLE_SPACING_US: u32 = 100;

// ===== LOAD PATH =====

/// Current-sense shunt (Ω).
pub const SHUNT_RESISTANCE_OHM: f32 = 0.1;

/// Fixed discharge load (Ω).
pub const LOAD_RESISTANCE_OHM: f32 = 4.0;

// ===== VOLTAGE DIVIDER =====

/// Divider resistor between battery terminal and sense node (Ω).
pub const DIVIDER_HIGH_OHM: f32 = 10_000.0;

/// Divider resistor between sense node and ground (Ω).
pub const DIVIDER_LOW_OHM: f32 = 3_000.0;

/// Empirical offset and tolerance correction for the divider (dimensionless).
pub const DIVIDER_CORRECTION: f32 = 1.000_813_87;

// ===== DIFFERENTIAL AMPLIFIER =====

/// Amplifier R1 (Ω).
pub const GAIN_R1_OHM: f32 = 1_000.0;

/// Amplifier R2 (Ω).
pub const GAIN_R2_OHM: f32 = 1_000.0;

/// Amplifier R3 (Ω).
pub const GAIN_R3_OHM: f32 = 10_000.0;

/// Amplifier R4 (Ω).
pub const GAIN_R4_OHM: f32 = 10_000.0;

/// Empirical offset and tolerance correction for the amplifier (dimensionless).
pub const GAIN_CORRECTION: f32 = 1.007_814_766;
