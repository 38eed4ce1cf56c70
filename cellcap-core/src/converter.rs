//! Sample Converter
//!
//! Turns raw ADC counts into volts and amperes:
//!
//! ```text
//! voltage = counts × volts_per_count / divider_factor
//! current = counts × volts_per_count / gain_factor / R_shunt
//! ```
//!
//! Both conversions are total and strictly increasing over the valid count
//! range. Obtaining the count, and pacing acquisitions, is the bench's job.

use crate::{
    calibration::{CalibrationConstants, DerivedFactors},
    errors::CalibrationResult,
};

/// Battery terminal voltage for a voltage-channel count
pub fn to_voltage(raw: u16, factors: &DerivedFactors) -> f32 {
    f32::from(raw) * factors.volts_per_count / factors.divider_factor
}

/// Discharge current for a shunt-channel count
pub fn to_current(raw: u16, factors: &DerivedFactors, shunt_resistance: f32) -> f32 {
    f32::from(raw) * factors.volts_per_count / factors.gain_factor / shunt_resistance
}

/// Calibrated count-to-physical converter
///
/// Bundles the derived factors with the constants the conversions still need
/// (shunt, load, resolution).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleConverter {
    factors: DerivedFactors,
    shunt_resistance: f32,
    load_resistance: f32,
    adc_resolution: u16,
}

impl SampleConverter {
    /// Validate the constants and derive the scale factors
    pub fn new(constants: &CalibrationConstants) -> CalibrationResult<Self> {
        Ok(Self {
            factors: constants.derive()?,
            shunt_resistance: constants.shunt_resistance,
            load_resistance: constants.load_resistance,
            adc_resolution: constants.adc_resolution,
        })
    }

    /// Derived scale factors in use
    pub fn factors(&self) -> &DerivedFactors {
        &self.factors
    }

    /// ADC full-scale count
    pub fn adc_resolution(&self) -> u16 {
        self.adc_resolution
    }

    /// Largest valid count
    pub fn full_scale(&self) -> u16 {
        self.adc_resolution.saturating_sub(1)
    }

    /// Battery terminal voltage for a voltage-channel count
    pub fn to_voltage(&self, raw: u16) -> f32 {
        to_voltage(raw, &self.factors)
    }

    /// Discharge current for a shunt-channel count
    pub fn to_current(&self, raw: u16) -> f32 {
        to_current(raw, &self.factors, self.shunt_resistance)
    }

    /// Count the voltage channel would report for `volts`, rounded and
    /// clamped to the converter range
    pub fn voltage_to_raw(&self, volts: f32) -> u16 {
        self.quantize(volts * self.factors.divider_factor / self.factors.volts_per_count)
    }

    /// Count the shunt channel would report for `amps`, rounded and clamped
    pub fn current_to_raw(&self, amps: f32) -> u16 {
        self.quantize(
            amps * self.shunt_resistance * self.factors.gain_factor / self.factors.volts_per_count,
        )
    }

    /// Current the fixed load draws from a cell at `volts`
    pub fn expected_load_current(&self, volts: f32) -> f32 {
        volts / (self.load_resistance + self.shunt_resistance)
    }

    fn quantize(&self, counts: f32) -> u16 {
        let counts = libm::roundf(counts);
        if !(counts > 0.0) {
            0
        } else if counts >= f32::from(self.full_scale()) {
            self.full_scale()
        } else {
            counts as u16
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn converter() -> SampleConverter {
        SampleConverter::new(&CalibrationConstants::default()).unwrap()
    }

    #[test]
    fn zero_counts_is_zero() {
        let conv = converter();
        assert_eq!(conv.to_voltage(0), 0.0);
        assert_eq!(conv.to_current(0), 0.0);
    }

    #[test]
    fn full_scale_voltage() {
        let conv = converter();
        // 1023 × 1.1/1024 / 0.23096 ≈ 4.758 V
        let volts = conv.to_voltage(1023);
        assert!((volts - 4.758).abs() < 0.01, "got {}", volts);
    }

    #[test]
    fn full_scale_current() {
        let conv = converter();
        // 1023 × 1.1/1024 / 10.078 / 0.1 ≈ 1.090 A
        let amps = conv.to_current(1023);
        assert!((amps - 1.090).abs() < 0.01, "got {}", amps);
    }

    #[test]
    fn inverse_clamps_to_range() {
        let conv = converter();
        assert_eq!(conv.voltage_to_raw(-2.0), 0);
        assert_eq!(conv.voltage_to_raw(f32::NAN), 0);
        assert_eq!(conv.voltage_to_raw(50.0), 1023);
        assert_eq!(conv.current_to_raw(10.0), 1023);
    }

    #[test]
    fn load_current_uses_load_and_shunt() {
        let conv = converter();
        // 4.1 V across 4.0 + 0.1 Ω
        assert!((conv.expected_load_current(4.1) - 1.0).abs() < 1e-6);
    }
}
