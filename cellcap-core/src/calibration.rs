//! Calibration Model
//!
//! ## Overview
//!
//! Every physical quantity the tester reports is a raw ADC count scaled by two
//! dimensionless factors derived from the circuit:
//!
//! ```text
//! volts_per_count = V_ref / resolution
//!
//! divider_factor  = R_low / (R_high + R_low) × BK
//!
//! gain_factor     = R4 / (R2 + R4) × (R1 + R3) / R1 × GK
//! ```
//!
//! `BK` and `GK` absorb resistor tolerance and amplifier offset. They cannot be
//! computed from the schematic and must be measured on each physical unit,
//! which is why they are ordinary configurable constants and not hardcoded.
//!
//! ## Reference Self-Calibration
//!
//! The internal reference of a cheap MCU can be several percent off its
//! nominal value. [`ReferenceCalibrator`] recovers the real figure by averaging
//! a known, precise signal on a spare channel:
//!
//! ```text
//! V_ref = V_known × resolution / mean(counts)
//! ```
//!
//! ## Usage Example
//!
//! ```rust
//! use cellcap_core::CalibrationConstants;
//!
//! let factors = CalibrationConstants::default()
//!     .with_reference_voltage(1.085)
//!     .with_corrections(1.0008, 1.0078)
//!     .derive()?;
//!
//! assert!(factors.divider_factor > 0.0);
//! assert!(factors.gain_factor > 0.0);
//! # Ok::<(), cellcap_core::CalibrationError>(())
//! ```

use crate::{
    bench::Bench,
    constants::circuit::{
        ADC_RESOLUTION_COUNTS, DIVIDER_CORRECTION, DIVIDER_HIGH_OHM, DIVIDER_LOW_OHM,
        GAIN_CORRECTION, GAIN_R1_OHM, GAIN_R2_OHM, GAIN_R3_OHM, GAIN_R4_OHM,
        LOAD_RESISTANCE_OHM, REFERENCE_SAMPLES, REFERENCE_SAMPLE_SPACING_US,
        REFERENCE_VOLTAGE_V, SHUNT_RESISTANCE_OHM,
    },
    errors::{CalibrationError, CalibrationResult, TesterResult},
    traits::{AnalogInput, Channel, Clock, Console, GateOutput},
};

/// Fixed physical and circuit constants of one tester
///
/// Set once at configuration time and never mutated during a run.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CalibrationConstants {
    /// ADC reference voltage (V)
    pub reference_voltage: f32,
    /// ADC full-scale count
    pub adc_resolution: u16,
    /// Current-sense shunt (Ω)
    pub shunt_resistance: f32,
    /// Fixed discharge load (Ω)
    pub load_resistance: f32,
    /// Divider resistor on the battery side (Ω)
    pub divider_high: f32,
    /// Divider resistor on the ground side (Ω)
    pub divider_low: f32,
    /// Amplifier resistors R1..R4 (Ω)
    pub gain_resistors: [f32; 4],
    /// Empirical divider correction (BK)
    pub divider_correction: f32,
    /// Empirical amplifier correction (GK)
    pub gain_correction: f32,
}

impl Default for CalibrationConstants {
    fn default() -> Self {
        Self {
            reference_voltage: REFERENCE_VOLTAGE_V,
            adc_resolution: ADC_RESOLUTION_COUNTS,
            shunt_resistance: SHUNT_RESISTANCE_OHM,
            load_resistance: LOAD_RESISTANCE_OHM,
            divider_high: DIVIDER_HIGH_OHM,
            divider_low: DIVIDER_LOW_OHM,
            gain_resistors: [GAIN_R1_OHM, GAIN_R2_OHM, GAIN_R3_OHM, GAIN_R4_OHM],
            divider_correction: DIVIDER_CORRECTION,
            gain_correction: GAIN_CORRECTION,
        }
    }
}

impl CalibrationConstants {
    /// Replace the ADC reference voltage, e.g. with a self-calibrated value
    pub fn with_reference_voltage(mut self, volts: f32) -> Self {
        self.reference_voltage = volts;
        self
    }

    /// Replace the ADC full-scale count
    pub fn with_adc_resolution(mut self, counts: u16) -> Self {
        self.adc_resolution = counts;
        self
    }

    /// Replace the shunt resistance
    pub fn with_shunt_resistance(mut self, ohms: f32) -> Self {
        self.shunt_resistance = ohms;
        self
    }

    /// Replace the load resistance
    pub fn with_load_resistance(mut self, ohms: f32) -> Self {
        self.load_resistance = ohms;
        self
    }

    /// Replace the divider pair
    pub fn with_divider(mut self, high_ohms: f32, low_ohms: f32) -> Self {
        self.divider_high = high_ohms;
        self.divider_low = low_ohms;
        self
    }

    /// Replace the amplifier resistors R1..R4
    pub fn with_gain_resistors(mut self, resistors: [f32; 4]) -> Self {
        self.gain_resistors = resistors;
        self
    }

    /// Replace the empirical BK / GK corrections
    pub fn with_corrections(mut self, divider: f32, gain: f32) -> Self {
        self.divider_correction = divider;
        self.gain_correction = gain;
        self
    }

    /// Reject constants that would make the scale factors meaningless
    pub fn validate(&self) -> CalibrationResult<()> {
        if self.adc_resolution == 0 {
            return Err(CalibrationError::ZeroResolution);
        }

        let [r1, r2, r3, r4] = self.gain_resistors;
        let checks = [
            ("reference_voltage", self.reference_voltage),
            ("shunt_resistance", self.shunt_resistance),
            ("load_resistance", self.load_resistance),
            ("divider_high", self.divider_high),
            ("divider_low", self.divider_low),
            ("gain_r1", r1),
            ("gain_r2", r2),
            ("gain_r3", r3),
            ("gain_r4", r4),
            ("divider_correction", self.divider_correction),
            ("gain_correction", self.gain_correction),
        ];

        for (parameter, value) in checks {
            positive(parameter, value)?;
        }

        Ok(())
    }

    /// Validate and compute the scale factors
    pub fn derive(&self) -> CalibrationResult<DerivedFactors> {
        self.validate()?;

        let [r1, r2, r3, r4] = self.gain_resistors;

        Ok(DerivedFactors {
            volts_per_count: self.reference_voltage / f32::from(self.adc_resolution),
            divider_factor: self.divider_low / (self.divider_high + self.divider_low)
                * self.divider_correction,
            gain_factor: (r4 / (r2 + r4)) * ((r1 + r3) / r1) * self.gain_correction,
        })
    }
}

fn positive(parameter: &'static str, value: f32) -> CalibrationResult<()> {
    // NaN fails the comparison too
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(CalibrationError::NonPositive { parameter, value })
    }
}

/// Scale factors computed once from [`CalibrationConstants`]
///
/// Both factors are dimensionless and strictly positive for valid constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedFactors {
    /// Volts represented by one ADC count
    pub volts_per_count: f32,
    /// Fraction of battery voltage seen at the sense node
    pub divider_factor: f32,
    /// Shunt amplifier voltage gain
    pub gain_factor: f32,
}

/// Measures the real ADC reference against a known signal
#[derive(Debug, Clone, Copy)]
pub struct ReferenceCalibrator {
    /// Number of raw samples to average
    pub samples: u8,
    /// Delay between samples (µs)
    pub spacing_us: u32,
}

impl Default for ReferenceCalibrator {
    fn default() -> Self {
        Self {
            samples: REFERENCE_SAMPLES,
            spacing_us: REFERENCE_SAMPLE_SPACING_US,
        }
    }
}

impl ReferenceCalibrator {
    /// Estimate the reference voltage from `known_signal` volts applied to
    /// [`Channel::Reference`]
    pub fn estimate<A, G, C, K>(
        &self,
        bench: &mut Bench<A, G, C, K>,
        known_signal: f32,
        adc_resolution: u16,
    ) -> TesterResult<f32>
    where
        A: AnalogInput,
        G: GateOutput,
        C: Console,
        K: Clock,
    {
        positive("known_signal", known_signal)?;
        if adc_resolution == 0 {
            return Err(CalibrationError::ZeroResolution.into());
        }

        let full_scale = adc_resolution - 1;
        let samples = self.samples.max(1);
        let mut total: u32 = 0;
        for _ in 0..samples {
            total += u32::from(bench.sample(Channel::Reference, full_scale)?);
            bench.clock.delay_us(self.spacing_us);
        }

        let mean = total as f32 / f32::from(samples);
        if mean <= 0.0 {
            return Err(CalibrationError::NoSignal.into());
        }

        let reference = known_signal * f32::from(adc_resolution) / mean;
        log_info!("reference estimated at {} V from mean {} counts", reference, mean);
        Ok(reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_factors_match_bench() {
        let factors = CalibrationConstants::default().derive().unwrap();

        assert!((factors.volts_per_count - 1.1 / 1024.0).abs() < 1e-9);
        // 3k / 13k × BK
        assert!((factors.divider_factor - 0.230_957_8).abs() < 1e-5);
        // 10k/11k × 11k/1k = 10, times GK
        assert!((factors.gain_factor - 10.078_148).abs() < 1e-4);
    }

    #[test]
    fn rejects_zero_resolution() {
        let constants = CalibrationConstants::default().with_adc_resolution(0);
        assert_eq!(constants.derive(), Err(CalibrationError::ZeroResolution));
    }

    #[test]
    fn rejects_non_positive_resistance() {
        let constants = CalibrationConstants::default().with_divider(10_000.0, -1.0);
        assert!(matches!(
            constants.derive(),
            Err(CalibrationError::NonPositive { parameter: "divider_low", .. })
        ));

        let constants = CalibrationConstants::default().with_gain_resistors([1_000.0, 0.0, 1.0, 1.0]);
        assert!(matches!(
            constants.validate(),
            Err(CalibrationError::NonPositive { parameter: "gain_r2", .. })
        ));
    }

    #[test]
    fn rejects_nan_corrections() {
        let constants = CalibrationConstants::default().with_corrections(f32::NAN, 1.0);
        assert!(constants.validate().is_err());
    }
}
