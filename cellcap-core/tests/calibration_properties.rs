//! Property tests for the calibration model and the sample converter,
//! plus reference self-calibration against a scripted ADC

#[macro_use]
mod common;

use cellcap_core::{
    CalibrationConstants, CalibrationError, CapacityTester, ReferenceCalibrator, SampleConverter,
    TesterConfig, TesterError,
};
use proptest::prelude::*;

use common::{bench, new_trace, ScriptedAdc};

fn resistance() -> impl Strategy<Value = f32> {
    1.0f32..100_000.0
}

fn correction() -> impl Strategy<Value = f32> {
    0.9f32..1.1
}

prop_compose! {
    fn valid_constants()(
        reference_voltage in 0.5f32..5.0,
        adc_resolution in prop::sample::select(vec![256u16, 1024, 4096]),
        shunt_resistance in 0.01f32..1.0,
        load_resistance in 0.5f32..20.0,
        divider_high in resistance(),
        divider_low in resistance(),
        gain_resistors in [resistance(), resistance(), resistance(), resistance()],
        divider_correction in correction(),
        gain_correction in correction(),
    ) -> CalibrationConstants {
        CalibrationConstants {
            reference_voltage,
            adc_resolution,
            shunt_resistance,
            load_resistance,
            divider_high,
            divider_low,
            gain_resistors,
            divider_correction,
            gain_correction,
        }
    }
}

proptest! {
    #[test]
    fn factors_strictly_positive(constants in valid_constants()) {
        let factors = constants.derive().unwrap();
        prop_assert!(factors.volts_per_count > 0.0);
        prop_assert!(factors.divider_factor > 0.0);
        prop_assert!(factors.gain_factor > 0.0);
    }

    #[test]
    fn conversions_increase_with_counts(constants in valid_constants(), raw in 0u16..255) {
        let conv = SampleConverter::new(&constants).unwrap();
        prop_assert!(conv.to_voltage(raw + 1) > conv.to_voltage(raw));
        prop_assert!(conv.to_current(raw + 1) > conv.to_current(raw));
    }

    #[test]
    fn voltage_round_trip_within_one_count(constants in valid_constants(), fraction in 0.0f32..1.0) {
        let conv = SampleConverter::new(&constants).unwrap();
        let full_scale_volts = conv.to_voltage(conv.full_scale());
        let volts = fraction * full_scale_volts;

        let raw = conv.voltage_to_raw(volts);
        let one_count = conv.to_voltage(1);

        prop_assert!(
            (conv.to_voltage(raw) - volts).abs() <= one_count,
            "{} V -> {} counts -> {} V", volts, raw, conv.to_voltage(raw)
        );
    }

    #[test]
    fn non_positive_resistance_rejected(constants in valid_constants(), bad in -10.0f32..=0.0) {
        let constants = constants.with_shunt_resistance(bad);
        let rejected = matches!(
            constants.derive(),
            Err(CalibrationError::NonPositive { parameter: "shunt_resistance", .. })
        );
        prop_assert!(rejected);
    }
}

#[test]
fn reference_estimated_from_known_signal() {
    // 0.55 V reading as 512 counts on a 10-bit converter means V_ref = 1.1 V
    let adc = ScriptedAdc::new(new_trace()).references([510, 514, 512, 511, 513, 512, 512, 512, 512, 512]);
    let mut bench = bench(adc);

    let reference = ReferenceCalibrator::default()
        .estimate(&mut bench, 0.55, 1024)
        .unwrap();

    assert_within_tolerance!(reference, 1.1, 1e-6);
    // Ten samples spaced by 100 µs
    assert_eq!(bench.clock.micros(), 1_000);
}

#[test]
fn reference_reads_clamped_to_full_scale() {
    let adc = ScriptedAdc::new(new_trace()).references([5000]);
    let mut bench = bench(adc);

    let reference = ReferenceCalibrator::default()
        .estimate(&mut bench, 0.55, 1024)
        .unwrap();

    // Every read clamps to 1023 counts: 0.55 × 1024 / 1023
    assert_within_tolerance!(reference, 0.550_537_6, 1e-6);
}

#[test]
fn dead_reference_channel_reported() {
    let adc = ScriptedAdc::new(new_trace()).references([0]);
    let mut bench = bench(adc);

    let result = ReferenceCalibrator::default().estimate(&mut bench, 0.55, 1024);

    assert_eq!(result, Err(TesterError::Calibration(CalibrationError::NoSignal)));
}

#[test]
fn tester_adopts_calibrated_reference() {
    let adc = ScriptedAdc::new(new_trace()).references([540]);
    let mut tester = CapacityTester::new(bench(adc), TesterConfig::default()).unwrap();

    let before = tester.converter().to_voltage(800);
    let reference = tester.calibrate_reference(0.55).unwrap();

    // 0.55 × 1024 / 540
    assert_within_tolerance!(reference, 1.042_963, 1e-5);
    assert_eq!(tester.config().calibration.reference_voltage, reference);
    assert!(tester.converter().to_voltage(800) < before);
}

#[test]
fn config_loads_from_partial_json() {
    let json = r#"{
        "calibration": { "reference_voltage": 1.084, "divider_correction": 1.0012 },
        "timing": { "sample_period_ms": 250 }
    }"#;

    let config: TesterConfig = serde_json::from_str(json).unwrap();

    assert_eq!(config.calibration.reference_voltage, 1.084);
    assert_eq!(config.calibration.divider_correction, 1.0012);
    assert_eq!(config.calibration.adc_resolution, 1024);
    assert_eq!(config.timing.sample_period_ms, 250);
    assert_eq!(config.timing.settle_ms, 10);
    assert!(config.validate().is_ok());

    let text = serde_json::to_string(&config).unwrap();
    let back: TesterConfig = serde_json::from_str(&text).unwrap();
    assert_eq!(back, config);
}
