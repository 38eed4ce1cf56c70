//! Supervised test cycle
//!
//! `CapacityTester` ties the pieces together: it owns the bench and the
//! validated configuration, runs the precondition check and hands off to the
//! integrator when the cell is ready.
//!
//! ```text
//!          ┌──────────── ack ────────────┐
//!          ▼                             │
//!   idle → check ──Inverted/Undercharged─┘
//!            │
//!            └─Ready → ack → discharge → ack → (next cycle)
//! ```
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use cellcap_core::{
//!     AnalogInput, Bench, CapacityTester, Clock, Console, GateOutput, TesterConfig, TesterError,
//! };
//!
//! fn supervise<A, G, C, K>(bench: Bench<A, G, C, K>) -> Result<(), TesterError>
//! where
//!     A: AnalogInput,
//!     G: GateOutput,
//!     C: Console,
//!     K: Clock,
//! {
//!     let mut tester = CapacityTester::new(bench, TesterConfig::default())?;
//!
//!     // Forever, or until a collaborator fails
//!     match tester.run()? {}
//! }
//! ```

use core::convert::Infallible;

use crate::{
    bench::Bench,
    calibration::ReferenceCalibrator,
    checker::{BatteryState, PreconditionChecker},
    config::TesterConfig,
    converter::SampleConverter,
    errors::TesterResult,
    integrator::{CapacityIntegrator, DischargeReport},
    traits::{AnalogInput, Clock, Console, GateOutput},
};

/// Result of one precondition check
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CheckOutcome {
    /// Classification of the resting voltage
    pub state: BatteryState,
    /// Resting voltage the classification was made from (V)
    pub voltage: f32,
    /// Discharge result, present only when the cell was Ready
    pub discharge: Option<DischargeReport>,
}

/// Complete capacity tester
pub struct CapacityTester<A, G, C, K> {
    bench: Bench<A, G, C, K>,
    config: TesterConfig,
    converter: SampleConverter,
    checker: PreconditionChecker,
    integrator: CapacityIntegrator,
}

impl<A, G, C, K> CapacityTester<A, G, C, K>
where
    A: AnalogInput,
    G: GateOutput,
    C: Console,
    K: Clock,
{
    /// Validate `config`, derive the scale factors and take the bench
    pub fn new(mut bench: Bench<A, G, C, K>, config: TesterConfig) -> TesterResult<Self> {
        config.validate()?;
        bench.set_acquisition(config.acquisition);

        Ok(Self {
            bench,
            converter: SampleConverter::new(&config.calibration)?,
            checker: PreconditionChecker::new(config.thresholds),
            integrator: CapacityIntegrator::new(&config.thresholds, config.timing),
            config,
        })
    }

    /// Configuration in use
    pub fn config(&self) -> &TesterConfig {
        &self.config
    }

    /// Converter in use
    pub fn converter(&self) -> &SampleConverter {
        &self.converter
    }

    /// Borrow the bench
    pub fn bench(&mut self) -> &mut Bench<A, G, C, K> {
        &mut self.bench
    }

    /// Give the bench back
    pub fn into_bench(self) -> Bench<A, G, C, K> {
        self.bench
    }

    /// One precondition step; discharges when the cell is Ready
    pub fn check(&mut self) -> TesterResult<CheckOutcome> {
        let (state, voltage) = self.checker.check(&mut self.bench, &self.converter)?;

        let discharge = match state {
            BatteryState::Ready => Some(self.integrator.run(&mut self.bench, &self.converter)?),
            BatteryState::Inverted | BatteryState::Undercharged => None,
        };

        Ok(CheckOutcome {
            state,
            voltage,
            discharge,
        })
    }

    /// Idle for the cycle delay, then check
    pub fn run_cycle(&mut self) -> TesterResult<CheckOutcome> {
        self.bench.clock.delay_ms(self.config.timing.cycle_delay_ms);
        self.check()
    }

    /// Run supervised cycles until a collaborator fails
    pub fn run(&mut self) -> TesterResult<Infallible> {
        loop {
            self.run_cycle()?;
        }
    }

    /// Measure the real ADC reference against `known_signal` volts on the
    /// reference channel and rebuild the scale factors from it
    ///
    /// Returns the new reference voltage. The previous factors are kept if
    /// the measurement fails.
    pub fn calibrate_reference(&mut self, known_signal: f32) -> TesterResult<f32> {
        let reference = ReferenceCalibrator::default().estimate(
            &mut self.bench,
            known_signal,
            self.config.calibration.adc_resolution,
        )?;

        let calibration = self.config.calibration.with_reference_voltage(reference);
        self.converter = SampleConverter::new(&calibration)?;
        self.config.calibration = calibration;

        Ok(reference)
    }
}
