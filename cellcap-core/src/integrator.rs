//! Capacity Integrator
//!
//! ## Overview
//!
//! Drains the cell through the fixed load and integrates the discharge current
//! over time. Charge is the area under the current curve, approximated with
//! the trapezoidal rule over consecutive samples:
//!
//! ```text
//!           (I_prev + I_cur)[A] × (t_cur − t_prev)[ms]
//! ΔQ[mAh] = ──────────────────────────────────────────
//!                            7200
//! ```
//!
//! `A·ms` equals `mA·s`; halving for the trapezoid average and dividing by
//! 3600 s/h yields mAh. The rule is exact for constant and linearly varying
//! current, so its error only comes from curvature of the discharge curve
//! between samples. Keep the sample period short relative to that.
//!
//! ## Discharge Protocol
//!
//! ```text
//! gate on → settle → t₀, I₀
//! loop:
//!     wait sample period
//!     V ← sample;  V < cut-off ? stop
//!     wait channel gap
//!     I ← sample;  t ← now
//!     Q += trapezoid(t_prev, I_prev, t, I)
//!     every N additions: progress line
//! gate off → final line → wait for operator
//! ```
//!
//! The voltage is compared before the addition, so a run whose voltage stays
//! above the floor for `n` samples performs exactly `n` additions. The gate is
//! turned off on every exit path, including collaborator errors. A run cut
//! short by an error still prints the capacity measured up to that point.
//! A progress line that does not fit the line buffer is skipped, never fatal.
//!
//! ## Accuracy Notes
//!
//! - The accumulator is `f64`; a multi-hour run adds tens of thousands of
//!   small increments and `f32` would visibly drift.
//! - A current reading that converts to something negative or not finite is
//!   clamped to zero and logged. With a well-formed converter this cannot
//!   happen, the clamp only guards custom collaborators.

use crate::{
    bench::Bench,
    checker::BatteryThresholds,
    config::DischargeTiming,
    constants::time::TRAPEZOID_MAH_DIVISOR,
    converter::SampleConverter,
    errors::TesterResult,
    report,
    time::Timestamp,
    traits::{AnalogInput, Clock, Console, GateOutput},
};

/// Left edge of the next trapezoid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrapezoidState {
    /// Timestamp of the previous sample (ms)
    pub timestamp: Timestamp,
    /// Current of the previous sample (A)
    pub current: f32,
}

/// Online trapezoidal integrator of current over time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapacityAccumulator {
    origin: Timestamp,
    edge: TrapezoidState,
    capacity_mah: f64,
    steps: u32,
}

impl CapacityAccumulator {
    /// Begin integrating from an initial sample, capacity zero
    pub fn start(timestamp: Timestamp, current: f32) -> Self {
        Self {
            origin: timestamp,
            edge: TrapezoidState { timestamp, current },
            capacity_mah: 0.0,
            steps: 0,
        }
    }

    /// Add the trapezoid between the previous sample and this one, then slide
    /// the edge forward. Returns the increment in mAh.
    ///
    /// A timestamp earlier than the previous one contributes nothing.
    pub fn add_sample(&mut self, timestamp: Timestamp, current: f32) -> f64 {
        let dt_ms = timestamp.saturating_sub(self.edge.timestamp);
        let increment = (f64::from(self.edge.current) + f64::from(current)) * dt_ms as f64
            / TRAPEZOID_MAH_DIVISOR;

        self.capacity_mah += increment;
        self.steps += 1;
        self.edge = TrapezoidState { timestamp, current };

        increment
    }

    /// Accumulated capacity (mAh)
    pub fn capacity_mah(&self) -> f64 {
        self.capacity_mah
    }

    /// Number of trapezoids added
    pub fn steps(&self) -> u32 {
        self.steps
    }

    /// Current left edge
    pub fn edge(&self) -> &TrapezoidState {
        &self.edge
    }

    /// Time covered since the initial sample (ms)
    pub fn elapsed_ms(&self) -> u64 {
        self.edge.timestamp.saturating_sub(self.origin)
    }
}

/// Outcome of one completed discharge
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DischargeReport {
    /// Delivered charge (mAh)
    pub capacity_mah: f64,
    /// Trapezoid additions performed
    pub steps: u32,
    /// Time integrated over (ms)
    pub duration_ms: u64,
    /// Voltage that ended the run (V)
    pub final_voltage: f32,
}

/// Runs a discharge against the bench
#[derive(Debug, Clone, Copy)]
pub struct CapacityIntegrator {
    cutoff: f32,
    timing: DischargeTiming,
}

impl CapacityIntegrator {
    /// Integrator stopping below `thresholds.cutoff`, paced by `timing`
    pub fn new(thresholds: &BatteryThresholds, timing: DischargeTiming) -> Self {
        Self {
            cutoff: thresholds.cutoff,
            timing,
        }
    }

    /// Discharge the cell to the cut-off and report the delivered capacity
    ///
    /// Blocks for the whole discharge and then for the operator's
    /// acknowledgment of the result. There is no cancellation.
    pub fn run<A, G, C, K>(
        &self,
        bench: &mut Bench<A, G, C, K>,
        converter: &SampleConverter,
    ) -> TesterResult<DischargeReport>
    where
        A: AnalogInput,
        G: GateOutput,
        C: Console,
        K: Clock,
    {
        bench.say("Starting capacity count!")?;
        log_info!("discharge started, cut-off {} V", self.cutoff);

        let mut progress = None;
        let outcome = self.discharge(bench, converter, &mut progress);

        // Never leave the load connected, whatever happened in the loop
        let released = bench.gate_off();
        let report = match outcome.and_then(|report| released.map(|()| report)) {
            Ok(report) => report,
            Err(err) => {
                if let Some(partial) = progress {
                    Self::report_interrupted(bench, &partial);
                }
                return Err(err);
            }
        };

        log_info!(
            "discharge finished: {} mAh over {} ms in {} steps",
            report.capacity_mah,
            report.duration_ms,
            report.steps
        );

        bench.say(&report::completion_line(report.capacity_mah)?)?;
        bench.say("Press enter to continue.")?;
        bench.acknowledge()?;

        Ok(report)
    }

    fn discharge<A, G, C, K>(
        &self,
        bench: &mut Bench<A, G, C, K>,
        converter: &SampleConverter,
        progress: &mut Option<CapacityAccumulator>,
    ) -> TesterResult<DischargeReport>
    where
        A: AnalogInput,
        G: GateOutput,
        C: Console,
        K: Clock,
    {
        bench.gate_on()?;
        bench.clock.delay_ms(self.timing.settle_ms);

        let initial = plausible_current(bench.read_current(converter)?);
        let accumulator =
            progress.insert(CapacityAccumulator::start(bench.clock.now(), initial));

        let final_voltage = loop {
            bench.clock.delay_ms(self.timing.sample_period_ms);

            let voltage = bench.read_voltage(converter)?;
            if voltage < self.cutoff {
                break voltage;
            }

            bench.clock.delay_us(self.timing.channel_gap_us);
            let current = plausible_current(bench.read_current(converter)?);
            let increment = accumulator.add_sample(bench.clock.now(), current);
            log_debug!("step {}: +{} mAh", accumulator.steps(), increment);

            if accumulator.steps() % self.timing.report_every.max(1) == 0 {
                match report::progress_line(voltage, current, accumulator.capacity_mah()) {
                    Ok(line) => bench.say(&line)?,
                    Err(_) => {
                        log_warn!(
                            "progress line at step {} overflowed, skipped",
                            accumulator.steps()
                        );
                    }
                }
            }
        };

        Ok(DischargeReport {
            capacity_mah: accumulator.capacity_mah(),
            steps: accumulator.steps(),
            duration_ms: accumulator.elapsed_ms(),
            final_voltage,
        })
    }

    /// Best effort: the console may be the collaborator that failed
    fn report_interrupted<A, G, C, K>(
        bench: &mut Bench<A, G, C, K>,
        partial: &CapacityAccumulator,
    ) where
        A: AnalogInput,
        G: GateOutput,
        C: Console,
        K: Clock,
    {
        log_warn!(
            "discharge interrupted after {} steps, {} mAh measured",
            partial.steps(),
            partial.capacity_mah()
        );
        if let Ok(line) = report::interrupted_line(partial.capacity_mah()) {
            let _ = bench.say(&line);
        }
    }
}

fn plausible_current(current: f32) -> f32 {
    if current.is_finite() && current >= 0.0 {
        current
    } else {
        log_warn!("implausible current reading {} A, clamping to 0", current);
        0.0
    }
}
