//! Bench: the four collaborators in one place
//!
//! `Bench` owns the analog input, the gate, the console and the clock. The
//! checker and the integrator borrow it mutably for the duration of a step, so
//! there is no ambient state anywhere in the crate.
//!
//! Collaborator errors are logged with their full `Debug` detail, then folded
//! into the small `Copy` [`TesterError`] the control loop passes around.

use crate::{
    config::AcquisitionSettings,
    converter::SampleConverter,
    errors::{TesterError, TesterResult},
    traits::{AnalogInput, Channel, Clock, Console, GateOutput},
};

/// Hardware collaborators of one tester
pub struct Bench<A, G, C, K> {
    /// Analog input
    pub adc: A,
    /// Discharge gate
    pub gate: G,
    /// Operator console
    pub console: C,
    /// Time source and delays
    pub clock: K,
    acquisition: AcquisitionSettings,
}

impl<A, G, C, K> Bench<A, G, C, K>
where
    A: AnalogInput,
    G: GateOutput,
    C: Console,
    K: Clock,
{
    /// Bundle the collaborators, single conversion per reading until a
    /// tester applies its configured acquisition settings
    pub fn new(adc: A, gate: G, console: C, clock: K) -> Self {
        Self {
            adc,
            gate,
            console,
            clock,
            acquisition: AcquisitionSettings::default(),
        }
    }

    /// Current acquisition settings, taken from the tester configuration
    pub fn acquisition(&self) -> AcquisitionSettings {
        self.acquisition
    }

    pub(crate) fn set_acquisition(&mut self, acquisition: AcquisitionSettings) {
        self.acquisition = acquisition;
    }

    /// Split back into the collaborators
    pub fn release(self) -> (A, G, C, K) {
        (self.adc, self.gate, self.console, self.clock)
    }

    /// Block for one conversion on `channel`
    pub fn read_raw(&mut self, channel: Channel) -> TesterResult<u16> {
        nb::block!(self.adc.read_raw(channel)).map_err(|err| {
            log_warn!("ADC read on {:?} failed: {:?}", channel, err);
            TesterError::Acquisition { channel }
        })
    }

    /// One reading on `channel`: averaged over the oversampling count and
    /// clamped to `full_scale`
    pub fn sample(&mut self, channel: Channel, full_scale: u16) -> TesterResult<u16> {
        let count = self.acquisition.oversampling.max(1);
        let mut total: u32 = 0;

        for _ in 0..count {
            let raw = self.read_raw(channel)?;
            let raw = if raw > full_scale {
                log_warn!(
                    "{:?} read {} counts above full scale {}, clamping",
                    channel,
                    raw,
                    full_scale
                );
                full_scale
            } else {
                raw
            };
            total += u32::from(raw);
        }

        // Rounded mean of values that are all <= full_scale
        let count = u32::from(count);
        Ok(((total + count / 2) / count) as u16)
    }

    /// Battery terminal voltage (V)
    pub fn read_voltage(&mut self, converter: &SampleConverter) -> TesterResult<f32> {
        let raw = self.sample(Channel::BatteryVoltage, converter.full_scale())?;
        Ok(converter.to_voltage(raw))
    }

    /// Discharge current (A)
    pub fn read_current(&mut self, converter: &SampleConverter) -> TesterResult<f32> {
        let raw = self.sample(Channel::ShuntCurrent, converter.full_scale())?;
        Ok(converter.to_current(raw))
    }

    /// Connect the load
    pub fn gate_on(&mut self) -> TesterResult<()> {
        self.drive_gate(true)
    }

    /// Disconnect the load
    pub fn gate_off(&mut self) -> TesterResult<()> {
        self.drive_gate(false)
    }

    fn drive_gate(&mut self, active: bool) -> TesterResult<()> {
        self.gate.set_gate(active).map_err(|err| {
            log_warn!("gate drive to {} failed: {:?}", active, err);
            TesterError::Gate
        })
    }

    /// Print one status line
    pub fn say(&mut self, line: &str) -> TesterResult<()> {
        log_debug!("console: {}", line);
        self.console.emit_line(line).map_err(|err| {
            log_warn!("console write failed: {:?}", err);
            TesterError::Console
        })
    }

    /// Block until the operator continues
    pub fn acknowledge(&mut self) -> TesterResult<()> {
        self.console.await_acknowledgment().map_err(|err| {
            log_warn!("console read failed: {:?}", err);
            TesterError::Console
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::SimulatedClock;
    use core::convert::Infallible;

    struct QueueAdc {
        values: [u16; 4],
        next: usize,
        busy: bool,
    }

    impl AnalogInput for QueueAdc {
        type Error = Infallible;

        fn read_raw(&mut self, _channel: Channel) -> nb::Result<u16, Self::Error> {
            // Every other poll reports a conversion in flight
            self.busy = !self.busy;
            if self.busy {
                return Err(nb::Error::WouldBlock);
            }
            let value = self.values[self.next % self.values.len()];
            self.next += 1;
            Ok(value)
        }
    }

    struct NullGate;

    impl GateOutput for NullGate {
        type Error = Infallible;

        fn set_gate(&mut self, _active: bool) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    struct NullConsole;

    impl Console for NullConsole {
        type Error = Infallible;

        fn emit_line(&mut self, _line: &str) -> Result<(), Self::Error> {
            Ok(())
        }

        fn await_acknowledgment(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    fn bench(values: [u16; 4]) -> Bench<QueueAdc, NullGate, NullConsole, SimulatedClock> {
        let adc = QueueAdc {
            values,
            next: 0,
            busy: false,
        };
        Bench::new(adc, NullGate, NullConsole, SimulatedClock::new(0))
    }

    #[test]
    fn blocks_through_would_block() {
        let mut bench = bench([700, 0, 0, 0]);
        assert_eq!(bench.read_raw(Channel::BatteryVoltage), Ok(700));
    }

    #[test]
    fn clamps_above_full_scale() {
        let mut bench = bench([5000, 0, 0, 0]);
        assert_eq!(bench.sample(Channel::ShuntCurrent, 1023), Ok(1023));
    }

    #[test]
    fn oversampling_averages() {
        let mut bench = bench([100, 101, 102, 103]);
        bench.set_acquisition(AcquisitionSettings { oversampling: 4 });
        // (406 + 2) / 4
        assert_eq!(bench.sample(Channel::BatteryVoltage, 1023), Ok(102));
    }
}
