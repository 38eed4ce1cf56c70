//! Adapters from `embedded-hal` and `std` to the collaborator traits
//!
//! - [`PinGate`]: any `OutputPin` as the discharge gate
//! - [`HalClock`]: a tick counter plus any `DelayNs` as the loop clock
//! - [`StdConsole`]: stdin/stdout as the operator console (requires std)

use embedded_hal::{delay::DelayNs, digital::OutputPin};

use crate::{
    time::Timestamp,
    traits::{Clock, GateOutput, TimeSource},
};

/// Logic level that connects the load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatePolarity {
    /// Pin high turns the MOSFET on
    ActiveHigh,
    /// Pin low turns the MOSFET on (P-channel or inverting driver)
    ActiveLow,
}

/// Discharge gate driven by a HAL output pin
#[derive(Debug)]
pub struct PinGate<P> {
    pin: P,
    polarity: GatePolarity,
}

impl<P: OutputPin> PinGate<P> {
    /// Active-high gate
    pub fn new(pin: P) -> Self {
        Self::with_polarity(pin, GatePolarity::ActiveHigh)
    }

    /// Gate with explicit polarity
    pub fn with_polarity(pin: P, polarity: GatePolarity) -> Self {
        Self { pin, polarity }
    }

    /// Give the pin back
    pub fn release(self) -> P {
        self.pin
    }
}

impl<P: OutputPin> GateOutput for PinGate<P> {
    type Error = P::Error;

    fn set_gate(&mut self, active: bool) -> Result<(), Self::Error> {
        let high = match self.polarity {
            GatePolarity::ActiveHigh => active,
            GatePolarity::ActiveLow => !active,
        };

        if high {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        }
    }
}

/// Loop clock assembled from a time source and a HAL delay provider
#[derive(Debug)]
pub struct HalClock<T, D> {
    time: T,
    delay: D,
}

impl<T: TimeSource, D: DelayNs> HalClock<T, D> {
    /// Pair `time` with `delay`
    pub fn new(time: T, delay: D) -> Self {
        Self { time, delay }
    }

    /// Give both parts back
    pub fn release(self) -> (T, D) {
        (self.time, self.delay)
    }
}

impl<T: TimeSource, D: DelayNs> TimeSource for HalClock<T, D> {
    fn now(&self) -> Timestamp {
        self.time.now()
    }
}

impl<T: TimeSource, D: DelayNs> Clock for HalClock<T, D> {
    fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }

    fn delay_us(&mut self, us: u32) {
        self.delay.delay_us(us);
    }
}

#[cfg(feature = "std")]
pub use self::std_console::StdConsole;

#[cfg(feature = "std")]
mod std_console {
    use std::io::{self, BufRead, Write};

    use crate::traits::Console;

    /// Operator console on stdin/stdout
    ///
    /// An acknowledgment is any line, including an empty one.
    #[derive(Debug, Default)]
    pub struct StdConsole;

    impl Console for StdConsole {
        type Error = io::Error;

        fn emit_line(&mut self, line: &str) -> Result<(), Self::Error> {
            let mut out = io::stdout().lock();
            writeln!(out, "{}", line)?;
            out.flush()
        }

        fn await_acknowledgment(&mut self) -> Result<(), Self::Error> {
            let mut line = String::new();
            if io::stdin().lock().read_line(&mut line)? == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "console closed while waiting for acknowledgment",
                ));
            }
            Ok(())
        }
    }
}
