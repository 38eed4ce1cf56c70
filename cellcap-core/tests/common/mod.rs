//! Scripted collaborators for integration tests
//!
//! Provides:
//! - `ScriptedAdc`: per-channel queues of raw counts, optional fault injection
//! - `TraceGate` / `TraceConsole`: record into a shared, ordered trace
//! - `TraceClock`: a simulated clock that records every delay
//! - `bench()`: a ready-made bench on that clock
//!
//! The trace interleaves reads, gate changes, delays, console lines and
//! acknowledgments so tests can assert on ordering and on the time spent
//! between two events.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use cellcap_core::{
    time::{SimulatedClock, Timestamp},
    AnalogInput, Bench, Channel, Clock, Console, GateOutput, SampleConverter, TimeSource,
};

/// Something a collaborator did
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Read(Channel),
    Gate(bool),
    /// Blocking delay in microseconds
    Delay(u64),
    Line(String),
    Ack,
}

/// Shared ordered record of collaborator activity
pub type Trace = Rc<RefCell<Vec<Event>>>;

/// Fault reported by the scripted ADC
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdcFault;

/// ADC that replays scripted counts per channel
///
/// An exhausted queue keeps returning its last value; an empty one returns 0.
pub struct ScriptedAdc {
    voltage: VecDeque<u16>,
    current: VecDeque<u16>,
    reference: VecDeque<u16>,
    last: [u16; 3],
    fail_after: Option<usize>,
    reads: usize,
    trace: Trace,
}

impl ScriptedAdc {
    pub fn new(trace: Trace) -> Self {
        Self {
            voltage: VecDeque::new(),
            current: VecDeque::new(),
            reference: VecDeque::new(),
            last: [0; 3],
            fail_after: None,
            reads: 0,
            trace,
        }
    }

    pub fn voltages(mut self, counts: impl IntoIterator<Item = u16>) -> Self {
        self.voltage.extend(counts);
        self
    }

    pub fn currents(mut self, counts: impl IntoIterator<Item = u16>) -> Self {
        self.current.extend(counts);
        self
    }

    pub fn references(mut self, counts: impl IntoIterator<Item = u16>) -> Self {
        self.reference.extend(counts);
        self
    }

    /// Fail every read after the first `reads` successful ones
    pub fn fail_after(mut self, reads: usize) -> Self {
        self.fail_after = Some(reads);
        self
    }

    fn slot(channel: Channel) -> usize {
        match channel {
            Channel::BatteryVoltage => 0,
            Channel::ShuntCurrent => 1,
            Channel::Reference => 2,
        }
    }
}

impl AnalogInput for ScriptedAdc {
    type Error = AdcFault;

    fn read_raw(&mut self, channel: Channel) -> nb::Result<u16, Self::Error> {
        if let Some(limit) = self.fail_after {
            if self.reads >= limit {
                return Err(nb::Error::Other(AdcFault));
            }
        }
        self.reads += 1;
        self.trace.borrow_mut().push(Event::Read(channel));

        let queue = match channel {
            Channel::BatteryVoltage => &mut self.voltage,
            Channel::ShuntCurrent => &mut self.current,
            Channel::Reference => &mut self.reference,
        };
        let slot = Self::slot(channel);
        if let Some(value) = queue.pop_front() {
            self.last[slot] = value;
        }
        Ok(self.last[slot])
    }
}

/// Gate that records every level change
pub struct TraceGate {
    pub active: Option<bool>,
    trace: Trace,
}

impl GateOutput for TraceGate {
    type Error = core::convert::Infallible;

    fn set_gate(&mut self, active: bool) -> Result<(), Self::Error> {
        self.active = Some(active);
        self.trace.borrow_mut().push(Event::Gate(active));
        Ok(())
    }
}

/// Console that records lines and acknowledges immediately
pub struct TraceConsole {
    trace: Trace,
}

impl Console for TraceConsole {
    type Error = core::convert::Infallible;

    fn emit_line(&mut self, line: &str) -> Result<(), Self::Error> {
        self.trace.borrow_mut().push(Event::Line(line.to_string()));
        Ok(())
    }

    fn await_acknowledgment(&mut self) -> Result<(), Self::Error> {
        self.trace.borrow_mut().push(Event::Ack);
        Ok(())
    }
}

/// Simulated clock that records every delay
pub struct TraceClock {
    inner: SimulatedClock,
    trace: Trace,
}

impl TraceClock {
    /// Elapsed virtual time in microseconds
    pub fn micros(&self) -> u64 {
        self.inner.micros()
    }
}

impl TimeSource for TraceClock {
    fn now(&self) -> Timestamp {
        self.inner.now()
    }
}

impl Clock for TraceClock {
    fn delay_ms(&mut self, ms: u32) {
        self.inner.delay_ms(ms);
        self.trace.borrow_mut().push(Event::Delay(u64::from(ms) * 1000));
    }

    fn delay_us(&mut self, us: u32) {
        self.inner.delay_us(us);
        self.trace.borrow_mut().push(Event::Delay(u64::from(us)));
    }
}

pub type TestBench = Bench<ScriptedAdc, TraceGate, TraceConsole, TraceClock>;

/// Bench around `adc` sharing its trace, clock at zero
pub fn bench(adc: ScriptedAdc) -> TestBench {
    let trace = adc.trace.clone();
    Bench::new(
        adc,
        TraceGate {
            active: None,
            trace: trace.clone(),
        },
        TraceConsole {
            trace: trace.clone(),
        },
        TraceClock {
            inner: SimulatedClock::new(0),
            trace,
        },
    )
}

pub fn new_trace() -> Trace {
    Rc::new(RefCell::new(Vec::new()))
}

/// Console lines in order
pub fn lines(trace: &Trace) -> Vec<String> {
    trace
        .borrow()
        .iter()
        .filter_map(|event| match event {
            Event::Line(line) => Some(line.clone()),
            _ => None,
        })
        .collect()
}

pub fn count(trace: &Trace, wanted: &Event) -> usize {
    trace.borrow().iter().filter(|event| *event == wanted).count()
}

/// Index of the first `wanted` event at or after `from`
pub fn position_from(trace: &Trace, from: usize, wanted: &Event) -> Option<usize> {
    trace
        .borrow()
        .iter()
        .skip(from)
        .position(|event| event == wanted)
        .map(|offset| from + offset)
}

/// Microseconds of delay recorded strictly between two trace indices
pub fn delay_between(trace: &Trace, start: usize, end: usize) -> u64 {
    trace.borrow()[start + 1..end]
        .iter()
        .map(|event| match event {
            Event::Delay(us) => *us,
            _ => 0,
        })
        .sum()
}

/// Default-calibration converter
pub fn converter() -> SampleConverter {
    SampleConverter::new(&Default::default()).unwrap()
}

/// Assert two floats agree within `tolerance`
macro_rules! assert_within_tolerance {
    ($actual:expr, $expected:expr, $tolerance:expr) => {{
        let actual = $actual as f64;
        let expected = $expected as f64;
        assert!(
            (actual - expected).abs() <= $tolerance,
            "{} not within {} of {}",
            actual,
            $tolerance,
            expected
        );
    }};
}
