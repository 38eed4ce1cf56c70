//! Simulated Discharge
//!
//! Runs one full supervised cycle against a crude Li-ion cell model on a
//! virtual clock, so a multi-hour discharge finishes instantly.
//!
//! The cell model:
//! - open-circuit voltage falls linearly from 4.2 V to 2.5 V with charge
//! - 80 mΩ internal resistance sags the terminal voltage under load
//! - the load is the tester's own 4 Ω + 0.1 Ω path
//!
//! Run with: `cargo run --example simulated_discharge`

use std::cell::{Cell, RefCell};
use std::convert::Infallible;
use std::rc::Rc;

use cellcap_core::{
    constants::{circuit::REFERENCE_SIGNAL_V, MS_PER_HOUR},
    time::SimulatedClock, AnalogInput, Bench, CapacityTester, Channel, Clock, Console,
    GateOutput, SampleConverter, TesterConfig, TimeSource,
};

const NOMINAL_MAH: f64 = 2_600.0;
const INTERNAL_RESISTANCE_OHM: f64 = 0.08;

/// Shared state between the ADC and the gate
struct CellModel {
    remaining_mah: f64,
    load_connected: bool,
    last_update_ms: u64,
}

impl CellModel {
    fn open_circuit_voltage(&self) -> f64 {
        let soc = (self.remaining_mah / NOMINAL_MAH).clamp(0.0, 1.0);
        2.5 + 1.7 * soc
    }

    fn load_current(&self, load_ohms: f64) -> f64 {
        if self.load_connected {
            self.open_circuit_voltage() / (load_ohms + INTERNAL_RESISTANCE_OHM)
        } else {
            0.0
        }
    }
}

struct ModelAdc {
    cell: Rc<RefCell<CellModel>>,
    now_ms: Rc<Cell<u64>>,
    converter: SampleConverter,
    load_ohms: f64,
}

impl AnalogInput for ModelAdc {
    type Error = Infallible;

    fn read_raw(&mut self, channel: Channel) -> nb::Result<u16, Self::Error> {
        let mut cell = self.cell.borrow_mut();

        // Drain whatever flowed since the last conversion
        let now = self.now_ms.get();
        let current = cell.load_current(self.load_ohms);
        let elapsed_h = now.saturating_sub(cell.last_update_ms) as f64 / MS_PER_HOUR as f64;
        cell.remaining_mah -= current * 1000.0 * elapsed_h;
        cell.last_update_ms = now;

        let current = cell.load_current(self.load_ohms);
        let terminal = cell.open_circuit_voltage() - current * INTERNAL_RESISTANCE_OHM;

        Ok(match channel {
            Channel::BatteryVoltage => self.converter.voltage_to_raw(terminal as f32),
            Channel::ShuntCurrent => self.converter.current_to_raw(current as f32),
            // 0.55 V against a true 1.1 V reference on 10 bits
            Channel::Reference => 512,
        })
    }
}

struct ModelGate {
    cell: Rc<RefCell<CellModel>>,
}

impl GateOutput for ModelGate {
    type Error = Infallible;

    fn set_gate(&mut self, active: bool) -> Result<(), Self::Error> {
        self.cell.borrow_mut().load_connected = active;
        Ok(())
    }
}

/// Prints to stdout and acknowledges on its own
struct AutoConsole {
    progress_seen: u32,
}

impl Console for AutoConsole {
    type Error = Infallible;

    fn emit_line(&mut self, line: &str) -> Result<(), Self::Error> {
        // Only every 50th progress line, a full run emits thousands
        if line.starts_with("Voltage:") {
            self.progress_seen += 1;
            if self.progress_seen % 50 != 0 {
                return Ok(());
            }
        }
        println!("{}", line);
        Ok(())
    }

    fn await_acknowledgment(&mut self) -> Result<(), Self::Error> {
        println!("> (enter)");
        Ok(())
    }
}

/// Simulated clock that publishes its time to the cell model
struct PublishingClock {
    inner: SimulatedClock,
    now_ms: Rc<Cell<u64>>,
}

impl TimeSource for PublishingClock {
    fn now(&self) -> u64 {
        self.inner.now()
    }
}

impl Clock for PublishingClock {
    fn delay_ms(&mut self, ms: u32) {
        self.inner.delay_ms(ms);
        self.now_ms.set(self.inner.now());
    }

    fn delay_us(&mut self, us: u32) {
        self.inner.delay_us(us);
        self.now_ms.set(self.inner.now());
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = TesterConfig::default();
    let converter = SampleConverter::new(&config.calibration)?;
    let load_ohms =
        f64::from(config.calibration.load_resistance + config.calibration.shunt_resistance);

    let cell = Rc::new(RefCell::new(CellModel {
        remaining_mah: NOMINAL_MAH,
        load_connected: false,
        last_update_ms: 0,
    }));
    let now_ms = Rc::new(Cell::new(0));

    let bench = Bench::new(
        ModelAdc {
            cell: cell.clone(),
            now_ms: now_ms.clone(),
            converter,
            load_ohms,
        },
        ModelGate { cell: cell.clone() },
        AutoConsole { progress_seen: 0 },
        PublishingClock {
            inner: SimulatedClock::new(0),
            now_ms,
        },
    );

    let mut tester = CapacityTester::new(bench, config)?;
    let reference = tester.calibrate_reference(REFERENCE_SIGNAL_V)?;
    println!("Reference self-calibration: {:.4} V", reference);

    let outcome = tester.run_cycle()?;
    println!("State: {:?}", outcome.state);

    if let Some(report) = outcome.discharge {
        println!(
            "Measured {:.1} mAh in {:.2} h ({} samples), cell model delivered {:.1} mAh",
            report.capacity_mah,
            report.duration_ms as f64 / MS_PER_HOUR as f64,
            report.steps,
            NOMINAL_MAH - cell.borrow().remaining_mah,
        );
    }

    Ok(())
}
