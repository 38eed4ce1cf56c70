//! Status lines for the operator console
//!
//! Lines are formatted into a fixed-capacity [`heapless::String`], no heap.
//! The text is free-form and human oriented; nothing parses it.

use core::fmt::Write;

use crate::errors::{TesterError, TesterResult};

/// Longest status line the tester emits
pub const LINE_CAPACITY: usize = 96;

/// Stack buffer for one status line
pub type LineBuffer = heapless::String<LINE_CAPACITY>;

/// Periodic discharge progress
pub fn progress_line(voltage: f32, current: f32, capacity_mah: f64) -> TesterResult<LineBuffer> {
    let mut line = LineBuffer::new();
    write!(
        line,
        "Voltage: {:.6} V | Current: {:.6} A | Capacity: {:.6} mAh",
        voltage, current, capacity_mah
    )
    .map_err(|_| TesterError::LineOverflow)?;
    Ok(line)
}

/// Final capacity figure
pub fn completion_line(capacity_mah: f64) -> TesterResult<LineBuffer> {
    let mut line = LineBuffer::new();
    write!(line, "Test complete! Your battery holds {:.6} mAh.", capacity_mah)
        .map_err(|_| TesterError::LineOverflow)?;
    Ok(line)
}

/// Capacity measured before a collaborator fault ended the run
pub fn interrupted_line(capacity_mah: f64) -> TesterResult<LineBuffer> {
    let mut line = LineBuffer::new();
    write!(line, "Test interrupted! {:.6} mAh measured before the fault.", capacity_mah)
        .map_err(|_| TesterError::LineOverflow)?;
    Ok(line)
}
