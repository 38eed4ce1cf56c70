//! Collaborator Traits
//!
//! The measurement core never touches a peripheral directly. It consumes four
//! narrow capabilities, so the same code drives a real board, a host console
//! or a scripted test double.
//!
//! ## Module Organization
//!
//! - [`io`] - analog input, discharge gate and operator console
//! - [`time`] - monotonic time and blocking delays
//!
//! ## Usage Example
//!
//! ```rust
//! use cellcap_core::traits::{AnalogInput, Channel};
//!
//! struct FixedAdc(u16);
//!
//! impl AnalogInput for FixedAdc {
//!     type Error = core::convert::Infallible;
//!
//!     fn read_raw(&mut self, _channel: Channel) -> nb::Result<u16, Self::Error> {
//!         Ok(self.0)
//!     }
//! }
//!
//! let mut adc = FixedAdc(512);
//! assert_eq!(nb::block!(adc.read_raw(Channel::BatteryVoltage)), Ok(512));
//! ```

pub mod io;
pub mod time;

pub use io::{AnalogInput, Channel, Console, GateOutput};
pub use time::{Clock, TimeSource};
