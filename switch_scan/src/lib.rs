#![deny(warnings)]
#![deny(missing_docs)]
#![deny(unsafe_code)]
#![no_std]

//! SWITCH SCAN
//!
//! Debounces a bank of up to 32 switches read through a chain of parallel to
//! serial shift registers (e.g. 74HC165), with the output registers of the
//! same chain (e.g. 74HC595) written on every transfer.
//!
//! The whole scan runs in the transfer complete interrupt: each completed
//! sample is XORed with the one before, the changed bits are walked with a
//! count-leading-zeros scan, and every switch owning a changed bit runs its
//! debounce state machine. Switches that are counting down a debounce time
//! sit on a list that is advanced once per debounce tick, a fixed number of
//! transfers. Owners are woken through a [Signal] and read the debounced
//! value from their [SwitchHandle].
//!
//! ```ignore
//! static PUBLISHED: Published<16> = Published::new();
//! static SIGNAL: Signal = Signal::new();
//!
//! let mut switches = Switches::new(&PUBLISHED);
//! let arm = switches.register(
//!     SwitchConfig::pushbutton(1 << 5)
//!         .mode(Mode::Settled)
//!         .debounce(ms_to_ticks(20), ms_to_ticks(20))
//!         .notify(&SIGNAL, 1 << 3),
//! )?;
//!
//! let mut driver = ScanDriver::new(SpiLink::<_, _, 2>::new(spi, latch), switches, ScanConfig::new())?;
//!
//! // transfer interrupt
//! driver.service()?;
//!
//! // owning task
//! if SIGNAL.take() & (1 << 3) != 0 && arm.contact() == Contact::Closed { /* ... */ }
//! ```
//!
//! Built using [`embedded-hal`] traits
//!
//! [`embedded-hal`]: https://docs.rs/embedded-hal/0.2

pub mod bitscan;
pub mod config;
pub mod fault;
pub mod link;
pub mod published;
pub mod registry;
pub mod scan;
pub mod signal;
pub mod switch;

#[cfg(test)]
mod mock;

pub use config::{ms_to_ticks, ScanConfig};
pub use fault::Fault;
pub use link::{LinkError, ShiftLink, SpiLink};
pub use published::{Published, SwitchHandle, SwitchId};
pub use registry::{SwitchConfig, SwitchKind, Switches};
pub use scan::ScanDriver;
pub use signal::{Notify, Signal};
pub use switch::{Contact, Mode, PairPosition, PushState};
