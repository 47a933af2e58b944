
//! Driver for a bit-banged PS/2 host port.
//!
//! The PS/2 bus is two open-drain lines, CLOCK and DATA. The device owns
//! the clock: every transfer, in either direction, is paced by clock
//! pulses the device generates at 10-16 kHz. This crate runs the bit-level
//! protocol from a falling-edge clock interrupt and exposes a byte-level
//! API to foreground code.
//!
//! # Reference material
//! * <https://wiki.osdev.org/PS/2_Keyboard>
//! * <http://www.burtonsys.com/ps2_chapweske.htm>
//!
//! The platform side implements [`bus::io::BusIO`] (pin sampling,
//! open-drain drive, clock-interrupt gating, microsecond delays) and
//! arranges for its falling-edge interrupt handler on CLOCK to call
//! [`host::Ps2::on_clock_edge`]. Everything above the pins lives here.

#![no_std]
#![forbid(missing_debug_implementations)]

pub mod bus;
pub mod host;

pub use host::Ps2;
