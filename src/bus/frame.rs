
//! Bit-frame state machines for both transfer directions.
//!
//! A PS/2 frame is 11 bits: start (0), eight data bits LSB first, odd
//! parity, stop (1). The machines here advance exactly one bit per call
//! and carry no I/O, so the framing invariants can be exercised without
//! any interrupt timing.

use super::io::{Drive, Level};

/// Bits in one frame.
pub const FRAME_BITS: u8 = 11;

/// Parity bit value that makes the total set-bit count of `byte` plus
/// parity odd.
pub fn odd_parity(byte: u8) -> bool {
    byte.count_ones() % 2 == 0
}

/// In-progress device-to-host frame.
#[derive(Debug, Clone, Copy)]
pub struct RxFrame {
    bit: u8,
    data: u8,
    ones: u8,
    parity_ok: bool,
}

#[derive(Debug)]
pub enum RxStep {
    Continue(RxFrame),
    Complete { byte: u8, parity_ok: bool },
    Fault(FrameFault),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameFault {
    /// Bit 0 was high where the start bit belongs.
    MalformedStart,
    /// Bit 10 was low where the stop bit belongs.
    BadStop,
}

impl RxFrame {
    pub fn begin() -> Self {
        RxFrame {
            bit: 0,
            data: 0,
            ones: 0,
            parity_ok: true,
        }
    }

    /// Shift in the level sampled on the current clock edge.
    pub fn sample(mut self, level: Level) -> RxStep {
        match self.bit {
            0 => {
                if level == Level::High {
                    return RxStep::Fault(FrameFault::MalformedStart);
                }
                self.bit = 1;
                RxStep::Continue(self)
            }
            1..=8 => {
                if level == Level::High {
                    self.data |= 1 << (self.bit - 1);
                    self.ones += 1;
                }
                self.bit += 1;
                RxStep::Continue(self)
            }
            9 => {
                let total = self.ones + (level == Level::High) as u8;
                self.parity_ok = total % 2 == 1;
                self.bit = 10;
                RxStep::Continue(self)
            }
            _ => {
                if level == Level::Low {
                    return RxStep::Fault(FrameFault::BadStop);
                }
                RxStep::Complete {
                    byte: self.data,
                    parity_ok: self.parity_ok,
                }
            }
        }
    }
}

/// In-progress host-to-device frame. The start bit is placed on the line
/// by the request-to-send sequence before the device begins clocking, so
/// bit 0 here is already the first data bit.
#[derive(Debug, Clone, Copy)]
pub struct TxFrame {
    byte: u8,
    bit: u8,
}

#[derive(Debug)]
pub enum TxStep {
    /// Put the next frame bit on the DATA line.
    Put(Drive, TxFrame),
    /// Frame finished; `acked` reflects the device's DATA-low acknowledge.
    Done { acked: bool },
}

impl TxFrame {
    pub fn new(byte: u8) -> Self {
        TxFrame { byte, bit: 0 }
    }

    /// Advance one clock edge. `data` is the sampled DATA level, only
    /// meaningful on the final (acknowledge) edge.
    pub fn clock(mut self, data: Level) -> TxStep {
        match self.bit {
            0..=7 => {
                let high = self.byte & (1 << self.bit) != 0;
                self.bit += 1;
                TxStep::Put(drive_for(high), self)
            }
            8 => {
                self.bit = 9;
                TxStep::Put(drive_for(odd_parity(self.byte)), self)
            }
            9 => {
                // Stop bit: release the line so the device can pull it
                // low to acknowledge.
                self.bit = 10;
                TxStep::Put(Drive::Release, self)
            }
            _ => TxStep::Done {
                acked: data == Level::Low,
            },
        }
    }
}

fn drive_for(high: bool) -> Drive {
    if high {
        Drive::Release
    } else {
        Drive::Low
    }
}
