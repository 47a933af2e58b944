
//! Sticky line status.
//!
//! Frame-level faults are handled entirely inside the interrupt context;
//! the foreground only ever sees them as flags here, never as errors from
//! `read`.

use bitflags::bitflags;

bitflags! {
    pub struct LineStatus: u8 {
        /// Bit 0 of a frame was not a start bit; the frame was discarded.
        const START_BIT_ERROR = 0b0000_0001;
        /// A delivered byte arrived with bad parity.
        const PARITY_ERROR = 0b0000_0010;
        /// The stop bit of a frame was low; the frame was discarded.
        const FRAMING_ERROR = 0b0000_0100;
        /// A completed byte was dropped because the receive queue was full.
        const BUFFER_OVERRUN = 0b0000_1000;
    }
}

#[derive(Debug)]
pub struct StatusInfo {
    flags: LineStatus,
}

#[derive(Debug)]
pub struct OddParity;

#[derive(Debug)]
pub struct EvenParity;

impl StatusInfo {
    pub(crate) fn new(flags: LineStatus) -> Self {
        StatusInfo { flags }
    }

    pub fn data_parity(&self) -> Result<OddParity, EvenParity> {
        if self.flags.contains(LineStatus::PARITY_ERROR) {
            Err(EvenParity)
        } else {
            Ok(OddParity)
        }
    }

    /// `false` if any frame was discarded for a bad start or stop bit.
    pub fn framing_ok(&self) -> bool {
        !self
            .flags
            .intersects(LineStatus::START_BIT_ERROR | LineStatus::FRAMING_ERROR)
    }

    /// `true` if a byte was lost to a full receive queue.
    pub fn overrun(&self) -> bool {
        self.flags.contains(LineStatus::BUFFER_OVERRUN)
    }

    pub fn raw(&self) -> LineStatus {
        self.flags
    }
}
