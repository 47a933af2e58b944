
//! The driver context: interrupt entry point plus the foreground API.
//!
//! One `Ps2` instance owns one bus. The platform's falling-edge interrupt
//! handler on CLOCK calls [`Ps2::on_clock_edge`]; everything else is
//! called from foreground code. Shared engine state lives behind a
//! `critical_section::Mutex`, so every touch of it is a short, bounded
//! critical section and the interrupt handler never blocks.

use core::cell::RefCell;
use core::fmt;
use core::mem;

use arraydeque::Array;
use critical_section::Mutex;

use crate::bus::frame::{FrameFault, RxFrame, RxStep, TxFrame, TxStep};
use crate::bus::io::{BusIO, Drive, Line};
use crate::bus::queue::RxQueue;
use crate::bus::status::{LineStatus, StatusInfo};

/// How long the request-to-send sequence holds CLOCK low before placing
/// the start bit. The protocol requires at least 100 microseconds.
pub const RTS_CLOCK_HOLD_MICROS: u32 = 100;

/// How long `reset` holds both lines low.
pub const RESET_HOLD_MICROS: u32 = 100;

/// Watchdog bound on one byte transfer. A frame takes about 1 ms at the
/// slowest clock rate, but a device may sit on its clock for tens of
/// milliseconds before it starts pulsing.
pub const WRITE_TIMEOUT_MICROS: u32 = 50_000;

const WRITE_POLL_MICROS: u32 = 50;

/// Receive queue capacity with the default backing array.
pub const DEFAULT_RX_CAPACITY: usize = 16;

/// Phase of the engine. Mutated only by `on_clock_edge`, except for the
/// arbitration done by `rts`, `suspend`, `resume` and `reset`.
#[derive(Debug, Clone, Copy)]
pub enum BusState {
    /// Listening; the next clock edge starts a receive frame.
    Idle,
    Receiving(RxFrame),
    /// Host holds the bus; the device has not started clocking yet.
    RequestToSend,
    Sending(TxFrame),
    /// CLOCK held low by the host; the device cannot initiate.
    Suspended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReadError {
    BufferEmpty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WriteError {
    /// A transfer is already in flight in either direction.
    BusBusy,
    /// The watchdog expired before the frame completed.
    Timeout,
    /// The frame completed but the device never pulled DATA low.
    Unacknowledged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlushSelection {
    Receive,
    Transmit,
    All,
}

#[derive(Debug)]
struct Engine<A: Array<Item = u8>> {
    state: BusState,
    rx: RxQueue<A>,
    tx_byte: u8,
    tx_result: Option<Result<(), WriteError>>,
    status: LineStatus,
}

pub struct Ps2<T: BusIO, A: Array<Item = u8> = [u8; DEFAULT_RX_CAPACITY]> {
    io: T,
    engine: Mutex<RefCell<Engine<A>>>,
}

impl<T: BusIO, A: Array<Item = u8>> Ps2<T, A> {
    pub fn new(io: T) -> Self {
        Ps2 {
            io,
            engine: Mutex::new(RefCell::new(Engine {
                state: BusState::Idle,
                rx: RxQueue::new(),
                tx_byte: 0,
                tx_result: None,
                status: LineStatus::empty(),
            })),
        }
    }

    fn with_engine<R>(&self, f: impl FnOnce(&mut Engine<A>) -> R) -> R {
        critical_section::with(|cs| f(&mut *self.engine.borrow(cs).borrow_mut()))
    }

    /// Interrupt entry point. Advances the engine by exactly one bit;
    /// bounded, constant time, never blocks.
    pub fn on_clock_edge(&self) {
        self.with_engine(|e| {
            let state = mem::replace(&mut e.state, BusState::Idle);
            e.state = match state {
                BusState::Idle => self.receive_bit(e, RxFrame::begin()),
                BusState::Receiving(frame) => self.receive_bit(e, frame),
                BusState::Sending(frame) => self.send_bit(e, frame),
                // No edges are expected while the host holds the clock.
                BusState::RequestToSend => BusState::RequestToSend,
                BusState::Suspended => BusState::Suspended,
            };
        });
    }

    fn receive_bit(&self, e: &mut Engine<A>, frame: RxFrame) -> BusState {
        match frame.sample(self.io.read(Line::Data)) {
            RxStep::Continue(frame) => BusState::Receiving(frame),
            RxStep::Complete { byte, parity_ok } => {
                // Parity policy: the byte is delivered either way, the
                // mismatch only sets the sticky flag.
                if !parity_ok {
                    e.status.insert(LineStatus::PARITY_ERROR);
                }
                if e.rx.push(byte).is_err() {
                    e.status.insert(LineStatus::BUFFER_OVERRUN);
                }
                BusState::Idle
            }
            RxStep::Fault(FrameFault::MalformedStart) => {
                e.status.insert(LineStatus::START_BIT_ERROR);
                BusState::Idle
            }
            RxStep::Fault(FrameFault::BadStop) => {
                e.status.insert(LineStatus::FRAMING_ERROR);
                BusState::Idle
            }
        }
    }

    fn send_bit(&self, e: &mut Engine<A>, frame: TxFrame) -> BusState {
        match frame.clock(self.io.read(Line::Data)) {
            TxStep::Put(drive, frame) => {
                self.io.drive(Line::Data, drive);
                BusState::Sending(frame)
            }
            TxStep::Done { acked } => {
                e.tx_result = Some(if acked {
                    Ok(())
                } else {
                    Err(WriteError::Unacknowledged)
                });
                BusState::Idle
            }
        }
    }

    /// Release both lines, clear engine state and enable the clock
    /// interrupt. Idempotent; buffered bytes are kept.
    pub fn begin(&self) {
        self.io.drive(Line::Clock, Drive::Release);
        self.io.drive(Line::Data, Drive::Release);
        self.with_engine(|e| {
            e.state = BusState::Idle;
            e.tx_result = None;
            e.status = LineStatus::empty();
        });
        self.io.set_clock_interrupt(true);
    }

    /// Completed bytes waiting in the receive queue.
    pub fn available(&self) -> usize {
        self.with_engine(|e| e.rx.len())
    }

    /// Pop one byte. Non-blocking.
    pub fn read(&self) -> Result<u8, ReadError> {
        self.with_engine(|e| e.rx.pop()).ok_or(ReadError::BufferEmpty)
    }

    /// Send one byte, blocking until the frame completes or the watchdog
    /// expires. Retrying is the caller's responsibility.
    pub fn write(&self, byte: u8) -> Result<(), WriteError> {
        self.with_engine(|e| match e.state {
            BusState::Idle => {
                e.tx_byte = byte;
                Ok(())
            }
            _ => Err(WriteError::BusBusy),
        })?;
        self.rts()?;

        let mut waited = 0;
        loop {
            if let Some(result) = self.with_engine(|e| e.tx_result.take()) {
                return result;
            }
            if waited >= WRITE_TIMEOUT_MICROS {
                self.abort_transfer();
                return Err(WriteError::Timeout);
            }
            self.io.delay_micros(WRITE_POLL_MICROS);
            waited += WRITE_POLL_MICROS;
        }
    }

    /// Request-to-send: seize the bus for a host-to-device frame. Sends
    /// the current transmit register contents (`write` is the loading
    /// path). Fails with `BusBusy` unless the bus is idle.
    pub fn rts(&self) -> Result<(), WriteError> {
        self.with_engine(|e| match e.state {
            BusState::Idle => {
                e.state = BusState::RequestToSend;
                e.tx_result = None;
                Ok(())
            }
            _ => Err(WriteError::BusBusy),
        })?;

        // Inhibit the device, then place the start bit and hand the
        // clock back. The device paces everything from here. The engine
        // must already be in the sending phase when the clock is
        // released, the first device edge can arrive immediately after.
        self.io.drive(Line::Clock, Drive::Low);
        self.io.delay_micros(RTS_CLOCK_HOLD_MICROS);
        self.io.drive(Line::Data, Drive::Low);
        self.with_engine(|e| e.state = BusState::Sending(TxFrame::new(e.tx_byte)));
        self.io.drive(Line::Clock, Drive::Release);
        Ok(())
    }

    /// Clear receive and transmit buffering state.
    pub fn flush(&self) {
        self.flush_selected(FlushSelection::All);
    }

    pub fn flush_selected(&self, selection: FlushSelection) {
        self.with_engine(|e| match selection {
            FlushSelection::Receive => e.rx.clear(),
            FlushSelection::Transmit => self.clear_transmit(e),
            FlushSelection::All => {
                e.rx.clear();
                self.clear_transmit(e);
            }
        });
    }

    fn clear_transmit(&self, e: &mut Engine<A>) {
        e.tx_result = None;
        if matches!(e.state, BusState::RequestToSend | BusState::Sending(_)) {
            e.state = BusState::Idle;
            self.io.drive(Line::Data, Drive::Release);
            self.io.drive(Line::Clock, Drive::Release);
        }
    }

    /// Reset the device by pulling both lines low simultaneously, then
    /// return to listening with all engine state cleared.
    pub fn reset(&self) {
        self.io.set_clock_interrupt(false);
        self.io.drive(Line::Clock, Drive::Low);
        self.io.drive(Line::Data, Drive::Low);
        self.io.delay_micros(RESET_HOLD_MICROS);
        self.io.drive(Line::Data, Drive::Release);
        self.io.drive(Line::Clock, Drive::Release);
        self.with_engine(|e| {
            e.state = BusState::Idle;
            e.tx_result = None;
            e.status = LineStatus::empty();
            e.rx.clear();
        });
        self.io.set_clock_interrupt(true);
    }

    /// Hold CLOCK low so the device cannot initiate a transfer. Buffered
    /// bytes are kept; a partial receive frame is abandoned, the device
    /// will retransmit once released.
    pub fn suspend(&self) {
        self.with_engine(|e| {
            e.state = BusState::Suspended;
            self.io.drive(Line::Clock, Drive::Low);
        });
    }

    /// Release CLOCK and listen again.
    pub fn resume(&self) {
        self.with_engine(|e| {
            if matches!(e.state, BusState::Suspended) {
                e.state = BusState::Idle;
                self.io.drive(Line::Clock, Drive::Release);
            }
        });
    }

    /// Sticky status flags accumulated since the last clear.
    pub fn status(&self) -> StatusInfo {
        StatusInfo::new(self.with_engine(|e| e.status))
    }

    /// Read and clear the sticky status flags.
    pub fn take_status(&self) -> StatusInfo {
        StatusInfo::new(self.with_engine(|e| {
            let flags = e.status;
            e.status = LineStatus::empty();
            flags
        }))
    }

    fn abort_transfer(&self) {
        self.with_engine(|e| {
            e.state = BusState::Idle;
            self.io.drive(Line::Data, Drive::Release);
            self.io.drive(Line::Clock, Drive::Release);
        });
    }
}

impl<T: BusIO, A: Array<Item = u8>> fmt::Debug for Ps2<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad("Ps2 { .. }")
    }
}
