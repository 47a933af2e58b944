
//! Byte queue between the engine (interrupt writer) and the foreground
//! reader.
//!
//! The queue itself does no locking; the driver wraps every access in a
//! critical section. On overflow the incoming byte is dropped
//! (`Saturating` behavior) and the error is surfaced so the engine can
//! record the overrun.

use arraydeque::{Array, ArrayDeque, CapacityError, Saturating};

#[derive(Debug)]
pub struct RxQueue<A: Array<Item = u8>> {
    bytes: ArrayDeque<A, Saturating>,
}

impl<A: Array<Item = u8>> RxQueue<A> {
    pub fn new() -> Self {
        Self {
            bytes: ArrayDeque::new(),
        }
    }

    /// Append a completed byte. Fails when full; the byte is dropped.
    pub fn push(&mut self, byte: u8) -> Result<(), CapacityError<u8>> {
        self.bytes.push_back(byte)
    }

    /// Remove the oldest byte.
    pub fn pop(&mut self) -> Option<u8> {
        self.bytes.pop_front()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.bytes.capacity()
    }

    pub fn clear(&mut self) {
        self.bytes.clear()
    }
}
