// SPDX-License-Identifier: GPL-3.0-only

//! In-process stand-in for a shared frame buffer
//!
//! A fixed ring of byte slots. Writers never block: a slot that is being read is
//! reported as contended so the retry policy can decide what to do.

use std::fmt;
use std::sync::{Mutex, TryLockError};

/// Why a slot write did not happen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteFailure {
    /// Payload is larger than a slot; retrying cannot help
    Oversized { len: usize, capacity: usize },
    /// Slot is currently held by a reader
    Contended,
}

impl WriteFailure {
    pub fn is_oversized(&self) -> bool {
        matches!(self, WriteFailure::Oversized { .. })
    }
}

impl fmt::Display for WriteFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteFailure::Oversized { len, capacity } => {
                write!(f, "payload of {} bytes exceeds slot capacity {}", len, capacity)
            }
            WriteFailure::Contended => write!(f, "slot contended"),
        }
    }
}

pub struct SharedFrameBuffer {
    slots: Vec<Mutex<Vec<u8>>>,
    slot_bytes: usize,
}

impl SharedFrameBuffer {
    /// Create a buffer with `slot_count` slots of `slot_bytes` each
    ///
    /// Slot memory is allocated on first write.
    pub fn new(slot_count: usize, slot_bytes: usize) -> Self {
        let slot_count = slot_count.max(1);
        Self {
            slots: (0..slot_count).map(|_| Mutex::new(Vec::new())).collect(),
            slot_bytes,
        }
    }

    /// Slot used for the n-th dispatched frame
    pub fn slot_for(&self, ticket: u64) -> usize {
        (ticket % self.slots.len() as u64) as usize
    }

    /// Copy `payload` into a slot without waiting
    ///
    /// `slot` wraps around the ring.
    pub fn try_write(&self, slot: usize, payload: &[u8]) -> Result<(), WriteFailure> {
        if payload.len() > self.slot_bytes {
            return Err(WriteFailure::Oversized {
                len: payload.len(),
                capacity: self.slot_bytes,
            });
        }

        let mut guard = match self.slots[slot % self.slots.len()].try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => return Err(WriteFailure::Contended),
            // A panicked reader leaves plain bytes behind; overwrite them
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
        };

        guard.clear();
        guard.extend_from_slice(payload);
        Ok(())
    }

    /// Run `f` over the contents of a slot, holding it for the duration
    pub fn with_slot<R>(&self, slot: usize, f: impl FnOnce(&[u8]) -> R) -> R {
        let guard = self.slots[slot % self.slots.len()]
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&guard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_read() {
        let buffer = SharedFrameBuffer::new(2, 16);
        buffer.try_write(1, &[1, 2, 3]).unwrap();
        let len = buffer.with_slot(1, |bytes| bytes.len());
        assert_eq!(len, 3);
        assert_eq!(buffer.with_slot(3, |bytes| bytes.to_vec()), vec![1, 2, 3]);
    }

    #[test]
    fn test_oversized_payload() {
        let buffer = SharedFrameBuffer::new(1, 4);
        assert_eq!(
            buffer.try_write(0, &[0; 5]),
            Err(WriteFailure::Oversized { len: 5, capacity: 4 })
        );
    }

    #[test]
    fn test_write_contended_while_reading() {
        let buffer = SharedFrameBuffer::new(1, 4);
        buffer.with_slot(0, |_| {
            assert_eq!(buffer.try_write(0, &[1]), Err(WriteFailure::Contended));
        });
        assert!(buffer.try_write(0, &[1]).is_ok());
    }

    #[test]
    fn test_slot_for_wraps() {
        let buffer = SharedFrameBuffer::new(3, 4);
        assert_eq!(buffer.slot_for(0), 0);
        assert_eq!(buffer.slot_for(4), 1);
    }
}
