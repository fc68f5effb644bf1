//! Shared geometry and spin-wait protocol for all three ring variants:
//! capacity rounding, the index/turn arithmetic, and the spin-wait's
//! 10-pause-then-1ms-sleep retry budget.

use core::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use thiserror::Error;

use crate::cc::next_power_of_two;
use crate::pr;

use super::slot::Slot;

/// Construction-time failure for any ring variant.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RingError {
    /// `capacity` was 0; a ring must hold at least one slot.
    #[error("ring capacity must be greater than 0")]
    ZeroCapacity,
}

/// The slot array and index arithmetic shared by `Spsc`, `Spmc`, and `Mpsc`.
pub(crate) struct RingCore<T> {
    capacity: usize,
    mask: usize,
    shift: u32,
    slots: Box<[Slot<T>]>,
}

impl<T> RingCore<T> {
    pub(crate) fn new(requested_capacity: usize) -> Result<Self, RingError> {
        if requested_capacity == 0 {
            return Err(RingError::ZeroCapacity);
        }
        let capacity = next_power_of_two(requested_capacity);
        let slots = (0..capacity).map(|_| Slot::new()).collect::<Vec<_>>().into_boxed_slice();
        Ok(Self {
            capacity,
            mask: capacity - 1,
            shift: capacity.trailing_zeros(),
            slots,
        })
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub(crate) fn slot(&self, logical_index: usize) -> &Slot<T> {
        &self.slots[logical_index & self.mask]
    }

    /// The generation of a logical index: `i / capacity`.
    #[inline]
    pub(crate) fn generation(&self, logical_index: usize) -> usize {
        logical_index >> self.shift
    }

    /// The `turn` value that makes the slot at `logical_index` writable.
    #[inline]
    pub(crate) fn write_turn(&self, logical_index: usize) -> usize {
        self.generation(logical_index) << 1
    }

    /// The `turn` value that makes the slot at `logical_index` readable.
    #[inline]
    pub(crate) fn read_turn(&self, logical_index: usize) -> usize {
        self.write_turn(logical_index) + 1
    }
}

/// Spin-wait for a slot's `turn` to reach `target`.
///
/// Up to 10 PAUSE/YIELD iterations are issued before falling back to a 1 ms
/// sleep; the retry budget then resets to 10. This bounds the worst-case CPU
/// burn on a slot starved behind a descheduled peer.
pub(crate) fn wait_slot_ready(turn: &AtomicUsize, target: usize) {
    let mut retry: u8 = 10;
    while turn.load(Ordering::Acquire) != target {
        if retry > 0 {
            retry -= 1;
            pr::stall();
        } else {
            thread::sleep(Duration::from_millis(1));
            retry = 10;
        }
    }
}
