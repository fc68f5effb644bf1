//! Single-producer/single-consumer ring queue.
//!
//! Both indices are plain counters, each exclusively owned by its side, so
//! no atomic read-modify-write is needed to claim a slot — only the slot's
//! own `turn` synchronizes producer and consumer.

use core::cell::UnsafeCell;
use core::sync::atomic::Ordering;

use crossbeam_utils::CachePadded;

use super::base::{wait_slot_ready, RingCore, RingError};

/// A bounded SPSC queue. Exactly one thread may call the push methods and
/// exactly one (possibly different) thread may call the pop methods;
/// violating that is a logic error, not something this type detects.
pub struct Spsc<T> {
    core: RingCore<T>,
    head: CachePadded<UnsafeCell<usize>>,
    tail: CachePadded<UnsafeCell<usize>>,
}

impl<T> Spsc<T> {
    /// Create a queue with room for at least `capacity` elements. `capacity`
    /// is rounded up to the next power of two internally.
    pub fn new(capacity: usize) -> Result<Self, RingError> {
        Ok(Self {
            core: RingCore::new(capacity)?,
            head: CachePadded::new(UnsafeCell::new(0)),
            tail: CachePadded::new(UnsafeCell::new(0)),
        })
    }

    /// The queue's actual capacity (rounded up from the requested value).
    pub fn capacity(&self) -> usize {
        self.core.capacity()
    }

    /// Enqueue without blocking. Returns `false` if the queue is full.
    ///
    /// # Safety (logical, not `unsafe`)
    /// Must only be called from the single producer thread.
    pub fn try_push(&self, value: T) -> bool {
        let tail = unsafe { *self.tail.get() };
        let slot = self.core.slot(tail);
        let target = self.core.write_turn(tail);
        if slot.turn.load(Ordering::Acquire) != target {
            return false;
        }
        unsafe {
            *self.tail.get() = tail + 1;
            slot.construct(value);
        }
        slot.turn.store(target + 1, Ordering::Release);
        true
    }

    /// Enqueue, spin-waiting until the target slot becomes writable.
    ///
    /// Must only be called from the single producer thread.
    pub fn push(&self, value: T) {
        let tail = unsafe { *self.tail.get() };
        unsafe {
            *self.tail.get() = tail + 1;
        }
        let slot = self.core.slot(tail);
        let target = self.core.write_turn(tail);
        wait_slot_ready(&slot.turn, target);
        unsafe {
            slot.construct(value);
        }
        slot.turn.store(target + 1, Ordering::Release);
    }

    /// Dequeue without blocking. Returns `None` if the queue is empty.
    ///
    /// Must only be called from the single consumer thread.
    pub fn try_pop(&self) -> Option<T> {
        let head = unsafe { *self.head.get() };
        let slot = self.core.slot(head);
        let target = self.core.read_turn(head);
        if slot.turn.load(Ordering::Acquire) != target {
            return None;
        }
        unsafe {
            *self.head.get() = head + 1;
        }
        let value = unsafe { slot.take() };
        slot.turn.store(target + 1, Ordering::Release);
        Some(value)
    }

    /// Dequeue, spin-waiting until an element is available.
    ///
    /// Must only be called from the single consumer thread.
    pub fn pop(&self) -> T {
        let head = unsafe { *self.head.get() };
        unsafe {
            *self.head.get() = head + 1;
        }
        let slot = self.core.slot(head);
        let target = self.core.read_turn(head);
        wait_slot_ready(&slot.turn, target);
        let value = unsafe { slot.take() };
        slot.turn.store(target + 1, Ordering::Release);
        value
    }
}

// Safety: the producer side only ever touches `tail`/construct, the
// consumer side only ever touches `head`/take; the slot's `turn` provides
// the happens-before edge between them, so `Spsc<T>` may be shared (e.g.
// behind an `Arc`) as long as each side keeps to its own role.
unsafe impl<T: Send> Send for Spsc<T> {}
unsafe impl<T: Send> Sync for Spsc<T> {}
