//! Single-producer/multi-consumer ring queue.
//!
//! The producer side is identical to `Spsc` (tail stays plain), but
//! consumers race for slots by CAS-ing `head` forward; a consumer that
//! loses the race simply rereads the now-current `head` and tries again.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicUsize, Ordering};

use crossbeam_utils::CachePadded;

use super::base::{wait_slot_ready, RingCore, RingError};

/// A bounded SPMC queue: one producer, any number of concurrent consumers.
pub struct Spmc<T> {
    core: RingCore<T>,
    head: CachePadded<AtomicUsize>,
    tail: CachePadded<UnsafeCell<usize>>,
}

impl<T> Spmc<T> {
    /// Create a queue with room for at least `capacity` elements.
    pub fn new(capacity: usize) -> Result<Self, RingError> {
        Ok(Self {
            core: RingCore::new(capacity)?,
            head: CachePadded::new(AtomicUsize::new(0)),
            tail: CachePadded::new(UnsafeCell::new(0)),
        })
    }

    /// The queue's actual capacity.
    pub fn capacity(&self) -> usize {
        self.core.capacity()
    }

    /// Enqueue without blocking. Must only be called from the single
    /// producer thread. Returns `false` if the queue is full.
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

    /// Enqueue, spin-waiting until writable. Single producer thread only.
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

    /// Dequeue without blocking. Safe to call from any number of consumer
    /// threads concurrently. Returns `None` if the queue is observed empty.
    pub fn try_pop(&self) -> Option<T> {
        let mut head = self.head.load(Ordering::Acquire);
        loop {
            let slot = self.core.slot(head);
            let target = self.core.read_turn(head);
            if slot.turn.load(Ordering::Acquire) == target {
                match self
                    .head
                    .compare_exchange_weak(head, head + 1, Ordering::AcqRel, Ordering::Acquire)
                {
                    Ok(_) => {
                        let value = unsafe { slot.take() };
                        slot.turn.store(target + 1, Ordering::Release);
                        return Some(value);
                    }
                    Err(observed) => {
                        head = observed;
                        continue;
                    }
                }
            }
            // Not ready yet from this consumer's point of view. If `head`
            // hasn't moved since we last looked, the queue is genuinely
            // empty; if it has, another consumer raced ahead and we must
            // reread the new candidate slot before giving up.
            let reloaded = self.head.load(Ordering::Acquire);
            if reloaded == head {
                return None;
            }
            head = reloaded;
        }
    }

    /// Dequeue, spin-waiting until an element is available. Safe to call
    /// from any number of consumer threads concurrently.
    pub fn pop(&self) -> T {
        let head = self.head.fetch_add(1, Ordering::Relaxed);
        let slot = self.core.slot(head);
        let target = self.core.read_turn(head);
        wait_slot_ready(&slot.turn, target);
        let value = unsafe { slot.take() };
        slot.turn.store(target + 1, Ordering::Release);
        value
    }
}

unsafe impl<T: Send> Send for Spmc<T> {}
unsafe impl<T: Send> Sync for Spmc<T> {}
