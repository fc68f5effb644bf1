//! Multi-producer/single-consumer ring queue.
//!
//! The mirror image of `Spmc` — producers race for slots by CAS-ing `tail`
//! forward, while the single consumer's `head` stays a plain counter.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicUsize, Ordering};

use crossbeam_utils::CachePadded;

use super::base::{wait_slot_ready, RingCore, RingError};

/// A bounded MPSC queue: any number of concurrent producers, one consumer.
pub struct Mpsc<T> {
    core: RingCore<T>,
    head: CachePadded<UnsafeCell<usize>>,
    tail: CachePadded<AtomicUsize>,
}

impl<T> Mpsc<T> {
    /// Create a queue with room for at least `capacity` elements.
    pub fn new(capacity: usize) -> Result<Self, RingError> {
        Ok(Self {
            core: RingCore::new(capacity)?,
            head: CachePadded::new(UnsafeCell::new(0)),
            tail: CachePadded::new(AtomicUsize::new(0)),
        })
    }

    /// The queue's actual capacity.
    pub fn capacity(&self) -> usize {
        self.core.capacity()
    }

    /// Enqueue without blocking. Safe to call from any number of producer
    /// threads concurrently. Returns `false` if the queue is observed full.
    pub fn try_push(&self, value: T) -> bool {
        let mut tail = self.tail.load(Ordering::Acquire);
        loop {
            let slot = self.core.slot(tail);
            let target = self.core.write_turn(tail);
            if slot.turn.load(Ordering::Acquire) == target {
                match self
                    .tail
                    .compare_exchange_weak(tail, tail + 1, Ordering::AcqRel, Ordering::Acquire)
                {
                    Ok(_) => {
                        unsafe {
                            slot.construct(value);
                        }
                        slot.turn.store(target + 1, Ordering::Release);
                        return true;
                    }
                    Err(observed) => {
                        tail = observed;
                        continue;
                    }
                }
            }
            let reloaded = self.tail.load(Ordering::Acquire);
            if reloaded == tail {
                return false;
            }
            tail = reloaded;
        }
    }

    /// Enqueue, spin-waiting until a slot becomes writable. Safe to call
    /// from any number of producer threads concurrently.
    pub fn push(&self, value: T) {
        let tail = self.tail.fetch_add(1, Ordering::Relaxed);
        let slot = self.core.slot(tail);
        let target = self.core.write_turn(tail);
        wait_slot_ready(&slot.turn, target);
        unsafe {
            slot.construct(value);
        }
        slot.turn.store(target + 1, Ordering::Release);
    }

    /// Dequeue without blocking. Must only be called from the single
    /// consumer thread. Returns `None` if the queue is empty.
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

    /// Dequeue, spin-waiting until an element is available. Single consumer
    /// thread only.
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

unsafe impl<T: Send> Send for Mpsc<T> {}
unsafe impl<T: Send> Sync for Mpsc<T> {}
