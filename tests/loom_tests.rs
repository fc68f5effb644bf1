//! Loom model-checking tests for `spin` and the SPSC ring protocol.
//!
//! Run with: `cargo test --features loom --test loom_tests --release`
//!
//! Loom replaces `std`'s atomics with its own and exhaustively explores
//! thread interleavings, so the types under test here are small,
//! loom-only reimplementations of the real synchronization protocol
//! rather than instrumented production types — loom cannot run against
//! code built on `core`/`std` atomics, and the full `cmap` state space
//! is too large for loom to explore in reasonable time, so only `spin`
//! and the smallest ring variant are modeled.

#![cfg(feature = "loom")]

use loom::cell::UnsafeCell;
use loom::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use loom::sync::Arc;
use loom::thread;

/// Mirrors `spin::Spin`'s test-and-set protocol exactly.
struct LoomSpin {
    locked: AtomicBool,
}

impl LoomSpin {
    fn new() -> Self {
        Self {
            locked: AtomicBool::new(false),
        }
    }

    fn lock(&self) {
        loop {
            if !self.locked.swap(true, Ordering::Acquire) {
                return;
            }
            while self.locked.load(Ordering::Relaxed) {
                loom::thread::yield_now();
            }
        }
    }

    fn unlock(&self) {
        self.locked.store(false, Ordering::Release);
    }
}

#[test]
fn loom_spin_is_mutually_exclusive() {
    loom::model(|| {
        let spin = Arc::new(LoomSpin::new());
        let counter = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..2 {
            let spin = Arc::clone(&spin);
            let counter = Arc::clone(&counter);
            handles.push(thread::spawn(move || {
                spin.lock();
                let prev = counter.load(Ordering::Relaxed);
                counter.store(prev + 1, Ordering::Relaxed);
                spin.unlock();
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    });
}

/// Mirrors `ring::Spsc`'s two-slot turn protocol: a plain `tail`/`head`
/// owned by their respective side, synchronized by each slot's own `turn`.
struct LoomSpsc {
    turn: [AtomicUsize; 2],
    storage: [UnsafeCell<u64>; 2],
    tail: UnsafeCell<usize>,
    head: UnsafeCell<usize>,
}

unsafe impl Send for LoomSpsc {}
unsafe impl Sync for LoomSpsc {}

impl LoomSpsc {
    fn new() -> Self {
        Self {
            turn: [AtomicUsize::new(0), AtomicUsize::new(0)],
            storage: [UnsafeCell::new(0), UnsafeCell::new(0)],
            tail: UnsafeCell::new(0),
            head: UnsafeCell::new(0),
        }
    }

    fn try_push(&self, value: u64) -> bool {
        let tail = unsafe { self.tail.with(|p| *p) };
        let idx = tail & 1;
        let target = (tail >> 1) << 1;
        if self.turn[idx].load(Ordering::Acquire) != target {
            return false;
        }
        unsafe {
            self.tail.with_mut(|p| *p = tail + 1);
            self.storage[idx].with_mut(|p| *p = value);
        }
        self.turn[idx].store(target + 1, Ordering::Release);
        true
    }

    fn try_pop(&self) -> Option<u64> {
        let head = unsafe { self.head.with(|p| *p) };
        let idx = head & 1;
        let target = ((head >> 1) << 1) + 1;
        if self.turn[idx].load(Ordering::Acquire) != target {
            return None;
        }
        unsafe {
            self.head.with_mut(|p| *p = head + 1);
        }
        let value = unsafe { self.storage[idx].with(|p| *p) };
        self.turn[idx].store(target + 1, Ordering::Release);
        Some(value)
    }
}

#[test]
fn loom_spsc_single_item_round_trips() {
    loom::model(|| {
        let ring = Arc::new(LoomSpsc::new());
        let producer_ring = Arc::clone(&ring);

        let producer = thread::spawn(move || {
            assert!(producer_ring.try_push(42));
        });

        let mut received = None;
        for _ in 0..3 {
            if let Some(v) = ring.try_pop() {
                received = Some(v);
                break;
            }
            loom::thread::yield_now();
        }

        producer.join().unwrap();
        if received.is_none() {
            received = ring.try_pop();
        }
        assert_eq!(received, Some(42));
    });
}

#[test]
fn loom_spsc_never_loses_or_duplicates_two_items() {
    loom::model(|| {
        let ring = Arc::new(LoomSpsc::new());
        let producer_ring = Arc::clone(&ring);

        let producer = thread::spawn(move || {
            assert!(producer_ring.try_push(1));
            assert!(producer_ring.try_push(2));
        });

        let mut received = Vec::new();
        for _ in 0..6 {
            if let Some(v) = ring.try_pop() {
                received.push(v);
            }
            if received.len() == 2 {
                break;
            }
            loom::thread::yield_now();
        }
        producer.join().unwrap();
        while received.len() < 2 {
            if let Some(v) = ring.try_pop() {
                received.push(v);
            }
        }
        assert_eq!(received, vec![1, 2]);
    });
}
