//! The cache-line-aware busy-wait lock shared by `ring` and `cmap`.
//!
//! `Spin` is a plain test-and-set lock: no exponential backoff, no fairness.
//! Contended callers spin tightly on a relaxed load until the flag reads
//! free, then retry the acquire — cmap locks one bucket at a time for a
//! handful of instructions, so growing the wait with backoff is not worth
//! the complexity.
//!
//! [`CachePadded`] wraps a `Spin` when a lock would otherwise false-share a
//! cache line with a hot neighbor (e.g. a segment's atomic timestamp sitting
//! next to its mutex). cmap's per-bucket lock, by contrast, stays unpadded:
//! there are many buckets and padding each one to 64 bytes would bloat the
//! table far past its useful working set.

use core::sync::atomic::{AtomicBool, Ordering};

use crate::pr;

pub use crossbeam_utils::CachePadded;

/// A test-and-set spinlock with no internal state beyond the flag itself.
///
/// Unlike `std::sync::Mutex`, `Spin` does not wrap the data it protects —
/// cmap's displacement algorithm must hold several bucket locks at once in
/// ways that don't fit a single RAII guard (lock `A`, construct into a
/// bucket reached through `B`, unlock `A`, ...), so callers pair `lock`/
/// `unlock` explicitly.
#[derive(Debug, Default)]
pub struct Spin {
    locked: AtomicBool,
}

impl Spin {
    /// Create a new, unlocked spinlock.
    #[inline]
    pub const fn new() -> Self {
        Self {
            locked: AtomicBool::new(false),
        }
    }

    /// Block until the caller acquires exclusive ownership.
    ///
    /// Never recursive: calling `lock` again from the same thread while
    /// already holding it deadlocks.
    #[inline]
    pub fn lock(&self) {
        loop {
            if !self.locked.swap(true, Ordering::Acquire) {
                return;
            }
            while self.locked.load(Ordering::Relaxed) {
                pr::stall();
            }
        }
    }

    /// Try to acquire without blocking. Returns `true` on success.
    #[inline]
    pub fn try_lock(&self) -> bool {
        !self.locked.swap(true, Ordering::Acquire)
    }

    /// Release the lock.
    ///
    /// Undefined behavior (in the sense of leaving the lock in whatever
    /// state a concurrent holder left it) if the caller does not currently
    /// hold it — `Spin` trusts its callers and is not exposed as a safe,
    /// guard-based API.
    #[inline]
    pub fn unlock(&self) {
        self.locked.store(false, Ordering::Release);
    }

    /// Best-effort check of whether the lock is currently held. Racy by
    /// construction; useful only for diagnostics and tests.
    #[inline]
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Relaxed)
    }
}

unsafe impl Send for Spin {}
unsafe impl Sync for Spin {}
