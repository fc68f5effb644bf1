//! A coarse lock over a stripe of buckets plus a conflict-detection counter.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

/// One segment: a coarse mutex guarding structural changes to its buckets,
/// and a monotonic timestamp bumped on every successful mutation so
/// lock-free readers can notice a concurrent insert/remove raced them.
pub(crate) struct Segment {
    mutex: Mutex<()>,
    timestamp: AtomicU32,
}

impl Segment {
    pub(crate) fn new() -> Self {
        Self {
            mutex: Mutex::new(()),
            timestamp: AtomicU32::new(0),
        }
    }

    /// Acquire the segment's coarse mutex. The guard is dropped to unlock.
    pub(crate) fn lock(&self) -> std::sync::MutexGuard<'_, ()> {
        self.mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Bump the conflict-detection timestamp. Lock-free: safe to call
    /// without holding the segment's mutex (used when reclaiming a bucket
    /// that belongs to a different segment than the one currently held).
    pub(crate) fn bump_timestamp(&self) {
        self.timestamp.fetch_add(1, Ordering::Release);
    }

    #[cfg(test)]
    pub(crate) fn timestamp(&self) -> u32 {
        self.timestamp.load(Ordering::Acquire)
    }
}
