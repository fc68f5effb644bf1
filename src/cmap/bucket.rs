//! A single hopscotch bucket: lock, hop bitmap, state, and inline storage.
//!
//! Each bucket carries a per-bucket spinlock, a small state word
//! (empty/occupied/transient-moved), and a `hop_info` bitmap recording which
//! of the next `HOP_RANGE` buckets are occupied by entries whose home is
//! this one.
//!
//! The cached-hash field is always present in the layout (`store_hash` is a
//! runtime config choice rather than a compile-time one, see DESIGN.md), and
//! `hop_info` is an `AtomicU32`: a home bucket's hop bitmap is read by
//! lookups that never take that bucket's own lock, so the field must be
//! genuinely atomic rather than a plain unsynchronized read.

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crate::spin::Spin;

/// A bucket's occupancy state.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum State {
    /// Not in use.
    Empty,
    /// Holds a live `(key, value)`, with its cached hash.
    Occupied(u32),
    /// Transient: an entry was just displaced out of here. Concurrent
    /// lock-free readers that observe this must restart their scan.
    Moved,
}

pub(crate) struct Bucket<K, V> {
    pub(crate) spin: Spin,
    state: UnsafeCell<State>,
    pub(crate) hop_info: AtomicU32,
    storage: UnsafeCell<MaybeUninit<(K, Arc<V>)>>,
}

impl<K, V> Bucket<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            spin: Spin::new(),
            state: UnsafeCell::new(State::Empty),
            hop_info: AtomicU32::new(0),
            storage: UnsafeCell::new(MaybeUninit::uninit()),
        }
    }

    /// Read the current state. Caller must hold `spin`.
    #[inline]
    pub(crate) unsafe fn state(&self) -> State {
        *self.state.get()
    }

    #[inline]
    pub(crate) unsafe fn is_empty(&self) -> bool {
        matches!(self.state(), State::Empty)
    }

    #[inline]
    pub(crate) unsafe fn is_moved(&self) -> bool {
        matches!(self.state(), State::Moved)
    }

    /// Claim an empty bucket as occupied by `hash`, without writing any
    /// data yet — a provisional marker placed during the free-bucket probe,
    /// filled in by a later `construct` or `move_into`.
    ///
    /// # Safety
    /// Caller must hold `spin` and the bucket must currently be `Empty`.
    #[inline]
    pub(crate) unsafe fn claim(&self, hash: u32) {
        *self.state.get() = State::Occupied(hash);
    }

    /// Write `(key, value)` into the bucket and mark it `Occupied` with the
    /// given cached hash — the state transition is part of `construct`
    /// itself, not assumed to already hold from a prior `claim`, since the
    /// bucket being constructed into may instead be a donor's vacated slot
    /// left in the `Moved` state by `move_into`.
    ///
    /// # Safety
    /// Caller must hold `spin`; the bucket must have no live storage to
    /// overwrite (i.e. not already `Occupied` with a constructed value).
    #[inline]
    pub(crate) unsafe fn construct(&self, hash: u32, key: K, value: Arc<V>) {
        (*self.storage.get()).write((key, value));
        *self.state.get() = State::Occupied(hash);
    }

    /// Borrow the stored key. Caller must hold `spin` and the bucket must
    /// be `Occupied` with a value already constructed.
    #[inline]
    pub(crate) unsafe fn key(&self) -> &K {
        &(*self.storage.get()).assume_init_ref().0
    }

    /// Clone the stored value handle. Caller must hold `spin` and the
    /// bucket must be `Occupied` with a value already constructed.
    #[inline]
    pub(crate) unsafe fn value_handle(&self) -> Arc<V> {
        Arc::clone(&(*self.storage.get()).assume_init_ref().1)
    }

    /// Remove and return the stored entry, resetting the bucket to empty.
    ///
    /// # Safety
    /// Caller must hold `spin`; the bucket must be `Occupied` with a value
    /// already constructed.
    #[inline]
    pub(crate) unsafe fn take(&self) -> (K, Arc<V>) {
        let entry = (*self.storage.get()).assume_init_read();
        *self.state.get() = State::Empty;
        entry
    }

    /// Reset a claimed-but-never-constructed bucket back to empty.
    ///
    /// Used on the displacement-failure path (see DESIGN.md) to avoid
    /// leaking the provisional claim made by the free-bucket probe.
    ///
    /// # Safety
    /// Caller must hold `spin`; the bucket must not have had `construct`
    /// called on it since its last `claim` (no storage to drop).
    #[inline]
    pub(crate) unsafe fn reset_claim_to_empty(&self) {
        *self.state.get() = State::Empty;
    }

    /// Move this bucket's constructed entry into `dest` (already `Occupied`
    /// via a prior `claim`, not yet constructed), then mark this bucket
    /// `Moved`.
    ///
    /// `dest`'s cached hash becomes this bucket's cached hash; this bucket
    /// never runs a destructor here — its storage is read out (not dropped)
    /// and ownership transfers whole.
    ///
    /// # Safety
    /// Caller must hold `self.spin`. `self` must be `Occupied` with a value
    /// constructed. `dest` must be `Occupied` from a bare `claim` with
    /// nothing constructed yet, and must not be reachable from any bucket's
    /// `hop_info` yet — which a freshly claimed bucket never is — so no
    /// separate lock on `dest` is required; nothing else can be touching it.
    #[inline]
    pub(crate) unsafe fn move_into(&self, dest: &Bucket<K, V>) {
        let hash = match self.state() {
            State::Occupied(h) => h,
            _ => unreachable!("move_into called on a non-occupied source bucket"),
        };
        let entry = (*self.storage.get()).assume_init_read();
        (*dest.storage.get()).write(entry);
        *dest.state.get() = State::Occupied(hash);
        *self.state.get() = State::Moved;
    }
}

impl<K, V> Drop for Bucket<K, V> {
    fn drop(&mut self) {
        if matches!(unsafe { *self.state.get() }, State::Occupied(_)) {
            unsafe {
                self.storage.get_mut().assume_init_drop();
            }
        }
    }
}

unsafe impl<K: Send, V: Send + Sync> Send for Bucket<K, V> {}
unsafe impl<K: Send, V: Send + Sync> Sync for Bucket<K, V> {}
