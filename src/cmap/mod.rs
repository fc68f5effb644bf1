//! A segment-striped hopscotch hash map.
//!
//! `B` buckets are laid out across `S` segments, each bucket carrying its
//! own spinlock and a 32-bit hop bitmap recording which of the next
//! `HOP_RANGE` buckets hold an entry whose home is this one. Lookups lock
//! only the candidate bucket; inserts and removes lock the owning segment
//! plus the target bucket; displacement may additionally lock one
//! neighboring segment, released before the segment lock the caller already
//! holds.
//!
//! See DESIGN.md for the reasoning behind a few edge-case choices: the
//! displacement-failure reclaim of a claimed-but-unconstructed bucket, the
//! segment-membership formula (`index & segment_mask`, not a contiguous
//! range), and why `get` returns `None` unconditionally once it exhausts a
//! home bucket's hop bits.

mod bucket;
mod hash;
mod segment;

use std::hash::Hash;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::cc::next_power_of_two;

use bucket::{Bucket, State};
use hash::hash_key;
use segment::Segment;

/// Entries within this many slots of a bucket's home are reachable from its
/// hop bitmap. Matches the bitmap's width: one bit per candidate slot.
const HOP_RANGE: u32 = 32;

/// How far past a home bucket `set` will probe for a free slot before
/// giving up. Sized to leave generous overflow room past `HOP_RANGE`.
const ADD_RANGE: u32 = 1024;

/// Default bucket count per segment, used when a caller doesn't size
/// segments explicitly.
const SEGMENT_RANGE: usize = 4096;

/// Above this occupancy fraction, `set` is expected to start failing more
/// often as displacement runs out of room; purely advisory, not enforced.
const MAX_LOAD_FACTOR: f64 = 0.82;

/// Sizing knobs for [`CMap::new`].
#[derive(Clone, Copy, Debug)]
pub struct CMapConfig {
    /// Rounded up to the next power of two; at least this many buckets are
    /// allocated for the table's primary range (before the overflow tail).
    pub expected_buckets: usize,
    /// Rounded up to the next power of two. `0` picks a segment count that
    /// gives each segment roughly `SEGMENT_RANGE` buckets.
    pub expected_segments: usize,
    /// Whether each bucket caches its key's hash alongside the state word,
    /// letting lookups skip a key comparison on a cached-hash mismatch.
    pub store_hash: bool,
}

impl Default for CMapConfig {
    fn default() -> Self {
        Self {
            expected_buckets: SEGMENT_RANGE,
            expected_segments: 0,
            store_hash: true,
        }
    }
}

/// A concurrent hopscotch hash map.
///
/// `set` never overwrites an existing key. `get` returns a cloned `Arc<V>`
/// handle whose lifetime is independent of later table mutations — a value
/// obtained before a concurrent `remove` of the same key stays valid.
pub struct CMap<K, V> {
    bucket_mask: u32,
    segment_mask: u32,
    store_hash: bool,
    buckets: Box<[Bucket<K, V>]>,
    segments: Box<[Segment]>,
}

impl<K, V> CMap<K, V>
where
    K: Hash + Eq,
{
    /// Build a new table. Returns the table and its advisory capacity
    /// (`bucket_count * MAX_LOAD_FACTOR`, rounded).
    pub fn new(config: CMapConfig) -> (Self, usize) {
        let bucket_count = next_power_of_two(config.expected_buckets.max(1)).max(SEGMENT_RANGE);
        let segment_count = if config.expected_segments > 0 {
            next_power_of_two(config.expected_segments)
        } else {
            next_power_of_two((bucket_count / SEGMENT_RANGE).max(1))
        };

        let bucket_mask = (bucket_count - 1) as u32;
        let segment_mask = (segment_count - 1) as u32;

        // Primary range plus an overflow tail so a home bucket near the end
        // of the primary range can still probe ADD_RANGE slots ahead, plus
        // one extra slot of room for the last home bucket's displacement.
        let total_buckets = bucket_count + ADD_RANGE as usize + 1;
        let buckets = (0..total_buckets)
            .map(|_| Bucket::new())
            .collect::<Vec<_>>()
            .into_boxed_slice();
        let segments = (0..segment_count)
            .map(|_| Segment::new())
            .collect::<Vec<_>>()
            .into_boxed_slice();

        let advisory_capacity = (bucket_count as f64 * MAX_LOAD_FACTOR).round() as usize;
        (
            Self {
                bucket_mask,
                segment_mask,
                store_hash: config.store_hash,
                buckets,
                segments,
            },
            advisory_capacity,
        )
    }

    #[inline]
    fn home_of(&self, hash: u32) -> u32 {
        hash & self.bucket_mask
    }

    #[inline]
    fn segment_of(&self, bucket_index: u32) -> usize {
        (bucket_index & self.segment_mask) as usize
    }

    #[inline]
    fn bucket_matches(&self, bucket: &Bucket<K, V>, hash: u32, key: &K) -> bool {
        match unsafe { bucket.state() } {
            State::Occupied(cached) => {
                if self.store_hash && cached != hash {
                    false
                } else {
                    unsafe { bucket.key() == key }
                }
            }
            _ => false,
        }
    }

    /// Look up `key`, returning a cloned value handle if present.
    ///
    /// Lock-free over the segment: only the candidate bucket's spinlock is
    /// taken, one at a time. If a candidate is observed `Moved` mid-scan
    /// (a concurrent displacement raced this lookup), the scan restarts
    /// from the home bucket's hop bitmap. Once the hop bits are exhausted
    /// with no match, the key is absent — even if a concurrent insert into
    /// the same segment is in flight and would, if awaited, have produced a
    /// hit. `get` does not retry on that race (see DESIGN.md); a caller
    /// that needs a stronger guarantee should retry `get` itself.
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        let hash = hash_key(key);
        let home = self.home_of(hash);

        'restart: loop {
            let mut remaining = self.buckets[home as usize].hop_info.load(Ordering::Acquire);
            while remaining != 0 {
                let d = remaining.trailing_zeros();
                remaining &= !(1 << d);
                let bucket = &self.buckets[(home + d) as usize];

                bucket.spin.lock();
                let state = unsafe { bucket.state() };
                if matches!(state, State::Moved) {
                    bucket.spin.unlock();
                    continue 'restart;
                }
                if self.bucket_matches(bucket, hash, key) {
                    let value = unsafe { bucket.value_handle() };
                    bucket.spin.unlock();
                    return Some(value);
                }
                bucket.spin.unlock();
            }
            return None;
        }
    }

    /// `true` if `key` is present.
    pub fn contains(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Insert `key -> value` if `key` is not already present.
    ///
    /// Returns `false` without modifying the table if `key` already exists,
    /// or if no free bucket could be brought within `HOP_RANGE` of `key`'s
    /// home (the neighborhood is saturated).
    pub fn set(&self, key: K, value: V) -> bool {
        let hash = hash_key(&key);
        let home = self.home_of(hash);
        let home_segment_idx = self.segment_of(home);
        let segment = &self.segments[home_segment_idx];
        let _segment_guard = segment.lock();

        let mut existing = self.buckets[home as usize].hop_info.load(Ordering::Acquire);
        while existing != 0 {
            let d = existing.trailing_zeros();
            existing &= !(1 << d);
            let bucket = &self.buckets[(home + d) as usize];
            bucket.spin.lock();
            let matched = self.bucket_matches(bucket, hash, &key);
            bucket.spin.unlock();
            if matched {
                return false;
            }
        }

        let mut free_idx = home;
        let mut free_dist: u32 = 0;
        let mut claimed = false;
        while free_dist < ADD_RANGE {
            let candidate = home + free_dist;
            let bucket = &self.buckets[candidate as usize];
            bucket.spin.lock();
            if unsafe { bucket.is_empty() } {
                unsafe {
                    bucket.claim(hash);
                }
                bucket.spin.unlock();
                free_idx = candidate;
                claimed = true;
                break;
            }
            bucket.spin.unlock();
            free_dist += 1;
        }
        if !claimed {
            return false;
        }

        let value = Arc::new(value);
        loop {
            if free_dist < HOP_RANGE {
                let bucket = &self.buckets[free_idx as usize];
                bucket.spin.lock();
                unsafe {
                    bucket.construct(hash, key, value);
                }
                bucket.spin.unlock();
                self.buckets[home as usize]
                    .hop_info
                    .fetch_or(1 << free_dist, Ordering::AcqRel);
                segment.bump_timestamp();
                return true;
            }

            if self.find_closer_free_bucket(home_segment_idx, &mut free_idx, &mut free_dist) {
                continue;
            }

            // Displacement exhausted with no donor in range: the bucket
            // claimed above would otherwise leak as a permanently
            // unreachable Occupied placeholder. Reclaim it.
            let owner_segment_idx = self.segment_of(free_idx);
            let bucket = &self.buckets[free_idx as usize];
            bucket.spin.lock();
            unsafe {
                bucket.reset_claim_to_empty();
            }
            bucket.spin.unlock();
            if owner_segment_idx != home_segment_idx {
                self.segments[owner_segment_idx].bump_timestamp();
            }
            segment.bump_timestamp();
            return false;
        }
    }

    /// Hunt for an occupied bucket within `(free_idx - HOP_RANGE, free_idx)`
    /// whose own home is closer to `free_idx`, and move it into `free_idx`,
    /// shrinking the displacement distance.
    ///
    /// On success, updates `*free_idx`/`*free_dist` to the vacated bucket
    /// (now closer to home) and returns `true`. Returns `false` if no
    /// bucket in the whole `HOP_RANGE` window ahead of any candidate home
    /// could donate a slot.
    fn find_closer_free_bucket(
        &self,
        home_segment_idx: usize,
        free_idx: &mut u32,
        free_dist: &mut u32,
    ) -> bool {
        let free = *free_idx;

        // Walk candidate homes from farthest to nearest; `j` is the distance
        // from each candidate home to `free`, so `candidate_home + j == free`
        // always, and `candidate_home` ranges from `free - (HOP_RANGE - 1)`
        // up to `free - 1` as `j` counts down.
        for j in (1..HOP_RANGE).rev() {
            let candidate_home = free - j;
            let hop = self.buckets[candidate_home as usize]
                .hop_info
                .load(Ordering::Acquire);
            if hop == 0 {
                continue;
            }
            // Only donors strictly closer to candidate_home than j matter:
            // moving them to `free` must shrink, not grow, their distance.
            let mask = hop & ((1u32 << j) - 1);
            if mask == 0 {
                continue;
            }
            let p = mask.trailing_zeros();

            let candidate_segment_idx = self.segment_of(candidate_home);
            let extra_guard = if candidate_segment_idx != home_segment_idx {
                Some(self.segments[candidate_segment_idx].lock())
            } else {
                None
            };

            // Re-check after the extra lock: another thread may have
            // already changed this home's hop bitmap.
            let hop_now = self.buckets[candidate_home as usize]
                .hop_info
                .load(Ordering::Acquire);
            if hop_now != hop {
                drop(extra_guard);
                continue;
            }

            let donor_idx = candidate_home + p;
            let donor = &self.buckets[donor_idx as usize];
            let dest = &self.buckets[free as usize];

            donor.spin.lock();
            unsafe {
                donor.move_into(dest);
            }
            donor.spin.unlock();

            let new_hop = (hop & !(1 << p)) | (1 << j);
            self.buckets[candidate_home as usize]
                .hop_info
                .store(new_hop, Ordering::Release);

            if candidate_segment_idx != home_segment_idx {
                self.segments[candidate_segment_idx].bump_timestamp();
            }
            drop(extra_guard);

            *free_idx = donor_idx;
            *free_dist -= j - p;
            return true;
        }
        false
    }

    /// Remove `key`. Returns `true` if it was present.
    pub fn remove(&self, key: &K) -> bool {
        let hash = hash_key(key);
        let home = self.home_of(hash);
        let segment_idx = self.segment_of(home);
        let segment = &self.segments[segment_idx];
        let _guard = segment.lock();

        let mut remaining = self.buckets[home as usize].hop_info.load(Ordering::Acquire);
        while remaining != 0 {
            let d = remaining.trailing_zeros();
            remaining &= !(1 << d);
            let bucket = &self.buckets[(home + d) as usize];

            bucket.spin.lock();
            let matched = self.bucket_matches(bucket, hash, key);
            if matched {
                unsafe {
                    bucket.take();
                }
                bucket.spin.unlock();
                self.buckets[home as usize]
                    .hop_info
                    .fetch_and(!(1 << d), Ordering::AcqRel);
                segment.bump_timestamp();
                return true;
            }
            bucket.spin.unlock();
        }
        false
    }
}

unsafe impl<K: Send, V: Send + Sync> Send for CMap<K, V> {}
unsafe impl<K: Send, V: Send + Sync> Sync for CMap<K, V> {}
