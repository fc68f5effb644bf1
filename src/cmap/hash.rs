//! The fixed-seed, non-cryptographic hash used to place keys.
//!
//! Keyed with constant, non-secret seeds so that `hash_key` is deterministic
//! and pure within a process: the same key always lands in the same home
//! bucket for the lifetime of a table, with no claim of stability across
//! separate process runs.

use core::hash::{BuildHasher, Hash, Hasher};

use ahash::RandomState;

// Arbitrary, fixed, non-secret seed material for ahash's keyed constructor.
const SEED_STATE: RandomState = RandomState::with_seeds(
    0x243F_6A88_85A3_08D3,
    0x1319_8A2E_0370_7344,
    0xA409_3822_299F_31D0,
    0x082E_FA98_EC4E_6C89,
);

/// Hash `key` to a 32-bit value, deterministically within this process.
#[inline]
pub(crate) fn hash_key<K: Hash + ?Sized>(key: &K) -> u32 {
    let mut hasher = SEED_STATE.build_hasher();
    key.hash(&mut hasher);
    let full = hasher.finish();
    fold_reserved((full as u32) ^ ((full >> 32) as u32))
}

/// Fold the three bucket-state sentinel values (`0`, `1`, `2`) onto
/// non-reserved values so a cached hash never collides with a state marker.
/// Narrows the usable hash space by exactly three values out of 2^32.
#[inline]
pub(crate) fn fold_reserved(hash: u32) -> u32 {
    if hash <= 2 {
        hash + 3
    } else {
        hash
    }
}
