//! # hopcore
//!
//! A segment-striped hopscotch hash map and a family of slot-versioned ring
//! queues, built on a shared cache-line-aware spinlock.
//!
//! This crate covers three layers, leaves first:
//!
//! - [`spin`] — a single-word test-and-test-and-set spinlock, optionally
//!   cache-line padded.
//! - [`ring`] — bounded, array-backed, slot-versioned concurrent queues in
//!   three variants: [`ring::Spsc`], [`ring::Spmc`], [`ring::Mpsc`].
//! - [`cmap`] — a concurrent hash map ([`cmap::CMap`]) using hopscotch
//!   open-addressing, segment-striped coarse locks, and per-bucket
//!   spinlocks.
//!
//! `cmap` and `ring` are independent of one another; both are built on
//! `spin` and the bit-scan helpers in [`cc`]. Neither depends on any global
//! or process-wide state: every table and queue is an explicit, owned value.
//!
//! ## Non-goals
//!
//! `CMap` never resizes or rehashes — size it at construction via
//! [`cmap::CMapConfig`]. Neither `CMap` nor `ring` persist to disk, support
//! weak references, or provide snapshot iteration. Memory reclamation is
//! tied to the structural locks described above, not to an epoch or
//! hazard-pointer scheme.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![allow(clippy::module_inception)]

/// Compiler-compatibility bit manipulation primitives (`ffs`, `ctz`,
/// `popcount`, power-of-two rounding) shared by `ring` and `cmap`.
pub mod cc;

/// The CPU-pause/yield primitive used by every busy-wait loop in this
/// crate.
pub mod pr;

/// The cache-line-aware test-and-set spinlock shared by `ring` and `cmap`.
pub mod spin;

/// Slot-versioned bounded ring queues: [`ring::Spsc`], [`ring::Spmc`],
/// [`ring::Mpsc`].
pub mod ring;

/// Segment-striped hopscotch concurrent hash map.
pub mod cmap;

pub use cc::{ctz, ctz_u64, ffs, ffs_u64, next_power_of_two, popcount, popcount_u64};
pub use cmap::{CMap, CMapConfig};
pub use ring::{Mpsc, RingError, Spmc, Spsc};
pub use spin::{CachePadded, Spin};
