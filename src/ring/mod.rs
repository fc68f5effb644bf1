//! Bounded, array-backed, slot-versioned concurrent queues.
//!
//! Three variants share a slot protocol (`base`/`slot`) and differ only in
//! how producers and consumers claim indices:
//!
//! * [`Spsc`] — single producer, single consumer: both indices are plain.
//! * [`Spmc`] — single producer, many consumers: consumers CAS `head`.
//! * [`Mpsc`] — many producers, single consumer: producers CAS `tail`.
//!
//! A turn-versioned slot protocol rather than a plain head/tail-gap ring
//! means producers and consumers never need a separate emptiness flag
//! alongside the indices — occupancy is read directly off each slot's
//! `turn`.

mod base;
mod mpsc;
mod slot;
mod spmc;
mod spsc;

pub use base::RingError;
pub use mpsc::Mpsc;
pub use spmc::Spmc;
pub use spsc::Spsc;
