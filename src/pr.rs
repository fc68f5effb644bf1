//! The CPU-pause/yield primitive shared by `spin` and `ring`'s spin-wait loops.
//!
//! Busy-wait loops elsewhere in this crate express their memory ordering
//! directly via `Ordering::Acquire`/`Release` on the atomics they own; the one
//! thing they all need from this module is a portable way to tell the CPU
//! "spin, but cheaply" between polls.

/// Issue a CPU pause/yield hint.
///
/// On x86 this compiles to a `PAUSE` instruction, on ARM to `YIELD`; on other
/// targets it is typically a no-op. Reduces contention between hyperthreads
/// sharing a core during a busy-wait and gives the branch predictor a hint
/// that the loop is spinning.
#[inline(always)]
pub fn stall() {
    core::hint::spin_loop();
}
