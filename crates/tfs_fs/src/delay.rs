//! Synthetic storage-access latency.
//!
//! The original project modeled secondary-storage access latency with a
//! busy loop defeating the optimizer via an inline-asm memory clobber. We
//! get the same effect portably with [`std::hint::black_box`]: it forces
//! the compiler to treat the loop counter as having escaped, so the loop
//! cannot be folded away even though it has no observable side effect.

use std::hint::black_box;

use tfs_types::DELAY;

/// Spends roughly `DELAY` iterations of a black-boxed counter, simulating
/// the latency of a disk access. This is a configuration knob, not a
/// correctness requirement: every table access that reads "disk" state
/// calls this once.
pub fn insert_delay() {
    let mut counter = 0u64;
    for _ in 0..DELAY {
        counter = black_box(counter.wrapping_add(1));
    }
    black_box(counter);
}
