/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Random sources for the poster selector.
//!
//! The selector only ever needs "a uniform integer below `bound`", so the seam
//! is that single method.  Production uses [`StdRandom`]; tests either seed it
//! or substitute a scripted source.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Supplies uniformly distributed integers.
pub trait RandomSource {
    /// Returns a value in `[0, bound)`.  `bound` is always at least 1.
    fn next_below(&mut self, bound: u32) -> u32;
}

/// [`RandomSource`] backed by `rand`'s [`StdRng`].
#[derive(Debug, Clone)]
pub struct StdRandom {
    rng: StdRng,
}

impl StdRandom {
    /// Deterministic source: the same seed yields the same sequence.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Source seeded from operating-system entropy.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl Default for StdRandom {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl RandomSource for StdRandom {
    fn next_below(&mut self, bound: u32) -> u32 {
        self.rng.gen_range(0..bound)
    }
}
