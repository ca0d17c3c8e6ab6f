//! Injectable randomness for event rolls and random grants.
//!
//! Every random decision the engine makes goes through [`RandomSource`], so
//! tests can script draws and replays can reuse a seed.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of the uniform draws the engine needs.
pub trait RandomSource: Send {
    /// Uniform float in `[0, 100)`.
    fn roll_percent(&mut self) -> f64;

    /// Uniform integer in `[min, max]`. Callers guarantee `min <= max`.
    fn range_inclusive(&mut self, min: u32, max: u32) -> u32;

    /// Uniform index in `[0, len)`. Returns 0 when `len` is 0.
    fn pick_index(&mut self, len: usize) -> usize;
}

/// Percentage check against a `[0, 100)` draw.
///
/// - percentage <= 0 never succeeds (no draw is consumed)
/// - percentage >= 100 always succeeds (no draw is consumed)
/// - otherwise succeeds iff draw < percentage
pub fn chance(rng: &mut dyn RandomSource, percentage: f64) -> bool {
    if percentage <= 0.0 || percentage.is_nan() {
        return false;
    }
    if percentage >= 100.0 {
        return true;
    }
    rng.roll_percent() < percentage
}

/// Seeded generator backed by [`StdRng`].
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededRandom {
    fn roll_percent(&mut self) -> f64 {
        self.rng.gen_range(0.0..100.0)
    }

    fn range_inclusive(&mut self, min: u32, max: u32) -> u32 {
        if min >= max {
            return min;
        }
        self.rng.gen_range(min..=max)
    }

    fn pick_index(&mut self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        self.rng.gen_range(0..len)
    }
}

impl std::fmt::Debug for SeededRandom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeededRandom").finish_non_exhaustive()
    }
}
