// Copyright (c) 2023 Mike Tsao. All rights reserved.

//! A small random-number generator for jittering test input.

use std::time::{SystemTime, UNIX_EPOCH};

/// Wraps [oorandom::Rand64]. Seed it explicitly when a run needs to be
/// reproducible.
#[derive(Debug)]
pub struct Rng(oorandom::Rand64);
impl Default for Rng {
    fn default() -> Self {
        // This is an awful source of entropy, but it's fine for this use case
        // where we just want a different sequence each run.
        Self::new_with_seed(
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos())
                .unwrap_or_default(),
        )
    }
}
#[allow(missing_docs)]
impl Rng {
    pub fn new_with_seed(seed: u128) -> Self {
        Self(oorandom::Rand64::new(seed))
    }

    pub fn rand_u64(&mut self) -> u64 {
        self.0.rand_u64()
    }

    pub fn rand_float(&mut self) -> f64 {
        self.0.rand_float()
    }

    pub fn rand_range(&mut self, range: std::ops::Range<u64>) -> u64 {
        self.0.rand_range(range)
    }

    /// A float uniformly distributed in `low..high`.
    pub fn rand_float_range(&mut self, low: f64, high: f64) -> f64 {
        low + self.rand_float() * (high - low)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mainline() {
        let mut r = Rng::default();

        assert_ne!(r.rand_u64(), r.rand_u64());
    }

    #[test]
    fn seeded_sequences_repeat() {
        let mut a = Rng::new_with_seed(42);
        let mut b = Rng::new_with_seed(42);
        for _ in 0..10 {
            assert_eq!(a.rand_u64(), b.rand_u64());
        }
        let f = a.rand_float_range(2.0, 3.0);
        assert!((2.0..3.0).contains(&f));
    }
}
