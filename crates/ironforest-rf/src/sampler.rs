//! Deterministic seeded sampling for bootstraps, per-tree seeds, and
//! per-node feature subsets.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// A pseudo-random stream keyed by a single integer seed.
///
/// Backed by ChaCha8, whose output is specified independently of platform
/// and word size, so the same seed yields the same draws everywhere. Every
/// fit owns its samplers; none are shared between threads.
#[derive(Debug, Clone)]
pub struct SeededSampler {
    rng: ChaCha8Rng,
}

impl SeededSampler {
    /// Create a sampler whose stream is a function of `seed` alone.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Draw `n_samples` row indices uniformly from `[0, n_samples)` with replacement.
    ///
    /// Returns an empty vector when `n_samples` is zero.
    pub fn bootstrap(&mut self, n_samples: usize) -> Vec<usize> {
        if n_samples == 0 {
            return Vec::new();
        }
        (0..n_samples)
            .map(|_| self.rng.random_range(0..n_samples))
            .collect()
    }

    /// Draw the next seed from this stream.
    pub fn next_seed(&mut self) -> u64 {
        self.rng.random()
    }

    /// Split off an independent sampler seeded from this stream.
    pub fn derive(&mut self) -> Self {
        Self::new(self.next_seed())
    }

    /// Draw `k` distinct feature indices from `[0, n_features)`.
    ///
    /// Uses a partial Fisher-Yates shuffle over the first `k` positions.
    /// The result is sorted ascending so split evaluation visits features
    /// in index order. `k` is clamped to `n_features`.
    pub fn feature_subset(&mut self, n_features: usize, k: usize) -> Vec<usize> {
        let take = k.min(n_features);
        let mut order: Vec<usize> = (0..n_features).collect();
        for i in 0..take {
            let j = self.rng.random_range(i..n_features);
            order.swap(i, j);
        }
        order.truncate(take);
        order.sort_unstable();
        order
    }
}
