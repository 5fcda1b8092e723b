//! Deterministic random number generation for search and self-play.
//!
//! ## Key Features
//!
//! - **Deterministic**: Same seed produces identical sequence
//! - **Forkable**: Derive independent streams (one per game, one per search)
//! - **Dirichlet noise**: Root exploration noise from Gamma variates
//!
//! ```
//! use alphazero::core::GameRng;
//!
//! let mut rng = GameRng::new(42);
//! let mut search_rng = rng.fork();
//!
//! // Forks are deterministic: same parent seed, same fork sequence
//! let mut rng2 = GameRng::new(42);
//! let mut search_rng2 = rng2.fork();
//! assert_eq!(search_rng.gen_range_usize(0..100), search_rng2.gen_range_usize(0..100));
//! ```

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Gamma};

/// Deterministic RNG with forking.
///
/// Uses ChaCha8 for speed while keeping good statistical quality.
#[derive(Clone, Debug)]
pub struct GameRng {
    inner: ChaCha8Rng,
    seed: u64,
    fork_counter: u64,
}

impl GameRng {
    /// Create a new RNG with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
            fork_counter: 0,
        }
    }

    /// The seed this RNG was created from.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Fork this RNG to create an independent stream.
    ///
    /// Each fork produces a different but deterministic sequence.
    #[must_use]
    pub fn fork(&mut self) -> Self {
        self.fork_counter += 1;
        let fork_seed = self.seed.wrapping_add(self.fork_counter.wrapping_mul(0x9E3779B97F4A7C15));
        Self {
            inner: ChaCha8Rng::seed_from_u64(fork_seed),
            seed: fork_seed,
            fork_counter: 0,
        }
    }

    /// Generate a random usize in the given range.
    pub fn gen_range_usize(&mut self, range: std::ops::Range<usize>) -> usize {
        self.inner.gen_range(range)
    }

    /// Generate a uniform float in `[0, 1)`.
    pub fn gen_f32(&mut self) -> f32 {
        self.inner.gen::<f32>()
    }

    /// Shuffle a slice in place.
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        use rand::seq::SliceRandom;
        slice.shuffle(&mut self.inner);
    }

    /// Choose an index with probability proportional to its weight.
    ///
    /// Weights do not need to sum to 1.0. Zero-weight entries are never
    /// chosen. Returns `None` if weights are empty or all zero.
    pub fn choose_weighted(&mut self, weights: &[f32]) -> Option<usize> {
        let total: f32 = weights.iter().filter(|w| **w > 0.0).sum();
        if total <= 0.0 {
            return None;
        }

        let mut threshold = self.inner.gen::<f32>() * total;

        for (i, &weight) in weights.iter().enumerate() {
            if weight <= 0.0 {
                continue;
            }
            threshold -= weight;
            if threshold <= 0.0 {
                return Some(i);
            }
        }

        // Rounding left a sliver of mass: take the last positive weight
        weights.iter().rposition(|w| *w > 0.0)
    }

    /// Sample a symmetric Dirichlet(alpha) vector of length `n`.
    ///
    /// Built from normalised Gamma(alpha, 1) variates. Returns an empty
    /// vector for `n == 0` and `[1.0]` for `n == 1`.
    ///
    /// # Panics
    ///
    /// Panics if `alpha` is not strictly positive and finite.
    pub fn dirichlet(&mut self, alpha: f32, n: usize) -> Vec<f32> {
        match n {
            0 => return Vec::new(),
            1 => return vec![1.0],
            _ => {}
        }

        let gamma = match Gamma::new(f64::from(alpha), 1.0) {
            Ok(gamma) => gamma,
            Err(e) => panic!("invalid Dirichlet alpha {alpha}: {e}"),
        };
        let mut samples: Vec<f32> = (0..n).map(|_| gamma.sample(&mut self.inner) as f32).collect();

        let sum: f32 = samples.iter().sum();
        if sum > 0.0 {
            for s in &mut samples {
                *s /= sum;
            }
        } else {
            samples.fill(1.0 / n as f32);
        }

        samples
    }
}
