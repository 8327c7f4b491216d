//! This module wraps the pseudo-random number engine of the "rand" ecosystem
//! behind the minimal interface that the analysis needs.

use crate::numeric::Float;
use rand::{Rng, SeedableRng};

// Select random number generation engine in use
#[cfg(feature = "f32")]
type Engine = rand_xoshiro::Xoshiro128Plus;
#[cfg(not(feature = "f32"))]
type Engine = rand_xoshiro::Xoshiro256Plus;

/// Seedable, splittable random number generator
#[derive(Clone, Debug)]
pub struct RandGenerator {
    rng: Engine,
}
//
impl RandGenerator {
    /// Spawn a new random number generator
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Engine::seed_from_u64(seed),
        }
    }

    /// Generate a random floating-point number in [0, 1)
    pub fn random(&mut self) -> Float {
        self.rng.gen()
    }

    /// Generate a random floating-point number in [min, max)
    pub fn uniform(&mut self, min: Float, max: Float) -> Float {
        min + (max - min) * self.random()
    }

    /// Advance state by a fixed, very large amount
    ///
    /// Used to give each batch of candidates its own non-overlapping stream
    /// of random numbers, whatever the number of numbers drawn per batch.
    ///
    pub fn jump(&mut self) {
        self.rng.jump();
    }
}
