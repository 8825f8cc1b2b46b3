//! Randomness sources.
//!
//! Every random attribute of an emitter is drawn from a `RandomSource`, so
//! the engine runs on the thread RNG in production and on a fixed value in
//! tests.

use rand::rngs::{StdRng, ThreadRng};
use rand::{Rng, SeedableRng};

/// A uniform generator over `[0, 1)`.
pub trait RandomSource {
    fn next_unit(&mut self) -> f64;

    /// Uniform value in `[min, max)`.
    fn in_range(&mut self, min: f64, max: f64) -> f64 {
        min + self.next_unit() * (max - min)
    }

    /// Uniform index in `[0, len)`. `len` must be non-zero.
    fn index(&mut self, len: usize) -> usize {
        ((self.next_unit() * len as f64) as usize).min(len - 1)
    }
}

/// Adapts any `rand` generator.
pub struct RngSource<R>(pub R);

impl<R: Rng> RandomSource for RngSource<R> {
    fn next_unit(&mut self) -> f64 {
        self.0.random::<f64>()
    }
}

impl RngSource<ThreadRng> {
    pub fn thread() -> Self {
        RngSource(rand::rng())
    }
}

impl RngSource<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        RngSource(StdRng::seed_from_u64(seed))
    }
}

/// Returns the same value for every draw.
#[derive(Debug, Clone, Copy)]
pub struct ConstantSource(pub f64);

impl RandomSource for ConstantSource {
    fn next_unit(&mut self) -> f64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_never_reaches_len() {
        let mut near_one = ConstantSource(0.999_999_999);
        assert_eq!(near_one.index(6), 5);
        let mut zero = ConstantSource(0.0);
        assert_eq!(zero.index(6), 0);
    }

    #[test]
    fn seeded_sources_agree() {
        let mut a = RngSource::seeded(7);
        let mut b = RngSource::seeded(7);
        for _ in 0..16 {
            let x = a.next_unit();
            assert_eq!(x, b.next_unit());
            assert!((0.0..1.0).contains(&x));
        }
    }
}
