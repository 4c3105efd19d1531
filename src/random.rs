//! Random variates consumed by index construction and repair.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

/// Source of the three variates the index needs.
///
/// Implemented for every [`rand::Rng`]; pass a seeded generator (see [`seeded`]) for
/// reproducible indexes.
pub trait RandomSource {
    /// Uniform real in `[0, 1)`.
    fn uniform_real(&mut self) -> f64;

    /// Uniform integer in `[0, k)`. `k` must be positive.
    fn uniform_int(&mut self, k: usize) -> usize;

    /// Number of Bernoulli(`p`) trials up to and including the first success (`>= 1`).
    fn geometric(&mut self, p: f64) -> usize {
        debug_assert!(p > 0.0 && p <= 1.0, "geometric p out of range: {p}");
        if p >= 1.0 {
            return 1;
        }
        // inverse CDF on (0, 1]
        let u = 1.0 - self.uniform_real();
        let trials = (u.ln() / (1.0 - p).ln()).ceil();
        (trials as usize).max(1)
    }

    fn coin(&mut self, p: f64) -> bool {
        self.uniform_real() < p
    }
}

impl<R: Rng> RandomSource for R {
    fn uniform_real(&mut self) -> f64 {
        self.random::<f64>()
    }

    fn uniform_int(&mut self, k: usize) -> usize {
        self.random_range(0..k)
    }
}

pub fn seeded(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

#[cfg(feature = "parallel")]
pub(crate) fn mix64(mut x: u64) -> u64 {
    x ^= x >> 30;
    x = x.wrapping_mul(0xbf58476d1ce4e5b9);
    x ^= x >> 27;
    x = x.wrapping_mul(0x94d049bb133111eb);
    x ^= x >> 31;
    x
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geometric_is_at_least_one_and_certain_at_p_one() {
        let mut rng = seeded(3);
        for _ in 0..1_000 {
            assert!(rng.geometric(0.3) >= 1);
            assert_eq!(rng.geometric(1.0), 1);
        }
    }

    #[test]
    fn geometric_mean_is_close_to_inverse_p() {
        let mut rng = seeded(11);
        let n = 20_000;
        let p = 0.25;
        let total: usize = (0..n).map(|_| rng.geometric(p)).sum();
        let mean = total as f64 / n as f64;
        assert!((mean - 1.0 / p).abs() < 0.15, "mean={mean}");
    }

    #[test]
    fn uniform_int_stays_in_range() {
        let mut rng = seeded(5);
        for _ in 0..1_000 {
            assert!(rng.uniform_int(7) < 7);
            let x = rng.uniform_real();
            assert!((0.0..1.0).contains(&x));
        }
    }
}
