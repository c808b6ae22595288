//! Deterministic level sampling.
//!
//! HNSW assigns each inserted node a random layer so that higher layers hold
//! exponentially fewer nodes. We need that draw to be reproducible across
//! runs (property tests rebuild the same graph from the same seed and expect
//! the same shape), so level sampling goes through a seeded
//! `rand_chacha::ChaCha8Rng` rather than thread-local randomness.

use rand::Rng;
use rand_chacha::ChaCha8Rng;

/// Sample a level via `floor(-ln(U) * m / m_max0)`, capped at `ml`.
///
/// `U` is drawn uniformly from `(0, 1]` — `rng.gen::<f64>()` returns `[0,
/// 1)`, so we take its complement to exclude zero and avoid an infinite
/// level from `ln(0)`.
pub fn sample_level(rng: &mut ChaCha8Rng, m: usize, m_max0: usize, ml: usize) -> usize {
    let u: f64 = 1.0 - rng.gen::<f64>();
    let level = (-u.ln() * (m as f64) / (m_max0 as f64)).floor();
    let level = if level.is_finite() && level > 0.0 {
        level as usize
    } else {
        0
    };
    level.min(ml)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn levels_are_capped_and_reproducible() {
        let mut a = ChaCha8Rng::seed_from_u64(7);
        let mut b = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..200 {
            assert_eq!(sample_level(&mut a, 16, 32, 9), sample_level(&mut b, 16, 32, 9));
        }
    }

    #[test]
    fn most_levels_are_zero() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let zero_count = (0..1000)
            .filter(|_| sample_level(&mut rng, 16, 32, 9) == 0)
            .count();
        assert!(zero_count > 400, "expected most levels to be 0, got {zero_count}/1000");
    }
}
