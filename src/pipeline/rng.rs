//! Deterministic RNG
//!
//! All randomness in a run flows through one PCG generator seeded once, so
//! a fixed seed reproduces every realized parameter and noise sample.

use rand::SeedableRng;
use rand_pcg::Pcg64;

/// Generator type used for every run
pub type PipelineRng = Pcg64;

/// Creates a PCG64 RNG from a 64-bit seed
pub fn create_rng(seed: u64) -> PipelineRng {
    Pcg64::seed_from_u64(seed)
}

/// Draw a fresh seed from OS entropy, for runs without a configured seed
pub fn entropy_seed() -> u64 {
    rand::random()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_rng_determinism() {
        let mut rng1 = create_rng(42);
        let mut rng2 = create_rng(42);

        let values1: Vec<f32> = (0..100).map(|_| rng1.gen()).collect();
        let values2: Vec<f32> = (0..100).map(|_| rng2.gen()).collect();

        assert_eq!(values1, values2);
    }

    #[test]
    fn test_different_seeds_produce_different_sequences() {
        let mut rng1 = create_rng(42);
        let mut rng2 = create_rng(43);

        let values1: Vec<f32> = (0..10).map(|_| rng1.gen()).collect();
        let values2: Vec<f32> = (0..10).map(|_| rng2.gen()).collect();

        assert_ne!(values1, values2);
    }
}
