//! Injectable permutations for the matching layout

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Produces a permutation of `0..len`
pub trait Shuffler: Send + Sync {
    fn permutation(&mut self, len: usize) -> Vec<usize>;
}

/// Uniform random permutations
#[derive(Debug)]
pub struct RandomShuffler {
    rng: StdRng,
}

impl RandomShuffler {
    pub fn new() -> Self {
        Self { rng: StdRng::from_entropy() }
    }

    /// Reproducible sequence of permutations
    pub fn seeded(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }
}

impl Default for RandomShuffler {
    fn default() -> Self {
        Self::new()
    }
}

impl Shuffler for RandomShuffler {
    fn permutation(&mut self, len: usize) -> Vec<usize> {
        let mut order: Vec<usize> = (0..len).collect();
        order.shuffle(&mut self.rng);
        order
    }
}

/// Keeps catalog order
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityShuffler;

impl Shuffler for IdentityShuffler {
    fn permutation(&mut self, len: usize) -> Vec<usize> {
        (0..len).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_permutation(order: &[usize], len: usize) -> bool {
        let mut sorted = order.to_vec();
        sorted.sort_unstable();
        sorted == (0..len).collect::<Vec<_>>()
    }

    #[test]
    fn test_random_is_permutation() {
        let mut s = RandomShuffler::new();
        for len in [0, 1, 3, 8] {
            assert!(is_permutation(&s.permutation(len), len));
        }
    }

    #[test]
    fn test_seeded_is_reproducible() {
        let mut a = RandomShuffler::seeded(7);
        let mut b = RandomShuffler::seeded(7);
        assert_eq!(a.permutation(10), b.permutation(10));
    }

    #[test]
    fn test_identity() {
        assert_eq!(IdentityShuffler.permutation(3), vec![0, 1, 2]);
    }
}
