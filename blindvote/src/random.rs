use rand::rngs::OsRng;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Source of the commission's cut-and-choose decisions
pub trait RandomProvider {
    /// A uniformly random index in `0..len`. `len` is never zero.
    fn next_index(&mut self, len: usize) -> usize;

    /// A uniformly random element of `items`, or `None` if it is empty
    fn next_item<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T>
    where
        Self: Sized,
    {
        if items.is_empty() {
            return None;
        }
        items.get(self.next_index(items.len()))
    }
}

/// Draws from the operating system's CSPRNG. Unpredictable to voters.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsRandomProvider;

impl RandomProvider for OsRandomProvider {
    fn next_index(&mut self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        OsRng.gen_range(0..len)
    }
}

/// ChaCha20 seeded from a fixed value, for reproducible simulations
#[derive(Debug, Clone)]
pub struct SeededRandomProvider {
    rng: ChaCha20Rng,
}

impl SeededRandomProvider {
    pub fn new(seed: u64) -> Self {
        SeededRandomProvider {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }
}

impl RandomProvider for SeededRandomProvider {
    fn next_index(&mut self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        self.rng.gen_range(0..len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indexes_stay_in_bounds() {
        let mut os = OsRandomProvider;
        let mut seeded = SeededRandomProvider::new(7);
        for len in 1..20 {
            assert!(os.next_index(len) < len);
            assert!(seeded.next_index(len) < len);
        }
        assert_eq!(os.next_index(0), 0);
    }

    #[test]
    fn seeded_provider_is_reproducible() {
        let mut a = SeededRandomProvider::new(42);
        let mut b = SeededRandomProvider::new(42);
        let first: Vec<usize> = (0..32).map(|_| a.next_index(10)).collect();
        let second: Vec<usize> = (0..32).map(|_| b.next_index(10)).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn next_item_picks_from_the_slice() {
        let items = [1, 2, 3];
        let mut provider = SeededRandomProvider::new(1);
        assert!(items.contains(provider.next_item(&items).unwrap()));

        let empty: [u8; 0] = [];
        assert!(provider.next_item(&empty).is_none());
    }
}
