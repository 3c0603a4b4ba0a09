//! Randomisation helpers for the queue
//!
//! Fisher-Yates over positions rather than tracks, so callers can follow
//! where a particular entry ended up even when ids repeat.

use rand::seq::SliceRandom;
use rand::Rng;

/// Random permutation of `0..len`
///
/// `order[new_position] == old_position`.
pub(crate) fn permutation<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Vec<usize> {
    let mut order: Vec<usize> = (0..len).collect();
    order.shuffle(rng);
    order
}

/// Uniform index in `0..len`, repeats allowed
pub(crate) fn random_index<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Option<usize> {
    (len > 0).then(|| rng.gen_range(0..len))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn permutation_contains_every_position_once() {
        let mut rng = StdRng::seed_from_u64(7);
        let order = permutation(25, &mut rng);

        let unique: HashSet<usize> = order.iter().copied().collect();
        assert_eq!(order.len(), 25);
        assert_eq!(unique.len(), 25);
        assert!(order.iter().all(|&i| i < 25));
    }

    #[test]
    fn permutation_of_empty_is_empty() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(permutation(0, &mut rng).is_empty());
    }

    #[test]
    fn random_index_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..500 {
            let index = random_index(3, &mut rng).unwrap();
            assert!(index < 3);
        }
        assert_eq!(random_index(0, &mut rng), None);
    }

    #[test]
    fn random_index_reaches_every_slot() {
        let mut rng = StdRng::seed_from_u64(3);
        let seen: HashSet<usize> = (0..200)
            .filter_map(|_| random_index(4, &mut rng))
            .collect();
        assert_eq!(seen.len(), 4);
    }
}
