//! Deterministic seeded shuffling.
//!
//! Every attempt is driven by a single `u32` seed. Replaying a stored seed
//! through [`seeded_shuffle`] reproduces the exact question and option order
//! the learner saw, on any platform.

use rand::Rng;

/// 32-bit xorshift generator (13/17/5).
///
/// A zero state is a fixed point: every draw is `0.0`. This is intentional,
/// seed `0` must shuffle the same way everywhere rather than be remapped.
#[derive(Debug, Clone)]
pub struct XorShift32 {
    state: u32,
}

impl XorShift32 {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Advance the generator and return the raw state.
    pub fn next_u32(&mut self) -> u32 {
        let mut s = self.state;
        s ^= s << 13;
        s ^= s >> 17;
        s ^= s << 5;
        self.state = s;
        s
    }

    /// Next draw in `[0, 1)`.
    pub fn next_unit(&mut self) -> f64 {
        f64::from(self.next_u32()) / 4_294_967_296.0
    }
}

/// Return a permuted copy of `items` using Fisher–Yates driven by `seed`.
pub fn seeded_shuffle<T: Clone>(items: &[T], seed: u32) -> Vec<T> {
    let mut out = items.to_vec();
    shuffle_in_place(&mut out, seed);
    out
}

/// Shuffle `items` in place; same permutation as [`seeded_shuffle`].
pub fn shuffle_in_place<T>(items: &mut [T], seed: u32) {
    let mut rng = XorShift32::new(seed);
    for i in (1..items.len()).rev() {
        let j = (rng.next_unit() * (i + 1) as f64).floor() as usize;
        items.swap(i, j);
    }
}

/// The permutation `seed` induces on `len` positions.
///
/// `result[new_position] == old_position`.
pub fn permutation(len: usize, seed: u32) -> Vec<usize> {
    let identity: Vec<usize> = (0..len).collect();
    seeded_shuffle(&identity, seed)
}

/// Produce a fresh seed for a new attempt.
///
/// Mixes wall-clock milliseconds with an unpredictable value. Never used to
/// reproduce an attempt; replay always goes through the stored seed.
pub fn derive_seed() -> u32 {
    let millis = chrono::Utc::now().timestamp_millis() as u64;
    let noise: u32 = rand::rng().random_range(0..1_000_000_000);
    (millis as u32) ^ noise
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xorshift_known_sequence() {
        let mut rng = XorShift32::new(1);
        assert_eq!(rng.next_u32(), 270_369);
        assert_eq!(rng.next_u32(), 67_634_689);
    }

    #[test]
    fn zero_seed_is_not_special_cased() {
        let mut rng = XorShift32::new(0);
        assert_eq!(rng.next_u32(), 0);
        assert_eq!(rng.next_unit(), 0.0);

        // Every draw is 0, so each step swaps i with 0.
        assert_eq!(seeded_shuffle(&[0, 1, 2, 3], 0), vec![1, 2, 3, 0]);
    }

    #[test]
    fn shuffle_is_deterministic() {
        let items: Vec<u32> = (0..50).collect();
        for seed in [0, 1, 42, 17, u32::MAX, 123_456_789] {
            assert_eq!(seeded_shuffle(&items, seed), seeded_shuffle(&items, seed));
        }
    }

    #[test]
    fn shuffle_is_a_permutation() {
        let items: Vec<u32> = (0..37).collect();
        for seed in [1, 42, 99, 2_024, u32::MAX] {
            let mut shuffled = seeded_shuffle(&items, seed);
            assert_eq!(shuffled.len(), items.len());
            shuffled.sort_unstable();
            assert_eq!(shuffled, items);
        }
    }

    #[test]
    fn different_seeds_usually_differ() {
        let items: Vec<u32> = (0..20).collect();
        assert_ne!(seeded_shuffle(&items, 1), seeded_shuffle(&items, 2));
    }

    #[test]
    fn empty_and_single_are_untouched() {
        assert!(seeded_shuffle::<u8>(&[], 9).is_empty());
        assert_eq!(seeded_shuffle(&["only"], 9), vec!["only"]);
    }

    #[test]
    fn permutation_matches_shuffle() {
        let items = ["a", "b", "c", "d"];
        let perm = permutation(4, 42);
        let shuffled = seeded_shuffle(&items, 42);
        for (new_pos, old_pos) in perm.iter().enumerate() {
            assert_eq!(shuffled[new_pos], items[*old_pos]);
        }
    }
}
