//! RNG module - single deterministic generator for all game rolls
//!
//! One seeded generator drives generator drops, order selection and echo
//! rolls so that a session can be replayed from its save: the save stores
//! `snapshot()` and a restored session continues the exact sequence.
//!
//! The core is a mulberry32-style mixer over a u32 state. It is not
//! cryptographic and does not need to be; it is small, fast and stable
//! across platforms.

/// Deterministic seeded RNG with an explicit snapshot/restore contract
#[derive(Debug, Clone)]
pub struct DeterministicRng {
    state: u32,
}

impl DeterministicRng {
    /// Create a new generator from a seed
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Recreate a generator from a previously taken snapshot
    pub fn restore(snapshot: u32) -> Self {
        Self { state: snapshot }
    }

    /// Current state, suitable for persisting in a save
    pub fn snapshot(&self) -> u32 {
        self.state
    }

    /// Generate the next random u32
    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(0x6d2b_79f5);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        t ^ (t >> 14)
    }

    /// Uniform draw in [0, 1)
    pub fn next_f64(&mut self) -> f64 {
        f64::from(self.next_u32()) / 4_294_967_296.0
    }

    /// Uniform integer in [min, max_inclusive]; degenerate ranges return min
    pub fn int(&mut self, min: i64, max_inclusive: i64) -> i64 {
        if max_inclusive <= min {
            return min;
        }
        let span = (max_inclusive - min + 1) as f64;
        min + (self.next_f64() * span) as i64
    }

    /// Pick an index from a weighted table. Negative weights count as zero;
    /// if every weight is zero the first entry wins.
    ///
    /// Panics on an empty table - callers draw from content tables that are
    /// validated non-empty at repository build time.
    pub fn choose_weighted_index(&mut self, weights: &[f64]) -> usize {
        assert!(!weights.is_empty(), "choose_weighted on empty table");
        let total: f64 = weights.iter().map(|w| w.max(0.0)).sum();
        if total <= 0.0 {
            return 0;
        }
        let roll = self.next_f64() * total;
        let mut acc = 0.0;
        for (index, weight) in weights.iter().enumerate() {
            acc += weight.max(0.0);
            if roll <= acc {
                return index;
            }
        }
        weights.len() - 1
    }

    /// Pick a value from `(value, weight)` entries
    pub fn choose_weighted<'a, T>(&mut self, entries: &'a [(T, f64)]) -> &'a T {
        let weights: Vec<f64> = entries.iter().map(|(_, w)| *w).collect();
        let index = self.choose_weighted_index(&weights);
        &entries[index].0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rng_deterministic() {
        let mut a = DeterministicRng::new(12345);
        let mut b = DeterministicRng::new(12345);

        for _ in 0..100 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn test_rng_different_seeds_diverge() {
        let mut a = DeterministicRng::new(12345);
        let mut b = DeterministicRng::new(54321);
        assert_ne!(a.next_u32(), b.next_u32());
    }

    #[test]
    fn test_snapshot_restore_continues_sequence() {
        let mut rng = DeterministicRng::new(99);
        rng.next_u32();
        rng.next_u32();

        let snapshot = rng.snapshot();
        let expected: Vec<u32> = (0..10).map(|_| rng.next_u32()).collect();

        let mut restored = DeterministicRng::restore(snapshot);
        let actual: Vec<u32> = (0..10).map(|_| restored.next_u32()).collect();
        assert_eq!(expected, actual);
    }

    #[test]
    fn test_next_f64_in_unit_interval() {
        let mut rng = DeterministicRng::new(7);
        for _ in 0..1000 {
            let value = rng.next_f64();
            assert!((0.0..1.0).contains(&value));
        }
    }

    #[test]
    fn test_int_range_inclusive() {
        let mut rng = DeterministicRng::new(42);
        let mut seen_min = false;
        let mut seen_max = false;
        for _ in 0..2000 {
            let value = rng.int(2, 5);
            assert!((2..=5).contains(&value));
            seen_min |= value == 2;
            seen_max |= value == 5;
        }
        assert!(seen_min);
        assert!(seen_max);
    }

    #[test]
    fn test_int_degenerate_range() {
        let mut rng = DeterministicRng::new(1);
        assert_eq!(rng.int(3, 3), 3);
        assert_eq!(rng.int(5, 2), 5);
    }

    #[test]
    fn test_choose_weighted_zero_total_falls_back_to_first() {
        let mut rng = DeterministicRng::new(1);
        let entries = [("a", 0.0), ("b", 0.0)];
        assert_eq!(*rng.choose_weighted(&entries), "a");
    }

    #[test]
    fn test_choose_weighted_ignores_negative_weights() {
        let mut rng = DeterministicRng::new(1);
        let entries = [("never", -5.0), ("always", 1.0)];
        for _ in 0..100 {
            assert_eq!(*rng.choose_weighted(&entries), "always");
        }
    }

    #[test]
    fn test_choose_weighted_distribution_sanity() {
        let mut rng = DeterministicRng::new(2024);
        let entries = [("common", 9.0), ("rare", 1.0)];
        let mut common = 0;
        for _ in 0..1000 {
            if *rng.choose_weighted(&entries) == "common" {
                common += 1;
            }
        }
        // Loose bound - the exact count is seed-dependent but stable
        assert!(common > 800, "expected common to dominate, got {common}");
    }
}
