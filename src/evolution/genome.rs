//! Genome manipulation utilities for evolutionary search.
//!
//! Provides random generation, crossover, and mutation operations. The value
//! level operators are free functions so they can be checked in isolation;
//! [`GenomeRng`] applies them to whole genomes and enforces the parameter
//! domains afterwards.

use rand::prelude::*;
use rand_distr::{Distribution, Normal};

use crate::schema::{Genome, ParameterBounds};

/// Random number generator wrapper for genome operations.
pub struct GenomeRng {
    rng: StdRng,
}

impl GenomeRng {
    /// Create from seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Generate a random genome within bounds, with unpopulated results.
    pub fn random_genome(&mut self, bounds: &ParameterBounds, benchmark_count: usize) -> Genome {
        let k = self.rng.gen_range(bounds.k.0..=bounds.k.1);
        let n = self.rng.gen_range(bounds.n.0..=bounds.n.1);
        // Uniform over the even values of the W domain
        let w = self.rng.gen_range(bounds.w.0.div_ceil(2)..=bounds.w.1 / 2) * 2;

        Genome::new(k, n, w, benchmark_count)
    }

    /// Whether an event with the given probability happens.
    pub fn trigger(&mut self, probability: f64) -> bool {
        self.rng.gen_bool(probability.clamp(0.0, 1.0))
    }

    /// Two distinct uniform indices in `0..len`, if `len >= 2`.
    pub fn two_distinct(&mut self, len: usize) -> Option<(usize, usize)> {
        if len < 2 {
            return None;
        }
        let a = self.rng.gen_range(0..len);
        // Draw from the remaining len - 1 slots and skip over `a`
        let mut b = self.rng.gen_range(0..len - 1);
        if b >= a {
            b += 1;
        }
        Some((a, b))
    }

    /// Uniform real in `[0, max]`.
    pub fn uniform(&mut self, max: f64) -> f64 {
        if max <= 0.0 {
            return 0.0;
        }
        self.rng.gen_range(0.0..=max)
    }

    /// Perform crossover between two genomes.
    ///
    /// Produces the XOR child first and the mean child second. Children start
    /// with unpopulated results sized like the first parent's.
    pub fn crossover(
        &mut self,
        parent1: &Genome,
        parent2: &Genome,
        bounds: &ParameterBounds,
    ) -> (Genome, Genome) {
        let slots = parent1.results.len();
        let (k1, k2) = crossover_values(parent1.k, parent2.k);
        let (n1, n2) = crossover_values(parent1.n, parent2.n);
        let (w1, w2) = crossover_values(parent1.w, parent2.w);

        let child1 = Genome::new(
            clamp_param(k1, bounds.k),
            clamp_param(n1, bounds.n),
            even_within(w1, bounds.w),
            slots,
        );
        let child2 = Genome::new(
            clamp_param(k2, bounds.k),
            clamp_param(n2, bounds.n),
            even_within(w2, bounds.w),
            slots,
        );

        (child1, child2)
    }

    /// Mutate a genome in place and reset its cached results.
    pub fn mutate(&mut self, genome: &mut Genome, amount: f64, bounds: &ParameterBounds) {
        genome.k = clamp_param(mutate_value(genome.k, amount, &mut self.rng), bounds.k);
        genome.n = clamp_param(mutate_value(genome.n, amount, &mut self.rng), bounds.n);
        genome.w = even_within(mutate_value(genome.w, amount, &mut self.rng), bounds.w);
        genome.reset_results();
    }
}

/// Crossover of one parameter: `(a XOR b, floor((a + b) / 2))` over 32 bits.
pub fn crossover_values(a: u32, b: u32) -> (u32, u32) {
    let mixed = a ^ b;
    // Widen so the sum cannot overflow
    let mean = ((u64::from(a) + u64::from(b)) / 2) as u32;
    (mixed, mean)
}

/// Gaussian mutation of one parameter.
///
/// Draws from `Normal(value, value * amount)` and truncates toward zero;
/// negative draws become 0. A zero amount returns `value` unchanged.
pub fn mutate_value<R: Rng + ?Sized>(value: u32, amount: f64, rng: &mut R) -> u32 {
    let mean = f64::from(value);
    let std_dev = mean * amount;
    match Normal::new(mean, std_dev) {
        // `as` saturates at the u32 range and maps NaN to 0
        Ok(normal) => normal.sample(rng).max(0.0) as u32,
        Err(_) => value,
    }
}

/// Clamp a parameter to its inclusive domain.
pub fn clamp_param(value: u32, bounds: (u32, u32)) -> u32 {
    value.clamp(bounds.0, bounds.1)
}

/// Clamp to the domain and coerce to an even value.
///
/// Odd values round up unless that would leave the domain, in which case
/// they round down.
pub fn even_within(value: u32, bounds: (u32, u32)) -> u32 {
    let value = clamp_param(value, bounds);
    if value % 2 == 0 {
        value
    } else if value < bounds.1 {
        value + 1
    } else {
        value - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_random_genome() {
        let mut rng = GenomeRng::new(42);
        let bounds = ParameterBounds::default();

        for _ in 0..100 {
            let genome = rng.random_genome(&bounds, 3);
            assert!(bounds.contains(&genome));
            assert_eq!(genome.results.len(), 3);
            assert!(!genome.is_populated());
        }
    }

    #[test]
    fn test_crossover_values() {
        assert_eq!(crossover_values(4, 6), (2, 5));
        assert_eq!(crossover_values(u32::MAX, u32::MAX), (0, u32::MAX));
        assert_eq!(crossover_values(7, 0), (7, 3));
    }

    #[test]
    fn test_crossover() {
        let mut rng = GenomeRng::new(42);
        let bounds = ParameterBounds::default();

        let mut a = Genome::new(4, 10, 50, 2);
        a.results[0] = crate::schema::BenchmarkResult::measured(1.0, 1.0);
        let b = Genome::new(6, 20, 100, 2);

        let (xor_child, mean_child) = rng.crossover(&a, &b, &bounds);

        assert_eq!(xor_child.params(), (2, 30, 86));
        assert_eq!(mean_child.params(), (5, 15, 76));
        assert_eq!(xor_child.results.len(), 2);
        assert!(!xor_child.is_populated());
        assert!(!mean_child.is_populated());
    }

    #[test]
    fn test_crossover_clamps_to_bounds() {
        let mut rng = GenomeRng::new(1);
        let bounds = ParameterBounds::default();

        // Identical parents XOR to zero, below every lower bound
        let a = Genome::new(8, 8, 8, 0);
        let (xor_child, _) = rng.crossover(&a, &a, &bounds);
        assert_eq!(xor_child.params(), (2, 1, 2));
    }

    #[test]
    fn test_mutation_zero_amount() {
        let mut rng = GenomeRng::new(42);
        let bounds = ParameterBounds::default();

        let mut genome = Genome::new(4, 10, 50, 1);
        genome.results[0] = crate::schema::BenchmarkResult::measured(3.0, 4.0);
        rng.mutate(&mut genome, 0.0, &bounds);

        assert_eq!(genome.params(), (4, 10, 50));
        assert!(!genome.is_populated());
    }

    #[test]
    fn test_even_within() {
        assert_eq!(even_within(49, (2, 250)), 50);
        assert_eq!(even_within(50, (2, 250)), 50);
        assert_eq!(even_within(251, (2, 250)), 250);
        assert_eq!(even_within(0, (1, 250)), 2);
        assert_eq!(even_within(9, (2, 9)), 8);
    }

    #[test]
    fn test_two_distinct() {
        let mut rng = GenomeRng::new(3);
        assert_eq!(rng.two_distinct(1), None);
        for _ in 0..100 {
            let (a, b) = rng.two_distinct(2).unwrap();
            assert_ne!(a, b);
            assert!(a < 2 && b < 2);
        }
    }

    proptest! {
        #[test]
        fn prop_crossover_stays_in_bounds(
            k1 in 2u32..=25, k2 in 2u32..=25,
            n1 in 1u32..=50, n2 in 1u32..=50,
            w1 in 1u32..=125, w2 in 1u32..=125,
        ) {
            let bounds = ParameterBounds::default();
            let mut rng = GenomeRng::new(0);
            let a = Genome::new(k1, n1, w1 * 2, 0);
            let b = Genome::new(k2, n2, w2 * 2, 0);

            let (c1, c2) = rng.crossover(&a, &b, &bounds);
            prop_assert!(bounds.contains(&c1));
            prop_assert!(bounds.contains(&c2));
        }

        #[test]
        fn prop_mutation_stays_in_bounds(
            seed in any::<u64>(),
            amount in 0.0f64..3.0,
            k in 2u32..=25, n in 1u32..=50, w in 1u32..=125,
        ) {
            let bounds = ParameterBounds::default();
            let mut rng = GenomeRng::new(seed);
            let mut genome = Genome::new(k, n, w * 2, 2);

            rng.mutate(&mut genome, amount, &bounds);
            prop_assert!(bounds.contains(&genome));
            prop_assert!(!genome.is_populated());
        }
    }
}
