//! Fitness evaluation boundary and reference-normalized scoring.
//!
//! Raw measurements come from a [`FitnessEvaluator`]. They are made
//! comparable across benchmarks by dividing each by a fixed baseline held in
//! the [`ReferenceTracker`], so every benchmark weighs the same regardless of
//! its absolute size.

use std::sync::Arc;

use crate::schema::{BenchmarkId, BenchmarkResult, Genome};

/// Score of a genome that cannot be normalized yet.
pub const NEUTRAL_SCORE: f64 = 1.0;

/// Measures a genome on a set of benchmarks.
///
/// Implementations must return one result per benchmark, in the order given,
/// and report problems as [`BenchmarkResult::failure`] instead of panicking.
/// Calls may block for a long time; the engine runs them on worker threads
/// and never retries on its own.
pub trait FitnessEvaluator: Send + Sync {
    fn evaluate(&self, genome: &Genome, benchmarks: &[BenchmarkId]) -> Vec<BenchmarkResult>;
}

impl<T: FitnessEvaluator + ?Sized> FitnessEvaluator for Arc<T> {
    fn evaluate(&self, genome: &Genome, benchmarks: &[BenchmarkId]) -> Vec<BenchmarkResult> {
        (**self).evaluate(genome, benchmarks)
    }
}

impl<T: FitnessEvaluator + ?Sized> FitnessEvaluator for Box<T> {
    fn evaluate(&self, genome: &Genome, benchmarks: &[BenchmarkId]) -> Vec<BenchmarkResult> {
        (**self).evaluate(genome, benchmarks)
    }
}

/// First usable measurement per benchmark, fixed for the rest of the run.
#[derive(Debug, Clone)]
pub struct ReferenceTracker {
    baseline: Vec<BenchmarkResult>,
}

impl ReferenceTracker {
    /// Tracker with `benchmark_count` empty slots.
    pub fn new(benchmark_count: usize) -> Self {
        Self {
            baseline: vec![BenchmarkResult::default(); benchmark_count],
        }
    }

    /// Baseline slots in benchmark order; empty slots are unpopulated.
    pub fn baseline(&self) -> &[BenchmarkResult] {
        &self.baseline
    }

    /// Baseline for one benchmark, if set.
    pub fn slot(&self, index: usize) -> Option<&BenchmarkResult> {
        self.baseline.get(index).filter(|r| r.populated)
    }

    /// Every slot has a baseline.
    pub fn is_complete(&self) -> bool {
        self.baseline.iter().all(|r| r.populated)
    }

    /// Fill empty slots from `genome`'s results. Set slots are never
    /// overwritten. Returns the number of slots filled.
    ///
    /// Only successful, strictly positive measurements qualify: a zero
    /// baseline could not serve as a denominator.
    pub fn seed_from(&mut self, genome: &Genome) -> usize {
        let mut filled = 0;
        for (slot, result) in self.baseline.iter_mut().zip(&genome.results) {
            if slot.populated {
                continue;
            }
            if result.is_success() && result.area > 0.0 && result.delay > 0.0 {
                *slot = BenchmarkResult::measured(result.area, result.delay);
                filled += 1;
            }
        }
        filled
    }

    /// Relative score of a genome, lower is better.
    ///
    /// The mean over benchmarks of `(delay / ref_delay + area / ref_area) / 2`.
    /// Returns [`NEUTRAL_SCORE`] while any baseline is unset, and for genomes
    /// that are not fully measured without failure.
    pub fn score(&self, genome: &Genome) -> f64 {
        if self.baseline.is_empty() || !self.is_complete() || !genome.is_viable() {
            return NEUTRAL_SCORE;
        }
        if genome.results.len() != self.baseline.len() {
            return NEUTRAL_SCORE;
        }

        let total: f64 = genome
            .results
            .iter()
            .zip(&self.baseline)
            .map(|(r, base)| (r.delay / base.delay + r.area / base.area) / 2.0)
            .sum();

        total / self.baseline.len() as f64
    }
}

/// Area-delay product summed over benchmarks.
///
/// Unit-dependent, so it only orders genomes before a baseline exists.
pub fn raw_cost(genome: &Genome) -> f64 {
    genome.results.iter().map(|r| r.area * r.delay).sum()
}

/// Fit an evaluator reply to `expected` slots: missing or unpopulated slots
/// become failures, extra ones are dropped.
pub(crate) fn conform_results(
    mut results: Vec<BenchmarkResult>,
    expected: usize,
) -> Vec<BenchmarkResult> {
    results.resize(expected, BenchmarkResult::failure());
    for result in results.iter_mut().filter(|r| !r.populated) {
        *result = BenchmarkResult::failure();
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    fn measured(k: u32, values: &[(f64, f64)]) -> Genome {
        let mut genome = Genome::new(k, 10, 50, values.len());
        for (slot, &(area, delay)) in genome.results.iter_mut().zip(values) {
            *slot = BenchmarkResult::measured(area, delay);
        }
        genome
    }

    #[test]
    fn test_score_neutral_without_reference() {
        let tracker = ReferenceTracker::new(2);
        let genome = measured(4, &[(10.0, 1.0), (20.0, 2.0)]);
        assert_eq!(tracker.score(&genome), NEUTRAL_SCORE);
    }

    #[test]
    fn test_score_normalized() {
        let mut tracker = ReferenceTracker::new(2);
        let reference = measured(4, &[(10.0, 1.0), (20.0, 2.0)]);
        assert_eq!(tracker.seed_from(&reference), 2);
        assert!(tracker.is_complete());
        assert!((tracker.score(&reference) - 1.0).abs() < 1e-12);

        // Half the delay, same area on both benchmarks
        let faster = measured(5, &[(10.0, 0.5), (20.0, 1.0)]);
        assert!((tracker.score(&faster) - 0.75).abs() < 1e-12);

        // Double area on the first benchmark only
        let bigger = measured(6, &[(20.0, 1.0), (20.0, 2.0)]);
        assert!((tracker.score(&bigger) - 1.25).abs() < 1e-12);
    }

    #[test]
    fn test_reference_never_overwritten() {
        let mut tracker = ReferenceTracker::new(1);
        tracker.seed_from(&measured(4, &[(10.0, 1.0)]));
        assert_eq!(tracker.seed_from(&measured(5, &[(1.0, 0.1)])), 0);

        let slot = tracker.slot(0).unwrap();
        assert_eq!(slot.area, 10.0);
        assert_eq!(slot.delay, 1.0);
    }

    #[test]
    fn test_reference_skips_unusable_results() {
        let mut tracker = ReferenceTracker::new(2);
        let mut genome = measured(4, &[(0.0, 1.0), (5.0, 1.0)]);
        assert_eq!(tracker.seed_from(&genome), 1);
        assert!(tracker.slot(0).is_none());
        assert!(!tracker.is_complete());

        genome.results[0] = BenchmarkResult::failure();
        assert_eq!(tracker.seed_from(&genome), 0);
    }

    #[test]
    fn test_score_neutral_for_failed_genome() {
        let mut tracker = ReferenceTracker::new(1);
        tracker.seed_from(&measured(4, &[(10.0, 1.0)]));

        let mut failed = Genome::new(5, 10, 50, 1);
        failed.results[0] = BenchmarkResult::failure();
        assert_eq!(tracker.score(&failed), NEUTRAL_SCORE);
    }

    #[test]
    fn test_conform_results() {
        let results = conform_results(vec![BenchmarkResult::measured(1.0, 1.0)], 3);
        assert_eq!(results.len(), 3);
        assert!(results[0].is_success());
        assert!(results[1].failed && results[2].failed);

        let results = conform_results(vec![BenchmarkResult::default(); 4], 2);
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.failed));
    }
}
