//! Evolution parameters and run reporting types.
//!
//! This module provides the validated construction parameters for the search
//! engine together with the serializable summaries it exposes after every
//! generation.

use serde::{Deserialize, Serialize};

use super::{BenchmarkResult, Genome};

/// Parameters of the genetic search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionParams {
    /// Number of genomes alive in every generation.
    #[serde(default = "default_population_size")]
    pub population_size: usize,
    /// Best genomes copied unchanged into the next generation.
    #[serde(default = "default_elite_count")]
    pub elite_count: usize,
    /// Distinct genomes drawn as parents for crossover and mutation.
    #[serde(default = "default_selection_count")]
    pub selection_count: usize,
    /// Probability (0.0-1.0) that a selected genome spawns a mutant.
    #[serde(default = "default_mutation_rate")]
    pub mutation_rate: f64,
    /// Relative standard deviation of Gaussian mutation.
    #[serde(default = "default_mutation_amount")]
    pub mutation_amount: f64,
    /// Probability (0.0-1.0) that a crossover happens in a generation.
    #[serde(default = "default_crossover_rate")]
    pub crossover_rate: f64,
    /// Domain of each architecture parameter.
    #[serde(default)]
    pub bounds: ParameterBounds,
    /// Evaluation worker threads (0 = one per CPU).
    #[serde(default)]
    pub workers: usize,
    /// Random seed for reproducibility.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

impl Default for EvolutionParams {
    fn default() -> Self {
        Self {
            population_size: default_population_size(),
            elite_count: default_elite_count(),
            selection_count: default_selection_count(),
            mutation_rate: default_mutation_rate(),
            mutation_amount: default_mutation_amount(),
            crossover_rate: default_crossover_rate(),
            bounds: ParameterBounds::default(),
            workers: 0,
            random_seed: None,
        }
    }
}

fn default_population_size() -> usize {
    10
}
fn default_elite_count() -> usize {
    2
}
fn default_selection_count() -> usize {
    5
}
fn default_mutation_rate() -> f64 {
    0.05
}
fn default_mutation_amount() -> f64 {
    0.05
}
fn default_crossover_rate() -> f64 {
    0.05
}

/// Inclusive `(min, max)` domain for each architecture parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterBounds {
    /// LUT input count.
    #[serde(default = "default_k_bounds")]
    pub k: (u32, u32),
    /// Logic elements per cluster.
    #[serde(default = "default_n_bounds")]
    pub n: (u32, u32),
    /// Routing channel width. Must contain at least one even value.
    #[serde(default = "default_w_bounds")]
    pub w: (u32, u32),
}

impl Default for ParameterBounds {
    fn default() -> Self {
        Self {
            k: default_k_bounds(),
            n: default_n_bounds(),
            w: default_w_bounds(),
        }
    }
}

fn default_k_bounds() -> (u32, u32) {
    (2, 25)
}
fn default_n_bounds() -> (u32, u32) {
    (1, 50)
}
fn default_w_bounds() -> (u32, u32) {
    (2, 250)
}

impl ParameterBounds {
    /// Whether `genome` lies inside every domain and has an even `W`.
    pub fn contains(&self, genome: &Genome) -> bool {
        let inside = |v: u32, b: (u32, u32)| v >= b.0 && v <= b.1;
        inside(genome.k, self.k)
            && inside(genome.n, self.n)
            && inside(genome.w, self.w)
            && genome.w % 2 == 0
    }
}

// ============================================================================
// Reporting
// ============================================================================

/// Serializable view of a genome with its relative score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenomeSnapshot {
    pub k: u32,
    pub n: u32,
    pub w: u32,
    /// Score relative to the reference baseline (lower is better, 1.0 neutral).
    pub score: f64,
    pub results: Vec<BenchmarkResult>,
}

impl GenomeSnapshot {
    pub fn new(genome: &Genome, score: f64) -> Self {
        Self {
            k: genome.k,
            n: genome.n,
            w: genome.w,
            score,
            results: genome.results.clone(),
        }
    }
}

/// What happened in one generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationSummary {
    /// Index of the generation just completed (starting at 0).
    pub generation: usize,
    /// Best ranked genome.
    pub best: GenomeSnapshot,
    /// Worst ranked genome.
    pub worst: GenomeSnapshot,
    /// Genomes that were fully measured without failure.
    pub survivors: usize,
    /// Genomes culled because a benchmark failed.
    pub failures: usize,
    /// Evaluator invocations performed this generation.
    pub evaluated: usize,
    /// Evaluator invocations since the engine was created.
    pub total_evaluations: u64,
    /// Mean score over the ranking pool.
    pub mean_score: f64,
    /// Whether every reference slot has a baseline.
    pub reference_complete: bool,
}

/// Score history for plotting.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EvolutionHistory {
    /// Best score per generation.
    pub best_score: Vec<f64>,
    /// Mean score per generation.
    pub mean_score: Vec<f64>,
    /// Survivor count per generation.
    pub survivors: Vec<usize>,
}

impl EvolutionHistory {
    pub fn record(&mut self, summary: &GenerationSummary) {
        self.best_score.push(summary.best.score);
        self.mean_score.push(summary.mean_score);
        self.survivors.push(summary.survivors);
    }
}

/// Final result of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionResult {
    /// Best genome of the last completed generation.
    pub best: GenomeSnapshot,
    pub stats: EvolutionStats,
    pub history: EvolutionHistory,
}

/// Statistics from a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionStats {
    /// Generations completed.
    pub generations: usize,
    /// Total evaluator invocations.
    pub total_evaluations: u64,
    /// Best score of the last completed generation.
    pub best_score: f64,
    /// Wall-clock time (in seconds).
    pub elapsed_seconds: f64,
    pub stop_reason: StopReason,
}

/// Reason a run stopped.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StopReason {
    /// Reached the requested number of generations.
    MaxGenerations,
    /// Cancelled through the cancel handle.
    Cancelled,
}

// ============================================================================
// Validation
// ============================================================================

/// Evolution parameter validation errors.
#[derive(Debug, thiserror::Error)]
pub enum EvolutionConfigError {
    #[error("Population size must be at least 2")]
    PopulationTooSmall,
    #[error("Elite count {elite_count} must be below population size {population_size}")]
    TooManyElites {
        elite_count: usize,
        population_size: usize,
    },
    #[error("{name} must be within [0, 1], got {value}")]
    InvalidRate { name: &'static str, value: f64 },
    #[error("Mutation amount must be finite and non-negative, got {0}")]
    InvalidMutationAmount(f64),
    #[error("No benchmarks specified")]
    NoBenchmarks,
    #[error("Initial population has {actual} genomes, expected {expected}")]
    PopulationMismatch { expected: usize, actual: usize },
    #[error("Invalid parameter bounds: {0}")]
    InvalidBounds(String),
    #[error("Failed to build evaluation worker pool: {0}")]
    ThreadPool(String),
}

impl EvolutionParams {
    /// Validate evolution parameters.
    pub fn validate(&self) -> Result<(), EvolutionConfigError> {
        if self.population_size < 2 {
            return Err(EvolutionConfigError::PopulationTooSmall);
        }

        if self.elite_count >= self.population_size {
            return Err(EvolutionConfigError::TooManyElites {
                elite_count: self.elite_count,
                population_size: self.population_size,
            });
        }

        let check_rate = |value: f64, name: &'static str| {
            if (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(EvolutionConfigError::InvalidRate { name, value })
            }
        };

        check_rate(self.mutation_rate, "mutation_rate")?;
        check_rate(self.crossover_rate, "crossover_rate")?;

        if !self.mutation_amount.is_finite() || self.mutation_amount < 0.0 {
            return Err(EvolutionConfigError::InvalidMutationAmount(
                self.mutation_amount,
            ));
        }

        self.bounds.validate()
    }
}

impl ParameterBounds {
    /// Validate parameter domains.
    pub fn validate(&self) -> Result<(), EvolutionConfigError> {
        let check_bounds = |bounds: (u32, u32), name: &str| {
            if bounds.0 > bounds.1 {
                Err(EvolutionConfigError::InvalidBounds(format!(
                    "{} min ({}) > max ({})",
                    name, bounds.0, bounds.1
                )))
            } else {
                Ok(())
            }
        };

        check_bounds(self.k, "K")?;
        check_bounds(self.n, "N")?;
        check_bounds(self.w, "W")?;

        if self.w.0 == self.w.1 && self.w.0 % 2 == 1 {
            return Err(EvolutionConfigError::InvalidBounds(format!(
                "W range [{}, {}] contains no even value",
                self.w.0, self.w.1
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params_valid() {
        let params = EvolutionParams::default();
        assert!(params.validate().is_ok());
        assert_eq!(params.population_size, 10);
        assert_eq!(params.elite_count, 2);
        assert_eq!(params.selection_count, 5);
    }

    #[test]
    fn test_rejects_invalid_params() {
        let params = EvolutionParams {
            population_size: 1,
            elite_count: 0,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(EvolutionConfigError::PopulationTooSmall)
        ));

        let params = EvolutionParams {
            population_size: 4,
            elite_count: 4,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(EvolutionConfigError::TooManyElites { .. })
        ));

        let params = EvolutionParams {
            crossover_rate: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(EvolutionConfigError::InvalidRate {
                name: "crossover_rate",
                ..
            })
        ));

        let params = EvolutionParams {
            mutation_amount: f64::NAN,
            ..Default::default()
        };
        assert!(matches!(
            params.validate(),
            Err(EvolutionConfigError::InvalidMutationAmount(_))
        ));
    }

    #[test]
    fn test_rejects_invalid_bounds() {
        let bounds = ParameterBounds {
            k: (10, 2),
            ..Default::default()
        };
        assert!(matches!(
            bounds.validate(),
            Err(EvolutionConfigError::InvalidBounds(_))
        ));

        let bounds = ParameterBounds {
            w: (7, 7),
            ..Default::default()
        };
        assert!(bounds.validate().is_err());

        let bounds = ParameterBounds {
            w: (7, 8),
            ..Default::default()
        };
        assert!(bounds.validate().is_ok());
    }

    #[test]
    fn test_bounds_contains() {
        let bounds = ParameterBounds::default();
        assert!(bounds.contains(&Genome::new(4, 10, 50, 0)));
        assert!(!bounds.contains(&Genome::new(4, 10, 51, 0)));
        assert!(!bounds.contains(&Genome::new(26, 10, 50, 0)));
    }

    #[test]
    fn test_serialization_defaults() {
        let params: EvolutionParams = serde_json::from_str("{\"population_size\": 20}").unwrap();
        assert_eq!(params.population_size, 20);
        assert_eq!(params.bounds, ParameterBounds::default());
        assert_eq!(params.random_seed, None);
    }
}
