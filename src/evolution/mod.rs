//! Genetic search over FPGA architecture parameters.
//!
//! # Overview
//!
//! The search system consists of:
//!
//! - **Fitness** (`fitness`): the evaluator boundary and reference-normalized scoring
//! - **Genome Operations** (`genome`): random generation, crossover, and mutation
//! - **Selection** (`selection`): rank-biased roulette over the ranking pool
//! - **Search** (`search`): the generational engine
//! - **Reporting** (`report`): progress files written while a run goes on
//!
//! # Example
//!
//! ```rust,no_run
//! use arch_explorer::evaluator::CommandEvaluator;
//! use arch_explorer::evolution::EvolutionEngine;
//! use arch_explorer::schema::ExplorerConfig;
//!
//! let config = ExplorerConfig::default();
//! let evaluator = CommandEvaluator::new(config.evaluator.clone());
//! let mut engine =
//!     EvolutionEngine::new(config.evolution, evaluator, config.benchmarks).unwrap();
//!
//! let result = engine.run_with_callback(Some(100), |summary| {
//!     println!(
//!         "Generation {}: best score = {:.4}",
//!         summary.generation, summary.best.score
//!     );
//! });
//! println!(
//!     "Best: K={} N={} W={}",
//!     result.best.k, result.best.n, result.best.w
//! );
//! ```
//!
//! # Scoring
//!
//! A genome's score is the mean over benchmarks of
//! `(delay / ref_delay + area / ref_area) / 2`, where the reference values are
//! the first successful measurement seen for each benchmark. Lower is better
//! and 1.0 is the reference itself.

mod fitness;
mod genome;
mod report;
mod search;
mod selection;

pub use fitness::{FitnessEvaluator, NEUTRAL_SCORE, ReferenceTracker, raw_cost};
pub use genome::{GenomeRng, clamp_param, crossover_values, even_within, mutate_value};
pub use report::{ProgressReport, ProgressRow, load_best};
pub use search::{EvolutionEngine, RankedGenome};
pub use selection::SelectionSampler;
