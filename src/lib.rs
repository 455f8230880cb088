//! Arch Explorer - Genetic design-space exploration of FPGA architectures.
//!
//! This crate searches the space of three architecture parameters, LUT size
//! `K`, cluster size `N` and channel width `W`, for combinations that
//! minimize area and critical path delay across a set of benchmark circuits.
//!
//! # Architecture
//!
//! The crate is split into three modules:
//!
//! - `schema`: Genomes, measurement results and configuration types
//! - `evolution`: Scoring, genetic operators, selection and the search engine
//! - `evaluator`: Measurement through an external place-and-route tool
//!
//! # Example
//!
//! ```rust,no_run
//! use arch_explorer::{
//!     evaluator::CommandEvaluator,
//!     evolution::EvolutionEngine,
//!     schema::ExplorerConfig,
//! };
//!
//! let config = ExplorerConfig::from_file("explore.json").unwrap();
//! let evaluator = CommandEvaluator::new(config.evaluator.clone());
//! let mut engine =
//!     EvolutionEngine::new(config.evolution, evaluator, config.benchmarks).unwrap();
//!
//! for _ in 0..10 {
//!     let summary = engine.run_generation();
//!     println!("Generation {}: best score {:.4}", summary.generation, summary.best.score);
//! }
//!
//! println!("Best architecture: {}", engine.best());
//! ```

pub mod evaluator;
pub mod evolution;
pub mod schema;

// Re-export commonly used types
pub use evaluator::CommandEvaluator;
pub use evolution::{EvolutionEngine, FitnessEvaluator, ReferenceTracker};
pub use schema::{BenchmarkId, BenchmarkResult, EvolutionParams, ExplorerConfig, Genome};
