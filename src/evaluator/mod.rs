//! Fitness evaluation through an external place-and-route toolchain.
//!
//! [`CommandEvaluator`] renders an architecture description for a genome,
//! runs the configured tool once per benchmark in a scratch directory and
//! reads area and delay back from the tool's output.

mod command;
mod parse;
mod template;

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

pub use command::CommandEvaluator;
pub use parse::{Metrics, parse_metrics, value_after};
pub use template::{
    ArgVars, K_DELAYS_PLACEHOLDER, K_PLACEHOLDER, N_PLACEHOLDER, W_PLACEHOLDER, render_arg,
    render_template,
};

/// Reasons a single measurement fails.
///
/// These stay inside the evaluator: they are logged and the benchmark is
/// reported as failed.
#[derive(Debug, thiserror::Error)]
pub enum EvaluatorError {
    #[error("Failed to read architecture template {}: {source}", path.display())]
    Template {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Architecture template lacks the {0} placeholder")]
    MissingPlaceholder(&'static str),
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to start {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("Tool did not finish within {0} seconds")]
    Timeout(u64),
    #[error("Tool exited with {0}")]
    ExitStatus(ExitStatus),
    #[error("Tool output lacks area or delay metrics")]
    MissingMetrics,
}
