//! Schema module - Genome, parameter and configuration types.

mod config;
mod evolution;
mod genome;

pub use config::*;
pub use evolution::*;
pub use genome::*;
