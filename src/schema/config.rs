//! Configuration types for an exploration run.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{BenchmarkId, EvolutionConfigError, EvolutionParams};

/// Top-level configuration read by the command line driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplorerConfig {
    /// Genetic search parameters.
    #[serde(default)]
    pub evolution: EvolutionParams,
    /// External toolchain invocation.
    pub evaluator: EvaluatorConfig,
    /// Benchmarks every genome is measured against, in order.
    pub benchmarks: Vec<BenchmarkId>,
    /// Progress reporting.
    #[serde(default)]
    pub report: ReportConfig,
    /// Stop after this many generations (runs until stopped if unset).
    #[serde(default)]
    pub max_generations: Option<usize>,
    /// Stop once this file exists, checked between generations.
    #[serde(default)]
    pub stop_file: Option<PathBuf>,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            evolution: EvolutionParams::default(),
            evaluator: EvaluatorConfig::default(),
            benchmarks: vec![BenchmarkId::new("benchmarks/diffeq.blif")],
            report: ReportConfig::default(),
            max_generations: None,
            stop_file: Some(PathBuf::from("STOP")),
        }
    }
}

/// How to run the place-and-route toolchain for one measurement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluatorConfig {
    /// Program to execute.
    pub command: String,
    /// Arguments. `{arch}`, `{benchmark}`, `{workdir}`, `{K}`, `{N}` and `{W}`
    /// are substituted per invocation.
    #[serde(default = "default_args")]
    pub args: Vec<String>,
    /// Architecture description template.
    pub template: PathBuf,
    /// File name of the rendered architecture inside the working directory.
    #[serde(default = "default_arch_file_name")]
    pub arch_file_name: String,
    /// Per-input LUT delay written for `{{K_DELAYS}}`.
    #[serde(default = "default_lut_delay")]
    pub lut_delay: String,
    /// Measurements averaged per benchmark.
    #[serde(default = "default_runs")]
    pub runs: usize,
    /// Kill the tool after this many seconds.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Measure a genome's benchmarks concurrently.
    #[serde(default)]
    pub parallel_benchmarks: bool,
    /// Labels preceding each metric in the tool output.
    #[serde(default)]
    pub labels: MetricLabels,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            command: "vpr".to_string(),
            args: default_args(),
            template: PathBuf::from("arch_template.xml"),
            arch_file_name: default_arch_file_name(),
            lut_delay: default_lut_delay(),
            runs: default_runs(),
            timeout_secs: None,
            parallel_benchmarks: false,
            labels: MetricLabels::default(),
        }
    }
}

fn default_args() -> Vec<String> {
    vec![
        "{arch}".to_string(),
        "{benchmark}".to_string(),
        "--route_chan_width".to_string(),
        "{W}".to_string(),
    ]
}
fn default_arch_file_name() -> String {
    "arch.xml".to_string()
}
fn default_lut_delay() -> String {
    "2.690e-10".to_string()
}
fn default_runs() -> usize {
    1
}

/// Output labels the metric parser searches for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricLabels {
    #[serde(default = "default_logic_area_label")]
    pub logic_area: String,
    #[serde(default = "default_routing_area_label")]
    pub routing_area: String,
    #[serde(default = "default_critical_path_label")]
    pub critical_path: String,
}

impl Default for MetricLabels {
    fn default() -> Self {
        Self {
            logic_area: default_logic_area_label(),
            routing_area: default_routing_area_label(),
            critical_path: default_critical_path_label(),
        }
    }
}

fn default_logic_area_label() -> String {
    "Total used logic block area:".to_string()
}
fn default_routing_area_label() -> String {
    "Total routing area:".to_string()
}
fn default_critical_path_label() -> String {
    "Final critical path:".to_string()
}

/// Progress reporting settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Print the best genome every N generations.
    #[serde(default = "default_interval")]
    pub interval: usize,
    /// Directory for `progress.csv` and `best.json`.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            output_dir: None,
        }
    }
}

fn default_interval() -> usize {
    50
}

impl ExplorerConfig {
    /// Load a configuration from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.evolution.validate()?;

        if self.benchmarks.is_empty() {
            return Err(EvolutionConfigError::NoBenchmarks.into());
        }
        if self.evaluator.command.trim().is_empty() {
            return Err(ConfigError::EmptyCommand);
        }
        if self.evaluator.runs == 0 {
            return Err(ConfigError::InvalidRuns);
        }
        if self.report.interval == 0 {
            return Err(ConfigError::InvalidInterval);
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Evaluator command must not be empty")]
    EmptyCommand,
    #[error("Evaluator runs must be at least 1")]
    InvalidRuns,
    #[error("Report interval must be non-zero")]
    InvalidInterval,
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Evolution config validation failed: {0}")]
    Evolution(#[from] EvolutionConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_valid() {
        let config = ExplorerConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_empty_benchmarks() {
        let config = ExplorerConfig {
            benchmarks: Vec::new(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Evolution(EvolutionConfigError::NoBenchmarks))
        ));
    }

    #[test]
    fn test_rejects_zero_runs() {
        let mut config = ExplorerConfig::default();
        config.evaluator.runs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidRuns)));
    }

    #[test]
    fn test_from_file_minimal() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "evaluator": {{ "command": "vpr", "template": "arch.xml" }},
                "benchmarks": ["a.blif", "b.blif"],
                "evolution": {{ "population_size": 6, "random_seed": 7 }}
            }}"#
        )
        .unwrap();

        let config = ExplorerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.benchmarks.len(), 2);
        assert_eq!(config.evolution.population_size, 6);
        assert_eq!(config.evolution.random_seed, Some(7));
        assert_eq!(config.evaluator.runs, 1);
        assert_eq!(config.evaluator.args, default_args());
        assert_eq!(config.report.interval, 50);
    }

    #[test]
    fn test_from_file_missing() {
        let result = ExplorerConfig::from_file("/nonexistent/explorer.json");
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
