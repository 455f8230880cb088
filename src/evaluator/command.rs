//! Toolchain driver.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, warn};
use rayon::prelude::*;

use super::EvaluatorError;
use super::parse::{Metrics, parse_metrics};
use super::template::{ArgVars, render_arg, render_template};
use crate::evolution::FitnessEvaluator;
use crate::schema::{BenchmarkId, BenchmarkResult, EvaluatorConfig, Genome};

const OUTPUT_FILE: &str = "tool_output.log";
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Evaluates genomes by running an external tool per benchmark.
///
/// Every run gets its own temporary directory, removed once the run is
/// parsed, so concurrent evaluations never share files.
#[derive(Debug, Clone)]
pub struct CommandEvaluator {
    config: EvaluatorConfig,
}

impl CommandEvaluator {
    pub fn new(config: EvaluatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    /// Measure one benchmark, averaging `runs` tool invocations.
    pub fn measure(
        &self,
        genome: &Genome,
        benchmark: &BenchmarkId,
    ) -> Result<Metrics, EvaluatorError> {
        let template =
            fs::read_to_string(&self.config.template).map_err(|source| EvaluatorError::Template {
                path: self.config.template.clone(),
                source,
            })?;
        let arch = render_template(&template, genome, &self.config.lut_delay)?;
        let benchmark_path = absolute(Path::new(benchmark.as_str()));

        let runs = self.config.runs.max(1);
        let mut area = 0.0;
        let mut delay = 0.0;
        for run in 0..runs {
            let metrics = self.run_once(genome, &benchmark_path, &arch)?;
            debug!(
                "{genome} on {benchmark} run {run}: area {} delay {}",
                metrics.area, metrics.delay
            );
            area += metrics.area;
            delay += metrics.delay;
        }

        Ok(Metrics {
            area: area / runs as f64,
            delay: delay / runs as f64,
        })
    }

    fn run_once(
        &self,
        genome: &Genome,
        benchmark: &Path,
        arch: &str,
    ) -> Result<Metrics, EvaluatorError> {
        let workdir = tempfile::Builder::new()
            .prefix("arch-explorer-")
            .tempdir()
            .map_err(|source| EvaluatorError::Io {
                path: std::env::temp_dir(),
                source,
            })?;
        let dir = workdir.path();

        let arch_path = dir.join(&self.config.arch_file_name);
        fs::write(&arch_path, arch).map_err(|source| EvaluatorError::Io {
            path: arch_path.clone(),
            source,
        })?;

        let output_path = dir.join(OUTPUT_FILE);
        let output = File::create(&output_path).map_err(|source| EvaluatorError::Io {
            path: output_path.clone(),
            source,
        })?;

        let arch_arg = arch_path.to_string_lossy();
        let benchmark_arg = benchmark.to_string_lossy();
        let workdir_arg = dir.to_string_lossy();
        let vars = ArgVars {
            arch: &arch_arg,
            benchmark: &benchmark_arg,
            workdir: &workdir_arg,
        };
        let args: Vec<String> = self
            .config
            .args
            .iter()
            .map(|arg| render_arg(arg, genome, &vars))
            .collect();

        let program = program_path(&self.config.command);
        let mut child = Command::new(&program)
            .args(&args)
            .current_dir(dir)
            .stdin(Stdio::null())
            .stdout(Stdio::from(output))
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| EvaluatorError::Spawn {
                command: self.config.command.clone(),
                source,
            })?;

        let status = self.wait(&mut child)?;
        if !status.success() {
            return Err(EvaluatorError::ExitStatus(status));
        }

        let text = fs::read_to_string(&output_path).map_err(|source| EvaluatorError::Io {
            path: output_path.clone(),
            source,
        })?;
        parse_metrics(&text, &self.config.labels).ok_or(EvaluatorError::MissingMetrics)
    }

    /// Wait for the child, killing it once the configured timeout expires.
    fn wait(&self, child: &mut Child) -> Result<ExitStatus, EvaluatorError> {
        let io_error = |source: io::Error| EvaluatorError::Io {
            path: PathBuf::from(&self.config.command),
            source,
        };

        // A timeout too large to represent is no timeout at all
        let Some((secs, deadline)) = self.config.timeout_secs.and_then(|secs| {
            Instant::now()
                .checked_add(Duration::from_secs(secs))
                .map(|deadline| (secs, deadline))
        }) else {
            return child.wait().map_err(io_error);
        };

        loop {
            if let Some(status) = child.try_wait().map_err(io_error)? {
                return Ok(status);
            }
            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                return Err(EvaluatorError::Timeout(secs));
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    fn measure_or_fail(&self, genome: &Genome, benchmark: &BenchmarkId) -> BenchmarkResult {
        match self.measure(genome, benchmark) {
            Ok(metrics) => BenchmarkResult::measured(metrics.area, metrics.delay),
            Err(e) => {
                warn!("{genome} on {benchmark}: {e}");
                BenchmarkResult::failure()
            }
        }
    }
}

impl FitnessEvaluator for CommandEvaluator {
    fn evaluate(&self, genome: &Genome, benchmarks: &[BenchmarkId]) -> Vec<BenchmarkResult> {
        if self.config.parallel_benchmarks {
            benchmarks
                .par_iter()
                .map(|benchmark| self.measure_or_fail(genome, benchmark))
                .collect()
        } else {
            benchmarks
                .iter()
                .map(|benchmark| self.measure_or_fail(genome, benchmark))
                .collect()
        }
    }
}

/// Paths are resolved before the tool changes into its scratch directory.
fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Bare program names are left for `PATH` lookup.
fn program_path(command: &str) -> PathBuf {
    let path = Path::new(command);
    if path.components().count() > 1 {
        absolute(path)
    } else {
        path.to_path_buf()
    }
}
