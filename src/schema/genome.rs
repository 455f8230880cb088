//! Genome and benchmark result types.
//!
//! A genome is one candidate architecture: LUT size `K`, cluster size `N` and
//! routing channel width `W`, plus the cached measurement for every configured
//! benchmark. Equality and hashing only look at the parameters, so two genomes
//! with the same `(K, N, W)` are interchangeable for deduplication regardless
//! of what has been measured for them.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// Opaque benchmark identifier handed to the evaluator (usually a netlist path).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BenchmarkId(pub String);

impl BenchmarkId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BenchmarkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BenchmarkId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Measurement of one genome on one benchmark.
///
/// `Default` is the unpopulated slot. A failed slot never contributes to a
/// score, whatever `populated` says.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BenchmarkResult {
    /// Silicon area (minimum transistor units).
    pub area: f64,
    /// Critical path delay (seconds).
    pub delay: f64,
    pub populated: bool,
    pub failed: bool,
}

impl BenchmarkResult {
    /// Successful measurement.
    pub fn measured(area: f64, delay: f64) -> Self {
        Self {
            area,
            delay,
            populated: true,
            failed: false,
        }
    }

    /// The benchmark could not be measured.
    pub fn failure() -> Self {
        Self {
            area: 0.0,
            delay: 0.0,
            populated: true,
            failed: true,
        }
    }

    /// Populated and not failed.
    pub fn is_success(&self) -> bool {
        self.populated && !self.failed
    }
}

/// Candidate architecture parameters plus cached per-benchmark results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Genome {
    /// LUT input count.
    pub k: u32,
    /// Logic elements per cluster.
    pub n: u32,
    /// Routing channel width (always even).
    pub w: u32,
    /// One slot per configured benchmark, in configuration order.
    pub results: Vec<BenchmarkResult>,
}

impl Genome {
    /// Genome with `benchmark_count` unpopulated result slots.
    pub fn new(k: u32, n: u32, w: u32, benchmark_count: usize) -> Self {
        Self {
            k,
            n,
            w,
            results: vec![BenchmarkResult::default(); benchmark_count],
        }
    }

    /// The `(K, N, W)` triple that defines identity.
    pub fn params(&self) -> (u32, u32, u32) {
        (self.k, self.n, self.w)
    }

    /// Drop cached fitness, keeping the number of benchmark slots.
    pub fn reset_results(&mut self) {
        let count = self.results.len();
        self.results.clear();
        self.results.resize(count, BenchmarkResult::default());
    }

    /// Every slot has been populated (successfully or not).
    pub fn is_populated(&self) -> bool {
        self.results.iter().all(|r| r.populated)
    }

    /// At least one benchmark failed.
    pub fn has_failure(&self) -> bool {
        self.results.iter().any(|r| r.failed)
    }

    /// Fully measured with no failures: eligible for ranking and parenthood.
    pub fn is_viable(&self) -> bool {
        self.is_populated() && !self.has_failure()
    }

    /// Whether the evaluator has to run for this genome.
    ///
    /// Failed slots are not a valid cache, so a failed genome that resurfaces
    /// is measured again.
    pub fn needs_evaluation(&self) -> bool {
        !self.is_viable()
    }
}

impl PartialEq for Genome {
    fn eq(&self, other: &Self) -> bool {
        self.params() == other.params()
    }
}

impl Eq for Genome {}

impl Hash for Genome {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.params().hash(state);
    }
}

impl fmt::Display for Genome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "K={} N={} W={}", self.k, self.n, self.w)
    }
}
