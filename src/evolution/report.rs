//! Progress files for long-running explorations.
//!
//! The engine only exposes summaries; this writer turns them into a CSV log
//! with one row per generation and a JSON file holding the current best
//! genome, so a run can be monitored or post-processed while it goes on.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::schema::{GenerationSummary, GenomeSnapshot};

/// One line of `progress.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRow {
    pub generation: usize,
    pub best_k: u32,
    pub best_n: u32,
    pub best_w: u32,
    pub best_score: f64,
    pub worst_k: u32,
    pub worst_n: u32,
    pub worst_w: u32,
    pub worst_score: f64,
    pub survivors: usize,
    pub failures: usize,
    /// Evaluator invocations since the run started.
    pub evaluations: u64,
}

impl From<&GenerationSummary> for ProgressRow {
    fn from(summary: &GenerationSummary) -> Self {
        Self {
            generation: summary.generation,
            best_k: summary.best.k,
            best_n: summary.best.n,
            best_w: summary.best.w,
            best_score: summary.best.score,
            worst_k: summary.worst.k,
            worst_n: summary.worst.n,
            worst_w: summary.worst.w,
            worst_score: summary.worst.score,
            survivors: summary.survivors,
            failures: summary.failures,
            evaluations: summary.total_evaluations,
        }
    }
}

/// Appends generation summaries to `progress.csv` and keeps `best.json`
/// current inside an output directory.
pub struct ProgressReport {
    writer: csv::Writer<File>,
    best_path: PathBuf,
    rows: usize,
}

impl ProgressReport {
    /// Create the output directory and start a fresh `progress.csv`.
    ///
    /// The header line is written together with the first row.
    pub fn create<P: AsRef<Path>>(dir: P) -> io::Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let writer = csv::Writer::from_path(dir.join("progress.csv"))?;

        Ok(Self {
            writer,
            best_path: dir.join("best.json"),
            rows: 0,
        })
    }

    /// Record one generation.
    ///
    /// The row is flushed immediately so the file stays readable while the
    /// run continues.
    pub fn record(&mut self, summary: &GenerationSummary) -> io::Result<()> {
        self.writer.serialize(ProgressRow::from(summary))?;
        self.writer.flush()?;
        self.rows += 1;

        let json = serde_json::to_string_pretty(&summary.best)?;
        fs::write(&self.best_path, json)
    }

    /// Rows written so far.
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn best_path(&self) -> &Path {
        &self.best_path
    }
}

/// Load a best-genome snapshot written by [`ProgressReport::record`].
pub fn load_best<P: AsRef<Path>>(path: P) -> io::Result<GenomeSnapshot> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{BenchmarkResult, Genome};
    use tempfile::tempdir;

    fn test_summary(
        generation: usize,
        best_score: f64,
        total_evaluations: u64,
    ) -> GenerationSummary {
        let mut best = Genome::new(6, 10, 80, 1);
        best.results[0] = BenchmarkResult::measured(1200.0, 4.5e-9);
        let worst = Genome::new(2, 1, 2, 1);

        GenerationSummary {
            generation,
            best: GenomeSnapshot::new(&best, best_score),
            worst: GenomeSnapshot::new(&worst, 1.5),
            survivors: 8,
            failures: 2,
            evaluated: 10,
            total_evaluations,
            mean_score: 1.1,
            reference_complete: true,
        }
    }

    #[test]
    fn test_row_from_summary() {
        let row = ProgressRow::from(&test_summary(3, 0.875, 42));
        assert_eq!(row.generation, 3);
        assert_eq!((row.best_k, row.best_n, row.best_w), (6, 10, 80));
        assert_eq!((row.worst_k, row.worst_n, row.worst_w), (2, 1, 2));
        assert_eq!(row.best_score, 0.875);
        assert_eq!(row.worst_score, 1.5);
        assert_eq!((row.survivors, row.failures, row.evaluations), (8, 2, 42));
    }

    #[test]
    fn test_report_writes_files() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("run");

        let mut report = ProgressReport::create(&out).unwrap();
        report.record(&test_summary(0, 1.0, 10)).unwrap();
        report.record(&test_summary(1, 0.9, 18)).unwrap();
        assert_eq!(report.rows(), 2);

        let mut reader = csv::Reader::from_path(out.join("progress.csv")).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            vec![
                "generation",
                "best_k",
                "best_n",
                "best_w",
                "best_score",
                "worst_k",
                "worst_n",
                "worst_w",
                "worst_score",
                "survivors",
                "failures",
                "evaluations",
            ]
        );

        let rows: Vec<ProgressRow> = reader.deserialize().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], ProgressRow::from(&test_summary(1, 0.9, 18)));
        assert_eq!(rows[0].evaluations, 10);

        let best = load_best(report.best_path()).unwrap();
        assert_eq!((best.k, best.n, best.w), (6, 10, 80));
        assert!((best.score - 0.9).abs() < 1e-12);
        assert_eq!(best.results[0].area, 1200.0);
    }

    #[test]
    fn test_load_best_rejects_garbage() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("best.json");
        fs::write(&path, "not json").unwrap();

        let err = load_best(&path).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
