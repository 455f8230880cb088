//! Rank-biased roulette selection.

use std::collections::HashSet;

use super::genome::GenomeRng;
use crate::schema::Genome;

/// Cumulative triangular weight table over a ranked pool.
///
/// For a pool of `m` genomes sorted best first, index `i` owns a slice of
/// width `m - i`, so the best genome is `m` times as likely to be drawn as
/// the worst one.
#[derive(Debug, Clone, Default)]
pub struct SelectionSampler {
    cumulative: Vec<u64>,
}

impl SelectionSampler {
    /// Build the table for a ranked pool of size `m`.
    pub fn new(m: usize) -> Self {
        let mut cumulative = Vec::with_capacity(m);
        let mut total = 0u64;
        for i in 0..m {
            total += (m - i) as u64;
            cumulative.push(total);
        }
        Self { cumulative }
    }

    /// Pool size.
    pub fn len(&self) -> usize {
        self.cumulative.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cumulative.is_empty()
    }

    /// Cumulative weights, monotonically increasing.
    pub fn weights(&self) -> &[u64] {
        &self.cumulative
    }

    /// Index whose slice contains `target`: the smallest index with a
    /// cumulative weight strictly greater than `target`. A target at or past
    /// the total maps to the last index.
    pub fn index_for(&self, target: f64) -> Option<usize> {
        let last = self.cumulative.len().checked_sub(1)?;
        let idx = self.cumulative.partition_point(|&w| (w as f64) <= target);
        Some(idx.min(last))
    }

    /// Draw one biased index, or `None` for an empty pool.
    pub fn draw(&self, rng: &mut GenomeRng) -> Option<usize> {
        let total = *self.cumulative.last()?;
        self.index_for(rng.uniform(total as f64))
    }

    /// Draw up to `count` structurally distinct genomes from `ranked`.
    ///
    /// When the pool holds `count` or fewer distinct genomes they are all
    /// returned in rank order. Otherwise draws are repeated until `count`
    /// distinct genomes have been picked; if the draw budget runs out the
    /// remainder is filled in rank order.
    pub fn select_distinct(
        &self,
        ranked: &[Genome],
        count: usize,
        rng: &mut GenomeRng,
    ) -> Vec<Genome> {
        debug_assert_eq!(ranked.len(), self.len());

        let mut seen: HashSet<(u32, u32, u32)> = HashSet::new();
        let distinct: Vec<&Genome> = ranked.iter().filter(|g| seen.insert(g.params())).collect();

        if distinct.len() <= count {
            return distinct.into_iter().cloned().collect();
        }

        let mut picked: HashSet<(u32, u32, u32)> = HashSet::with_capacity(count);
        let mut selected = Vec::with_capacity(count);
        let budget = ranked.len().saturating_mul(64).max(64);

        for _ in 0..budget {
            if selected.len() == count {
                break;
            }
            let Some(idx) = self.draw(rng) else {
                break;
            };
            let genome = &ranked[idx];
            if picked.insert(genome.params()) {
                selected.push(genome.clone());
            }
        }

        for genome in distinct {
            if selected.len() == count {
                break;
            }
            if picked.insert(genome.params()) {
                selected.push(genome.clone());
            }
        }

        selected
    }
}
