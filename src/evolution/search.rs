//! Generational search over architecture parameters.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

use log::{debug, info, warn};
use rayon::prelude::*;

use crate::schema::{
    BenchmarkId, EvolutionConfigError, EvolutionHistory, EvolutionParams, EvolutionResult,
    EvolutionStats, GenerationSummary, Genome, GenomeSnapshot, StopReason,
};

use super::fitness::{
    FitnessEvaluator, NEUTRAL_SCORE, ReferenceTracker, conform_results, raw_cost,
};
use super::genome::GenomeRng;
use super::selection::SelectionSampler;

/// A genome of the ranking pool with its relative score.
#[derive(Debug, Clone)]
pub struct RankedGenome {
    /// Genome with its cached results.
    pub genome: Genome,
    /// Score against the reference baseline (lower is better).
    pub score: f64,
}

impl RankedGenome {
    pub fn snapshot(&self) -> GenomeSnapshot {
        GenomeSnapshot::new(&self.genome, self.score)
    }
}

/// Evolution engine that runs the search.
///
/// One generation is: evaluate, cull failures, seed the reference baseline,
/// rank, copy elites, select parents, cross over, mutate, replace. Only
/// evaluation runs in parallel; everything else happens on the caller's
/// thread after all evaluations of the generation have joined.
pub struct EvolutionEngine<E> {
    params: EvolutionParams,
    evaluator: E,
    benchmarks: Vec<BenchmarkId>,
    rng: GenomeRng,
    workers: rayon::ThreadPool,
    population: Vec<Genome>,
    /// Ranking pool of the last completed generation, best first.
    ranking: Vec<RankedGenome>,
    reference: ReferenceTracker,
    history: EvolutionHistory,
    summary: Option<GenerationSummary>,
    generation: usize,
    evaluations: AtomicU64,
    cancelled: Arc<AtomicBool>,
}

impl<E: FitnessEvaluator> EvolutionEngine<E> {
    /// Create an engine with a random initial population.
    pub fn new(
        params: EvolutionParams,
        evaluator: E,
        benchmarks: Vec<BenchmarkId>,
    ) -> Result<Self, EvolutionConfigError> {
        params.validate()?;
        if benchmarks.is_empty() {
            return Err(EvolutionConfigError::NoBenchmarks);
        }

        let workers = rayon::ThreadPoolBuilder::new()
            .num_threads(params.workers)
            .thread_name(|i| format!("arch-eval-{i}"))
            .build()
            .map_err(|e| EvolutionConfigError::ThreadPool(e.to_string()))?;

        let seed = params.random_seed.unwrap_or_else(rand::random);
        debug!("evolution seed {seed}");
        let mut rng = GenomeRng::new(seed);

        let population = (0..params.population_size)
            .map(|_| rng.random_genome(&params.bounds, benchmarks.len()))
            .collect();

        Ok(Self {
            reference: ReferenceTracker::new(benchmarks.len()),
            params,
            evaluator,
            benchmarks,
            rng,
            workers,
            population,
            ranking: Vec::new(),
            history: EvolutionHistory::default(),
            summary: None,
            generation: 0,
            evaluations: AtomicU64::new(0),
            cancelled: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Replace the initial population.
    ///
    /// Cached results are kept when they cover the configured benchmarks,
    /// otherwise they are reset.
    pub fn with_population(mut self, genomes: Vec<Genome>) -> Result<Self, EvolutionConfigError> {
        if genomes.len() != self.params.population_size {
            return Err(EvolutionConfigError::PopulationMismatch {
                expected: self.params.population_size,
                actual: genomes.len(),
            });
        }

        let slots = self.benchmarks.len();
        let mut population = Vec::with_capacity(genomes.len());
        for mut genome in genomes {
            if !self.params.bounds.contains(&genome) {
                return Err(EvolutionConfigError::InvalidBounds(format!(
                    "initial genome {genome} lies outside the parameter bounds"
                )));
            }
            if genome.results.len() != slots {
                genome = Genome::new(genome.k, genome.n, genome.w, slots);
            }
            population.push(genome);
        }

        self.population = population;
        Ok(self)
    }

    /// Get cancellation handle.
    ///
    /// The flag is honoured between generations only.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    pub fn parameters(&self) -> &EvolutionParams {
        &self.params
    }

    pub fn benchmarks(&self) -> &[BenchmarkId] {
        &self.benchmarks
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    /// Current population. After a generation: elites, crossover children,
    /// mutants, random top-up, in that order.
    pub fn population(&self) -> &[Genome] {
        &self.population
    }

    /// Ranking pool of the last generation, best first.
    pub fn ranking(&self) -> &[RankedGenome] {
        &self.ranking
    }

    pub fn reference(&self) -> &ReferenceTracker {
        &self.reference
    }

    /// Generations completed.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Evaluator invocations so far.
    pub fn evaluations(&self) -> u64 {
        self.evaluations.load(Ordering::Relaxed)
    }

    pub fn history(&self) -> &EvolutionHistory {
        &self.history
    }

    /// Summary of the last generation.
    pub fn summary(&self) -> Option<&GenerationSummary> {
        self.summary.as_ref()
    }

    /// Score of any genome against the current baseline.
    pub fn score_of(&self, genome: &Genome) -> f64 {
        self.reference.score(genome)
    }

    /// Best genome of the last generation. Before the first generation this
    /// is the first population member, with a neutral score.
    pub fn best(&self) -> &Genome {
        match self.ranking.first() {
            Some(ranked) => &ranked.genome,
            None => &self.population[0],
        }
    }

    /// Worst genome of the last generation, with the same fallback as
    /// [`best`](Self::best).
    pub fn worst(&self) -> &Genome {
        match self.ranking.last() {
            Some(ranked) => &ranked.genome,
            None => &self.population[0],
        }
    }

    fn best_snapshot(&self) -> GenomeSnapshot {
        match self.ranking.first() {
            Some(ranked) => ranked.snapshot(),
            None => GenomeSnapshot::new(&self.population[0], NEUTRAL_SCORE),
        }
    }

    /// Advance by exactly one generation.
    pub fn run_generation(&mut self) -> GenerationSummary {
        let evaluated = self.evaluate_population();

        let survivors: Vec<Genome> = self
            .population
            .iter()
            .filter(|g| g.is_viable())
            .cloned()
            .collect();
        let failures = self.population.len() - survivors.len();
        if failures > 0 {
            debug!(
                "generation {}: culled {failures} failed genomes",
                self.generation
            );
        }

        self.seed_reference(&survivors);
        let survivor_count = survivors.len();
        let ranking = self.rank(survivors);

        let next = self.breed(&ranking);
        self.population = next;
        self.ranking = ranking;

        let summary = self.summarize(survivor_count, failures, evaluated);
        info!(
            "generation {}: best {} score {:.4}, {} survivors, {} failures",
            summary.generation,
            self.best(),
            summary.best.score,
            summary.survivors,
            summary.failures
        );
        self.history.record(&summary);
        self.summary = Some(summary.clone());
        self.generation += 1;

        summary
    }

    /// Evaluate every genome without a complete, failure-free result set.
    /// Returns the number of evaluator calls.
    fn evaluate_population(&mut self) -> usize {
        let evaluator = &self.evaluator;
        let benchmarks = self.benchmarks.as_slice();
        let counter = &self.evaluations;
        let population = &mut self.population;

        // Blocks until every evaluation of this generation has finished
        self.workers.install(|| {
            population
                .par_iter_mut()
                .filter(|genome| genome.needs_evaluation())
                .map(|genome| {
                    debug!("evaluating {genome}");
                    let results = evaluator.evaluate(genome, benchmarks);
                    counter.fetch_add(1, Ordering::Relaxed);
                    genome.results = conform_results(results, benchmarks.len());
                    if genome.has_failure() {
                        warn!("evaluation of {genome} failed on at least one benchmark");
                    }
                    1
                })
                .sum()
        })
    }

    /// Fill empty baseline slots, best survivor first.
    fn seed_reference(&mut self, survivors: &[Genome]) {
        if self.reference.is_complete() || survivors.is_empty() {
            return;
        }

        let mut order: Vec<&Genome> = survivors.iter().collect();
        order.sort_by(|a, b| raw_cost(a).total_cmp(&raw_cost(b)));

        for genome in order {
            let filled = self.reference.seed_from(genome);
            if filled > 0 {
                info!("reference baseline: {filled} slots taken from {genome}");
            }
            if self.reference.is_complete() {
                break;
            }
        }
    }

    /// Sort survivors by score, ties kept in population order. With no
    /// survivors the whole population forms the pool at a neutral score.
    fn rank(&self, survivors: Vec<Genome>) -> Vec<RankedGenome> {
        if survivors.is_empty() {
            warn!(
                "generation {}: no genome survived evaluation, using neutral scores",
                self.generation
            );
            return self
                .population
                .iter()
                .map(|genome| RankedGenome {
                    genome: genome.clone(),
                    score: NEUTRAL_SCORE,
                })
                .collect();
        }

        let mut ranked: Vec<RankedGenome> = survivors
            .into_iter()
            .map(|genome| RankedGenome {
                score: self.reference.score(&genome),
                genome,
            })
            .collect();
        ranked.sort_by(|a, b| a.score.total_cmp(&b.score));
        ranked
    }

    /// Build the next population from the ranking pool.
    fn breed(&mut self, ranking: &[RankedGenome]) -> Vec<Genome> {
        let size = self.params.population_size;
        let bounds = self.params.bounds;
        let mut next = Vec::with_capacity(size * 2);

        // Elitism: keep best individuals with their cached results
        next.extend(
            ranking
                .iter()
                .take(self.params.elite_count)
                .map(|r| r.genome.clone()),
        );

        let pool: Vec<Genome> = ranking.iter().map(|r| r.genome.clone()).collect();
        let sampler = SelectionSampler::new(pool.len());
        let selected = sampler.select_distinct(&pool, self.params.selection_count, &mut self.rng);

        if self.rng.trigger(self.params.crossover_rate)
            && let Some((a, b)) = self.rng.two_distinct(selected.len())
        {
            let (child1, child2) = self.rng.crossover(&selected[a], &selected[b], &bounds);
            debug!(
                "crossover {} x {} -> {child1}, {child2}",
                selected[a], selected[b]
            );
            next.push(child1);
            next.push(child2);
        }

        for parent in &selected {
            if self.rng.trigger(self.params.mutation_rate) {
                let mut mutant = parent.clone();
                self.rng
                    .mutate(&mut mutant, self.params.mutation_amount, &bounds);
                debug!("mutation {parent} -> {mutant}");
                next.push(mutant);
            }
        }

        next.truncate(size);
        while next.len() < size {
            next.push(self.rng.random_genome(&bounds, self.benchmarks.len()));
        }
        next
    }

    fn summarize(&self, survivors: usize, failures: usize, evaluated: usize) -> GenerationSummary {
        let best = self.best_snapshot();
        let worst = match self.ranking.last() {
            Some(ranked) => ranked.snapshot(),
            None => best.clone(),
        };
        let mean_score = if self.ranking.is_empty() {
            NEUTRAL_SCORE
        } else {
            self.ranking.iter().map(|r| r.score).sum::<f64>() / self.ranking.len() as f64
        };

        GenerationSummary {
            generation: self.generation,
            best,
            worst,
            survivors,
            failures,
            evaluated,
            total_evaluations: self.evaluations(),
            mean_score,
            reference_complete: self.reference.is_complete(),
        }
    }

    /// Run generations until cancelled or `max_generations` have completed,
    /// calling `callback` after each one.
    pub fn run_with_callback<F>(
        &mut self,
        max_generations: Option<usize>,
        mut callback: F,
    ) -> EvolutionResult
    where
        F: FnMut(&GenerationSummary),
    {
        let start_time = Instant::now();
        let first_generation = self.generation;

        let stop_reason = loop {
            if self.cancelled.load(Ordering::Relaxed) {
                break StopReason::Cancelled;
            }
            if let Some(max) = max_generations
                && self.generation - first_generation >= max
            {
                break StopReason::MaxGenerations;
            }

            let summary = self.run_generation();
            callback(&summary);
        };

        let best = self.best_snapshot();

        EvolutionResult {
            stats: EvolutionStats {
                generations: self.generation - first_generation,
                total_evaluations: self.evaluations(),
                best_score: best.score,
                elapsed_seconds: start_time.elapsed().as_secs_f64(),
                stop_reason,
            },
            best,
            history: self.history.clone(),
        }
    }

    /// Run a fixed number of generations (blocking).
    pub fn run(&mut self, generations: usize) -> EvolutionResult {
        self.run_with_callback(Some(generations), |_| {})
    }
}
