//! Generational genetic algorithm over formula weights.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

use log::{info, warn};
use rayon::prelude::*;

use crate::schema::{
    EvolutionConfig, EvolutionConfigError, EvolutionHistory, EvolutionProgress, FitnessScore,
    Formula, FormulaError, Generation, Individual, StopReason,
};

use super::fitness::Evaluate;
use super::genome::FormulaRng;

/// A member of the working population.
#[derive(Debug, Clone)]
struct Candidate {
    id: u64,
    formula: Formula,
    /// Set exactly once, by evaluation; elites carry theirs forward.
    score: Option<FitnessScore>,
    generation: usize,
    parents: Vec<u64>,
}

impl Candidate {
    fn fitness(&self) -> f64 {
        self.score.map_or(f64::NEG_INFINITY, |s| s.fitness)
    }

    fn to_individual(&self) -> Individual {
        Individual {
            id: self.id,
            formula: self.formula.clone(),
            score: self.score.unwrap_or_default(),
            generation: self.generation,
            parents: self.parents.clone(),
        }
    }
}

/// Evolution engine that runs the search.
pub struct EvolutionEngine<E: Evaluate> {
    config: EvolutionConfig,
    rng: FormulaRng,
    evaluator: E,
    population: Vec<Candidate>,
    generations: Vec<Generation>,
    best_fitness: f64,
    best_formula: Option<Formula>,
    stall_count: usize,
    evaluations: u64,
    next_id: Arc<AtomicU64>,
    cancelled: Arc<AtomicBool>,
    pool: Option<rayon::ThreadPool>,
}

impl<E: Evaluate> EvolutionEngine<E> {
    /// Create a new evolution engine.
    pub fn new(config: EvolutionConfig, evaluator: E) -> Result<Self, EvolutionConfigError> {
        config.validate()?;

        let seed = config.random_seed.unwrap_or_else(rand::random);
        let workers = config.evaluation.parallel_workers;
        let pool = if workers > 1 {
            match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
                Ok(pool) => Some(pool),
                Err(e) => {
                    warn!("Could not build {workers}-thread pool, using global pool: {e}");
                    None
                }
            }
        } else {
            None
        };

        Ok(Self {
            config,
            rng: FormulaRng::new(seed),
            evaluator,
            population: Vec::new(),
            generations: Vec::new(),
            best_fitness: f64::NEG_INFINITY,
            best_formula: None,
            stall_count: 0,
            evaluations: 0,
            next_id: Arc::new(AtomicU64::new(0)),
            cancelled: Arc::new(AtomicBool::new(false)),
            pool,
        })
    }

    /// Get cancellation handle.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }

    /// Initialize the population with random formulas of the target family.
    pub fn initialize(&mut self) {
        self.population.clear();
        self.generations.clear();
        self.best_fitness = f64::NEG_INFINITY;
        self.best_formula = None;
        self.stall_count = 0;
        self.evaluations = 0;

        for _ in 0..self.config.population.size {
            let candidate = self.fresh_candidate(0);
            self.population.push(candidate);
        }
    }

    fn fresh_candidate(&mut self, generation: usize) -> Candidate {
        Candidate {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            formula: self.rng.random_formula(self.config.family),
            score: None,
            generation,
            parents: Vec::new(),
        }
    }

    /// Score every candidate that has no score yet.
    fn evaluate_population(&mut self) {
        let pending = self.population.iter().filter(|c| c.score.is_none()).count();
        let evaluator = &self.evaluator;
        let score = |candidate: &mut Candidate| {
            if candidate.score.is_none() {
                candidate.score = Some(evaluator.evaluate(&candidate.formula));
            }
        };

        match (&self.pool, self.config.evaluation.parallel_workers) {
            (_, 1) => self.population.iter_mut().for_each(score),
            (Some(pool), _) => {
                let population = &mut self.population;
                pool.install(|| population.par_iter_mut().for_each(score));
            }
            (None, _) => self.population.par_iter_mut().for_each(score),
        }

        self.evaluations += pending as u64;
    }

    /// Sort, summarize and append the current population as a generation.
    fn record_generation(&mut self, index: usize) -> &Generation {
        self.population.sort_by(|a, b| b.fitness().total_cmp(&a.fitness()));

        let individuals: Vec<Individual> =
            self.population.iter().map(Candidate::to_individual).collect();
        let n = individuals.len().max(1) as f64;
        let mean = individuals.iter().map(Individual::fitness).sum::<f64>() / n;
        let variance = individuals
            .iter()
            .map(|i| (i.fitness() - mean).powi(2))
            .sum::<f64>()
            / n;
        let best_individual = individuals[0].clone();

        if best_individual.fitness() > self.best_fitness {
            self.best_fitness = best_individual.fitness();
            self.best_formula = Some(best_individual.formula.clone());
        }

        info!(
            "Generation {index}: best={:.4} mean={mean:.4} std={:.4}",
            best_individual.fitness(),
            variance.sqrt()
        );

        self.generations.push(Generation {
            index,
            best_fitness: best_individual.fitness(),
            mean_fitness: mean,
            fitness_std: variance.sqrt(),
            best_individual,
            individuals,
        });
        &self.generations[self.generations.len() - 1]
    }

    /// Replace the population with the next generation.
    fn step_generation(&mut self, next_index: usize) {
        let size = self.config.population.size;
        let elite_size = self.config.genetic.elite_size.min(self.population.len());
        let mut next_gen = Vec::with_capacity(size);

        // Elitism: keep best individuals with their scores.
        for elite in &self.population[..elite_size] {
            let mut elite = elite.clone();
            elite.generation = next_index;
            next_gen.push(elite);
        }

        while next_gen.len() < size {
            let first = self.select_index();
            let second = self.select_index();
            let candidate = match self.breed(first, second) {
                Ok(formula) => Candidate {
                    id: self.next_id.fetch_add(1, Ordering::Relaxed),
                    formula,
                    score: None,
                    generation: next_index,
                    parents: vec![self.population[first].id, self.population[second].id],
                },
                Err(e) => {
                    warn!("Breeding failed, substituting a random individual: {e}");
                    self.fresh_candidate(next_index)
                }
            };
            next_gen.push(candidate);
        }

        self.population = next_gen;
    }

    fn breed(&mut self, first: usize, second: usize) -> Result<Formula, FormulaError> {
        let child = self.population[first]
            .formula
            .crossover(&self.population[second].formula, &mut self.rng)?;
        Ok(child.mutate(self.config.genetic.mutation_rate, &mut self.rng))
    }

    /// Tournament selection: best of `tournament_size` uniform draws.
    fn select_index(&mut self) -> usize {
        let mut best_idx = 0;
        let mut best_fitness = f64::NEG_INFINITY;
        for _ in 0..self.config.genetic.tournament_size {
            let idx = self.rng.index(self.population.len());
            if self.population[idx].fitness() > best_fitness {
                best_fitness = self.population[idx].fitness();
                best_idx = idx;
            }
        }
        best_idx
    }

    /// Progress after the most recent generation.
    pub fn progress(&self, elapsed_seconds: f64) -> EvolutionProgress {
        let latest = self.generations.last();
        EvolutionProgress {
            generation: latest.map_or(0, |g| g.index),
            total_generations: self.config.population.max_generations,
            best_fitness: self.best_fitness_or_zero(),
            generation_best: latest.map_or(0.0, |g| g.best_fitness),
            mean_fitness: latest.map_or(0.0, |g| g.mean_fitness),
            stall_count: self.stall_count,
            elapsed_seconds,
        }
    }

    fn best_fitness_or_zero(&self) -> f64 {
        if self.best_fitness.is_finite() {
            self.best_fitness
        } else {
            0.0
        }
    }

    /// Cancellation or timeout, checked at generation boundaries.
    fn should_stop(&self, start: Instant) -> Option<StopReason> {
        if self.cancelled.load(Ordering::Relaxed) {
            return Some(StopReason::Cancelled);
        }
        match self.config.evaluation.max_duration_secs {
            Some(limit) if start.elapsed().as_secs_f64() >= limit => Some(StopReason::Timeout),
            _ => None,
        }
    }

    /// Run evolution with progress callback.
    pub fn run_with_callback<F>(&mut self, callback: F) -> EvolutionHistory
    where
        F: Fn(&EvolutionProgress),
    {
        let start = Instant::now();
        let max_generations = self.config.population.max_generations;
        let threshold = self.config.convergence.threshold;
        let patience = self.config.convergence.patience;

        self.initialize();
        info!(
            "Evolving {} formulas: population {}, up to {max_generations} generations",
            self.config.family, self.config.population.size
        );

        let mut convergence_generation = None;
        let mut generation = 0;
        let stop_reason = loop {
            if let Some(reason) = self.should_stop(start) {
                break reason;
            }

            self.evaluate_population();
            let previous_best = self.generations.last().map(|g| g.best_fitness);
            let current_best = self.record_generation(generation).best_fitness;

            if let Some(previous) = previous_best {
                if current_best - previous < threshold {
                    self.stall_count += 1;
                } else {
                    self.stall_count = 0;
                }
            }
            callback(&self.progress(start.elapsed().as_secs_f64()));

            if self.stall_count >= patience {
                convergence_generation = Some(generation);
                info!("Converged at generation {generation}");
                break StopReason::Converged;
            }
            if generation + 1 >= max_generations {
                break StopReason::MaxGenerations;
            }

            self.step_generation(generation + 1);
            generation += 1;
        };

        if stop_reason == StopReason::Cancelled || stop_reason == StopReason::Timeout {
            info!(
                "Evolution stopped ({stop_reason:?}) after {} generations",
                self.generations.len()
            );
        }

        EvolutionHistory {
            family: self.config.family,
            config: self.config.clone(),
            generations: self.generations.clone(),
            converged: convergence_generation.is_some(),
            convergence_generation,
            best_fitness: self.best_fitness_or_zero(),
            best_formula: self.best_formula.clone(),
            stop_reason,
            total_evaluations: self.evaluations,
            elapsed_seconds: start.elapsed().as_secs_f64(),
        }
    }

    /// Run evolution (blocking).
    pub fn run(&mut self) -> EvolutionHistory {
        self.run_with_callback(|_| {})
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{
        ConvergenceConfig, EvaluationConfig, FormulaFamily, GeneticAlgorithmConfig,
        PopulationConfig,
    };
    use std::sync::atomic::AtomicUsize;

    /// Fitness driven by call count: generation g scores `curve(g)`.
    struct Scripted<F: Fn(usize) -> f64 + Sync> {
        calls: AtomicUsize,
        per_generation: usize,
        curve: F,
    }

    impl<F: Fn(usize) -> f64 + Sync> Evaluate for Scripted<F> {
        fn evaluate(&self, _formula: &Formula) -> FitnessScore {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            FitnessScore {
                fitness: (self.curve)(call / self.per_generation),
                ..Default::default()
            }
        }
    }

    fn scripted_config(size: usize, max_generations: usize, patience: usize) -> EvolutionConfig {
        EvolutionConfig {
            family: FormulaFamily::Phonetic,
            domains: vec!["unused".to_string()],
            population: PopulationConfig {
                size,
                max_generations,
            },
            genetic: GeneticAlgorithmConfig {
                elite_size: 0,
                ..Default::default()
            },
            convergence: ConvergenceConfig {
                threshold: 0.001,
                patience,
            },
            evaluation: EvaluationConfig {
                parallel_workers: 1,
                ..Default::default()
            },
            random_seed: Some(42),
            ..Default::default()
        }
    }

    #[test]
    fn test_stall_from_generation_one_converges_after_patience() {
        let config = scripted_config(6, 50, 3);
        let evaluator = Scripted {
            calls: AtomicUsize::new(0),
            per_generation: 6,
            curve: |g| if g == 0 { 0.1 } else { 0.5 },
        };
        let mut engine = EvolutionEngine::new(config, evaluator).unwrap();
        let history = engine.run();

        assert!(history.converged);
        assert_eq!(history.convergence_generation, Some(1 + 3));
        assert_eq!(history.stop_reason, StopReason::Converged);
        assert_eq!(history.generations.len(), 5);
    }

    #[test]
    fn test_strict_improvement_runs_all_generations() {
        let config = scripted_config(4, 8, 2);
        let evaluator = Scripted {
            calls: AtomicUsize::new(0),
            per_generation: 4,
            curve: |g| 0.1 * g as f64,
        };
        let mut engine = EvolutionEngine::new(config, evaluator).unwrap();
        let history = engine.run();

        assert!(!history.converged);
        assert_eq!(history.convergence_generation, None);
        assert_eq!(history.stop_reason, StopReason::MaxGenerations);
        assert_eq!(history.generations.len(), 8);
        assert_eq!(history.total_evaluations, 32);
        assert!((history.best_fitness - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_cancellation() {
        let config = scripted_config(4, 100, 5);
        let evaluator = Scripted {
            calls: AtomicUsize::new(0),
            per_generation: 4,
            curve: |g| g as f64,
        };
        let mut engine = EvolutionEngine::new(config, evaluator).unwrap();
        let cancel = engine.cancel_handle();

        // Cancel immediately
        cancel.store(true, Ordering::Relaxed);

        let history = engine.run();
        assert_eq!(history.stop_reason, StopReason::Cancelled);
        assert!(history.generations.is_empty());
    }

    #[test]
    fn test_cancel_from_callback_keeps_partial_history() {
        let config = scripted_config(4, 100, 5);
        let evaluator = Scripted {
            calls: AtomicUsize::new(0),
            per_generation: 4,
            curve: |g| g as f64,
        };
        let mut engine = EvolutionEngine::new(config, evaluator).unwrap();
        let cancel = engine.cancel_handle();
        let history = engine.run_with_callback(|p| {
            if p.generation == 2 {
                cancel.store(true, Ordering::Relaxed);
            }
        });
        assert_eq!(history.stop_reason, StopReason::Cancelled);
        assert_eq!(history.generations.len(), 3);
        assert!(history.generations.iter().all(|g| g.individuals.len() == 4));
    }

    #[test]
    fn test_zero_budget_times_out() {
        let mut config = scripted_config(4, 10, 5);
        config.evaluation.max_duration_secs = Some(0.0);
        let evaluator = Scripted {
            calls: AtomicUsize::new(0),
            per_generation: 4,
            curve: |_| 0.0,
        };
        let history = EvolutionEngine::new(config, evaluator).unwrap().run();
        assert_eq!(history.stop_reason, StopReason::Timeout);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = scripted_config(4, 10, 5);
        config.genetic.elite_size = 4;
        let evaluator = Scripted {
            calls: AtomicUsize::new(0),
            per_generation: 4,
            curve: |_| 0.0,
        };
        assert!(matches!(
            EvolutionEngine::new(config, evaluator),
            Err(EvolutionConfigError::TooManyElites { .. })
        ));
    }

    struct ByWeight;

    impl Evaluate for ByWeight {
        fn evaluate(&self, formula: &Formula) -> FitnessScore {
            FitnessScore {
                fitness: formula.parameters.iter().map(|(_, w)| w).sum(),
                ..Default::default()
            }
        }
    }

    #[test]
    fn test_elites_survive_with_their_scores() {
        let mut config = scripted_config(8, 4, 10);
        config.genetic.elite_size = 2;
        config.evaluation.parallel_workers = 2;
        let mut engine = EvolutionEngine::new(config, ByWeight).unwrap();
        let history = engine.run();

        for pair in history.generations.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            assert!(next.best_fitness >= prev.best_fitness);
            for elite in prev.top(2) {
                let carried = next.individuals.iter().find(|i| i.id == elite.id).unwrap();
                assert_eq!(carried.score, elite.score);
                assert_eq!(carried.generation, next.index);
            }
        }
        assert_eq!(history.total_evaluations, 8 + 3 * 6);
    }

    #[test]
    fn test_breeding_failure_substitutes_random_individual() {
        let mut config = scripted_config(6, 2, 10);
        config.genetic.tournament_size = 1;
        let mut engine = EvolutionEngine::new(config, ByWeight).unwrap();
        engine.initialize();
        for (candidate, family) in engine.population.iter_mut().zip(FormulaFamily::ALL) {
            candidate.formula = Formula::canonical(family);
        }
        engine.evaluate_population();
        engine.record_generation(0);

        let mut fallbacks = 0;
        engine.step_generation(1);
        for candidate in &engine.population {
            if candidate.parents.is_empty() {
                assert_eq!(candidate.formula.family, FormulaFamily::Phonetic);
                assert!(candidate.formula.id.starts_with("phonetic-r"));
                fallbacks += 1;
            } else {
                assert_eq!(candidate.parents.len(), 2);
            }
        }
        assert_eq!(engine.population.len(), 6);
        assert!(fallbacks > 0);
    }
}
