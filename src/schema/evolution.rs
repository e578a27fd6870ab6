//! Evolution configuration and history types for formula optimization.
//!
//! This module provides types for configuring the genetic algorithm that
//! evolves formula weights against cross-domain validation fitness, and the
//! generation-by-generation record it produces.

use serde::{Deserialize, Serialize};

use super::{ConfigError, Formula, FormulaFamily, ValidationConfig};

/// Top-level configuration for an evolution run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionConfig {
    /// Family whose weights are evolved.
    pub family: FormulaFamily,
    /// Domains used to score every individual.
    pub domains: Vec<String>,
    /// Population and generation settings.
    #[serde(default)]
    pub population: PopulationConfig,
    /// Genetic operator settings.
    #[serde(default)]
    pub genetic: GeneticAlgorithmConfig,
    /// Early-stopping settings.
    #[serde(default)]
    pub convergence: ConvergenceConfig,
    /// Fitness component weights.
    #[serde(default)]
    pub fitness: FitnessWeights,
    /// Evaluation settings (parallelism, time budget).
    #[serde(default)]
    pub evaluation: EvaluationConfig,
    /// Validator settings used for fitness.
    #[serde(default)]
    pub validation: ValidationConfig,
    /// Random seed for reproducibility.
    #[serde(default)]
    pub random_seed: Option<u64>,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            family: FormulaFamily::Phonetic,
            domains: Vec::new(),
            population: PopulationConfig::default(),
            genetic: GeneticAlgorithmConfig::default(),
            convergence: ConvergenceConfig::default(),
            fitness: FitnessWeights::default(),
            evaluation: EvaluationConfig::default(),
            validation: ValidationConfig::default(),
            random_seed: None,
        }
    }
}

/// Population and generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Number of individuals in population.
    #[serde(default = "default_population_size")]
    pub size: usize,
    /// Maximum number of generations.
    #[serde(default = "default_max_generations")]
    pub max_generations: usize,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            size: default_population_size(),
            max_generations: default_max_generations(),
        }
    }
}

fn default_population_size() -> usize {
    50
}
fn default_max_generations() -> usize {
    50
}

/// Genetic algorithm configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneticAlgorithmConfig {
    /// Per-weight mutation probability (0.0-1.0).
    #[serde(default = "default_mutation_rate")]
    pub mutation_rate: f64,
    /// Elitism: number of best individuals copied unchanged.
    #[serde(default = "default_elite_size")]
    pub elite_size: usize,
    /// Individuals sampled per tournament.
    #[serde(default = "default_tournament_size")]
    pub tournament_size: usize,
}

impl Default for GeneticAlgorithmConfig {
    fn default() -> Self {
        Self {
            mutation_rate: default_mutation_rate(),
            elite_size: default_elite_size(),
            tournament_size: default_tournament_size(),
        }
    }
}

fn default_mutation_rate() -> f64 {
    0.1
}
fn default_elite_size() -> usize {
    5
}
fn default_tournament_size() -> usize {
    3
}

/// Convergence detection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvergenceConfig {
    /// Best-fitness improvement below this counts as a stall.
    #[serde(default = "default_convergence_threshold")]
    pub threshold: f64,
    /// Consecutive stalled generations before stopping.
    #[serde(default = "default_patience")]
    pub patience: usize,
}

impl Default for ConvergenceConfig {
    fn default() -> Self {
        Self {
            threshold: default_convergence_threshold(),
            patience: default_patience(),
        }
    }
}

fn default_convergence_threshold() -> f64 {
    0.001
}
fn default_patience() -> usize {
    5
}

/// Weights of the fitness components.
///
/// Ordering of objectives: raw predictive power, then cross-domain
/// stability, then parsimony.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitnessWeights {
    #[serde(default = "default_correlation_weight")]
    pub correlation_weight: f64,
    #[serde(default = "default_consistency_weight")]
    pub consistency_weight: f64,
    #[serde(default = "default_simplicity_weight")]
    pub simplicity_weight: f64,
}

impl Default for FitnessWeights {
    fn default() -> Self {
        Self {
            correlation_weight: default_correlation_weight(),
            consistency_weight: default_consistency_weight(),
            simplicity_weight: default_simplicity_weight(),
        }
    }
}

fn default_correlation_weight() -> f64 {
    0.70
}
fn default_consistency_weight() -> f64 {
    0.20
}
fn default_simplicity_weight() -> f64 {
    0.10
}

/// Evaluation settings for fitness computation.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EvaluationConfig {
    /// Number of parallel evaluations (0 = rayon global pool, 1 = sequential).
    #[serde(default)]
    pub parallel_workers: usize,
    /// Wall-clock budget checked at generation boundaries.
    #[serde(default)]
    pub max_duration_secs: Option<f64>,
}

// ============================================================================
// History Types
// ============================================================================

/// Fitness of one individual and the components it was built from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct FitnessScore {
    pub fitness: f64,
    pub overall_correlation: f64,
    pub consistency_score: f64,
    pub simplicity_score: f64,
}

/// One formula instance and its fitness within a generation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Individual {
    /// Unique identifier within the run.
    pub id: u64,
    pub formula: Formula,
    pub score: FitnessScore,
    /// Generation this individual belongs to.
    pub generation: usize,
    /// Parent individual ids (empty for generation 0 and fresh replacements).
    pub parents: Vec<u64>,
}

impl Individual {
    #[inline]
    pub fn fitness(&self) -> f64 {
        self.score.fitness
    }
}

/// Synchronized population snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Generation {
    pub index: usize,
    /// Individuals sorted by descending fitness.
    pub individuals: Vec<Individual>,
    pub best_fitness: f64,
    pub mean_fitness: f64,
    pub fitness_std: f64,
    pub best_individual: Individual,
}

impl Generation {
    /// Top `n` individuals by fitness, ties in stored order.
    pub fn top(&self, n: usize) -> Vec<&Individual> {
        let mut ranked: Vec<&Individual> = self.individuals.iter().collect();
        ranked.sort_by(|a, b| b.fitness().total_cmp(&a.fitness()));
        ranked.truncate(n);
        ranked
    }
}

/// Full record of an evolution run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionHistory {
    pub family: FormulaFamily,
    pub config: EvolutionConfig,
    pub generations: Vec<Generation>,
    pub converged: bool,
    pub convergence_generation: Option<usize>,
    /// Best fitness across all generations.
    pub best_fitness: f64,
    /// Best formula found, including its weights.
    pub best_formula: Option<Formula>,
    pub stop_reason: StopReason,
    pub total_evaluations: u64,
    pub elapsed_seconds: f64,
}

impl EvolutionHistory {
    pub fn final_generation(&self) -> Option<&Generation> {
        self.generations.last()
    }

    pub fn initial_best_fitness(&self) -> Option<f64> {
        self.generations.first().map(|g| g.best_fitness)
    }
}

/// Progress update emitted after each completed generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionProgress {
    /// Index of the generation just recorded.
    pub generation: usize,
    /// Total generations planned.
    pub total_generations: usize,
    /// Best fitness seen so far.
    pub best_fitness: f64,
    /// Best fitness this generation.
    pub generation_best: f64,
    /// Mean fitness this generation.
    pub mean_fitness: f64,
    /// Consecutive generations without sufficient improvement.
    pub stall_count: usize,
    pub elapsed_seconds: f64,
}

/// Reason evolution stopped.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StopReason {
    /// Fitness stalled for the configured patience.
    Converged,
    /// Reached maximum generations.
    MaxGenerations,
    /// Cancelled through the cancel handle.
    Cancelled,
    /// Wall-clock budget exhausted.
    Timeout,
}

// ============================================================================
// Validation
// ============================================================================

/// Evolution configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum EvolutionConfigError {
    #[error("Population size must be at least 2")]
    PopulationTooSmall,
    #[error("Max generations must be positive")]
    NoGenerations,
    #[error("Elite size {elite} must be smaller than population {population}")]
    TooManyElites { elite: usize, population: usize },
    #[error("Tournament size must be positive")]
    InvalidTournament,
    #[error("Mutation rate must be in [0, 1], got {0}")]
    InvalidMutationRate(f64),
    #[error("No domains specified")]
    NoDomains,
    #[error("Invalid fitness weight: {0}")]
    InvalidWeight(String),
    #[error("Convergence patience must be positive")]
    InvalidPatience,
    #[error("Validation config invalid: {0}")]
    Validation(#[from] ConfigError),
}

impl EvolutionConfig {
    /// Validate evolution configuration.
    pub fn validate(&self) -> Result<(), EvolutionConfigError> {
        self.validation.validate()?;

        if self.population.size < 2 {
            return Err(EvolutionConfigError::PopulationTooSmall);
        }
        if self.population.max_generations == 0 {
            return Err(EvolutionConfigError::NoGenerations);
        }
        if self.genetic.elite_size >= self.population.size {
            return Err(EvolutionConfigError::TooManyElites {
                elite: self.genetic.elite_size,
                population: self.population.size,
            });
        }
        if self.genetic.tournament_size == 0 {
            return Err(EvolutionConfigError::InvalidTournament);
        }
        if !(0.0..=1.0).contains(&self.genetic.mutation_rate) {
            return Err(EvolutionConfigError::InvalidMutationRate(
                self.genetic.mutation_rate,
            ));
        }
        if self.domains.is_empty() {
            return Err(EvolutionConfigError::NoDomains);
        }

        let weights = [
            ("correlation", self.fitness.correlation_weight),
            ("consistency", self.fitness.consistency_weight),
            ("simplicity", self.fitness.simplicity_weight),
        ];
        for (name, w) in weights {
            if !(w >= 0.0 && w.is_finite()) {
                return Err(EvolutionConfigError::InvalidWeight(format!(
                    "{name} weight {w} must be non-negative"
                )));
            }
        }
        if weights.iter().all(|(_, w)| *w == 0.0) {
            return Err(EvolutionConfigError::InvalidWeight(
                "all fitness weights are zero".to_string(),
            ));
        }

        if self.convergence.patience == 0 {
            return Err(EvolutionConfigError::InvalidPatience);
        }

        Ok(())
    }
}
