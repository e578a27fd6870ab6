//! Evolutionary search over formula weights.
//!
//! # Overview
//!
//! The evolutionary search system consists of:
//!
//! - **Genome Operations** (`genome`): seeded random formulas, crossover and mutation
//! - **Fitness** (`fitness`): validator-backed scoring of one formula
//! - **Search** (`search`): generational GA with elitism and tournament selection
//! - **Run Archive** (`archive`): storage, export and comparison of finished runs
//!
//! # Example
//!
//! ```rust,no_run
//! use formula_evolution::compute::evolution::evolve;
//! use formula_evolution::domain::JsonDomainLoader;
//! use formula_evolution::schema::{EvolutionConfig, FormulaFamily};
//!
//! let config = EvolutionConfig {
//!     family: FormulaFamily::Phonetic,
//!     domains: vec!["startups".to_string()],
//!     ..Default::default()
//! };
//! let loader = JsonDomainLoader::new("data/domains");
//! let history = evolve(config, &loader).unwrap();
//! println!("best fitness {:.3} after {} generations",
//!     history.best_fitness, history.generations.len());
//! ```
//!
//! # Fitness
//!
//! ```text
//! fitness = 0.7 · overall_correlation + 0.2 · consistency + 0.1 · simplicity
//! ```
//!
//! Evolution stops when the best fitness improves by less than the
//! convergence threshold for `patience` consecutive generations, when
//! `max_generations` is reached, or on cancellation/timeout.

mod archive;
mod fitness;
mod genome;
mod search;

pub use archive::{ArchiveError, RunArchive, load_history};
pub use fitness::{Evaluate, FitnessEvaluator, combine, simplicity_score};
pub use genome::{FormulaRng, MUTATION_SPAN, RANDOM_WEIGHT_MAX, RANDOM_WEIGHT_MIN, WEIGHT_CEILING};
pub use search::EvolutionEngine;

use crate::compute::engine::FormulaEngine;
use crate::compute::validator::FormulaValidator;
use crate::domain::DomainLoader;
use crate::schema::{EvolutionConfig, EvolutionConfigError, EvolutionHistory, EvolutionProgress};

/// Evolve `config.family` against `config.domains` (blocking).
pub fn evolve(
    config: EvolutionConfig,
    loader: &dyn DomainLoader,
) -> Result<EvolutionHistory, EvolutionConfigError> {
    evolve_with_callback(config, loader, |_| {})
}

/// Like [`evolve`], reporting progress after every generation.
pub fn evolve_with_callback<F>(
    config: EvolutionConfig,
    loader: &dyn DomainLoader,
    callback: F,
) -> Result<EvolutionHistory, EvolutionConfigError>
where
    F: Fn(&EvolutionProgress),
{
    let engine = FormulaEngine::new();
    let validator = FormulaValidator::new(&engine, loader, config.validation.clone());
    let evaluator = FitnessEvaluator::new(validator, &config);
    let mut search = EvolutionEngine::new(config, evaluator)?;
    Ok(search.run_with_callback(callback))
}
