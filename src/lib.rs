//! Formula evolution - Cross-domain search for name-to-visual encodings.
//!
//! A *formula* maps the linguistic features of a name (phonetics, meaning,
//! structure, letter statistics, numerology) to a fixed-schema visual
//! encoding. This crate evaluates how well each formula's visual properties
//! predict real-world outcomes across several domains, evolves formula
//! weights with a genetic algorithm, and mines the converged populations
//! for recurring numeric regularities.
//!
//! # Architecture
//!
//! - `schema`: serde data types and configuration (features, encodings,
//!   reports, evolution history, convergence signatures)
//! - `compute`: formula families, registry, validator, evolution and
//!   convergence analysis
//! - `domain`: the domain-loader seam plus in-memory, JSON and synthetic
//!   loaders
//!
//! # Example
//!
//! ```rust,no_run
//! use formula_evolution::{
//!     compute::{ConvergenceAnalyzer, evolve},
//!     domain::{InMemoryDomains, SyntheticDomain},
//!     schema::{EvolutionConfig, FormulaFamily, keys},
//! };
//!
//! // A seeded domain whose outcome follows name harshness
//! let loader = InMemoryDomains::new()
//!     .with_synthetic(&SyntheticDomain::new("brands", 200, 7).with_term(keys::HARSHNESS, 1.0))
//!     .unwrap();
//!
//! let config = EvolutionConfig {
//!     family: FormulaFamily::Phonetic,
//!     domains: vec!["brands".to_string()],
//!     random_seed: Some(7),
//!     ..Default::default()
//! };
//! let history = evolve(config, &loader).unwrap();
//! let signature = ConvergenceAnalyzer::default().analyze(&history);
//!
//! println!("Best fitness: {:.3}", history.best_fitness);
//! println!("Invariants found: {}", signature.invariants.len());
//! ```

pub mod compute;
pub mod domain;
pub mod schema;

// Re-export commonly used types
pub use compute::{ConvergenceAnalyzer, FormulaEngine, FormulaValidator, evolve};
pub use schema::{EvolutionConfig, EvolutionHistory, Formula, FormulaFamily, VisualEncoding};
