//! Compute module - Formula transforms, validation, evolution and analysis.

pub mod convergence;
pub mod engine;
pub mod evolution;
pub mod formula;
pub mod stats;
pub mod validator;

pub use convergence::ConvergenceAnalyzer;
pub use engine::FormulaEngine;
pub use evolution::{EvolutionEngine, FormulaRng, RunArchive, evolve};
pub use formula::{GOLDEN_ANGLE, MeaningCategory, PHI, transform};
pub use validator::FormulaValidator;
