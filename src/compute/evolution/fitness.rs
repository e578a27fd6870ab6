//! Fitness evaluation for evolutionary formula search.
//!
//! Fitness combines cross-domain predictive power, cross-domain stability and
//! parameter parsimony:
//!
//! ```text
//! fitness = 0.7 · overall_correlation + 0.2 · consistency + 0.1 · simplicity
//! ```
//!
//! Simplicity penalizes distance from weight 1.0 for every family. Hybrid
//! weights default to 0.2, so the canonical hybrid formula is already
//! penalized; the term is kept uniform across families regardless.

use crate::compute::validator::FormulaValidator;
use crate::schema::{EvolutionConfig, FitnessScore, FitnessWeights, Formula};

/// Scores one formula. Called concurrently from evaluation threads.
pub trait Evaluate: Sync {
    fn evaluate(&self, formula: &Formula) -> FitnessScore;
}

/// `max(0, 1 - mean(|w - 1|) / 2)` over the formula's weights.
pub fn simplicity_score(formula: &Formula) -> f64 {
    let n = formula.parameters.len();
    if n == 0 {
        return 1.0;
    }
    let mean_dev = formula
        .parameters
        .iter()
        .map(|(_, w)| (w - 1.0).abs())
        .sum::<f64>()
        / n as f64;
    (1.0 - mean_dev / 2.0).max(0.0)
}

/// Weighted sum of the three fitness components.
pub fn combine(
    weights: &FitnessWeights,
    overall_correlation: f64,
    consistency_score: f64,
    simplicity_score: f64,
) -> FitnessScore {
    FitnessScore {
        fitness: weights.correlation_weight * overall_correlation
            + weights.consistency_weight * consistency_score
            + weights.simplicity_weight * simplicity_score,
        overall_correlation,
        consistency_score,
        simplicity_score,
    }
}

/// Validator-backed fitness over a fixed domain list.
pub struct FitnessEvaluator<'a> {
    validator: FormulaValidator<'a>,
    domains: Vec<String>,
    weights: FitnessWeights,
    limit_per_domain: usize,
}

impl<'a> FitnessEvaluator<'a> {
    pub fn new(validator: FormulaValidator<'a>, config: &EvolutionConfig) -> Self {
        let limit_per_domain = validator.config().limit_per_domain;
        Self {
            validator,
            domains: config.domains.clone(),
            weights: config.fitness.clone(),
            limit_per_domain,
        }
    }
}

impl Evaluate for FitnessEvaluator<'_> {
    fn evaluate(&self, formula: &Formula) -> FitnessScore {
        let report = self
            .validator
            .validate(formula, &self.domains, self.limit_per_domain);
        combine(
            &self.weights,
            report.overall_correlation,
            report.consistency_score,
            simplicity_score(formula),
        )
    }
}
