//! Cross-domain statistical validation of formulas.
//!
//! Each domain is tested independently: entities are transformed, every
//! numeric visual property is correlated with the outcome, and the per-domain
//! results are folded into a [`CrossDomainReport`]. A failing domain is
//! skipped, never fatal.
//!
//! No multiple-comparison correction is applied across the tested
//! properties, so with thirteen properties per domain a "significant" hit at
//! alpha = 0.05 is expected by chance about half the time.

use std::collections::BTreeMap;

use log::{debug, warn};

use super::engine::FormulaEngine;
use super::stats;
use crate::domain::{DomainEntity, DomainError, DomainLoader};
use crate::schema::{
    CorrelationResult, CrossDomainReport, DomainPerformance, EffectSize, Formula, FormulaError,
    ValidationConfig, VisualProperty,
};

/// Tests formulas against domains served by a [`DomainLoader`].
pub struct FormulaValidator<'a> {
    engine: &'a FormulaEngine,
    loader: &'a dyn DomainLoader,
    config: ValidationConfig,
}

impl<'a> FormulaValidator<'a> {
    pub fn new(
        engine: &'a FormulaEngine,
        loader: &'a dyn DomainLoader,
        config: ValidationConfig,
    ) -> Self {
        Self {
            engine,
            loader,
            config,
        }
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Validate a registered formula. Unknown ids fail.
    pub fn validate_formula(
        &self,
        formula_id: &str,
        domains: &[String],
        limit_per_domain: usize,
    ) -> Result<CrossDomainReport, FormulaError> {
        let formula = self.engine.get(formula_id)?;
        Ok(self.validate(formula, domains, limit_per_domain))
    }

    /// Validate any formula instance, registered or not.
    pub fn validate(
        &self,
        formula: &Formula,
        domains: &[String],
        limit_per_domain: usize,
    ) -> CrossDomainReport {
        let mut performances = Vec::with_capacity(domains.len());
        let mut skipped = Vec::new();

        for domain in domains {
            match self.validate_domain(formula, domain, limit_per_domain) {
                Ok(perf) => performances.push(perf),
                Err(e) => {
                    warn!("Skipping domain {domain} for {}: {e}", formula.id);
                    skipped.push(domain.clone());
                }
            }
        }

        aggregate(formula, domains, performances, skipped)
    }

    fn validate_domain(
        &self,
        formula: &Formula,
        domain: &str,
        limit: usize,
    ) -> Result<DomainPerformance, DomainError> {
        let entities = self.loader.load(domain, limit)?;
        let samples = self.samples(formula, &entities);

        if samples.len() < self.config.min_sample_size {
            warn!(
                "Domain {domain}: {} usable entities, need {}",
                samples.len(),
                self.config.min_sample_size
            );
            return Ok(DomainPerformance::insufficient(domain, samples.len()));
        }

        let outcomes: Vec<f64> = samples.iter().map(|s| s.outcome).collect();
        let alpha = self.config.significance_level;

        let correlations: Vec<CorrelationResult> = VisualProperty::ALL
            .iter()
            .enumerate()
            .map(|(idx, &property)| {
                let values: Vec<f64> = samples.iter().map(|s| s.properties[idx]).collect();
                let c = stats::pearson(&values, &outcomes);
                CorrelationResult {
                    domain: domain.to_string(),
                    property,
                    correlation: c.r,
                    p_value: c.p_value,
                    sample_size: c.n,
                    significant: c.is_significant(alpha),
                    effect_size: EffectSize::from_correlation(c.r),
                }
            })
            .collect();

        let mut best: Option<&CorrelationResult> = None;
        for result in &correlations {
            if best.is_none_or(|b| result.correlation.abs() > b.correlation.abs()) {
                best = Some(result);
            }
        }
        let (best_property, best_correlation, best_p_value) = best
            .map(|b| (Some(b.property), b.correlation, b.p_value))
            .unwrap_or((None, 0.0, 1.0));

        let binary_accuracy = best_property
            .and_then(|property| binary_accuracy(&samples, property, best_correlation));

        let significant_properties: Vec<VisualProperty> = correlations
            .iter()
            .filter(|c| c.significant)
            .map(|c| c.property)
            .collect();

        debug!(
            "Domain {domain}: n={} best={:?} r={best_correlation:.4} p={best_p_value:.4}",
            samples.len(),
            best_property
        );

        Ok(DomainPerformance {
            domain: domain.to_string(),
            sample_size: samples.len(),
            best_property,
            best_correlation,
            best_p_value,
            binary_accuracy,
            correlations,
            significant_properties,
            insufficient_data: false,
        })
    }

    /// Entities with both an encoding and a finite outcome.
    fn samples(&self, formula: &Formula, entities: &[DomainEntity]) -> Vec<Sample> {
        entities
            .iter()
            .filter_map(|entity| {
                let features = entity.linguistic_features.as_ref()?;
                let outcome = entity.outcome_metric.filter(|o| o.is_finite())?;
                let encoding = formula.transform(&entity.name, features);
                let mut properties = [0.0; VisualProperty::ALL.len()];
                for (slot, &p) in properties.iter_mut().zip(VisualProperty::ALL.iter()) {
                    *slot = encoding.property(p);
                }
                Some(Sample {
                    properties,
                    outcome,
                    successful: entity.is_successful,
                })
            })
            .collect()
    }
}

struct Sample {
    properties: [f64; VisualProperty::ALL.len()],
    outcome: f64,
    successful: Option<bool>,
}

fn property_index(property: VisualProperty) -> usize {
    VisualProperty::ALL
        .iter()
        .position(|&p| p == property)
        .unwrap_or(0)
}

/// Median-split classifier on one property; `None` unless every sample
/// carries a success flag.
fn binary_accuracy(samples: &[Sample], property: VisualProperty, r: f64) -> Option<f64> {
    let flags: Vec<bool> = samples.iter().map(|s| s.successful).collect::<Option<_>>()?;
    let idx = property_index(property);
    let values: Vec<f64> = samples.iter().map(|s| s.properties[idx]).collect();
    let median = stats::median(&values);

    let correct = values
        .iter()
        .zip(&flags)
        .filter(|(v, flag)| {
            let predicted = if r >= 0.0 { **v > median } else { **v < median };
            predicted == **flag
        })
        .count();
    Some(correct as f64 / samples.len() as f64)
}

fn aggregate(
    formula: &Formula,
    domains: &[String],
    performances: Vec<DomainPerformance>,
    skipped: Vec<String>,
) -> CrossDomainReport {
    let with_data: Vec<&DomainPerformance> = performances.iter().filter(|p| p.has_data()).collect();
    let abs_best: Vec<f64> = with_data.iter().map(|p| p.best_correlation.abs()).collect();

    let overall_correlation = stats::mean(&abs_best);
    let consistency_score = if abs_best.is_empty() {
        0.0
    } else {
        (1.0 - stats::std_dev(&abs_best)).max(0.0)
    };

    let by_strength = |a: &&&DomainPerformance, b: &&&DomainPerformance| {
        a.best_correlation.abs().total_cmp(&b.best_correlation.abs())
    };
    let best_domain = with_data.iter().max_by(by_strength).map(|p| p.domain.clone());
    let worst_domain = with_data.iter().min_by(by_strength).map(|p| p.domain.clone());

    let mut counts: BTreeMap<VisualProperty, usize> = BTreeMap::new();
    for perf in &with_data {
        for &property in &perf.significant_properties {
            *counts.entry(property).or_insert(0) += 1;
        }
    }
    let universal_properties: Vec<VisualProperty> = VisualProperty::ALL
        .iter()
        .copied()
        .filter(|p| counts.get(p).is_some_and(|&c| 2 * c >= with_data.len()))
        .collect();

    let domain_specific_properties: BTreeMap<String, Vec<VisualProperty>> = with_data
        .iter()
        .filter_map(|perf| {
            let specific: Vec<VisualProperty> = perf
                .significant_properties
                .iter()
                .copied()
                .filter(|p| !universal_properties.contains(p))
                .collect();
            (!specific.is_empty()).then(|| (perf.domain.clone(), specific))
        })
        .collect();

    CrossDomainReport {
        formula_id: formula.id.clone(),
        family: formula.family,
        domains_tested: domains.to_vec(),
        domain_performances: performances,
        skipped_domains: skipped,
        overall_correlation,
        consistency_score,
        best_domain,
        worst_domain,
        universal_properties,
        domain_specific_properties,
    }
}
