//! Validation report types for cross-domain formula testing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{FormulaFamily, VisualProperty};

/// Effect-size bucket by absolute correlation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum EffectSize {
    None,
    Small,
    Medium,
    Large,
}

impl EffectSize {
    /// |r| < 0.1 none, < 0.3 small, < 0.5 medium, else large.
    pub fn from_correlation(r: f64) -> Self {
        let r = r.abs();
        if r < 0.1 {
            EffectSize::None
        } else if r < 0.3 {
            EffectSize::Small
        } else if r < 0.5 {
            EffectSize::Medium
        } else {
            EffectSize::Large
        }
    }
}

/// One (domain, visual property) correlation test.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CorrelationResult {
    pub domain: String,
    pub property: VisualProperty,
    pub correlation: f64,
    pub p_value: f64,
    pub sample_size: usize,
    pub significant: bool,
    pub effect_size: EffectSize,
}

/// Performance of one formula on one domain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DomainPerformance {
    pub domain: String,
    /// Entities with both an encoding and an outcome.
    pub sample_size: usize,
    /// Property with the largest |r|; `None` when the sample was insufficient.
    pub best_property: Option<VisualProperty>,
    pub best_correlation: f64,
    pub best_p_value: f64,
    /// Median-split accuracy on the best property (diagnostic only).
    pub binary_accuracy: Option<f64>,
    pub correlations: Vec<CorrelationResult>,
    pub significant_properties: Vec<VisualProperty>,
    /// True when fewer than the minimum sample size was available.
    pub insufficient_data: bool,
}

impl DomainPerformance {
    /// Zero-correlation record for an undersized sample.
    pub fn insufficient(domain: &str, sample_size: usize) -> Self {
        Self {
            domain: domain.to_string(),
            sample_size,
            best_property: None,
            best_correlation: 0.0,
            best_p_value: 1.0,
            binary_accuracy: None,
            correlations: Vec::new(),
            significant_properties: Vec::new(),
            insufficient_data: true,
        }
    }

    /// Whether this domain contributes to the aggregate statistics.
    pub fn has_data(&self) -> bool {
        !self.insufficient_data
    }
}

/// Per-formula aggregate across domains.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CrossDomainReport {
    pub formula_id: String,
    pub family: FormulaFamily,
    /// Domains requested by the caller.
    pub domains_tested: Vec<String>,
    /// Domains that loaded; insufficient samples included.
    pub domain_performances: Vec<DomainPerformance>,
    /// Domains skipped because loading failed.
    pub skipped_domains: Vec<String>,
    /// Mean |best correlation| over domains with data.
    pub overall_correlation: f64,
    /// max(0, 1 - stddev(|best correlation|)).
    pub consistency_score: f64,
    pub best_domain: Option<String>,
    pub worst_domain: Option<String>,
    /// Significant in at least half of the domains with data.
    pub universal_properties: Vec<VisualProperty>,
    /// Significant properties that are not universal, per domain.
    pub domain_specific_properties: BTreeMap<String, Vec<VisualProperty>>,
}

impl CrossDomainReport {
    /// Performance entry for a domain.
    pub fn domain(&self, domain: &str) -> Option<&DomainPerformance> {
        self.domain_performances.iter().find(|p| p.domain == domain)
    }

    /// Number of domains that contributed data.
    pub fn domains_with_data(&self) -> usize {
        self.domain_performances.iter().filter(|p| p.has_data()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effect_size_buckets() {
        assert_eq!(EffectSize::from_correlation(0.05), EffectSize::None);
        assert_eq!(EffectSize::from_correlation(-0.2), EffectSize::Small);
        assert_eq!(EffectSize::from_correlation(0.3), EffectSize::Medium);
        assert_eq!(EffectSize::from_correlation(-0.75), EffectSize::Large);
    }

    #[test]
    fn test_insufficient_record() {
        let perf = DomainPerformance::insufficient("startups", 4);
        assert!(!perf.has_data());
        assert_eq!(perf.best_correlation, 0.0);
        assert_eq!(perf.best_p_value, 1.0);
    }
}
