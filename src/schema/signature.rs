//! Convergence signature types produced by invariant mining.
//!
//! Every invariant here is a candidate pattern found by tolerance matching,
//! not a proof; numeric coincidences are expected to show up.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::FormulaFamily;

/// Kind of numeric regularity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum InvariantType {
    /// Parameter clusters around a known mathematical constant.
    Constant,
    /// Parameter clusters around Fibonacci numbers.
    Pattern,
    /// Ratio of two parameters clusters around a known constant.
    Ratio,
    /// Two parameters keep a near-constant sum.
    Relationship,
}

/// One discovered numeric pattern.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MathematicalInvariant {
    pub invariant_type: InvariantType,
    pub description: String,
    /// Parameters involved (one for constant/pattern, two for ratio/relationship).
    pub parameters: Vec<String>,
    /// Observed median value (parameter, ratio or sum).
    pub observed: f64,
    /// Reference value it matched, if any.
    pub reference: Option<f64>,
    /// Fraction of individuals whose raw values match.
    pub occurrence_rate: f64,
    /// 1 - relative spread, in [0, 1].
    pub consistency_score: f64,
}

/// Summary statistics of one parameter across the top individuals.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParameterStatistics {
    pub name: String,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    /// Pearson correlation with fitness.
    pub fitness_correlation: f64,
    pub p_value: f64,
    pub significant: bool,
}

/// Correlation between two parameters across the top individuals.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParameterCorrelation {
    pub first: String,
    pub second: String,
    pub correlation: f64,
    pub p_value: f64,
}

/// Strongest findings of one signature.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct UniversalPatterns {
    /// Parameters with significant and strong fitness correlation.
    pub important_parameters: Vec<String>,
    /// Descriptions of invariants with high occurrence rate.
    pub frequent_invariants: Vec<String>,
}

/// Discovered numeric patterns for one formula type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConvergenceSignature {
    pub formula_type: FormulaFamily,
    /// Individuals analyzed.
    pub sample_size: usize,
    /// Best fitness among the analyzed individuals.
    pub best_fitness: f64,
    /// Ranked by |fitness correlation|, descending.
    pub parameter_statistics: Vec<ParameterStatistics>,
    /// Per-parameter median across the top individuals.
    pub optimal_parameters: BTreeMap<String, f64>,
    pub invariants: Vec<MathematicalInvariant>,
    /// Parameter pairs with |r| above the correlation threshold.
    pub parameter_correlations: Vec<ParameterCorrelation>,
    pub universal_patterns: UniversalPatterns,
}

impl ConvergenceSignature {
    /// Invariants that mention a parameter.
    pub fn invariants_for<'a>(
        &'a self,
        parameter: &'a str,
    ) -> impl Iterator<Item = &'a MathematicalInvariant> {
        self.invariants
            .iter()
            .filter(move |inv| inv.parameters.iter().any(|p| p == parameter))
    }
}

/// Patterns shared by several formula types.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CrossFormulaComparison {
    pub formula_types: Vec<FormulaFamily>,
    /// Parameter name → formula types where it was important.
    pub universal_parameters: BTreeMap<String, Vec<FormulaFamily>>,
    /// Invariant description → formula types where it recurred verbatim.
    pub common_invariants: BTreeMap<String, Vec<FormulaFamily>>,
}
