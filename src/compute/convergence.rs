//! Convergence analysis: mining numeric regularities from evolved populations.
//!
//! The analyzer looks at the fittest individuals of a run's final generation
//! and reports per-parameter statistics plus four kinds of tolerance-matched
//! invariants (constant, Fibonacci, ratio, near-constant sum). Matches are
//! candidates only. With a handful of parameters and seven reference
//! constants, coincidental hits are expected.

use std::collections::BTreeMap;
use std::f64::consts::{E, PI, SQRT_2};

use log::debug;

use super::formula::{text, GOLDEN_ANGLE, PHI};
use super::stats;
use crate::schema::{
    AnalyzerConfig, ConfigError, ConvergenceSignature, CrossFormulaComparison, EvolutionHistory,
    FormulaFamily, InvariantType, MathematicalInvariant, ParameterCorrelation,
    ParameterStatistics, UniversalPatterns,
};

const SQRT_3: f64 = 1.732_050_807_568_877_2;
const SQRT_5: f64 = 2.236_067_977_499_79;

/// Reference constants for constant and ratio matching.
pub const KNOWN_CONSTANTS: [(&str, f64); 7] = [
    ("φ", PHI),
    ("π", PI),
    ("e", E),
    ("√2", SQRT_2),
    ("√3", SQRT_3),
    ("√5", SQRT_5),
    ("golden angle", GOLDEN_ANGLE),
];

/// Relative distance `|value - reference| / reference` within `tolerance`.
#[inline]
fn near(value: f64, reference: f64, tolerance: f64) -> bool {
    reference != 0.0 && ((value - reference) / reference).abs() <= tolerance
}

fn near_fibonacci(value: f64, tolerance: f64) -> Option<u64> {
    if value.is_nan() || value <= 0.0 {
        return None;
    }
    let fib = text::nearest_fibonacci(value);
    near(value, fib as f64, tolerance).then_some(fib)
}

/// Fraction of `values` satisfying `pred`; 0 for an empty slice.
fn occurrence(values: &[f64], pred: impl Fn(f64) -> bool) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().filter(|&&v| pred(v)).count() as f64 / values.len() as f64
}

/// `1 - std / median`, clipped to [0, 1]; 0 unless the median is positive.
fn consistency(values: &[f64], median: f64) -> f64 {
    if median > 0.0 {
        (1.0 - stats::std_dev(values) / median).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Extracts convergence signatures from evolution histories.
#[derive(Debug, Clone, Default)]
pub struct ConvergenceAnalyzer {
    config: AnalyzerConfig,
}

impl ConvergenceAnalyzer {
    pub fn new(config: AnalyzerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Analyze the final generation of a run.
    ///
    /// A history without generations yields an empty signature.
    pub fn analyze(&self, history: &EvolutionHistory) -> ConvergenceSignature {
        let family = history.family;
        let top = history
            .final_generation()
            .map(|g| g.top(self.config.top_n))
            .unwrap_or_default();

        let fitness: Vec<f64> = top.iter().map(|i| i.fitness()).collect();
        let columns: Vec<(&'static str, Vec<f64>)> = family
            .parameter_specs()
            .iter()
            .map(|spec| {
                let values = top.iter().map(|i| i.formula.weight(spec.name)).collect();
                (spec.name, values)
            })
            .collect();

        let mut parameter_statistics: Vec<ParameterStatistics> = columns
            .iter()
            .map(|(name, values)| self.parameter_statistics(name, values, &fitness))
            .collect();
        parameter_statistics.sort_by(|a, b| {
            b.fitness_correlation
                .abs()
                .total_cmp(&a.fitness_correlation.abs())
        });

        let optimal_parameters = parameter_statistics
            .iter()
            .map(|s| (s.name.clone(), s.median))
            .collect();

        let mut invariants = Vec::new();
        if !top.is_empty() {
            for (name, values) in &columns {
                invariants.extend(self.constant_invariants(name, values));
                invariants.extend(self.fibonacci_invariant(name, values));
            }
            for (i, (first, a)) in columns.iter().enumerate() {
                for (second, b) in &columns[i + 1..] {
                    invariants.extend(self.ratio_invariants(first, a, second, b));
                    invariants.extend(self.sum_invariant(first, a, second, b));
                }
            }
        }

        let parameter_correlations = self.parameter_correlations(&columns);
        let universal_patterns = UniversalPatterns {
            important_parameters: parameter_statistics
                .iter()
                .filter(|s| self.is_important(s))
                .map(|s| s.name.clone())
                .collect(),
            frequent_invariants: invariants
                .iter()
                .filter(|inv| inv.occurrence_rate > self.config.universal_occurrence)
                .map(|inv| inv.description.clone())
                .collect(),
        };

        debug!(
            "{family}: {} individuals, {} invariants, {} strong parameter pairs",
            top.len(),
            invariants.len(),
            parameter_correlations.len()
        );

        ConvergenceSignature {
            formula_type: family,
            sample_size: top.len(),
            best_fitness: fitness.first().copied().unwrap_or(0.0),
            parameter_statistics,
            optimal_parameters,
            invariants,
            parameter_correlations,
            universal_patterns,
        }
    }

    fn parameter_statistics(
        &self,
        name: &str,
        values: &[f64],
        fitness: &[f64],
    ) -> ParameterStatistics {
        let correlation = stats::pearson(values, fitness);
        let (min, max) = if values.is_empty() {
            (0.0, 0.0)
        } else {
            (stats::min(values), stats::max(values))
        };
        ParameterStatistics {
            name: name.to_string(),
            mean: stats::mean(values),
            median: stats::median(values),
            std: stats::std_dev(values),
            min,
            max,
            fitness_correlation: correlation.r,
            p_value: correlation.p_value,
            significant: correlation.is_significant(self.config.significance_level),
        }
    }

    fn is_important(&self, statistics: &ParameterStatistics) -> bool {
        statistics.significant
            && statistics.fitness_correlation.abs() > self.config.correlation_threshold
    }

    fn constant_invariants(&self, name: &str, values: &[f64]) -> Vec<MathematicalInvariant> {
        let tolerance = self.config.constant_tolerance;
        let median = stats::median(values);

        KNOWN_CONSTANTS
            .iter()
            .filter(|(_, constant)| near(median, *constant, tolerance))
            .filter_map(|&(symbol, constant)| {
                let rate = occurrence(values, |v| near(v, constant, tolerance));
                (rate > self.config.constant_occurrence).then(|| MathematicalInvariant {
                    invariant_type: InvariantType::Constant,
                    description: format!("{name} ≈ {symbol}"),
                    parameters: vec![name.to_string()],
                    observed: median,
                    reference: Some(constant),
                    occurrence_rate: rate,
                    consistency_score: consistency(values, median),
                })
            })
            .collect()
    }

    fn fibonacci_invariant(&self, name: &str, values: &[f64]) -> Option<MathematicalInvariant> {
        let tolerance = self.config.fibonacci_tolerance;
        let median = stats::median(values);
        let fib = near_fibonacci(median, tolerance)?;
        let rate = occurrence(values, |v| near_fibonacci(v, tolerance).is_some());
        (rate > self.config.fibonacci_occurrence).then(|| MathematicalInvariant {
            invariant_type: InvariantType::Pattern,
            description: format!("{name} ≈ Fibonacci {fib}"),
            parameters: vec![name.to_string()],
            observed: median,
            reference: Some(fib as f64),
            occurrence_rate: rate,
            consistency_score: consistency(values, median),
        })
    }

    fn ratio_invariants(
        &self,
        first: &str,
        a: &[f64],
        second: &str,
        b: &[f64],
    ) -> Vec<MathematicalInvariant> {
        let ratios: Vec<f64> = a
            .iter()
            .zip(b)
            .filter(|&(_, &denominator)| denominator != 0.0)
            .map(|(numerator, denominator)| numerator / denominator)
            .collect();
        if ratios.is_empty() {
            return Vec::new();
        }

        let tolerance = self.config.constant_tolerance;
        let median = stats::median(&ratios);
        KNOWN_CONSTANTS
            .iter()
            .filter(|(_, constant)| near(median, *constant, tolerance))
            .filter_map(|&(symbol, constant)| {
                let rate = occurrence(&ratios, |r| near(r, constant, tolerance));
                (rate > self.config.constant_occurrence).then(|| MathematicalInvariant {
                    invariant_type: InvariantType::Ratio,
                    description: format!("{first} / {second} ≈ {symbol}"),
                    parameters: vec![first.to_string(), second.to_string()],
                    observed: median,
                    reference: Some(constant),
                    occurrence_rate: rate,
                    consistency_score: consistency(&ratios, median),
                })
            })
            .collect()
    }

    fn sum_invariant(
        &self,
        first: &str,
        a: &[f64],
        second: &str,
        b: &[f64],
    ) -> Option<MathematicalInvariant> {
        let sums: Vec<f64> = a.iter().zip(b).map(|(x, y)| x + y).collect();
        let median = stats::median(&sums);
        if median <= 0.0 {
            return None;
        }
        let band = self.config.sum_cv_threshold * median;
        if stats::std_dev(&sums) >= band {
            return None;
        }
        Some(MathematicalInvariant {
            invariant_type: InvariantType::Relationship,
            description: format!("{first} + {second} ≈ constant"),
            parameters: vec![first.to_string(), second.to_string()],
            observed: median,
            reference: None,
            occurrence_rate: occurrence(&sums, |s| (s - median).abs() <= band),
            consistency_score: consistency(&sums, median),
        })
    }

    fn parameter_correlations(&self, columns: &[(&str, Vec<f64>)]) -> Vec<ParameterCorrelation> {
        let mut pairs = Vec::new();
        for (i, (first, a)) in columns.iter().enumerate() {
            for (second, b) in &columns[i + 1..] {
                let correlation = stats::pearson(a, b);
                if correlation.r.abs() > self.config.correlation_threshold {
                    pairs.push(ParameterCorrelation {
                        first: first.to_string(),
                        second: second.to_string(),
                        correlation: correlation.r,
                        p_value: correlation.p_value,
                    });
                }
            }
        }
        pairs
    }

    /// Find parameters and invariants shared by at least two formula types.
    pub fn compare_formula_types(
        &self,
        signatures: &[ConvergenceSignature],
    ) -> CrossFormulaComparison {
        let mut universal_parameters: BTreeMap<String, Vec<FormulaFamily>> = BTreeMap::new();
        let mut common_invariants: BTreeMap<String, Vec<FormulaFamily>> = BTreeMap::new();

        for signature in signatures {
            let family = signature.formula_type;
            for statistics in &signature.parameter_statistics {
                if self.is_important(statistics) {
                    push_unique(&mut universal_parameters, &statistics.name, family);
                }
            }
            for invariant in &signature.invariants {
                push_unique(&mut common_invariants, &invariant.description, family);
            }
        }

        universal_parameters.retain(|_, families| families.len() >= 2);
        common_invariants.retain(|_, families| families.len() >= 2);

        let mut formula_types: Vec<FormulaFamily> =
            signatures.iter().map(|s| s.formula_type).collect();
        formula_types.sort();
        formula_types.dedup();

        CrossFormulaComparison {
            formula_types,
            universal_parameters,
            common_invariants,
        }
    }
}

fn push_unique(map: &mut BTreeMap<String, Vec<FormulaFamily>>, key: &str, family: FormulaFamily) {
    let families = map.entry(key.to_string()).or_default();
    if !families.contains(&family) {
        families.push(family);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{
        EvolutionConfig, FitnessScore, Formula, Generation, Individual, ParameterMap, StopReason,
    };
    use rand::prelude::*;

    /// History whose only generation holds the given weight rows.
    fn history(family: FormulaFamily, rows: Vec<(Vec<(&str, f64)>, f64)>) -> EvolutionHistory {
        let mut individuals: Vec<Individual> = rows
            .into_iter()
            .enumerate()
            .map(|(i, (weights, fitness))| {
                let mut parameters = ParameterMap::defaults(family);
                for (name, w) in weights {
                    parameters.set(name, w);
                }
                Individual {
                    id: i as u64,
                    formula: Formula {
                        id: format!("{family}-t{i}"),
                        family,
                        parameters,
                        parents: Vec::new(),
                    },
                    score: FitnessScore {
                        fitness,
                        ..Default::default()
                    },
                    generation: 0,
                    parents: Vec::new(),
                }
            })
            .collect();
        individuals.sort_by(|a, b| b.fitness().total_cmp(&a.fitness()));
        let generation = Generation {
            index: 0,
            best_fitness: individuals[0].fitness(),
            mean_fitness: 0.0,
            fitness_std: 0.0,
            best_individual: individuals[0].clone(),
            individuals,
        };
        EvolutionHistory {
            family,
            config: EvolutionConfig::default(),
            best_fitness: generation.best_fitness,
            best_formula: Some(generation.best_individual.formula.clone()),
            generations: vec![generation],
            converged: true,
            convergence_generation: Some(0),
            stop_reason: StopReason::Converged,
            total_evaluations: 0,
            elapsed_seconds: 0.0,
        }
    }

    /// Varied phonetic weights; complexity and syllable stay at 1.0.
    const VARIED: [&str; 4] = [
        "harshness_weight",
        "smoothness_weight",
        "vowel_weight",
        "plosive_weight",
    ];

    fn uniform_rows(rng: &mut StdRng, n: usize) -> Vec<(Vec<(&'static str, f64)>, f64)> {
        (0..n)
            .map(|_| {
                let weights = VARIED.iter().map(|&p| (p, rng.gen_range(0.0..2.0))).collect();
                (weights, rng.r#gen::<f64>())
            })
            .collect()
    }

    #[test]
    fn test_golden_ratio_cluster_is_found() {
        let mut rng = StdRng::seed_from_u64(8);
        let mut rows = uniform_rows(&mut rng, 10);
        for (weights, _) in &mut rows {
            weights[0].1 = PHI * rng.gen_range(0.99..1.01);
        }
        let signature =
            ConvergenceAnalyzer::default().analyze(&history(FormulaFamily::Phonetic, rows));

        let golden = signature
            .invariants_for("harshness_weight")
            .find(|inv| {
                inv.invariant_type == InvariantType::Constant && inv.description.contains('φ')
            })
            .unwrap();
        assert!(golden.occurrence_rate > 0.5);
        assert!(golden.consistency_score > 0.9);
        assert!((signature.optimal_parameters["harshness_weight"] - PHI).abs() < 0.02);
    }

    #[test]
    fn test_top_individuals_ranked_by_fitness_not_stored_order() {
        let mut rng = StdRng::seed_from_u64(13);
        let mut rows = uniform_rows(&mut rng, 20);
        for (i, (weights, fitness)) in rows.iter_mut().enumerate() {
            if i < 10 {
                *fitness = 0.01;
            } else {
                weights[0].1 = PHI * rng.gen_range(0.99..1.01);
                *fitness = 0.9;
            }
        }
        let mut history = history(FormulaFamily::Phonetic, rows);
        history.generations[0].individuals.reverse();

        let signature = ConvergenceAnalyzer::default().analyze(&history);
        assert_eq!(signature.sample_size, 10);
        assert_eq!(signature.best_fitness, 0.9);
        assert!((signature.optimal_parameters["harshness_weight"] - PHI).abs() < 0.02);
    }

    #[test]
    fn test_uniform_population_has_no_invariants() {
        let mut rng = StdRng::seed_from_u64(21);
        let rows = uniform_rows(&mut rng, 400);
        let analyzer = ConvergenceAnalyzer::new(AnalyzerConfig {
            top_n: 400,
            ..Default::default()
        })
        .unwrap();
        let signature = analyzer.analyze(&history(FormulaFamily::Phonetic, rows));

        assert_eq!(signature.sample_size, 400);
        for name in VARIED {
            assert_eq!(signature.invariants_for(name).count(), 0, "{name}");
        }
    }

    #[test]
    fn test_fibonacci_and_sum_invariants() {
        // vowel ≈ 1 and plosive ≈ 2 (both Fibonacci); their sum stays near 3.
        let rows = (0..10)
            .map(|i| {
                let jitter = (i as f64 - 4.5) * 0.004;
                let weights = vec![
                    ("harshness_weight", 0.3 + 0.15 * i as f64),
                    ("smoothness_weight", 0.2 + 0.17 * i as f64),
                    ("vowel_weight", 1.0 + jitter),
                    ("plosive_weight", 2.0 - jitter),
                ];
                (weights, i as f64)
            })
            .collect();
        let signature =
            ConvergenceAnalyzer::default().analyze(&history(FormulaFamily::Phonetic, rows));

        assert!(signature.invariants_for("vowel_weight").any(|inv| {
            inv.invariant_type == InvariantType::Pattern && inv.reference == Some(1.0)
        }));
        let sum = signature
            .invariants
            .iter()
            .find(|inv| inv.invariant_type == InvariantType::Relationship)
            .unwrap();
        assert_eq!(sum.parameters, vec!["vowel_weight", "plosive_weight"]);
        assert!((sum.observed - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_ratio_invariant_names_both_parameters() {
        let rows = (0..10)
            .map(|i| {
                let base = 0.5 + 0.1 * i as f64;
                let weights = vec![
                    ("harshness_weight", base * PHI),
                    ("smoothness_weight", base),
                    ("vowel_weight", 0.1 + 0.19 * ((i * 7) % 10) as f64),
                    ("plosive_weight", 0.15 + 0.18 * ((i * 3) % 10) as f64),
                ];
                (weights, i as f64)
            })
            .collect();
        let signature =
            ConvergenceAnalyzer::default().analyze(&history(FormulaFamily::Phonetic, rows));

        let ratio = signature
            .invariants
            .iter()
            .find(|inv| inv.invariant_type == InvariantType::Ratio)
            .unwrap();
        assert_eq!(ratio.parameters, vec!["harshness_weight", "smoothness_weight"]);
        assert_eq!(ratio.occurrence_rate, 1.0);
        assert!(signature
            .parameter_correlations
            .iter()
            .any(|c| c.first == "harshness_weight" && c.second == "smoothness_weight"));
    }

    #[test]
    fn test_statistics_ranked_by_fitness_correlation() {
        let rows = (0..10)
            .map(|i| {
                let x = i as f64 / 10.0;
                let weights = vec![
                    ("harshness_weight", 1.0 + 0.05 * ((i * 7) % 10) as f64),
                    ("smoothness_weight", 0.1 + x),
                    ("vowel_weight", 1.0),
                    ("plosive_weight", 1.0),
                ];
                (weights, x)
            })
            .collect();
        let signature =
            ConvergenceAnalyzer::default().analyze(&history(FormulaFamily::Phonetic, rows));

        let first = &signature.parameter_statistics[0];
        assert_eq!(first.name, "smoothness_weight");
        assert!((first.fitness_correlation - 1.0).abs() < 1e-9);
        assert!(first.significant);
        // Constant columns have no defined correlation.
        let vowel = signature
            .parameter_statistics
            .iter()
            .find(|s| s.name == "vowel_weight")
            .unwrap();
        assert_eq!((vowel.fitness_correlation, vowel.p_value), (0.0, 1.0));
        assert_eq!(
            signature.universal_patterns.important_parameters,
            vec!["smoothness_weight".to_string()]
        );
    }

    #[test]
    fn test_huge_weights_analyze_without_overflow() {
        let rows = (0..10)
            .map(|i| (vec![("length_weight", 1e20)], 0.1 * i as f64))
            .collect();
        let signature =
            ConvergenceAnalyzer::default().analyze(&history(FormulaFamily::Structural, rows));
        assert_eq!(signature.sample_size, 10);
        assert!(
            signature
                .invariants_for("length_weight")
                .all(|inv| inv.invariant_type != InvariantType::Pattern)
        );
    }

    #[test]
    fn test_empty_history() {
        let mut h = history(FormulaFamily::Semantic, vec![(vec![], 0.0)]);
        h.generations.clear();
        let signature = ConvergenceAnalyzer::default().analyze(&h);
        assert_eq!(signature.sample_size, 0);
        assert!(signature.invariants.is_empty());
        assert_eq!(signature.best_fitness, 0.0);
    }

    #[test]
    fn test_compare_needs_two_formula_types() {
        let analyzer = ConvergenceAnalyzer::default();
        let mut a = analyzer.analyze(&history(FormulaFamily::Phonetic, vec![(vec![], 0.5)]));
        let mut b = analyzer.analyze(&history(FormulaFamily::Hybrid, vec![(vec![], 0.5)]));
        let shared = MathematicalInvariant {
            invariant_type: InvariantType::Constant,
            description: "x ≈ φ".to_string(),
            parameters: vec!["x".to_string()],
            observed: PHI,
            reference: Some(PHI),
            occurrence_rate: 1.0,
            consistency_score: 1.0,
        };
        a.invariants = vec![shared.clone()];
        b.invariants = vec![shared];
        let mut only_a = a.invariants[0].clone();
        only_a.description = "y ≈ e".to_string();
        a.invariants.push(only_a);

        let comparison = analyzer.compare_formula_types(&[a, b]);
        assert_eq!(
            comparison.formula_types,
            vec![FormulaFamily::Phonetic, FormulaFamily::Hybrid]
        );
        assert_eq!(comparison.common_invariants.len(), 1);
        assert_eq!(
            comparison.common_invariants["x ≈ φ"],
            vec![FormulaFamily::Phonetic, FormulaFamily::Hybrid]
        );
        assert!(comparison.universal_parameters.is_empty());
    }
}
