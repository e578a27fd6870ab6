//! Formula families: pure mappings from a name and its linguistic features
//! to a bounded [`VisualEncoding`].
//!
//! Each family is one hypothesis about which linguistic dimension drives
//! visual form. Families compute a [`RawVisual`]; range enforcement happens
//! once, in [`VisualEncoding::bounded`], so no family can leak an
//! out-of-range value.

mod frequency;
mod hybrid;
mod numerological;
mod phonetic;
mod semantic;
mod structural;
pub mod text;

pub use semantic::MeaningCategory;

use crate::compute::evolution::FormulaRng;
use crate::schema::{
    Formula, FormulaError, FormulaFamily, LinguisticFeatures, RawVisual, VisualEncoding,
};

/// Golden ratio.
pub const PHI: f64 = 1.618_033_988_749_895;

/// Golden angle in degrees, 360 / φ².
pub const GOLDEN_ANGLE: f64 = 137.507_764_050_037_86;

/// Transform a name under a formula.
///
/// Deterministic: the same formula, name and features always produce the
/// same encoding.
pub fn transform(formula: &Formula, name: &str, features: &LinguisticFeatures) -> VisualEncoding {
    VisualEncoding::bounded(raw_transform(formula, name, features), name, &formula.id)
}

fn raw_transform(formula: &Formula, name: &str, features: &LinguisticFeatures) -> RawVisual {
    match formula.family {
        FormulaFamily::Phonetic => phonetic::transform(formula, features),
        FormulaFamily::Semantic => semantic::transform(formula, name, features),
        FormulaFamily::Structural => structural::transform(formula, name, features),
        FormulaFamily::Frequency => frequency::transform(formula, name),
        FormulaFamily::Numerological => numerological::transform(formula, name),
        FormulaFamily::Hybrid => hybrid::transform(formula, name, features),
    }
}

impl Formula {
    /// See [`transform`].
    pub fn transform(&self, name: &str, features: &LinguisticFeatures) -> VisualEncoding {
        transform(self, name, features)
    }

    /// New formula with each weight perturbed with probability `rate`.
    pub fn mutate(&self, rate: f64, rng: &mut FormulaRng) -> Formula {
        rng.mutate(self, rate)
    }

    /// New formula inheriting each weight from `self` or `other`.
    pub fn crossover(
        &self,
        other: &Formula,
        rng: &mut FormulaRng,
    ) -> Result<Formula, FormulaError> {
        rng.crossover(self, other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{keys, ParameterMap};
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    const FEATURE_KEYS: [&str; 12] = [
        keys::SYLLABLES,
        keys::LENGTH,
        keys::HARSHNESS,
        keys::SMOOTHNESS,
        keys::VOWEL_RATIO,
        keys::PLOSIVE_RATIO,
        keys::PHONETIC_COMPLEXITY,
        keys::MEMORABILITY,
        keys::AUTHORITY,
        keys::PRESTIGE,
        keys::SENTIMENT,
        keys::SEMANTIC_CATEGORY,
    ];

    fn family_strategy() -> impl Strategy<Value = FormulaFamily> {
        prop::sample::select(FormulaFamily::ALL.to_vec())
    }

    fn features_strategy() -> impl Strategy<Value = LinguisticFeatures> {
        prop::collection::vec(prop::option::of(-500.0f64..500.0), FEATURE_KEYS.len()).prop_map(
            |values| {
                FEATURE_KEYS
                    .iter()
                    .zip(values)
                    .filter_map(|(k, v)| v.map(|v| (k.to_string(), v)))
                    .collect()
            },
        )
    }

    fn formula_with(family: FormulaFamily, weights: &[f64]) -> Formula {
        let values: BTreeMap<String, f64> = family
            .parameter_specs()
            .iter()
            .zip(weights.iter().cycle())
            .map(|(spec, w)| (spec.name.to_string(), *w))
            .collect();
        let params = ParameterMap::new(family, values).unwrap();
        Formula::with_parameters("prop", family, params).unwrap()
    }

    proptest! {
        #[test]
        fn test_outputs_stay_in_range(
            family in family_strategy(),
            weights in prop::collection::vec(0.0f64..=2.0, 6),
            name in "[A-Za-z -]{0,24}",
            features in features_strategy(),
        ) {
            let formula = formula_with(family, &weights);
            let out = transform(&formula, &name, &features);
            prop_assert!(out.is_within_bounds(), "{family}: {out:?}");
        }

        #[test]
        fn test_transform_is_deterministic(
            family in family_strategy(),
            weights in prop::collection::vec(0.0f64..=2.0, 6),
            name in "[A-Za-z]{1,16}",
            features in features_strategy(),
        ) {
            let formula = formula_with(family, &weights);
            prop_assert_eq!(
                transform(&formula, &name, &features),
                transform(&formula, &name, &features)
            );
        }
    }

    #[test]
    fn test_missing_features_use_defaults() {
        for family in FormulaFamily::ALL {
            let formula = Formula::canonical(family);
            let out = formula.transform("Acme", &LinguisticFeatures::new());
            assert!(out.is_within_bounds(), "{family}");
            assert_eq!(out.formula_id, family.as_str());
            assert_eq!(out.name, "Acme");
        }
    }

    #[test]
    fn test_weights_change_output() {
        let features = LinguisticFeatures::new()
            .with(keys::HARSHNESS, 70.0)
            .with(keys::VOWEL_RATIO, 0.3);
        let base = Formula::canonical(FormulaFamily::Phonetic);
        let mut heavy = base.clone();
        heavy.parameters.set("vowel_weight", 1.5);
        assert_ne!(
            transform(&base, "Acme", &features).hue,
            transform(&heavy, "Acme", &features).hue
        );
    }

    #[test]
    fn test_golden_angle_matches_phi() {
        assert!((GOLDEN_ANGLE - 360.0 / (PHI * PHI)).abs() < 1e-9);
    }
}
