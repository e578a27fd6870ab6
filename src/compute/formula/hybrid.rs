//! Hybrid family: a weighted blend of the five single-hypothesis families.
//!
//! Numeric fields are a weighted mean of the bounded sub-encodings; shape and
//! palette go to a weighted vote. Angles are averaged linearly, so two hues
//! either side of 0° blend toward 180°.

use std::collections::BTreeMap;

use crate::schema::{
    Formula, FormulaFamily, LinguisticFeatures, RawVisual, ShapeType, VisualEncoding,
    VisualProperty,
};

const PARTS: [(FormulaFamily, &str); 5] = [
    (FormulaFamily::Phonetic, "phonetic_weight"),
    (FormulaFamily::Semantic, "semantic_weight"),
    (FormulaFamily::Structural, "structural_weight"),
    (FormulaFamily::Frequency, "frequency_weight"),
    (FormulaFamily::Numerological, "numerological_weight"),
];

pub(super) fn transform(formula: &Formula, name: &str, features: &LinguisticFeatures) -> RawVisual {
    let parts: Vec<(VisualEncoding, f64)> = PARTS
        .iter()
        .map(|&(family, key)| {
            let sub = Formula::canonical(family);
            let raw = super::raw_transform(&sub, name, features);
            let weight = formula.weight(key);
            let weight = if weight.is_finite() { weight.max(0.0) } else { 0.0 };
            (VisualEncoding::bounded(raw, name, &sub.id), weight)
        })
        .collect();

    let total: f64 = parts.iter().map(|(_, w)| w).sum();
    let weights: Vec<f64> = if total > 0.0 {
        parts.iter().map(|(_, w)| w / total).collect()
    } else {
        vec![1.0 / parts.len() as f64; parts.len()]
    };

    let blend = |property: VisualProperty| -> f64 {
        parts
            .iter()
            .zip(&weights)
            .map(|((enc, _), w)| enc.property(property) * w)
            .sum()
    };

    RawVisual {
        shape_type: vote(parts.iter().map(|(e, _)| e.shape_type).zip(weights.iter().copied()))
            .unwrap_or(ShapeType::Circle),
        palette: vote(parts.iter().map(|(e, _)| e.palette).zip(weights.iter().copied())),
        complexity: blend(VisualProperty::Complexity),
        symmetry: blend(VisualProperty::Symmetry),
        angular_vs_curved: blend(VisualProperty::AngularVsCurved),
        hue: blend(VisualProperty::Hue),
        saturation: blend(VisualProperty::Saturation),
        brightness: blend(VisualProperty::Brightness),
        x: blend(VisualProperty::X),
        y: blend(VisualProperty::Y),
        z: blend(VisualProperty::Z),
        rotation: blend(VisualProperty::Rotation),
        glow_intensity: blend(VisualProperty::GlowIntensity),
        pattern_density: blend(VisualProperty::PatternDensity),
        fractal_dimension: blend(VisualProperty::FractalDimension),
    }
}

/// Weighted majority; ties go to the earliest category in declaration order.
fn vote<T: Ord + Copy>(ballots: impl Iterator<Item = (T, f64)>) -> Option<T> {
    let mut tally: BTreeMap<T, f64> = BTreeMap::new();
    for (choice, weight) in ballots {
        *tally.entry(choice).or_insert(0.0) += weight;
    }
    let mut best: Option<(T, f64)> = None;
    for (choice, score) in tally {
        if best.is_none_or(|(_, s)| score > s) {
            best = Some((choice, score));
        }
    }
    best.map(|(choice, _)| choice)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{keys, PaletteCategory};

    #[test]
    fn test_vote_prefers_heavier_side() {
        let ballots = vec![
            (ShapeType::Circle, 0.2),
            (ShapeType::Star, 0.5),
            (ShapeType::Circle, 0.2),
        ];
        assert_eq!(vote(ballots.into_iter()), Some(ShapeType::Star));
    }

    #[test]
    fn test_vote_tie_goes_to_declaration_order() {
        let ballots = vec![(PaletteCategory::Neon, 0.5), (PaletteCategory::Warm, 0.5)];
        assert_eq!(vote(ballots.into_iter()), Some(PaletteCategory::Warm));
    }

    #[test]
    fn test_single_weight_reproduces_sub_formula() {
        let mut formula = Formula::canonical(FormulaFamily::Hybrid);
        for (_, key) in PARTS {
            formula.parameters.set(key, 0.0);
        }
        formula.parameters.set("phonetic_weight", 1.0);

        let features = LinguisticFeatures::new().with(keys::HARSHNESS, 80.0);
        let hybrid = VisualEncoding::bounded(transform(&formula, "Acme", &features), "Acme", "h");
        let phonetic = super::super::transform(
            &Formula::canonical(FormulaFamily::Phonetic),
            "Acme",
            &features,
        );
        assert_eq!(hybrid.shape_type, phonetic.shape_type);
        assert!((hybrid.hue - phonetic.hue).abs() < 1e-9);
        assert!((hybrid.brightness - phonetic.brightness).abs() < 1e-9);
    }

    #[test]
    fn test_zero_weights_fall_back_to_equal() {
        let mut zero = Formula::canonical(FormulaFamily::Hybrid);
        for (_, key) in PARTS {
            zero.parameters.set(key, 0.0);
        }
        let canonical = Formula::canonical(FormulaFamily::Hybrid);
        let features = LinguisticFeatures::new();
        let a = transform(&zero, "Acme", &features);
        let b = transform(&canonical, "Acme", &features);
        assert_eq!(a.shape_type, b.shape_type);
        assert_eq!(a.palette, b.palette);
        assert!((a.hue - b.hue).abs() < 1e-9);
        assert!((a.complexity - b.complexity).abs() < 1e-12);
    }
}
