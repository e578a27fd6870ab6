//! Structural family: the shape of the word itself.
//!
//! Syllable count sets the polygon, palindromes and half-balance set
//! symmetry, and hue advances by the golden angle per letter.

use super::text;
use super::GOLDEN_ANGLE;
use crate::schema::{keys, Formula, LinguisticFeatures, RawVisual, ShapeType};

pub(super) fn transform(formula: &Formula, name: &str, features: &LinguisticFeatures) -> RawVisual {
    let letters = text::letters(name);
    let syllable_w = formula.weight("syllable_weight");
    let length_w = formula.weight("length_weight");
    let balance_w = formula.weight("balance_weight");
    let rhythm_w = formula.weight("rhythm_weight");

    let length = features.get_or(keys::LENGTH, letters.len() as f64) * length_w;
    let syllables = features
        .get(keys::SYLLABLES)
        .unwrap_or_else(|| text::estimate_syllables(&letters) as f64)
        * syllable_w;
    let palindrome = text::is_palindrome(&letters);
    let balance = text::balance(&letters) * balance_w;
    let rhythm = text::rhythm(&letters) * rhythm_w;

    let shape_type = if palindrome {
        ShapeType::Circle
    } else {
        let sides = syllables.round().clamp(0.0, 10.0) as u32 + 2;
        ShapeType::from_sides(sides)
    };

    RawVisual {
        shape_type,
        palette: None,
        complexity: length / 15.0,
        symmetry: if palindrome { 1.0 } else { balance },
        // Alternating consonant/vowel flow reads as curved.
        angular_vs_curved: (2.0 * (0.5 - rhythm)).tanh(),
        hue: GOLDEN_ANGLE * length + 30.0 * syllables,
        saturation: 40.0 + 40.0 * rhythm + 4.0 * syllables,
        brightness: 50.0 + 40.0 * (balance - 0.5),
        x: (length / 8.0 - 1.0).tanh(),
        y: (syllables / 2.0 - 1.0).tanh(),
        z: syllables / 6.0,
        rotation: GOLDEN_ANGLE * syllables,
        glow_intensity: 0.8 * balance + if palindrome { 0.2 } else { 0.0 },
        pattern_density: rhythm,
        fractal_dimension: 1.0 + (length / 20.0).min(1.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FormulaFamily;

    #[test]
    fn test_palindrome_is_symmetric_circle() {
        let formula = Formula::canonical(FormulaFamily::Structural);
        let out = transform(&formula, "Level", &LinguisticFeatures::new());
        assert_eq!(out.shape_type, ShapeType::Circle);
        assert_eq!(out.symmetry, 1.0);
    }

    #[test]
    fn test_syllables_set_sides() {
        let formula = Formula::canonical(FormulaFamily::Structural);
        let features = LinguisticFeatures::new().with(keys::SYLLABLES, 3.0);
        assert_eq!(transform(&formula, "Acme", &features).shape_type, ShapeType::Pentagon);
        let features = LinguisticFeatures::new().with(keys::SYLLABLES, 1.0);
        assert_eq!(transform(&formula, "Acme", &features).shape_type, ShapeType::Triangle);
    }

    #[test]
    fn test_length_falls_back_to_name() {
        let formula = Formula::canonical(FormulaFamily::Structural);
        let implicit = transform(&formula, "Acme", &LinguisticFeatures::new());
        let features = LinguisticFeatures::new().with(keys::LENGTH, 4.0);
        let explicit = transform(&formula, "Acme", &features);
        assert_eq!(implicit.hue, explicit.hue);
    }
}
