//! Frequency family: letter statistics of the name.

use super::text;
use crate::schema::{Formula, RawVisual, ShapeType};

pub(super) fn transform(formula: &Formula, name: &str) -> RawVisual {
    let letters = text::letters(name);
    let entropy = text::normalized_entropy(&letters) * formula.weight("entropy_weight");
    let repetition = text::repetition(&letters) * formula.weight("repetition_weight");
    let spectrum = text::spectral_centroid(&letters) * formula.weight("spectrum_weight");
    let rarity = text::rarity(&letters) * formula.weight("rarity_weight");

    let shape_type = if repetition > 0.4 {
        ShapeType::Spiral
    } else if entropy > 0.8 {
        ShapeType::Fractal
    } else if rarity > 0.6 {
        ShapeType::Star
    } else {
        let unique = text::letter_counts(&letters).iter().filter(|&&c| c > 0).count();
        ShapeType::from_sides((unique as u32).div_ceil(2) + 2)
    };

    RawVisual {
        shape_type,
        palette: None,
        complexity: entropy,
        symmetry: repetition,
        angular_vs_curved: (2.0 * (rarity - 0.5)).tanh(),
        // Alphabet position maps onto the visible spectrum, red to violet.
        hue: 300.0 * spectrum,
        saturation: 30.0 + 70.0 * rarity,
        brightness: 40.0 + 40.0 * entropy + 20.0 * (1.0 - repetition),
        x: (2.0 * (spectrum - 0.5)).tanh(),
        y: (2.0 * (entropy - 0.5)).tanh(),
        z: repetition,
        rotation: 180.0 * entropy + 180.0 * spectrum,
        glow_intensity: 0.5 * (1.0 - repetition) + 0.5 * rarity,
        pattern_density: repetition + 0.3 * entropy,
        fractal_dimension: 1.0 + entropy,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FormulaFamily;

    #[test]
    fn test_repetitive_names_spiral() {
        let formula = Formula::canonical(FormulaFamily::Frequency);
        let out = transform(&formula, "Mississippi");
        assert_eq!(out.shape_type, ShapeType::Spiral);
        assert!(out.symmetry > 0.5);
    }

    #[test]
    fn test_rare_letters_are_angular() {
        let formula = Formula::canonical(FormulaFamily::Frequency);
        let rare = transform(&formula, "Zyqx");
        let common = transform(&formula, "Tease");
        assert!(rare.angular_vs_curved > common.angular_vs_curved);
    }

    #[test]
    fn test_empty_name_is_finite() {
        let formula = Formula::canonical(FormulaFamily::Frequency);
        let out = transform(&formula, "");
        assert!(out.hue.is_finite());
        assert_eq!(out.complexity, 0.0);
    }
}
