//! Phonetic family: sound texture drives shape and color.
//!
//! Harshness against smoothness sets angularity, the vowel/plosive mix sets
//! hue, and phonetic complexity sets fractal dimension.

use crate::schema::{keys, Formula, LinguisticFeatures, RawVisual, ShapeType};

const DEFAULT_HARSHNESS: f64 = 50.0;
const DEFAULT_SMOOTHNESS: f64 = 50.0;
const DEFAULT_VOWEL_RATIO: f64 = 0.4;
const DEFAULT_PLOSIVE_RATIO: f64 = 0.2;
const DEFAULT_COMPLEXITY: f64 = 50.0;
const DEFAULT_SYLLABLES: f64 = 2.0;

pub(super) fn transform(formula: &Formula, features: &LinguisticFeatures) -> RawVisual {
    let harsh = features.get_or(keys::HARSHNESS, DEFAULT_HARSHNESS) / 100.0
        * formula.weight("harshness_weight");
    let smooth = features.get_or(keys::SMOOTHNESS, DEFAULT_SMOOTHNESS) / 100.0
        * formula.weight("smoothness_weight");
    let vowel =
        features.get_or(keys::VOWEL_RATIO, DEFAULT_VOWEL_RATIO) * formula.weight("vowel_weight");
    let plosive = features.get_or(keys::PLOSIVE_RATIO, DEFAULT_PLOSIVE_RATIO)
        * formula.weight("plosive_weight");
    let complexity = features.get_or(keys::PHONETIC_COMPLEXITY, DEFAULT_COMPLEXITY) / 100.0
        * formula.weight("complexity_weight");
    let syllables =
        features.get_or(keys::SYLLABLES, DEFAULT_SYLLABLES) * formula.weight("syllable_weight");

    let angularity = (2.0 * (harsh - smooth)).tanh();

    // Open vowels pull toward blue, plosives toward red.
    let hue = 30.0 + 240.0 * vowel - 120.0 * plosive;

    RawVisual {
        shape_type: shape(angularity, syllables, complexity),
        palette: None,
        complexity,
        symmetry: 1.0 - (harsh - smooth).abs(),
        angular_vs_curved: angularity,
        hue,
        saturation: 35.0 + 50.0 * harsh + 15.0 * plosive,
        brightness: 30.0 + 60.0 * vowel + 10.0 * (1.0 - harsh),
        x: angularity,
        y: (3.0 * (vowel - DEFAULT_VOWEL_RATIO)).tanh(),
        z: syllables / 6.0,
        rotation: 45.0 * syllables + 90.0 * angularity,
        glow_intensity: vowel * (1.0 - 0.5 * plosive),
        pattern_density: (plosive + complexity) / 2.0,
        fractal_dimension: 1.0 + 0.7 * complexity + 0.3 * harsh,
    }
}

fn shape(angularity: f64, syllables: f64, complexity: f64) -> ShapeType {
    if angularity > 0.5 {
        if syllables <= 1.5 {
            ShapeType::Triangle
        } else {
            ShapeType::Star
        }
    } else if angularity > 0.1 {
        let sides = (syllables.round().clamp(1.0, 4.0) as u32) + 2;
        ShapeType::from_sides(sides)
    } else if angularity > -0.3 {
        if complexity > 0.6 {
            ShapeType::Fractal
        } else {
            ShapeType::Hexagon
        }
    } else if complexity > 0.5 {
        ShapeType::Spiral
    } else {
        ShapeType::Circle
    }
}
