//! Semantic family: meaning category picks shape and base hue, authority and
//! prestige set symmetry and brightness.

use serde::{Deserialize, Serialize};

use crate::schema::{keys, Formula, LinguisticFeatures, PaletteCategory, RawVisual, ShapeType};

const DEFAULT_AUTHORITY: f64 = 50.0;
const DEFAULT_PRESTIGE: f64 = 50.0;
const DEFAULT_SENTIMENT: f64 = 0.0;
const DEFAULT_MEMORABILITY: f64 = 50.0;

/// Coarse meaning category of a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeaningCategory {
    Power,
    Nature,
    Technology,
    Wealth,
    Celestial,
    Abstract,
}

impl MeaningCategory {
    /// Index order used by the numeric `semantic_category` feature.
    pub const ALL: [MeaningCategory; 6] = [
        MeaningCategory::Power,
        MeaningCategory::Nature,
        MeaningCategory::Technology,
        MeaningCategory::Wealth,
        MeaningCategory::Celestial,
        MeaningCategory::Abstract,
    ];

    /// Category from the numeric feature code (rounded, modulo 6).
    pub fn from_code(code: f64) -> Self {
        let idx = (code.round() as i64).rem_euclid(Self::ALL.len() as i64) as usize;
        Self::ALL[idx]
    }

    /// Keyword lookup; first matching category wins, `Abstract` otherwise.
    pub fn from_name(name: &str) -> Self {
        let lower = name.to_ascii_lowercase();
        KEYWORDS
            .iter()
            .find(|(_, words)| words.iter().any(|w| lower.contains(w)))
            .map(|(category, _)| *category)
            .unwrap_or(MeaningCategory::Abstract)
    }

    fn shape(self) -> ShapeType {
        match self {
            MeaningCategory::Power => ShapeType::Triangle,
            MeaningCategory::Nature => ShapeType::Circle,
            MeaningCategory::Technology => ShapeType::Hexagon,
            MeaningCategory::Wealth => ShapeType::Square,
            MeaningCategory::Celestial => ShapeType::Star,
            MeaningCategory::Abstract => ShapeType::Spiral,
        }
    }

    fn base_hue(self) -> f64 {
        match self {
            MeaningCategory::Power => 0.0,
            MeaningCategory::Nature => 120.0,
            MeaningCategory::Technology => 210.0,
            MeaningCategory::Wealth => 45.0,
            MeaningCategory::Celestial => 260.0,
            MeaningCategory::Abstract => 300.0,
        }
    }

    fn palette(self) -> PaletteCategory {
        match self {
            MeaningCategory::Power => PaletteCategory::Warm,
            MeaningCategory::Nature => PaletteCategory::Earth,
            MeaningCategory::Technology => PaletteCategory::Cool,
            MeaningCategory::Wealth => PaletteCategory::Jewel,
            MeaningCategory::Celestial => PaletteCategory::Pastel,
            MeaningCategory::Abstract => PaletteCategory::Neon,
        }
    }

    /// Positive for hard-edged meanings, negative for organic ones.
    fn edge_bias(self) -> f64 {
        match self {
            MeaningCategory::Power | MeaningCategory::Technology => 0.3,
            MeaningCategory::Nature | MeaningCategory::Celestial => -0.3,
            MeaningCategory::Wealth | MeaningCategory::Abstract => 0.0,
        }
    }
}

const KEYWORDS: [(MeaningCategory, &[&str]); 5] = [
    (
        MeaningCategory::Power,
        &["king", "power", "force", "titan", "iron", "chief", "royal", "strong", "max"],
    ),
    (
        MeaningCategory::Nature,
        &["leaf", "tree", "river", "green", "bloom", "wood", "flower", "earth", "ocean", "rock"],
    ),
    (
        MeaningCategory::Technology,
        &["tech", "data", "byte", "soft", "net", "cyber", "logic", "quantum", "digital"],
    ),
    (
        MeaningCategory::Wealth,
        &["gold", "coin", "bank", "capital", "fund", "rich", "cash", "trust", "invest"],
    ),
    (
        MeaningCategory::Celestial,
        &["star", "moon", "sky", "sol", "luna", "nova", "astro", "cosmic", "orbit"],
    ),
];

pub(super) fn transform(formula: &Formula, name: &str, features: &LinguisticFeatures) -> RawVisual {
    let category = features
        .get(keys::SEMANTIC_CATEGORY)
        .map(MeaningCategory::from_code)
        .unwrap_or_else(|| MeaningCategory::from_name(name));

    let category_w = formula.weight("category_weight");
    let authority = features.get_or(keys::AUTHORITY, DEFAULT_AUTHORITY) / 100.0
        * formula.weight("authority_weight");
    let prestige = features.get_or(keys::PRESTIGE, DEFAULT_PRESTIGE) / 100.0
        * formula.weight("prestige_weight");
    let sentiment =
        features.get_or(keys::SENTIMENT, DEFAULT_SENTIMENT) * formula.weight("sentiment_weight");
    let memorability = features.get_or(keys::MEMORABILITY, DEFAULT_MEMORABILITY) / 100.0
        * formula.weight("memorability_weight");

    let base_hue = category.base_hue();
    let complexity = 1.0 - 0.8 * memorability;

    RawVisual {
        shape_type: category.shape(),
        palette: Some(category.palette()),
        complexity,
        symmetry: authority,
        angular_vs_curved: (2.0 * (authority - 0.5)).tanh() + category.edge_bias() * category_w,
        hue: base_hue * category_w + 45.0 * sentiment,
        saturation: 40.0 + 30.0 * sentiment.abs() + 30.0 * memorability,
        brightness: 30.0 + 70.0 * prestige,
        x: sentiment,
        y: (2.0 * (prestige - 0.5)).tanh(),
        z: 0.5 * authority + 0.5 * prestige,
        rotation: base_hue / 6.0 + 90.0 * authority,
        glow_intensity: prestige * (0.5 + 0.5 * sentiment.max(0.0)),
        pattern_density: 1.0 - memorability,
        fractal_dimension: 1.0 + 0.8 * complexity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FormulaFamily;

    #[test]
    fn test_keyword_lookup() {
        assert_eq!(MeaningCategory::from_name("GoldBridge"), MeaningCategory::Wealth);
        assert_eq!(MeaningCategory::from_name("NovaLight"), MeaningCategory::Celestial);
        assert_eq!(MeaningCategory::from_name("Qwerty"), MeaningCategory::Abstract);
    }

    #[test]
    fn test_category_code_wraps() {
        assert_eq!(MeaningCategory::from_code(0.0), MeaningCategory::Power);
        assert_eq!(MeaningCategory::from_code(7.2), MeaningCategory::Nature);
        assert_eq!(MeaningCategory::from_code(-1.0), MeaningCategory::Abstract);
    }

    #[test]
    fn test_feature_code_overrides_keywords() {
        let formula = Formula::canonical(FormulaFamily::Semantic);
        let features = LinguisticFeatures::new().with(keys::SEMANTIC_CATEGORY, 2.0);
        let out = transform(&formula, "GoldBridge", &features);
        assert_eq!(out.shape_type, ShapeType::Hexagon);
        assert_eq!(out.palette, Some(PaletteCategory::Cool));
    }

    #[test]
    fn test_prestige_drives_brightness() {
        let formula = Formula::canonical(FormulaFamily::Semantic);
        let low = transform(&formula, "x", &LinguisticFeatures::new().with(keys::PRESTIGE, 10.0));
        let high = transform(&formula, "x", &LinguisticFeatures::new().with(keys::PRESTIGE, 90.0));
        assert!(high.brightness > low.brightness);
    }
}
