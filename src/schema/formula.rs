//! Formula representation: family tag, declared parameter schema, weight map.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Formula family. Each family is a distinct hypothesis about which
/// linguistic dimension drives visual form.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum FormulaFamily {
    Phonetic,
    Semantic,
    Structural,
    Frequency,
    Numerological,
    Hybrid,
}

impl FormulaFamily {
    pub const ALL: [FormulaFamily; 6] = [
        FormulaFamily::Phonetic,
        FormulaFamily::Semantic,
        FormulaFamily::Structural,
        FormulaFamily::Frequency,
        FormulaFamily::Numerological,
        FormulaFamily::Hybrid,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FormulaFamily::Phonetic => "phonetic",
            FormulaFamily::Semantic => "semantic",
            FormulaFamily::Structural => "structural",
            FormulaFamily::Frequency => "frequency",
            FormulaFamily::Numerological => "numerological",
            FormulaFamily::Hybrid => "hybrid",
        }
    }

    /// Declared parameter schema for this family.
    pub fn parameter_specs(self) -> &'static [ParamSpec] {
        match self {
            FormulaFamily::Phonetic => PHONETIC_PARAMS,
            FormulaFamily::Semantic => SEMANTIC_PARAMS,
            FormulaFamily::Structural => STRUCTURAL_PARAMS,
            FormulaFamily::Frequency => FREQUENCY_PARAMS,
            FormulaFamily::Numerological => NUMEROLOGICAL_PARAMS,
            FormulaFamily::Hybrid => HYBRID_PARAMS,
        }
    }

    /// Default value for a parameter of this family.
    pub fn default_weight(self, name: &str) -> Option<f64> {
        self.parameter_specs()
            .iter()
            .find(|spec| spec.name == name)
            .map(|spec| spec.default)
    }
}

impl fmt::Display for FormulaFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormulaFamily {
    type Err = FormulaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        FormulaFamily::ALL
            .into_iter()
            .find(|family| family.as_str() == lower)
            .ok_or_else(|| FormulaError::UnknownFamily(s.to_string()))
    }
}

/// A named weight with its canonical default.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub default: f64,
}

const fn param(name: &'static str, default: f64) -> ParamSpec {
    ParamSpec { name, default }
}

pub const PHONETIC_PARAMS: &[ParamSpec] = &[
    param("harshness_weight", 1.0),
    param("smoothness_weight", 1.0),
    param("vowel_weight", 1.0),
    param("plosive_weight", 1.0),
    param("complexity_weight", 1.0),
    param("syllable_weight", 1.0),
];

pub const SEMANTIC_PARAMS: &[ParamSpec] = &[
    param("category_weight", 1.0),
    param("authority_weight", 1.0),
    param("prestige_weight", 1.0),
    param("sentiment_weight", 1.0),
    param("memorability_weight", 1.0),
];

pub const STRUCTURAL_PARAMS: &[ParamSpec] = &[
    param("syllable_weight", 1.0),
    param("length_weight", 1.0),
    param("balance_weight", 1.0),
    param("rhythm_weight", 1.0),
];

pub const FREQUENCY_PARAMS: &[ParamSpec] = &[
    param("entropy_weight", 1.0),
    param("repetition_weight", 1.0),
    param("spectrum_weight", 1.0),
    param("rarity_weight", 1.0),
];

pub const NUMEROLOGICAL_PARAMS: &[ParamSpec] = &[
    param("digit_weight", 1.0),
    param("golden_weight", 1.0),
    param("fibonacci_weight", 1.0),
    param("prime_weight", 1.0),
];

pub const HYBRID_PARAMS: &[ParamSpec] = &[
    param("phonetic_weight", 0.2),
    param("semantic_weight", 0.2),
    param("structural_weight", 0.2),
    param("frequency_weight", 0.2),
    param("numerological_weight", 0.2),
];

/// Named float weights owned by one formula instance.
///
/// The key set always equals the owning family's declared schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterMap(BTreeMap<String, f64>);

impl ParameterMap {
    /// Canonical defaults for a family.
    pub fn defaults(family: FormulaFamily) -> Self {
        Self(
            family
                .parameter_specs()
                .iter()
                .map(|spec| (spec.name.to_string(), spec.default))
                .collect(),
        )
    }

    /// Build from explicit values; the key set must match the family schema.
    pub fn new(family: FormulaFamily, values: BTreeMap<String, f64>) -> Result<Self, FormulaError> {
        let map = Self(values);
        map.check(family)?;
        Ok(map)
    }

    /// Verify the key set and finiteness against a family schema.
    pub fn check(&self, family: FormulaFamily) -> Result<(), FormulaError> {
        let specs = family.parameter_specs();
        if self.0.len() != specs.len() || !specs.iter().all(|s| self.0.contains_key(s.name)) {
            return Err(FormulaError::InvalidParameters {
                family,
                reason: format!(
                    "expected keys {:?}, got {:?}",
                    specs.iter().map(|s| s.name).collect::<Vec<_>>(),
                    self.0.keys().collect::<Vec<_>>()
                ),
            });
        }
        if let Some((name, value)) = self.0.iter().find(|(_, v)| !v.is_finite()) {
            return Err(FormulaError::InvalidParameters {
                family,
                reason: format!("{name} is not finite ({value})"),
            });
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied()
    }

    /// Replace an existing weight. Unknown names are ignored.
    pub fn set(&mut self, name: &str, value: f64) {
        if let Some(slot) = self.0.get_mut(name) {
            *slot = value;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Stable FNV-1a digest of the weights, usable as part of a cache key.
    pub fn digest(&self) -> u64 {
        const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
        const PRIME: u64 = 0x0100_0000_01b3;
        let mut hash = OFFSET;
        for (name, value) in &self.0 {
            for byte in name.bytes().chain(value.to_bits().to_le_bytes()) {
                hash ^= byte as u64;
                hash = hash.wrapping_mul(PRIME);
            }
        }
        hash
    }

    pub fn as_map(&self) -> &BTreeMap<String, f64> {
        &self.0
    }
}

/// One formula instance: identifier, family and weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Formula {
    pub id: String,
    pub family: FormulaFamily,
    pub parameters: ParameterMap,
    /// Ids of the formulas this one was derived from.
    #[serde(default)]
    pub parents: Vec<String>,
}

impl Formula {
    /// Canonical formula of a family; its id is the family name.
    pub fn canonical(family: FormulaFamily) -> Self {
        Self {
            id: family.as_str().to_string(),
            family,
            parameters: ParameterMap::defaults(family),
            parents: Vec::new(),
        }
    }

    /// Formula with explicit weights.
    pub fn with_parameters(
        id: impl Into<String>,
        family: FormulaFamily,
        parameters: ParameterMap,
    ) -> Result<Self, FormulaError> {
        parameters.check(family)?;
        Ok(Self {
            id: id.into(),
            family,
            parameters,
            parents: Vec::new(),
        })
    }

    /// Weight by name, falling back to the family default.
    #[inline]
    pub fn weight(&self, name: &str) -> f64 {
        self.parameters
            .get(name)
            .or_else(|| self.family.default_weight(name))
            .unwrap_or(1.0)
    }
}

/// Formula construction and lookup errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FormulaError {
    #[error("Unknown formula id: {0}")]
    UnknownFormula(String),
    #[error("Unknown formula family: {0}")]
    UnknownFamily(String),
    #[error("Cannot cross {left} with {right}: formula families differ")]
    FamilyMismatch {
        left: FormulaFamily,
        right: FormulaFamily,
    },
    #[error("Invalid parameters for {family}: {reason}")]
    InvalidParameters {
        family: FormulaFamily,
        reason: String,
    },
}
