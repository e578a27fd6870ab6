//! Linguistic feature vectors supplied by the external feature extractor.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Feature keys read by the formula families.
pub mod keys {
    pub const SYLLABLES: &str = "syllables";
    pub const LENGTH: &str = "length";
    pub const HARSHNESS: &str = "harshness";
    pub const SMOOTHNESS: &str = "smoothness";
    pub const VOWEL_RATIO: &str = "vowel_ratio";
    pub const PLOSIVE_RATIO: &str = "plosive_ratio";
    pub const PHONETIC_COMPLEXITY: &str = "phonetic_complexity";
    pub const MEMORABILITY: &str = "memorability";
    pub const AUTHORITY: &str = "authority";
    pub const PRESTIGE: &str = "prestige";
    pub const SENTIMENT: &str = "sentiment";
    pub const SEMANTIC_CATEGORY: &str = "semantic_category";
}

/// Name → scalar feature mapping for a single name.
///
/// Keys are not guaranteed present; formulas fall back to per-family
/// defaults through [`LinguisticFeatures::get_or`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinguisticFeatures(BTreeMap<String, f64>);

impl LinguisticFeatures {
    /// Create an empty feature vector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: &str, value: f64) -> Self {
        self.0.insert(key.to_string(), value);
        self
    }

    /// Insert or replace a feature.
    pub fn insert(&mut self, key: &str, value: f64) {
        self.0.insert(key.to_string(), value);
    }

    /// Raw lookup. Non-finite values are treated as missing.
    pub fn get(&self, key: &str) -> Option<f64> {
        self.0.get(key).copied().filter(|v| v.is_finite())
    }

    /// Lookup with a fallback default.
    #[inline]
    pub fn get_or(&self, key: &str, default: f64) -> f64 {
        self.get(key).unwrap_or(default)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl FromIterator<(String, f64)> for LinguisticFeatures {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
