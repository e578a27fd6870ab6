//! Seeded synthetic domains with a known feature → outcome relationship.

use rand::prelude::*;
use rand_distr::Normal;

use super::{DomainEntity, DomainError};
use crate::compute::formula::text;
use crate::compute::stats;
use crate::schema::{keys, LinguisticFeatures};

const ONSETS: [&str; 16] = [
    "b", "d", "g", "k", "p", "t", "l", "m", "n", "r", "s", "v", "z", "br", "st", "tr",
];
const NUCLEI: [&str; 7] = ["a", "e", "i", "o", "u", "ea", "io"];

/// Builder for a synthetic domain.
///
/// Outcome = intercept + Σ coefficient · feature + N(0, noise).
#[derive(Debug, Clone)]
pub struct SyntheticDomain {
    name: String,
    size: usize,
    seed: u64,
    intercept: f64,
    terms: Vec<(String, f64)>,
    noise_std: f64,
    success_flags: bool,
}

impl SyntheticDomain {
    pub fn new(name: impl Into<String>, size: usize, seed: u64) -> Self {
        Self {
            name: name.into(),
            size,
            seed,
            intercept: 0.0,
            terms: Vec::new(),
            noise_std: 1.0,
            success_flags: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn with_intercept(mut self, intercept: f64) -> Self {
        self.intercept = intercept;
        self
    }

    /// Add `coefficient · features[key]` to the outcome.
    pub fn with_term(mut self, key: &str, coefficient: f64) -> Self {
        self.terms.push((key.to_string(), coefficient));
        self
    }

    pub fn with_noise(mut self, noise_std: f64) -> Self {
        self.noise_std = noise_std;
        self
    }

    /// Mark entities above the median outcome as successful.
    pub fn with_success_flags(mut self) -> Self {
        self.success_flags = true;
        self
    }

    /// Generate the entities. Same builder, same entities.
    pub fn generate(&self) -> Result<Vec<DomainEntity>, DomainError> {
        if !(self.noise_std.is_finite() && self.noise_std >= 0.0) {
            return Err(DomainError::InvalidNoise(self.noise_std));
        }
        let noise = Normal::new(0.0, self.noise_std)
            .map_err(|_| DomainError::InvalidNoise(self.noise_std))?;
        let mut rng = StdRng::seed_from_u64(self.seed);

        let mut entities: Vec<DomainEntity> = (0..self.size)
            .map(|i| {
                let name = random_name(&mut rng, i);
                let features = random_features(&mut rng, &name);
                let outcome = self.intercept
                    + self
                        .terms
                        .iter()
                        .map(|(key, coef)| coef * features.get_or(key, 0.0))
                        .sum::<f64>()
                    + noise.sample(&mut rng);
                DomainEntity::new(name)
                    .with_features(features)
                    .with_outcome(outcome)
            })
            .collect();

        if self.success_flags {
            let outcomes: Vec<f64> = entities.iter().filter_map(|e| e.outcome_metric).collect();
            let median = stats::median(&outcomes);
            for entity in &mut entities {
                entity.is_successful = entity.outcome_metric.map(|o| o > median);
            }
        }

        Ok(entities)
    }
}

/// Pronounceable name of one to four syllables, suffixed with its index so
/// names stay unique.
fn random_name(rng: &mut StdRng, index: usize) -> String {
    let syllables = rng.gen_range(1..=4);
    let mut name = String::new();
    for _ in 0..syllables {
        name.push_str(ONSETS[rng.gen_range(0..ONSETS.len())]);
        name.push_str(NUCLEI[rng.gen_range(0..NUCLEI.len())]);
    }
    if rng.gen_bool(0.3) {
        name.push_str(ONSETS[rng.gen_range(0..ONSETS.len())]);
    }
    let mut chars = name.chars();
    let capitalized: String = chars
        .next()
        .map(|c| c.to_ascii_uppercase())
        .into_iter()
        .chain(chars)
        .collect();
    format!("{capitalized}{index}")
}

fn random_features(rng: &mut StdRng, name: &str) -> LinguisticFeatures {
    let letters = text::letters(name);
    let len = letters.len().max(1) as f64;
    let vowels = letters.iter().filter(|&&l| text::is_vowel(l)).count() as f64;
    let plosives = letters
        .iter()
        .filter(|&&l| b"bdgkpt".contains(&l))
        .count() as f64;
    let harshness = (plosives / len * 150.0 + rng.gen_range(0.0..40.0)).min(100.0);

    LinguisticFeatures::new()
        .with(keys::SYLLABLES, text::estimate_syllables(&letters) as f64)
        .with(keys::LENGTH, letters.len() as f64)
        .with(keys::HARSHNESS, harshness)
        .with(keys::SMOOTHNESS, 100.0 - harshness)
        .with(keys::VOWEL_RATIO, vowels / len)
        .with(keys::PLOSIVE_RATIO, plosives / len)
        .with(keys::PHONETIC_COMPLEXITY, rng.gen_range(0.0..100.0))
        .with(keys::MEMORABILITY, rng.gen_range(0.0..100.0))
        .with(keys::AUTHORITY, rng.gen_range(0.0..100.0))
        .with(keys::PRESTIGE, rng.gen_range(0.0..100.0))
        .with(keys::SENTIMENT, rng.gen_range(-1.0..1.0))
        .with(keys::SEMANTIC_CATEGORY, rng.gen_range(0..6) as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_is_seeded() {
        let domain = SyntheticDomain::new("d", 20, 11).with_term(keys::HARSHNESS, 0.1);
        let a = domain.generate().unwrap();
        let b = domain.generate().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 20);
        assert!(a.iter().all(|e| e.linguistic_features.is_some()));
    }

    #[test]
    fn test_noiseless_outcome_is_linear() {
        let domain = SyntheticDomain::new("d", 30, 2)
            .with_intercept(5.0)
            .with_term(keys::PRESTIGE, 2.0)
            .with_noise(0.0);
        for entity in domain.generate().unwrap() {
            let prestige = entity.linguistic_features.unwrap().get_or(keys::PRESTIGE, -1.0);
            let outcome = entity.outcome_metric.unwrap();
            assert!((outcome - (5.0 + 2.0 * prestige)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_success_flags_split_at_median() {
        let entities = SyntheticDomain::new("d", 40, 3)
            .with_term(keys::AUTHORITY, 1.0)
            .with_success_flags()
            .generate()
            .unwrap();
        let successes = entities.iter().filter(|e| e.is_successful == Some(true)).count();
        assert_eq!(successes, 20);
    }

    #[test]
    fn test_negative_noise_rejected() {
        let result = SyntheticDomain::new("d", 5, 0).with_noise(-1.0).generate();
        assert!(matches!(result, Err(DomainError::InvalidNoise(_))));
        let result = SyntheticDomain::new("d", 5, 0).with_noise(f64::NAN).generate();
        assert!(matches!(result, Err(DomainError::InvalidNoise(_))));
        assert_eq!(
            SyntheticDomain::new("d", 5, 0).with_noise(0.0).generate().unwrap().len(),
            5
        );
    }
}
