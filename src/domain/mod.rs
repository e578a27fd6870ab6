//! Domain datasets: named entities with outcome metrics.
//!
//! The validator only sees the [`DomainLoader`] trait. Loaders are read-only
//! and shared across evaluation threads.

mod json;
mod synthetic;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::schema::LinguisticFeatures;

pub use json::JsonDomainLoader;
pub use synthetic::SyntheticDomain;

/// One named entity of a domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainEntity {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linguistic_features: Option<LinguisticFeatures>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome_metric: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_successful: Option<bool>,
}

impl DomainEntity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            linguistic_features: None,
            outcome_metric: None,
            is_successful: None,
        }
    }

    pub fn with_features(mut self, features: LinguisticFeatures) -> Self {
        self.linguistic_features = Some(features);
        self
    }

    pub fn with_outcome(mut self, outcome: f64) -> Self {
        self.outcome_metric = Some(outcome);
        self
    }

    pub fn with_success(mut self, successful: bool) -> Self {
        self.is_successful = Some(successful);
        self
    }
}

/// Domain loading errors.
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("Unknown domain: {0}")]
    UnknownDomain(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid synthetic noise level: {0}")]
    InvalidNoise(f64),
}

/// Source of domain entities.
pub trait DomainLoader: Send + Sync {
    /// Up to `limit` entities of `domain`.
    fn load(&self, domain: &str, limit: usize) -> Result<Vec<DomainEntity>, DomainError>;
}

/// Domains held in memory, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDomains {
    domains: BTreeMap<String, Vec<DomainEntity>>,
}

impl InMemoryDomains {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, domain: impl Into<String>, entities: Vec<DomainEntity>) {
        self.domains.insert(domain.into(), entities);
    }

    pub fn with_domain(mut self, domain: impl Into<String>, entities: Vec<DomainEntity>) -> Self {
        self.insert(domain, entities);
        self
    }

    /// Generate a synthetic domain and store it under its own name.
    pub fn with_synthetic(mut self, synthetic: &SyntheticDomain) -> Result<Self, DomainError> {
        let entities = synthetic.generate()?;
        self.insert(synthetic.name(), entities);
        Ok(self)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.domains.keys().map(String::as_str)
    }
}

impl DomainLoader for InMemoryDomains {
    fn load(&self, domain: &str, limit: usize) -> Result<Vec<DomainEntity>, DomainError> {
        self.domains
            .get(domain)
            .map(|entities| entities.iter().take(limit).cloned().collect())
            .ok_or_else(|| DomainError::UnknownDomain(domain.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_limit_and_unknown() {
        let entities = (0..5)
            .map(|i| DomainEntity::new(format!("n{i}")).with_outcome(i as f64))
            .collect();
        let domains = InMemoryDomains::new().with_domain("brands", entities);

        assert_eq!(domains.load("brands", 3).unwrap().len(), 3);
        assert_eq!(domains.load("brands", 100).unwrap().len(), 5);
        assert!(matches!(
            domains.load("missing", 10),
            Err(DomainError::UnknownDomain(_))
        ));
    }

    #[test]
    fn test_entity_optional_fields_deserialize() {
        let entity: DomainEntity = serde_json::from_str(r#"{"name": "Acme"}"#).unwrap();
        assert_eq!(entity, DomainEntity::new("Acme"));

        let json = r#"{"name": "Zeta", "linguistic_features": {"harshness": 70.0},
                       "outcome_metric": 1.5, "is_successful": true}"#;
        let entity: DomainEntity = serde_json::from_str(json).unwrap();
        assert_eq!(entity.outcome_metric, Some(1.5));
        assert_eq!(
            entity.linguistic_features.and_then(|f| f.get("harshness")),
            Some(70.0)
        );
    }
}
