//! Configuration types for validation and convergence analysis.

use serde::{Deserialize, Serialize};

/// Cross-domain validation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Minimum entities with encoding and outcome before a domain is scored.
    #[serde(default = "default_min_sample_size")]
    pub min_sample_size: usize,
    /// Two-tailed p-value below which a correlation is significant.
    #[serde(default = "default_significance_level")]
    pub significance_level: f64,
    /// Entities requested per domain.
    #[serde(default = "default_limit_per_domain")]
    pub limit_per_domain: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_sample_size: default_min_sample_size(),
            significance_level: default_significance_level(),
            limit_per_domain: default_limit_per_domain(),
        }
    }
}

fn default_min_sample_size() -> usize {
    10
}
fn default_significance_level() -> f64 {
    0.05
}
fn default_limit_per_domain() -> usize {
    1000
}

impl ValidationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Pearson needs three points for a defined p-value.
        if self.min_sample_size < 3 {
            return Err(ConfigError::SampleSizeTooSmall(self.min_sample_size));
        }
        if !(self.significance_level > 0.0 && self.significance_level < 1.0) {
            return Err(ConfigError::InvalidSignificance(self.significance_level));
        }
        if self.limit_per_domain == 0 {
            return Err(ConfigError::InvalidLimit);
        }
        Ok(())
    }
}

/// Invariant-mining settings for the convergence analyzer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Individuals taken from the final generation.
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    /// Relative tolerance for constant and ratio matches.
    #[serde(default = "default_constant_tolerance")]
    pub constant_tolerance: f64,
    /// Relative tolerance for Fibonacci matches.
    #[serde(default = "default_fibonacci_tolerance")]
    pub fibonacci_tolerance: f64,
    /// Fraction of raw values that must match a constant (strictly greater).
    #[serde(default = "default_constant_occurrence")]
    pub constant_occurrence: f64,
    /// Fraction of raw values that must be near a Fibonacci number.
    #[serde(default = "default_fibonacci_occurrence")]
    pub fibonacci_occurrence: f64,
    /// Sum invariants need stddev below this fraction of the median sum.
    #[serde(default = "default_sum_cv_threshold")]
    pub sum_cv_threshold: f64,
    /// |r| above which a correlation counts as strong.
    #[serde(default = "default_correlation_threshold")]
    pub correlation_threshold: f64,
    /// Significance level for parameter-fitness correlations.
    #[serde(default = "default_significance_level")]
    pub significance_level: f64,
    /// Invariants above this occurrence rate enter the universal summary.
    #[serde(default = "default_universal_occurrence")]
    pub universal_occurrence: f64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            constant_tolerance: default_constant_tolerance(),
            fibonacci_tolerance: default_fibonacci_tolerance(),
            constant_occurrence: default_constant_occurrence(),
            fibonacci_occurrence: default_fibonacci_occurrence(),
            sum_cv_threshold: default_sum_cv_threshold(),
            correlation_threshold: default_correlation_threshold(),
            significance_level: default_significance_level(),
            universal_occurrence: default_universal_occurrence(),
        }
    }
}

fn default_top_n() -> usize {
    10
}
fn default_constant_tolerance() -> f64 {
    0.05
}
fn default_fibonacci_tolerance() -> f64 {
    0.10
}
fn default_constant_occurrence() -> f64 {
    0.5
}
fn default_fibonacci_occurrence() -> f64 {
    0.4
}
fn default_sum_cv_threshold() -> f64 {
    0.10
}
fn default_correlation_threshold() -> f64 {
    0.5
}
fn default_universal_occurrence() -> f64 {
    0.7
}

impl AnalyzerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.top_n == 0 {
            return Err(ConfigError::InvalidTopN);
        }
        let fractions = [
            ("constant_tolerance", self.constant_tolerance),
            ("fibonacci_tolerance", self.fibonacci_tolerance),
            ("constant_occurrence", self.constant_occurrence),
            ("fibonacci_occurrence", self.fibonacci_occurrence),
            ("sum_cv_threshold", self.sum_cv_threshold),
            ("correlation_threshold", self.correlation_threshold),
            ("universal_occurrence", self.universal_occurrence),
        ];
        for (name, value) in fractions {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidFraction {
                    name: name.to_string(),
                    value,
                });
            }
        }
        if !(self.significance_level > 0.0 && self.significance_level < 1.0) {
            return Err(ConfigError::InvalidSignificance(self.significance_level));
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Minimum sample size must be at least 3, got {0}")]
    SampleSizeTooSmall(usize),
    #[error("Significance level must be in (0, 1), got {0}")]
    InvalidSignificance(f64),
    #[error("Per-domain entity limit must be non-zero")]
    InvalidLimit,
    #[error("Analyzer top-N must be non-zero")]
    InvalidTopN,
    #[error("{name} must be in [0, 1], got {value}")]
    InvalidFraction { name: String, value: f64 },
}
