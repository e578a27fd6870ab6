//! Formula manipulation utilities for evolutionary search.
//!
//! Provides random generation, crossover, and mutation of formula weights.

use rand::prelude::*;

use crate::schema::{Formula, FormulaError, FormulaFamily, ParameterMap};

/// Lower bound for freshly drawn weights.
pub const RANDOM_WEIGHT_MIN: f64 = 0.1;
/// Upper bound for freshly drawn weights.
pub const RANDOM_WEIGHT_MAX: f64 = 2.0;
/// Weights are kept in `[0, WEIGHT_CEILING]` by mutation.
pub const WEIGHT_CEILING: f64 = 2.0;
/// Maximum relative perturbation applied by mutation.
pub const MUTATION_SPAN: f64 = 0.2;

/// Random number generator wrapper for formula operations.
///
/// Also hands out serial formula ids, so a seeded run produces the same ids
/// every time.
pub struct FormulaRng {
    rng: StdRng,
    serial: u64,
}

impl FormulaRng {
    /// Create from seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            serial: 0,
        }
    }

    /// Create with random seed.
    pub fn random() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            serial: 0,
        }
    }

    fn fresh_id(&mut self, family: FormulaFamily, tag: char) -> String {
        self.serial += 1;
        format!("{family}-{tag}{}", self.serial)
    }

    /// Formula of `family` with every weight drawn from U[0.1, 2.0].
    pub fn random_formula(&mut self, family: FormulaFamily) -> Formula {
        let mut parameters = ParameterMap::defaults(family);
        for spec in family.parameter_specs() {
            parameters.set(
                spec.name,
                self.rng.gen_range(RANDOM_WEIGHT_MIN..=RANDOM_WEIGHT_MAX),
            );
        }
        Formula {
            id: self.fresh_id(family, 'r'),
            family,
            parameters,
            parents: Vec::new(),
        }
    }

    /// New formula where each weight, with probability `rate`, is scaled by
    /// a uniform factor in [0.8, 1.2] and clipped to [0, 2].
    pub fn mutate(&mut self, formula: &Formula, rate: f64) -> Formula {
        let family = formula.family;
        let mut parameters = ParameterMap::defaults(family);
        for spec in family.parameter_specs() {
            let mut weight = formula.weight(spec.name);
            if self.rng.r#gen::<f64>() < rate {
                let delta = self.rng.gen_range(-MUTATION_SPAN..=MUTATION_SPAN);
                weight = (weight * (1.0 + delta)).clamp(0.0, WEIGHT_CEILING);
            }
            parameters.set(spec.name, weight);
        }
        Formula {
            id: self.fresh_id(family, 'm'),
            family,
            parameters,
            parents: vec![formula.id.clone()],
        }
    }

    /// Uniform crossover: each weight comes from either parent with equal odds.
    pub fn crossover(
        &mut self,
        first: &Formula,
        second: &Formula,
    ) -> Result<Formula, FormulaError> {
        if first.family != second.family {
            return Err(FormulaError::FamilyMismatch {
                left: first.family,
                right: second.family,
            });
        }

        let family = first.family;
        let mut parameters = ParameterMap::defaults(family);
        for spec in family.parameter_specs() {
            let source = if self.rng.gen_bool(0.5) { first } else { second };
            parameters.set(spec.name, source.weight(spec.name));
        }
        Ok(Formula {
            id: self.fresh_id(family, 'c'),
            family,
            parameters,
            parents: vec![first.id.clone(), second.id.clone()],
        })
    }

    /// Uniform index in `0..len`.
    pub fn index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }

    /// Raw u64 for seeding derived generators.
    pub fn next_seed(&mut self) -> u64 {
        self.rng.r#gen()
    }
}
