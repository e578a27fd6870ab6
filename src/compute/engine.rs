//! Formula registry: owns formula instances by id and dispatches transforms.

use std::collections::BTreeMap;

use log::debug;

use super::evolution::FormulaRng;
use crate::schema::{Formula, FormulaError, FormulaFamily, LinguisticFeatures, VisualEncoding};

/// Registry of formulas keyed by id.
///
/// A fresh engine holds the six canonical formulas, registered under their
/// family names.
#[derive(Debug, Clone)]
pub struct FormulaEngine {
    formulas: BTreeMap<String, Formula>,
}

impl Default for FormulaEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl FormulaEngine {
    pub fn new() -> Self {
        let formulas = FormulaFamily::ALL
            .iter()
            .map(|&family| {
                let formula = Formula::canonical(family);
                (formula.id.clone(), formula)
            })
            .collect();
        Self { formulas }
    }

    /// Registry with no formulas.
    pub fn empty() -> Self {
        Self {
            formulas: BTreeMap::new(),
        }
    }

    /// Register a formula, replacing any formula with the same id.
    pub fn register(&mut self, formula: Formula) -> Result<Option<Formula>, FormulaError> {
        formula.parameters.check(formula.family)?;
        debug!("Registering formula {} ({})", formula.id, formula.family);
        Ok(self.formulas.insert(formula.id.clone(), formula))
    }

    pub fn unregister(&mut self, id: &str) -> Option<Formula> {
        self.formulas.remove(id)
    }

    pub fn get(&self, id: &str) -> Result<&Formula, FormulaError> {
        self.formulas
            .get(id)
            .ok_or_else(|| FormulaError::UnknownFormula(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.formulas.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.formulas.keys().map(String::as_str)
    }

    /// Distinct families among registered formulas.
    pub fn families(&self) -> Vec<FormulaFamily> {
        let mut families: Vec<FormulaFamily> =
            self.formulas.values().map(|f| f.family).collect();
        families.sort();
        families.dedup();
        families
    }

    pub fn len(&self) -> usize {
        self.formulas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formulas.is_empty()
    }

    /// Randomly weighted formula with a fresh id. Not registered.
    pub fn create_random_formula(&self, family: FormulaFamily, rng: &mut FormulaRng) -> Formula {
        rng.random_formula(family)
    }

    /// Transform a name with the formula registered under `id`.
    pub fn transform(
        &self,
        id: &str,
        name: &str,
        features: &LinguisticFeatures,
    ) -> Result<VisualEncoding, FormulaError> {
        Ok(self.get(id)?.transform(name, features))
    }

    /// Transform a name with every registered formula.
    pub fn transform_all(
        &self,
        name: &str,
        features: &LinguisticFeatures,
    ) -> BTreeMap<String, VisualEncoding> {
        self.formulas
            .iter()
            .map(|(id, formula)| (id.clone(), formula.transform(name, features)))
            .collect()
    }
}
