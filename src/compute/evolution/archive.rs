//! Run archive for storing and comparing evolution histories.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::compute::convergence::ConvergenceAnalyzer;
use crate::schema::{ConvergenceSignature, CrossFormulaComparison, EvolutionHistory, FormulaFamily};

/// Archive persistence errors.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("No output directory set")]
    NoOutputDir,
    #[error("No run archived for {0}")]
    MissingRun(FormulaFamily),
}

/// Best evolution run per formula family.
#[derive(Debug, Default)]
pub struct RunArchive {
    runs: BTreeMap<FormulaFamily, EvolutionHistory>,
    /// Output directory for saving runs.
    output_dir: Option<PathBuf>,
}

impl RunArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set output directory for saving runs.
    pub fn with_output_dir<P: AsRef<Path>>(mut self, dir: P) -> Result<Self, ArchiveError> {
        let path = dir.as_ref().to_path_buf();
        fs::create_dir_all(&path)?;
        self.output_dir = Some(path);
        Ok(self)
    }

    /// Add a run. An existing run for the same family is only replaced by
    /// a run with higher best fitness.
    pub fn add(&mut self, history: EvolutionHistory) -> bool {
        if let Some(existing) = self.runs.get(&history.family)
            && history.best_fitness <= existing.best_fitness
        {
            return false;
        }
        self.runs.insert(history.family, history);
        true
    }

    pub fn get(&self, family: FormulaFamily) -> Option<&EvolutionHistory> {
        self.runs.get(&family)
    }

    /// All runs in family order.
    pub fn all(&self) -> impl Iterator<Item = &EvolutionHistory> {
        self.runs.values()
    }

    pub fn families(&self) -> Vec<FormulaFamily> {
        self.runs.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn clear(&mut self) {
        self.runs.clear();
    }

    fn file_name(family: FormulaFamily) -> String {
        format!("{family}_history.json")
    }

    /// Save one run to the output directory.
    pub fn save_run(&self, family: FormulaFamily) -> Result<PathBuf, ArchiveError> {
        let output_dir = self.output_dir.as_ref().ok_or(ArchiveError::NoOutputDir)?;
        let history = self.runs.get(&family).ok_or(ArchiveError::MissingRun(family))?;

        let path = output_dir.join(Self::file_name(family));
        let json = serde_json::to_string_pretty(history)?;
        fs::write(&path, json)?;
        debug!("Saved {family} run to {}", path.display());
        Ok(path)
    }

    /// Save all runs.
    pub fn save_all(&self) -> Result<Vec<PathBuf>, ArchiveError> {
        self.runs.keys().map(|&family| self.save_run(family)).collect()
    }

    /// Load every readable history in a directory.
    ///
    /// Unreadable or malformed files are skipped with a warning.
    pub fn load_from_dir<P: AsRef<Path>>(dir: P) -> Result<Self, ArchiveError> {
        let dir = dir.as_ref();
        let mut archive = Self {
            runs: BTreeMap::new(),
            output_dir: Some(dir.to_path_buf()),
        };

        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().is_none_or(|e| e != "json") {
                continue;
            }
            match load_history(&path) {
                Ok(history) => {
                    archive.add(history);
                }
                Err(e) => warn!("Skipping {}: {e}", path.display()),
            }
        }

        Ok(archive)
    }

    /// Signature of every stored run.
    pub fn analyze_all(
        &self,
        analyzer: &ConvergenceAnalyzer,
    ) -> BTreeMap<FormulaFamily, ConvergenceSignature> {
        self.runs
            .iter()
            .map(|(&family, history)| (family, analyzer.analyze(history)))
            .collect()
    }

    /// Cross-formula comparison over every stored run.
    pub fn compare(&self, analyzer: &ConvergenceAnalyzer) -> CrossFormulaComparison {
        let signatures: Vec<ConvergenceSignature> =
            self.analyze_all(analyzer).into_values().collect();
        analyzer.compare_formula_types(&signatures)
    }
}

/// Load an evolution history from a JSON file.
pub fn load_history<P: AsRef<Path>>(path: P) -> Result<EvolutionHistory, ArchiveError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{EvolutionConfig, StopReason};

    fn test_history(family: FormulaFamily, best_fitness: f64) -> EvolutionHistory {
        EvolutionHistory {
            family,
            config: EvolutionConfig {
                family,
                domains: vec!["d".to_string()],
                ..Default::default()
            },
            generations: Vec::new(),
            converged: false,
            convergence_generation: None,
            best_fitness,
            best_formula: None,
            stop_reason: StopReason::MaxGenerations,
            total_evaluations: 0,
            elapsed_seconds: 0.0,
        }
    }

    #[test]
    fn test_archive_add_keeps_better_run() {
        let mut archive = RunArchive::new();
        assert!(archive.add(test_history(FormulaFamily::Phonetic, 0.5)));
        assert!(!archive.add(test_history(FormulaFamily::Phonetic, 0.3)));
        assert!(archive.add(test_history(FormulaFamily::Phonetic, 0.7)));
        assert!(archive.add(test_history(FormulaFamily::Hybrid, 0.1)));

        assert_eq!(archive.len(), 2);
        assert_eq!(archive.get(FormulaFamily::Phonetic).unwrap().best_fitness, 0.7);
        assert_eq!(
            archive.families(),
            vec![FormulaFamily::Phonetic, FormulaFamily::Hybrid]
        );
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut archive = RunArchive::new().with_output_dir(dir.path()).unwrap();
        archive.add(test_history(FormulaFamily::Semantic, 0.4));
        archive.add(test_history(FormulaFamily::Frequency, 0.2));

        let paths = archive.save_all().unwrap();
        assert_eq!(paths.len(), 2);
        assert!(paths.iter().all(|p| p.exists()));
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        fs::write(dir.path().join("broken.json"), "{").unwrap();

        let loaded = RunArchive::load_from_dir(dir.path()).unwrap();
        assert_eq!(loaded.len(), 2);
        let semantic = loaded.get(FormulaFamily::Semantic).unwrap();
        assert_eq!(semantic.best_fitness, 0.4);
        assert_eq!(semantic.config.domains, vec!["d".to_string()]);
    }

    #[test]
    fn test_saved_fitness_reads_back_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let mut archive = RunArchive::new().with_output_dir(dir.path()).unwrap();
        let fitness = 0.461_899_609_765_104_36;
        archive.add(test_history(FormulaFamily::Numerological, fitness));
        let path = archive.save_run(FormulaFamily::Numerological).unwrap();

        let loaded = load_history(&path).unwrap();
        assert_eq!(loaded.best_fitness.to_bits(), fitness.to_bits());
    }

    #[test]
    fn test_save_requires_output_dir() {
        let mut archive = RunArchive::new();
        archive.add(test_history(FormulaFamily::Phonetic, 0.5));
        assert!(matches!(
            archive.save_run(FormulaFamily::Phonetic),
            Err(ArchiveError::NoOutputDir)
        ));

        let dir = tempfile::tempdir().unwrap();
        let archive = archive.with_output_dir(dir.path()).unwrap();
        assert!(matches!(
            archive.save_run(FormulaFamily::Hybrid),
            Err(ArchiveError::MissingRun(FormulaFamily::Hybrid))
        ));
    }

    #[test]
    fn test_compare_empty_runs() {
        let mut archive = RunArchive::new();
        archive.add(test_history(FormulaFamily::Phonetic, 0.5));
        archive.add(test_history(FormulaFamily::Structural, 0.5));

        let analyzer = ConvergenceAnalyzer::default();
        let signatures = archive.analyze_all(&analyzer);
        assert_eq!(signatures.len(), 2);
        assert!(signatures.values().all(|s| s.sample_size == 0));

        let comparison = archive.compare(&analyzer);
        assert_eq!(comparison.formula_types.len(), 2);
        assert!(comparison.common_invariants.is_empty());
    }
}
