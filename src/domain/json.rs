//! Domains stored as `<dir>/<domain>.json`, each a JSON array of entities.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use super::{DomainEntity, DomainError, DomainLoader};

/// Reads domain files from a directory on every call.
#[derive(Debug, Clone)]
pub struct JsonDomainLoader {
    dir: PathBuf,
}

impl JsonDomainLoader {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Domain ids available in the directory, sorted.
    pub fn available(&self) -> Result<Vec<String>, DomainError> {
        let mut ids: Vec<String> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .filter_map(|path| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .collect();
        ids.sort();
        Ok(ids)
    }

    /// Write a domain file, creating the directory if needed.
    pub fn save(&self, domain: &str, entities: &[DomainEntity]) -> Result<PathBuf, DomainError> {
        let path = self.path_for(domain)?;
        fs::create_dir_all(&self.dir)?;
        fs::write(&path, serde_json::to_string_pretty(entities)?)?;
        Ok(path)
    }

    fn path_for(&self, domain: &str) -> Result<PathBuf, DomainError> {
        if domain.is_empty() || domain.contains(['/', '\\']) || domain.contains("..") {
            return Err(DomainError::UnknownDomain(domain.to_string()));
        }
        Ok(self.dir.join(format!("{domain}.json")))
    }
}

impl DomainLoader for JsonDomainLoader {
    fn load(&self, domain: &str, limit: usize) -> Result<Vec<DomainEntity>, DomainError> {
        let path = self.path_for(domain)?;
        if !path.is_file() {
            return Err(DomainError::UnknownDomain(domain.to_string()));
        }
        let text = fs::read_to_string(&path)?;
        let mut entities: Vec<DomainEntity> = serde_json::from_str(&text)?;
        entities.truncate(limit);
        debug!("Loaded {} entities from {}", entities.len(), path.display());
        Ok(entities)
    }
}
