//! The static seed catalog shipped with the application.

use std::collections::HashSet;
use std::path::Path;

use atelier_core::catalog::CatalogEntry;
use atelier_core::error::{AtelierError, Result};
use serde::Deserialize;

const BUILTIN_CATALOG: &str = include_str!("../seed/catalog.toml");

#[derive(Deserialize)]
struct SeedFile {
    #[serde(default, rename = "tool")]
    tools: Vec<CatalogEntry>,
}

/// Ordered, id-unique list of seed entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedCatalog {
    entries: Vec<CatalogEntry>,
}

impl SeedCatalog {
    /// The catalog compiled into the binary.
    pub fn builtin() -> Result<Self> {
        Self::parse(BUILTIN_CATALOG)
    }

    /// Loads a seed catalog override from a TOML file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content).map_err(|e| {
            AtelierError::config(format!(
                "Invalid seed catalog at {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Uses `path` when it exists, the built-in catalog otherwise.
    pub fn load_or_builtin(path: &Path) -> Result<Self> {
        if path.exists() {
            tracing::info!("[SeedCatalog] Loading override from {}", path.display());
            Self::load_from(path)
        } else {
            Self::builtin()
        }
    }

    pub fn parse(content: &str) -> Result<Self> {
        let file: SeedFile = toml::from_str(content)?;
        Self::from_entries(file.tools)
    }

    /// Builds a catalog, rejecting duplicate or empty ids.
    pub fn from_entries(entries: Vec<CatalogEntry>) -> Result<Self> {
        let mut seen = HashSet::new();
        for entry in &entries {
            if entry.id.trim().is_empty() {
                return Err(AtelierError::config(format!(
                    "seed entry '{}' has an empty id",
                    entry.name
                )));
            }
            if !seen.insert(entry.id.as_str()) {
                return Err(AtelierError::config(format!(
                    "duplicate seed id '{}'",
                    entry.id
                )));
            }
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_parses() {
        let seed = SeedCatalog::builtin().unwrap();
        assert!(!seed.is_empty());

        let midjourney = seed
            .entries()
            .iter()
            .find(|e| e.id == "midjourney")
            .expect("midjourney is part of the launch catalog");
        assert_eq!(midjourney.category, "Generalist Generative AI");
        assert!(midjourney.use_cases.contains(&"ideation".to_string()));
        assert!(!midjourney.logo_ref.is_empty());
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let content = r#"
            [[tool]]
            id = "a"
            name = "A"

            [[tool]]
            id = "a"
            name = "A again"
        "#;
        let err = SeedCatalog::parse(content).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_empty_file_is_empty_catalog() {
        assert!(SeedCatalog::parse("").unwrap().is_empty());
    }

    #[test]
    fn test_load_or_builtin_falls_back() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let missing = temp_dir.path().join("catalog.toml");
        assert_eq!(
            SeedCatalog::load_or_builtin(&missing).unwrap(),
            SeedCatalog::builtin().unwrap()
        );

        std::fs::write(&missing, "[[tool]]\nid = \"only\"\nname = \"Only\"\n").unwrap();
        let loaded = SeedCatalog::load_or_builtin(&missing).unwrap();
        assert_eq!(loaded.len(), 1);
    }
}
