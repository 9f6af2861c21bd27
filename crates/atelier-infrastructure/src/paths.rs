//! Path resolution for Atelier configuration files.
//!
//! ```text
//! ~/.config/atelier/           # Config directory (platform config dir)
//! ├── config.toml              # Application configuration
//! └── catalog.toml             # Optional seed catalog override
//! ```

use std::path::PathBuf;

use atelier_core::error::{AtelierError, Result};

const APP_DIR: &str = "atelier";
const CONFIG_FILE: &str = "config.toml";
const SEED_CATALOG_FILE: &str = "catalog.toml";

/// Resolves Atelier paths, optionally under an explicit base directory.
#[derive(Debug, Clone, Default)]
pub struct AtelierPaths {
    base: Option<PathBuf>,
}

impl AtelierPaths {
    /// Uses `base` instead of the platform config directory when given.
    pub fn new(base: Option<PathBuf>) -> Self {
        Self { base }
    }

    /// Returns the Atelier configuration directory.
    pub fn config_dir(&self) -> Result<PathBuf> {
        if let Some(base) = &self.base {
            return Ok(base.clone());
        }
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or_else(|| AtelierError::config("Cannot find the platform config directory"))
    }

    pub fn config_file(&self) -> Result<PathBuf> {
        Ok(self.config_dir()?.join(CONFIG_FILE))
    }

    pub fn seed_catalog_file(&self) -> Result<PathBuf> {
        Ok(self.config_dir()?.join(SEED_CATALOG_FILE))
    }
}
