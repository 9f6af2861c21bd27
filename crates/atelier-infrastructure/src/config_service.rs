//! Configuration service implementation.
//!
//! This module provides a ConfigService that loads the application
//! configuration from the configuration file (~/.config/atelier/config.toml).

use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

use atelier_core::config::AtelierConfig;
use atelier_core::error::{AtelierError, Result};

use crate::paths::AtelierPaths;

/// Environment variable overriding `gemini.api_key`.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Configuration service that loads and caches the application configuration.
///
/// A missing file yields the defaults; a file that fails to parse or
/// validate is an error rather than being silently replaced.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
    /// Cached configuration loaded from file.
    config: Arc<RwLock<Option<AtelierConfig>>>,
}

impl ConfigService {
    /// Creates a service reading the default config file location.
    pub fn new(paths: &AtelierPaths) -> Result<Self> {
        Ok(Self::with_path(paths.config_file()?))
    }

    /// Creates a service reading `path`.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            config: Arc::new(RwLock::new(None)),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Gets the configuration, loading from file if not cached.
    pub fn get_config(&self) -> Result<AtelierConfig> {
        // Check if already cached
        {
            let read_lock = self.config.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(ref cached) = *read_lock {
                return Ok(cached.clone());
            }
        }

        let mut loaded = self.load_config()?;
        apply_env_overrides(&mut loaded, |key| std::env::var(key).ok());
        loaded.validate()?;

        // Cache it
        {
            let mut write_lock = self.config.write().unwrap_or_else(PoisonError::into_inner);
            *write_lock = Some(loaded.clone());
        }

        Ok(loaded)
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        let mut write_lock = self.config.write().unwrap_or_else(PoisonError::into_inner);
        *write_lock = None;
    }

    fn load_config(&self) -> Result<AtelierConfig> {
        if !self.path.exists() {
            tracing::info!(
                "[ConfigService] No config file at {}, using defaults",
                self.path.display()
            );
            return Ok(AtelierConfig::default());
        }

        let content = std::fs::read_to_string(&self.path)?;
        toml::from_str(&content).map_err(|e| {
            AtelierError::config(format!(
                "Failed to parse configuration file at {}: {}",
                self.path.display(),
                e
            ))
        })
    }
}

/// Applies environment overrides. `lookup` is `std::env::var` in production.
pub fn apply_env_overrides(config: &mut AtelierConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(key) = lookup(API_KEY_ENV).filter(|value| !value.trim().is_empty()) {
        config.gemini.api_key = Some(key);
    }
}
