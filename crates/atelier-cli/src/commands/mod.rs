pub mod catalog;
pub mod config;
pub mod generate;

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use atelier_core::config::AtelierConfig;
use atelier_infrastructure::{AtelierPaths, ConfigService};

/// Resolved paths plus the effective configuration, shared by every command.
pub struct Context {
    pub paths: AtelierPaths,
    pub config_file: PathBuf,
    pub config: AtelierConfig,
}

impl Context {
    pub fn load(config_dir: Option<PathBuf>) -> Result<Self> {
        let paths = AtelierPaths::new(config_dir);
        let service = ConfigService::new(&paths).context("Failed to resolve the config directory")?;
        let config = service
            .get_config()
            .with_context(|| format!("Failed to load {}", service.path().display()))?;

        tracing::debug!(app_id = %config.app_id, "configuration loaded");
        Ok(Self {
            paths,
            config_file: service.path().clone(),
            config,
        })
    }
}
