//! Application configuration.
//!
//! Every value has a documented default so a missing config file still
//! yields a working setup (minus the API key).

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AtelierError, Result};

pub const DEFAULT_APP_ID: &str = "default-app-id";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_IMAGE_MODEL: &str = "imagen-3.0-generate-002";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 100;
/// A full 0..100 sweep in 3 seconds at the default cadence.
pub const DEFAULT_TICK_INCREMENT: f32 = 100.0 / 30.0;
pub const DEFAULT_HISTORY_DISPLAY_COUNT: usize = 5;

/// Root configuration, loaded from `config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtelierConfig {
    /// Namespace for remote collection paths.
    #[serde(default = "default_app_id")]
    pub app_id: String,
    #[serde(default)]
    pub gemini: GeminiSettings,
    #[serde(default)]
    pub generation: GenerationSettings,
    #[serde(default)]
    pub history: HistorySettings,
}

impl Default for AtelierConfig {
    fn default() -> Self {
        Self {
            app_id: default_app_id(),
            gemini: GeminiSettings::default(),
            generation: GenerationSettings::default(),
            history: HistorySettings::default(),
        }
    }
}

impl AtelierConfig {
    /// Rejects values the orchestrator cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.app_id.trim().is_empty() {
            return Err(AtelierError::config("app_id must not be empty"));
        }
        if self.generation.tick_interval_ms == 0 {
            return Err(AtelierError::config(
                "generation.tick_interval_ms must be greater than zero",
            ));
        }
        if !(self.generation.tick_increment > 0.0) {
            return Err(AtelierError::config(
                "generation.tick_increment must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// Generative API endpoint settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeminiSettings {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_text_model")]
    pub text_model: String,
    #[serde(default = "default_image_model")]
    pub image_model: String,
    /// Zero disables the timeout.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            text_model: default_text_model(),
            image_model: default_image_model(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl GeminiSettings {
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }

    /// Copy safe to print: the API key is masked.
    pub fn redacted(&self) -> Self {
        Self {
            api_key: self.api_key.as_ref().map(|_| "********".to_string()),
            ..self.clone()
        }
    }
}

/// Synthetic progress settings for generation tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSettings {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "default_tick_increment")]
    pub tick_increment: f32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            tick_increment: default_tick_increment(),
        }
    }
}

impl GenerationSettings {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistorySettings {
    /// How many of the most recent results are shown.
    #[serde(default = "default_history_display_count")]
    pub display_count: usize,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            display_count: default_history_display_count(),
        }
    }
}

fn default_app_id() -> String {
    DEFAULT_APP_ID.to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_text_model() -> String {
    DEFAULT_TEXT_MODEL.to_string()
}

fn default_image_model() -> String {
    DEFAULT_IMAGE_MODEL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_tick_interval_ms() -> u64 {
    DEFAULT_TICK_INTERVAL_MS
}

fn default_tick_increment() -> f32 {
    DEFAULT_TICK_INCREMENT
}

fn default_history_display_count() -> usize {
    DEFAULT_HISTORY_DISPLAY_COUNT
}
