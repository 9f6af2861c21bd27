use std::time::Duration;

use atelier_core::config::AtelierConfig;

/// Runtime knobs of [`super::GenerationOrchestrator`].
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorSettings {
    /// Cadence of the synthetic progress ticker.
    pub tick_interval: Duration,
    /// Progress added per tick.
    pub tick_increment: f32,
    /// Upper bound on one endpoint request; `None` waits indefinitely.
    pub request_timeout: Option<Duration>,
    /// How many history entries [`super::GenerationOrchestrator::recent_history`] returns.
    pub history_display_count: usize,
}

impl OrchestratorSettings {
    pub fn from_config(config: &AtelierConfig) -> Self {
        Self {
            tick_interval: config.generation.tick_interval(),
            tick_increment: config.generation.tick_increment,
            request_timeout: config.gemini.request_timeout(),
            history_display_count: config.history.display_count,
        }
    }
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self::from_config(&AtelierConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_follow_config_defaults() {
        let settings = OrchestratorSettings::default();

        assert_eq!(settings.tick_interval, Duration::from_millis(100));
        assert_eq!(settings.request_timeout, Some(Duration::from_secs(60)));
        assert_eq!(settings.history_display_count, 5);
        // 30 ticks sweep the bar
        assert!((settings.tick_increment * 30.0 - 100.0).abs() < 1e-3);
    }

    #[test]
    fn test_zero_timeout_disables_it() {
        let mut config = AtelierConfig::default();
        config.gemini.request_timeout_secs = 0;

        assert_eq!(OrchestratorSettings::from_config(&config).request_timeout, None);
    }
}
