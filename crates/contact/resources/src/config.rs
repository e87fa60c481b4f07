//! Tracker configuration.
//!
//! Every field has a default so an empty or missing file yields a working
//! configuration.

use crate::error::{TrackerError, TrackerResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main tracker configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Deferred refresh configuration
    #[serde(default)]
    pub refresh: RefreshConfig,

    /// Update event channel configuration
    #[serde(default)]
    pub events: EventConfig,

    /// Per-contact view configuration
    #[serde(default)]
    pub views: ViewConfig,

    /// How interaction updates older than the stored value are treated
    #[serde(default)]
    pub interaction_policy: InteractionPolicy,
}

/// Deferred refresh configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Delay between view activation and the outbound version queries
    #[serde(default = "default_refresh_delay_ms")]
    pub delay_ms: u64,

    /// Issue outbound queries on activation at all
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl RefreshConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            delay_ms: default_refresh_delay_ms(),
            enabled: true,
        }
    }
}

/// Update event channel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventConfig {
    /// Capacity of the broadcast channel shared by all views
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

/// Per-contact view configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Capacity of each view's command queue
    #[serde(default = "default_command_capacity")]
    pub command_capacity: usize,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            command_capacity: default_command_capacity(),
        }
    }
}

/// Policy for interaction updates carrying an older timestamp
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionPolicy {
    /// Interaction updates older than the stored timestamp are rejected.
    ///
    /// Version updates still replace the whole record, timestamp included.
    #[default]
    Monotonic,

    /// Apply every update in delivery order
    LastWriteWins,
}

fn default_refresh_delay_ms() -> u64 {
    1000
}

fn default_true() -> bool {
    true
}

fn default_channel_capacity() -> usize {
    1024
}

fn default_command_capacity() -> usize {
    64
}

impl TrackerConfig {
    /// Load configuration from a TOML file; a missing file yields defaults.
    pub fn load(path: Option<&str>) -> TrackerResult<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let path = Path::new(path);
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(contents: &str) -> TrackerResult<Self> {
        let config: TrackerConfig =
            toml::from_str(contents).map_err(|e| TrackerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> TrackerResult<()> {
        if self.events.channel_capacity == 0 {
            return Err(TrackerError::Config(
                "events.channel_capacity must be > 0".to_string(),
            ));
        }
        if self.views.command_capacity == 0 {
            return Err(TrackerError::Config(
                "views.command_capacity must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = TrackerConfig::default();
        assert_eq!(config.refresh.delay(), Duration::from_secs(1));
        assert!(config.refresh.enabled);
        assert_eq!(config.events.channel_capacity, 1024);
        assert_eq!(config.interaction_policy, InteractionPolicy::Monotonic);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = TrackerConfig::from_toml_str(
            r#"
            interaction_policy = "last_write_wins"

            [refresh]
            delay_ms = 250
            "#,
        )
        .unwrap();

        assert_eq!(config.refresh.delay(), Duration::from_millis(250));
        assert!(config.refresh.enabled);
        assert_eq!(config.views.command_capacity, 64);
        assert_eq!(config.interaction_policy, InteractionPolicy::LastWriteWins);
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        let result = TrackerConfig::from_toml_str("[events]\nchannel_capacity = 0\n");
        assert!(matches!(result, Err(TrackerError::Config(_))));
    }

    #[test]
    fn test_load_missing_config() {
        let config = TrackerConfig::load(Some("/nonexistent/path/tracker.toml")).unwrap();
        assert_eq!(config.refresh.delay_ms, 1000);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[refresh]\nenabled = false").unwrap();

        let config = TrackerConfig::load(file.path().to_str()).unwrap();
        assert!(!config.refresh.enabled);
    }
}
