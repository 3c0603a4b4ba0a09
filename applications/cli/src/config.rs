/// Host configuration
use crate::error::{CliError, Result};
use cadence_playback::PlayerConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file, read from the working directory if present
pub const DEFAULT_CONFIG_FILE: &str = "cadence.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct HostConfig {
    #[serde(default)]
    pub player: PlayerConfig,

    #[serde(default)]
    pub storage: StorageSettings,

    #[serde(default)]
    pub engine: EngineSettings,

    #[serde(default)]
    pub session: SessionSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageSettings {
    #[serde(default = "default_session_file")]
    pub session_file: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineSettings {
    /// Interval between position reports
    #[serde(default = "default_tick_millis")]
    pub tick_millis: u64,

    /// Length of every simulated track
    #[serde(default = "default_track_millis")]
    pub track_millis: u64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SessionSettings {
    /// Signed-in user; likes are disabled without one
    #[serde(default)]
    pub user_id: Option<String>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            session_file: default_session_file(),
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            tick_millis: default_tick_millis(),
            track_millis: default_track_millis(),
        }
    }
}

impl HostConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist; otherwise `cadence.toml` is used when
    /// present. Environment variables such as `CADENCE_PLAYER__MAX_RATE`
    /// override file values.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path.to_path_buf()));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        // Double underscore separates sections so keys keep their underscores
        settings = settings.add_source(
            config::Environment::with_prefix("CADENCE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| CliError::Config(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !self.player.max_rate.is_finite() || self.player.max_rate <= 0.0 {
            return Err(CliError::Config(format!(
                "player.max_rate must be positive, got {}",
                self.player.max_rate
            )));
        }

        if self.engine.tick_millis == 0 {
            return Err(CliError::Config(
                "engine.tick_millis must be at least 1".to_string(),
            ));
        }

        if self.engine.track_millis == 0 {
            return Err(CliError::Config(
                "engine.track_millis must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

fn default_session_file() -> PathBuf {
    PathBuf::from("./data/session.json")
}

fn default_tick_millis() -> u64 {
    250
}

fn default_track_millis() -> u64 {
    30_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = HostConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.engine.tick_millis, 250);
        assert_eq!(config.player.max_rate, 4.0);
        assert_eq!(config.session.user_id, None);
    }

    #[test]
    fn rejects_zero_tick() {
        let mut config = HostConfig::default();
        config.engine.tick_millis = 0;
        assert!(matches!(config.validate(), Err(CliError::Config(_))));
    }

    #[test]
    fn rejects_non_positive_max_rate() {
        let mut config = HostConfig::default();
        config.player.max_rate = 0.0;
        assert!(config.validate().is_err());
    }
}
