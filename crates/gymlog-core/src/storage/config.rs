//! TOML-based application configuration.
//!
//! Holds the settings the host scheduler needs to run the sampler: the tick
//! interval and the text of the persistent tracking notification. The gym
//! itself (location, routines, payment date) lives in SQLite, not here.
//!
//! Configuration is stored at `~/.config/gymlog/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::error::ConfigError;

/// Sampler scheduling configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Minutes between scheduled ticks.
    #[serde(default = "default_interval_min")]
    pub interval_min: u32,
    #[serde(default = "default_notification_title")]
    pub notification_title: String,
    #[serde(default = "default_notification_body")]
    pub notification_body: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/gymlog/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub tracker: TrackerConfig,
}

fn default_interval_min() -> u32 {
    60
}
fn default_notification_title() -> String {
    "Gym tracker".into()
}
fn default_notification_body() -> String {
    "Your location is being sampled to record gym visits.".into()
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            interval_min: default_interval_min(),
            notification_title: default_notification_title(),
            notification_body: default_notification_body(),
        }
    }
}

impl Config {
    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or write and return the default.
    ///
    /// # Errors
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                toml::from_str(&content).map_err(|e| ConfigError::ParseFailed(e.to_string()))
            }
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    /// Returns an error if the config cannot be serialized or written.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })
    }

    /// Load from disk, returning default on error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}
