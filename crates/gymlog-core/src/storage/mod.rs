mod config;
pub mod database;

pub use config::{Config, TrackerConfig};
pub use database::{Database, PresenceSample};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/gymlog[-dev]/` based on GYMLOG_ENV.
///
/// Set GYMLOG_ENV=dev to use a development data directory.
///
/// # Errors
/// Returns an error if the config directory cannot be created.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("GYMLOG_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("gymlog-dev")
    } else {
        base_dir.join("gymlog")
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::LoadFailed {
        path: dir.clone(),
        message: e.to_string(),
    })?;
    Ok(dir)
}
