//! Core error types for gymlog-core.
//!
//! This module defines the error hierarchy using thiserror. Transient
//! location failures and persistence failures are separate enums because
//! they follow different propagation policies: the sampler swallows the
//! former at its tick boundary, while the latter reach UI-level callers.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for gymlog-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Application configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Location and geofence errors
    #[error("Location error: {0}")]
    Location(#[from] LocationError),

    /// No gym has been configured yet. Ticks treat this as a no-op;
    /// starting tracking treats it as a hard precondition.
    #[error("no gym configured")]
    GymNotConfigured,

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Location and geofence errors.
///
/// `PermissionDenied` is surfaced when the user tries to start tracking.
/// The transient variants abort a single tick and are retried on the next
/// scheduled tick, never surfaced past the sampler boundary.
#[derive(Error, Debug)]
pub enum LocationError {
    /// Location permission refused by the user or the platform
    #[error("location permission denied")]
    PermissionDenied,

    /// No position fix could be obtained
    #[error("position unavailable: {0}")]
    PositionUnavailable(String),

    /// Distance to the gym could not be computed
    #[error("distance computation failed: {0}")]
    DistanceFailed(String),
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
