//! Core error types for alarmdeck-core.
//!
//! Validation errors surface synchronously to the caller of a mutation.
//! Storage and remote errors are diagnostic only: the engine logs them,
//! keeps operating from memory, and retries on the next tick.

use std::path::PathBuf;
use thiserror::Error;

use crate::alarm::AlarmStatus;

/// Core error type for alarmdeck-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Persistence-tier errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Remote service errors
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

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

/// Persistence-tier errors.
///
/// A single failed tier is never fatal; these only escape the store when
/// every tier fails or when the store itself cannot be constructed.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Data directory could not be resolved or created
    #[error("Cannot resolve data directory: {0}")]
    DataDir(String),

    /// A tier's content could not be read
    #[error("Failed to read tier {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A tier's content was not a valid persisted collection
    #[error("Corrupt data in tier {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// No tier accepted the write
    #[error("All persistence tiers failed")]
    NoWritableTier,
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

    /// Unknown or unparseable configuration key/value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Validation errors, rejected at the lifecycle boundary before any
/// mutation reaches the store.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// Alarm title must be non-empty
    #[error("Alarm title must not be empty")]
    EmptyTitle,

    /// Weekly alarms require at least one weekday
    #[error("Weekly recurrence requires a non-empty daysOfWeek set")]
    EmptyDaysOfWeek,

    /// Weekday outside 0-6
    #[error("Invalid day of week {0} (expected 0-6, 0 = Sunday)")]
    InvalidDayOfWeek(u8),

    /// No alarm with the given id
    #[error("No alarm with id '{0}'")]
    UnknownAlarm(String),

    /// Disallowed status transition
    #[error("Cannot transition alarm from {from:?} to {to:?}")]
    InvalidTransition { from: AlarmStatus, to: AlarmStatus },

    /// Completed alarms cannot be edited
    #[error("Alarm '{0}' is completed and cannot be edited")]
    CompletedIsFrozen(String),
}

/// Remote service errors. Never user-facing; logged and retried on the
/// next reconciliation tick.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Remote returned status {0}")]
    Status(u16),

    #[error("Invalid remote URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
