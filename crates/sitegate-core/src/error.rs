//! Core error types for sitegate-core.
//!
//! This module defines the error hierarchy using thiserror. Each collaborator
//! of the reconciler (settings store, rule engine, config) has its own enum so
//! callers can tell a failed read apart from a rejected rule batch.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for sitegate-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Settings store errors
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    /// Rule engine errors
    #[error("Rule engine error: {0}")]
    Engine(#[from] EngineError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Settings store errors.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// The store could not be read
    #[error("Failed to read settings from {location}: {message}")]
    ReadFailed { location: String, message: String },

    /// The store could not be written
    #[error("Failed to write settings to {location}: {message}")]
    WriteFailed { location: String, message: String },

    /// Stored content is not a key-value table
    #[error("Failed to parse settings: {0}")]
    Parse(String),

    /// The store did not answer in time
    #[error("Settings store did not respond within {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },
}

/// Rule engine errors.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The engine refused an update batch; nothing from the batch was applied
    #[error("Rule update rejected: {0}")]
    UpdateRejected(String),

    /// The engine could not list its current rules
    #[error("Rule query failed: {0}")]
    QueryFailed(String),

    /// Backing file could not be accessed
    #[error("Rule storage at {path} failed: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
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

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Data directory could not be resolved or created
    #[error("Failed to access data directory: {0}")]
    DataDir(String),
}

/// Validation errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// Hour outside 0-23
    #[error("Invalid hour for '{field}': {value} (expected 0-23)")]
    InvalidHour { field: &'static str, value: i64 },

    /// More destinations than the reserved id range can hold
    #[error("Owner '{owner}' needs {count} rule ids but only {capacity} are reserved")]
    RangeOverflow {
        owner: String,
        count: usize,
        capacity: u32,
    },

    /// Reserved range runs past the largest rule id
    #[error("Owner '{owner}' reserves {count} rule ids from {base}, past the largest rule id")]
    IdSpaceOverflow { owner: String, base: u32, count: u32 },
}

impl From<tokio::time::error::Elapsed> for SettingsError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        SettingsError::Timeout {
            timeout_ms: crate::storage::settings::READ_TIMEOUT.as_millis() as u64,
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
