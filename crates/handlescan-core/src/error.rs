//! Core error types for handlescan.
//!
//! This module defines the error types shared by every crate in the
//! workspace. Subsystem crates define their own error enums and wrap these
//! where a core type (an ID, a config value) failed validation.

use std::path::PathBuf;
use thiserror::Error;

/// Central error type for core operations.
#[derive(Error, Debug)]
pub enum HandlescanError {
    /// Validation errors (invalid input, constraints)
    #[error("validation error: {0}")]
    Validation(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to determine config directory path
    #[error("could not determine config directory (XDG base directories not available)")]
    NoConfigDir,

    /// An explicitly requested config file does not exist
    #[error("config file not found at {}", path.display())]
    NotFound {
        /// Path that was requested
        path: PathBuf,
    },

    /// Failed to parse TOML
    #[error("failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// I/O error reading config
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration value
    #[error("invalid config value for {field}: {reason}")]
    InvalidValue {
        /// Field name
        field: String,
        /// Reason for invalidity
        reason: String,
    },
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
