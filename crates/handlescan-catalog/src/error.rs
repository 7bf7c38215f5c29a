//! Error types for the platform catalog.

use thiserror::Error;

/// Errors that can occur while loading or querying the platform catalog.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Platform not present in the catalog
    #[error("platform not found in catalog: {platform_id}")]
    NotFound {
        /// The platform ID that was not found
        platform_id: String,
    },

    /// Catalog file does not exist
    #[error("platform catalog file not found at {path}")]
    FileNotFound {
        /// Expected file path
        path: String,
    },

    /// Failed to read the catalog file
    #[error("failed to load platform catalog from {path}: {source}")]
    LoadError {
        /// Path to the catalog file
        path: String,
        /// Underlying error
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Failed to parse catalog TOML
    #[error("failed to parse platform catalog TOML in {path}: {source}")]
    ParseError {
        /// Path (or other origin) of the catalog document
        path: String,
        /// TOML parse error
        #[source]
        source: toml::de::Error,
    },

    /// A platform descriptor failed validation
    #[error("invalid platform definition for {platform_id}: {reason}")]
    ValidationError {
        /// Platform ID being validated
        platform_id: String,
        /// Reason for validation failure
        reason: String,
    },

    /// Two descriptors share an ID or a name
    #[error("duplicate platform {field} in catalog: {value}")]
    Duplicate {
        /// Which field collided (`id` or `name`)
        field: &'static str,
        /// The colliding value
        value: String,
    },

    /// The catalog has no platforms
    #[error("platform catalog is empty")]
    Empty,
}

/// Result type for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;
