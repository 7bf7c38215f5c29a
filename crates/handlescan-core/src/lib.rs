//! Handlescan Core - Foundation crate for the handlescan username prober.
//!
//! This crate provides shared types, error handling and configuration
//! management that the catalog, scanner and CLI crates depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths and env overrides
//! - [`types`] - Shared newtypes (`PlatformId`, `RunId`, `Timestamp`)
//!
//! # Example
//!
//! ```rust
//! use handlescan_core::{AppConfig, PlatformId};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::default();
//! assert_eq!(config.probe.concurrency, 10);
//!
//! let id = PlatformId::new("github")?;
//! assert_eq!(id.as_str(), "github");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{AppConfig, CatalogConfig, HttpConfig, ProbeConfig};
pub use error::{ConfigError, ConfigResult, HandlescanError};
pub use types::{PlatformId, RunId, Timestamp};
