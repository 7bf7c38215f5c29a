//! Handlescan Catalog - Platform definitions for username probing.
//!
//! This crate provides the types and loading logic for the platform catalog:
//! the ordered list of sites a username is probed against, each with a
//! profile URL template and the parameters the existence heuristics use.
//!
//! # Architecture
//!
//! - **Definition Types** ([`definition`]): Strongly-typed platform descriptors
//! - **Loader** ([`loader`]): TOML catalog file loading
//! - **Catalog** ([`catalog`]): Validated, ordered, immutable catalog with lookups
//! - **Errors** ([`error`]): Catalog-specific error types
//!
//! A catalog is validated once, when it is built. Any invalid entry rejects
//! the whole catalog so that configuration mistakes surface at startup rather
//! than as per-probe failures.
//!
//! # Example
//!
//! ```rust
//! use handlescan_catalog::PlatformCatalog;
//! use handlescan_core::PlatformId;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let catalog = PlatformCatalog::builtin()?;
//!
//! let github = catalog.get(&PlatformId::new("github")?)?;
//! println!("{} -> {}", github.name(), github.url_template);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod catalog;
pub mod definition;
pub mod error;
pub mod loader;

// Re-export commonly used types
pub use catalog::PlatformCatalog;
pub use definition::{PlatformCategory, PlatformDescriptor, USERNAME_SLOT};
pub use error::{CatalogError, Result};
pub use loader::CatalogLoader;
