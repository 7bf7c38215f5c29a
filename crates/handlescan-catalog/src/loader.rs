//! Platform catalog loading from TOML files.
//!
//! A catalog file holds a `[[platforms]]` array. The order of the entries in
//! the file is the catalog order used for reports.

use crate::{
    catalog::PlatformCatalog,
    definition::PlatformDescriptor,
    error::{CatalogError, Result},
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Built-in platform list shipped with the crate.
pub(crate) const BUILTIN_CATALOG: &str = include_str!("../platforms.toml");

/// On-disk layout of a catalog document.
#[derive(Debug, Deserialize)]
struct CatalogDocument {
    #[serde(default)]
    platforms: Vec<PlatformDescriptor>,
}

/// Loader for platform catalogs from TOML files.
pub struct CatalogLoader {
    /// Path of the catalog file
    path: PathBuf,
}

impl CatalogLoader {
    /// Create a new loader for the given catalog file.
    ///
    /// # Errors
    /// Returns error if the file doesn't exist.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if !path.is_file() {
            return Err(CatalogError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        Ok(Self { path })
    }

    /// Path of the catalog file this loader reads.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load and validate the catalog.
    ///
    /// # Errors
    /// Returns error if the file can't be read, isn't valid TOML, or any entry
    /// fails validation.
    pub fn load(&self) -> Result<PlatformCatalog> {
        let contents = std::fs::read_to_string(&self.path).map_err(|e| CatalogError::LoadError {
            path: self.path.display().to_string(),
            source: Box::new(e),
        })?;

        let catalog = Self::parse_str(&contents, &self.path.display().to_string())?;

        info!(
            count = catalog.len(),
            path = %self.path.display(),
            "loaded platform catalog"
        );

        Ok(catalog)
    }

    /// Parse and validate a catalog document.
    ///
    /// `origin` names the document in error messages.
    pub fn parse_str(contents: &str, origin: &str) -> Result<PlatformCatalog> {
        let document: CatalogDocument =
            toml::from_str(contents).map_err(|e| CatalogError::ParseError {
                path: origin.to_string(),
                source: e,
            })?;

        debug!(
            origin,
            entries = document.platforms.len(),
            "parsed platform catalog document"
        );

        PlatformCatalog::new(document.platforms)
    }
}
