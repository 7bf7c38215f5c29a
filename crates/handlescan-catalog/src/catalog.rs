//! Ordered, validated platform catalog.

use crate::{
    definition::{PlatformCategory, PlatformDescriptor},
    error::{CatalogError, Result},
    loader::{CatalogLoader, BUILTIN_CATALOG},
};
use handlescan_core::PlatformId;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Immutable list of platform descriptors in catalog order.
///
/// The catalog is validated once at construction: every descriptor must be
/// valid on its own and IDs and names must be unique. Iteration order is the
/// order the descriptors were supplied in and never changes.
#[derive(Debug, Clone)]
pub struct PlatformCatalog {
    /// Descriptors in catalog order
    platforms: Vec<PlatformDescriptor>,
    /// Position of each descriptor, indexed by platform ID
    positions: HashMap<PlatformId, usize>,
}

impl PlatformCatalog {
    /// Build a catalog from descriptors, validating all of them.
    ///
    /// # Errors
    /// Returns error if the list is empty, any descriptor is invalid, or an
    /// ID or name appears twice.
    pub fn new(platforms: Vec<PlatformDescriptor>) -> Result<Self> {
        if platforms.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut positions = HashMap::with_capacity(platforms.len());
        let mut names = HashSet::with_capacity(platforms.len());

        for (index, platform) in platforms.iter().enumerate() {
            platform.validate()?;

            if positions.insert(platform.id.clone(), index).is_some() {
                return Err(CatalogError::Duplicate {
                    field: "id",
                    value: platform.id.to_string(),
                });
            }

            if !names.insert(platform.name.as_str()) {
                return Err(CatalogError::Duplicate {
                    field: "name",
                    value: platform.name.clone(),
                });
            }
        }

        debug!(count = platforms.len(), "built platform catalog");

        Ok(Self {
            platforms,
            positions,
        })
    }

    /// The catalog shipped with handlescan.
    pub fn builtin() -> Result<Self> {
        CatalogLoader::parse_str(BUILTIN_CATALOG, "builtin platforms.toml")
    }

    /// All descriptors in catalog order.
    #[must_use]
    pub fn list(&self) -> &[PlatformDescriptor] {
        &self.platforms
    }

    /// Iterate descriptors in catalog order.
    pub fn iter(&self) -> std::slice::Iter<'_, PlatformDescriptor> {
        self.platforms.iter()
    }

    /// Get a descriptor by ID.
    ///
    /// # Errors
    /// Returns error if the platform is not in the catalog.
    pub fn get(&self, platform_id: &PlatformId) -> Result<&PlatformDescriptor> {
        self.position(platform_id)
            .map(|index| &self.platforms[index])
            .ok_or_else(|| CatalogError::NotFound {
                platform_id: platform_id.to_string(),
            })
    }

    /// Catalog position of a platform.
    #[must_use]
    pub fn position(&self, platform_id: &PlatformId) -> Option<usize> {
        self.positions.get(platform_id).copied()
    }

    /// Check if a platform exists in the catalog.
    #[must_use]
    pub fn contains(&self, platform_id: &PlatformId) -> bool {
        self.positions.contains_key(platform_id)
    }

    /// Number of platforms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.platforms.len()
    }

    /// Whether the catalog is empty. Always false for a constructed catalog.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.platforms.is_empty()
    }

    /// All platform IDs in catalog order.
    #[must_use]
    pub fn ids(&self) -> Vec<PlatformId> {
        self.platforms.iter().map(|p| p.id.clone()).collect()
    }

    /// Platform count by category.
    #[must_use]
    pub fn count_by_category(&self) -> HashMap<PlatformCategory, usize> {
        let mut counts: HashMap<PlatformCategory, usize> = HashMap::new();

        for platform in &self.platforms {
            *counts.entry(platform.category).or_insert(0) += 1;
        }

        counts
    }
}

impl<'a> IntoIterator for &'a PlatformCatalog {
    type Item = &'a PlatformDescriptor;
    type IntoIter = std::slice::Iter<'a, PlatformDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
