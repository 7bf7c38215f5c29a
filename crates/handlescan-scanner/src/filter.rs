#![allow(clippy::must_use_candidate)]

use handlescan_catalog::{PlatformCategory, PlatformDescriptor};
use handlescan_core::PlatformId;
use serde::{Deserialize, Serialize};

/// Selects which catalog entries a run probes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PlatformFilter {
    /// Every platform in the catalog
    #[default]
    All,
    /// Platforms in one category
    Category(PlatformCategory),
    /// Platforms whose id is listed
    Specific(Vec<PlatformId>),
}

impl PlatformFilter {
    /// Whether a platform is selected.
    pub fn matches(&self, platform: &PlatformDescriptor) -> bool {
        match self {
            PlatformFilter::All => true,
            PlatformFilter::Category(category) => platform.category == *category,
            PlatformFilter::Specific(ids) => ids.contains(&platform.id),
        }
    }
}
