//! Platform descriptor types.
//!
//! This module defines the data structures for platform definitions loaded
//! from TOML catalogs.

use crate::error::{CatalogError, Result};
use handlescan_core::PlatformId;
use serde::{Deserialize, Serialize};

/// Placeholder substituted with the (encoded) username in URL templates.
pub const USERNAME_SLOT: &str = "{username}";

/// Status codes treated as "profile exists" when a descriptor sets none.
pub const DEFAULT_EXPECTED_STATUS: &[u16] = &[200];

/// Status codes treated as "profile does not exist" when a descriptor sets none.
pub const DEFAULT_NOT_FOUND_STATUS: &[u16] = &[404, 410];

/// A single platform a username can be probed against.
///
/// Descriptors are immutable once a [`PlatformCatalog`](crate::PlatformCatalog)
/// has been built from them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformDescriptor {
    /// Unique platform identifier (e.g., "github", "`stack_overflow`")
    pub id: PlatformId,

    /// Human-readable platform name, unique within a catalog
    pub name: String,

    /// Profile URL with a single `{username}` slot
    pub url_template: String,

    /// Platform category
    #[serde(default)]
    pub category: PlatformCategory,

    /// Literal, case-sensitive body substrings that mark a "not found" page
    /// even when the platform answers 200
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub not_found_markers: Vec<String>,

    /// Substrings of the final URL that mark a redirect to a login wall or
    /// error page
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub not_found_url_markers: Vec<String>,

    /// Status codes meaning the profile exists (default `{200}`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_status: Option<Vec<u16>>,

    /// Status codes meaning the profile does not exist (default `{404, 410}`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_found_status: Option<Vec<u16>>,
}

impl PlatformDescriptor {
    /// Create a descriptor with default heuristics and no markers.
    #[must_use]
    pub fn new(id: PlatformId, name: impl Into<String>, url_template: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            url_template: url_template.into(),
            category: PlatformCategory::default(),
            not_found_markers: Vec::new(),
            not_found_url_markers: Vec::new(),
            expected_status: None,
            not_found_status: None,
        }
    }

    /// Set the platform category.
    #[must_use]
    pub fn with_category(mut self, category: PlatformCategory) -> Self {
        self.category = category;
        self
    }

    /// Set the body markers that identify a "not found" page.
    #[must_use]
    pub fn with_not_found_markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.not_found_markers = markers.into_iter().map(Into::into).collect();
        self
    }

    /// Set the final-URL markers that identify a login wall or error redirect.
    #[must_use]
    pub fn with_not_found_url_markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.not_found_url_markers = markers.into_iter().map(Into::into).collect();
        self
    }

    /// Set the status codes meaning "exists".
    #[must_use]
    pub fn with_expected_status(mut self, codes: impl Into<Vec<u16>>) -> Self {
        self.expected_status = Some(codes.into());
        self
    }

    /// Set the status codes meaning "does not exist".
    #[must_use]
    pub fn with_not_found_status(mut self, codes: impl Into<Vec<u16>>) -> Self {
        self.not_found_status = Some(codes.into());
        self
    }

    /// Get the platform ID.
    #[must_use]
    pub fn id(&self) -> &PlatformId {
        &self.id
    }

    /// Get the platform name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Status codes meaning "exists", with the default applied.
    #[must_use]
    pub fn expected_status(&self) -> &[u16] {
        self.expected_status
            .as_deref()
            .unwrap_or(DEFAULT_EXPECTED_STATUS)
    }

    /// Status codes meaning "does not exist", with the default applied.
    #[must_use]
    pub fn not_found_status(&self) -> &[u16] {
        self.not_found_status
            .as_deref()
            .unwrap_or(DEFAULT_NOT_FOUND_STATUS)
    }

    /// Validate the descriptor for completeness and correctness.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(self.invalid("platform name cannot be empty"));
        }

        if self.url_template.trim().is_empty() {
            return Err(self.invalid("URL template cannot be empty"));
        }

        let slots = self.url_template.matches(USERNAME_SLOT).count();
        if slots != 1 {
            return Err(self.invalid(format!(
                "URL template must contain exactly one {USERNAME_SLOT} slot, found {slots}"
            )));
        }

        if !(self.url_template.starts_with("http://") || self.url_template.starts_with("https://"))
        {
            return Err(self.invalid("URL template must be an http(s) URL"));
        }

        if self.not_found_markers.iter().any(|m| m.is_empty()) {
            return Err(self.invalid("not_found_markers cannot contain empty strings"));
        }

        if self.not_found_url_markers.iter().any(|m| m.is_empty()) {
            return Err(self.invalid("not_found_url_markers cannot contain empty strings"));
        }

        self.validate_status_set("expected_status", self.expected_status.as_deref())?;
        self.validate_status_set("not_found_status", self.not_found_status.as_deref())?;

        if let Some(code) = self
            .expected_status()
            .iter()
            .find(|code| self.not_found_status().contains(code))
        {
            return Err(self.invalid(format!(
                "status {code} is listed as both expected and not-found"
            )));
        }

        Ok(())
    }

    fn validate_status_set(&self, field: &str, codes: Option<&[u16]>) -> Result<()> {
        let Some(codes) = codes else {
            return Ok(());
        };

        if codes.is_empty() {
            return Err(self.invalid(format!("{field} cannot be an empty set when given")));
        }

        if let Some(code) = codes.iter().find(|code| !(100..=599).contains(*code)) {
            return Err(self.invalid(format!("{field} contains invalid HTTP status {code}")));
        }

        Ok(())
    }

    fn invalid(&self, reason: impl Into<String>) -> CatalogError {
        CatalogError::ValidationError {
            platform_id: self.id.to_string(),
            reason: reason.into(),
        }
    }
}

/// Categories of platforms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlatformCategory {
    /// General social networks (Twitter / X, Facebook, Instagram)
    Social,
    /// Developer communities (GitHub, `StackOverflow`)
    Developer,
    /// Professional networks (`LinkedIn`)
    Professional,
    /// Media and publishing (YouTube, Medium, `TikTok`)
    Media,
    /// Other/uncategorized
    #[default]
    Other,
}

impl PlatformCategory {
    /// Get a human-readable display name.
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Social => "Social",
            Self::Developer => "Developer",
            Self::Professional => "Professional",
            Self::Media => "Media",
            Self::Other => "Other",
        }
    }
}

impl std::str::FromStr for PlatformCategory {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "social" => Ok(Self::Social),
            "developer" => Ok(Self::Developer),
            "professional" => Ok(Self::Professional),
            "media" => Ok(Self::Media),
            "other" => Ok(Self::Other),
            other => Err(format!("unknown platform category: {other}")),
        }
    }
}
