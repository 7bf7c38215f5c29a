//! Configuration management for handlescan.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration.
///
/// This is loaded from `~/.config/handlescan/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Probe scheduling settings
    pub probe: ProbeConfig,
    /// HTTP client settings
    pub http: HttpConfig,
    /// Platform catalog source
    pub catalog: CatalogConfig,
}

impl AppConfig {
    /// Load configuration from disk, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path, falling back to defaults if
    /// the file does not exist.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if path.exists() {
            Self::read(path)
        } else {
            tracing::debug!("Config file not found at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Load configuration from a path the user named explicitly.
    ///
    /// Unlike [`load_from`](Self::load_from), a missing file is an error.
    pub fn load_existing(path: &Path) -> ConfigResult<Self> {
        if !path.is_file() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        Self::read(path)
    }

    fn read(path: &Path) -> ConfigResult<Self> {
        tracing::debug!("Loading config from {}", path.display());
        let contents = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `HANDLESCAN_CONCURRENCY`: Override the number of concurrent probes
    /// - `HANDLESCAN_TIMEOUT_SECS`: Override the per-request timeout
    /// - `HANDLESCAN_USER_AGENT`: Override the identifying user agent
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from an environment-like lookup.
    ///
    /// Values that fail to parse are ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("HANDLESCAN_CONCURRENCY") {
            if let Ok(concurrency) = val.parse() {
                self.probe.concurrency = concurrency;
                tracing::debug!("Override probe.concurrency from env: {}", concurrency);
            }
        }

        if let Some(val) = lookup("HANDLESCAN_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse() {
                self.probe.timeout_secs = secs;
                tracing::debug!("Override probe.timeout_secs from env: {}", secs);
            }
        }

        if let Some(val) = lookup("HANDLESCAN_USER_AGENT") {
            if !val.trim().is_empty() {
                tracing::debug!("Override http.user_agent from env: {}", val);
                self.http.user_agent = val;
            }
        }
    }

    /// Check value ranges that TOML typing alone cannot express.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.probe.concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                field: "probe.concurrency".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.probe.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "probe.timeout_secs".to_string(),
                reason: "must be at least 1 second".to_string(),
            });
        }
        if self.probe.run_deadline_secs == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "probe.run_deadline_secs".to_string(),
                reason: "must be at least 1 second when set".to_string(),
            });
        }
        if self.http.user_agent.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "http.user_agent".to_string(),
                reason: "an identifying user agent is required".to_string(),
            });
        }
        if self.http.max_body_bytes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "http.max_body_bytes".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/handlescan/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs = ProjectDirs::from("com", "handlescan", "handlescan")
            .ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }
}

/// Probe scheduling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Maximum number of probes in flight at once
    pub concurrency: usize,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Overall deadline for a whole run in seconds (unset = no deadline)
    pub run_deadline_secs: Option<u64>,
    /// Retries for transient network failures (timeouts, refused connections)
    pub max_retries: u32,
    /// Base delay between retries in milliseconds
    pub retry_delay_ms: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            concurrency: 10,
            timeout_secs: 10,
            run_deadline_secs: None,
            max_retries: 1,
            retry_delay_ms: 500,
        }
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Identifying user agent sent with every request
    pub user_agent: String,
    /// Maximum number of redirects followed per request
    pub max_redirects: usize,
    /// Response bodies are truncated beyond this many bytes
    pub max_body_bytes: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: format!(
                "handlescan/{} (+https://github.com/handlescan/handlescan)",
                env!("CARGO_PKG_VERSION")
            ),
            max_redirects: 5,
            max_body_bytes: 2 * 1024 * 1024,
        }
    }
}

/// Platform catalog source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Path to a platforms TOML file; the built-in catalog is used when unset
    pub path: Option<PathBuf>,
}
