//! Single-request HTTP fetching.
//!
//! A [`Fetcher`] performs exactly one GET per call and always returns a
//! [`FetchResult`]: network-level problems are reported as a
//! [`FetchFailure`] inside the result, never as an error. Retrying is left to
//! the caller.

use crate::error::{Result, ScanError};
use async_trait::async_trait;
use handlescan_core::HttpConfig;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::redirect::Policy;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use thiserror::Error;
use url::Url;

/// Why a fetch produced no usable response.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FetchFailure {
    /// The request did not complete within its timeout
    #[error("request timed out")]
    Timeout,

    /// DNS resolution, TCP connect or TLS handshake failed
    #[error("connection failed: {0}")]
    Connect(String),

    /// The redirect chain was longer than the configured bound
    #[error("too many redirects (limit {limit})")]
    TooManyRedirects {
        /// Configured redirect bound
        limit: usize,
    },

    /// The URL could not be parsed or requested
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Headers arrived but the body could not be read
    #[error("failed to read response body: {0}")]
    Body(String),

    /// Anything else reported by the HTTP stack
    #[error("request failed: {0}")]
    Other(String),
}

impl FetchFailure {
    /// Whether retrying the same request may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout | Self::Connect(_))
    }
}

/// What a single fetch produced: a response or a failure, never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchOutcome {
    /// An HTTP response was received
    Response {
        /// Final HTTP status code
        status: u16,
        /// Body text, lossily decoded as UTF-8
        body: String,
        /// Whether the body was cut at the size limit
        truncated: bool,
    },
    /// No usable response
    Failed(FetchFailure),
}

/// Normalized result of one HTTP attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchResult {
    /// URL the request was sent to
    pub requested_url: String,
    /// URL reached after following redirects (the requested URL on failure)
    pub final_url: String,
    /// Whether at least one redirect was followed
    pub redirected: bool,
    /// Response or failure
    pub outcome: FetchOutcome,
}

impl FetchResult {
    /// Build a result for a received response.
    #[must_use]
    pub fn response(
        requested_url: impl Into<String>,
        final_url: impl Into<String>,
        status: u16,
        body: impl Into<String>,
    ) -> Self {
        let requested_url = requested_url.into();
        let final_url = final_url.into();
        Self {
            redirected: requested_url != final_url,
            requested_url,
            final_url,
            outcome: FetchOutcome::Response {
                status,
                body: body.into(),
                truncated: false,
            },
        }
    }

    /// Build a result for a failed request.
    #[must_use]
    pub fn failed(requested_url: impl Into<String>, failure: FetchFailure) -> Self {
        let requested_url = requested_url.into();
        Self {
            final_url: requested_url.clone(),
            requested_url,
            redirected: false,
            outcome: FetchOutcome::Failed(failure),
        }
    }

    /// HTTP status, if a response was received.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match &self.outcome {
            FetchOutcome::Response { status, .. } => Some(*status),
            FetchOutcome::Failed(_) => None,
        }
    }

    /// Body text, if a response was received.
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        match &self.outcome {
            FetchOutcome::Response { body, .. } => Some(body),
            FetchOutcome::Failed(_) => None,
        }
    }

    /// Failure reason, if no response was received.
    #[must_use]
    pub fn failure(&self) -> Option<&FetchFailure> {
        match &self.outcome {
            FetchOutcome::Failed(failure) => Some(failure),
            FetchOutcome::Response { .. } => None,
        }
    }
}

/// Performs one bounded HTTP GET.
///
/// Implementations must not retry and must not panic on network errors;
/// every problem is reported through [`FetchResult::outcome`].
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch `url`, giving up after `timeout`.
    async fn get(&self, url: &str, timeout: Duration) -> FetchResult;
}

/// Settings for [`HttpFetcher`].
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Identifying user agent; required
    pub user_agent: String,
    /// Redirects followed before giving up with `TooManyRedirects`
    pub max_redirects: usize,
    /// Body bytes kept per response
    pub max_body_bytes: usize,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self::from(&HttpConfig::default())
    }
}

impl From<&HttpConfig> for FetcherConfig {
    fn from(config: &HttpConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_redirects: config.max_redirects,
            max_body_bytes: config.max_body_bytes,
        }
    }
}

/// [`Fetcher`] backed by a shared `reqwest` client.
///
/// The client keeps a connection pool, so one `HttpFetcher` should be shared
/// by all probes of a run.
pub struct HttpFetcher {
    client: Client,
    config: FetcherConfig,
}

impl HttpFetcher {
    /// Build the HTTP client.
    ///
    /// # Errors
    /// Returns error if the user agent is empty or not a valid header value,
    /// the body limit is zero, or the TLS backend fails to initialize.
    pub fn new(config: FetcherConfig) -> Result<Self> {
        if config.user_agent.trim().is_empty() {
            return Err(ScanError::InvalidSettings {
                field: "user_agent",
                reason: "an identifying user agent is required".to_string(),
            });
        }

        if config.max_body_bytes == 0 {
            return Err(ScanError::InvalidSettings {
                field: "max_body_bytes",
                reason: "must be greater than zero".to_string(),
            });
        }

        let user_agent =
            HeaderValue::from_str(&config.user_agent).map_err(|e| ScanError::InvalidSettings {
                field: "user_agent",
                reason: e.to_string(),
            })?;

        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml;q=0.9,*/*;q=0.8"),
        );

        let client = Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .redirect(Policy::limited(config.max_redirects))
            .build()
            .map_err(|e| ScanError::HttpClient(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// The settings this fetcher was built with.
    #[must_use]
    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    fn classify_error(&self, error: &reqwest::Error) -> FetchFailure {
        if error.is_timeout() {
            FetchFailure::Timeout
        } else if error.is_redirect() {
            FetchFailure::TooManyRedirects {
                limit: self.config.max_redirects,
            }
        } else if error.is_connect() {
            FetchFailure::Connect(error_chain(error))
        } else if error.is_builder() {
            FetchFailure::InvalidUrl(error_chain(error))
        } else if error.is_body() || error.is_decode() {
            FetchFailure::Body(error_chain(error))
        } else {
            FetchFailure::Other(error_chain(error))
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get(&self, url: &str, timeout: Duration) -> FetchResult {
        let started = Instant::now();

        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(e) => return FetchResult::failed(url, FetchFailure::InvalidUrl(e.to_string())),
        };

        let response = match self
            .client
            .get(parsed.clone())
            .timeout(timeout)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                let failure = self.classify_error(&e);
                tracing::debug!(url, error = %failure, "fetch failed");
                return FetchResult::failed(url, failure);
            }
        };

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let redirected = response.url() != &parsed;

        let outcome = match read_body(response, self.config.max_body_bytes).await {
            Ok((body, truncated)) => FetchOutcome::Response {
                status,
                body,
                truncated,
            },
            Err(e) => FetchOutcome::Failed(self.classify_error(&e)),
        };

        tracing::debug!(
            url,
            final_url = %final_url,
            status,
            redirected,
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "fetch finished"
        );

        FetchResult {
            requested_url: url.to_string(),
            final_url,
            redirected,
            outcome,
        }
    }
}

/// Read at most `limit` bytes of the body.
async fn read_body(
    mut response: Response,
    limit: usize,
) -> std::result::Result<(String, bool), reqwest::Error> {
    let mut buf: Vec<u8> = Vec::new();
    let mut truncated = false;

    while let Some(chunk) = response.chunk().await? {
        let remaining = limit - buf.len();
        if chunk.len() > remaining {
            buf.extend_from_slice(&chunk[..remaining]);
            truncated = true;
            break;
        }
        buf.extend_from_slice(&chunk);
    }

    Ok((String::from_utf8_lossy(&buf).into_owned(), truncated))
}

/// Error message including its sources, e.g. "error sending request: dns error: ...".
fn error_chain(error: &reqwest::Error) -> String {
    let mut message = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
