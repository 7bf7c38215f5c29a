//! Probe orchestrator for checking one username across a catalog.
//!
//! This module provides the [`ProbeOrchestrator`], which resolves one profile
//! URL per platform, fetches them under a concurrency cap with retry of
//! transient failures, classifies every response and assembles a
//! [`ProbeReport`] in catalog order.

use crate::classifier::{decide, Verdict};
use crate::error::{Result, ScanError};
use crate::fetcher::{FetchFailure, FetchResult, Fetcher};
use crate::filter::PlatformFilter;
use crate::metadata::extract_with_base;
use crate::report::{ProbeOutcome, ProbeReport, RunCompletion};
use crate::url_builder::{build_profile_url, normalize_username};
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use handlescan_catalog::{PlatformCatalog, PlatformDescriptor};
use handlescan_core::{ProbeConfig, RunId, Timestamp};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Default number of probes in flight.
pub const DEFAULT_CONCURRENCY_LIMIT: usize = 10;

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Default number of retries for transient failures.
pub const DEFAULT_MAX_RETRIES: u32 = 1;

/// Default base delay between retries; attempt `n` waits `n` times this.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Tuning for a probe run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeSettings {
    /// Maximum probes in flight at once
    pub concurrency_limit: usize,
    /// Timeout for each HTTP attempt
    pub request_timeout: Duration,
    /// Overall bound on the run, if any
    pub run_deadline: Option<Duration>,
    /// Retries after a transient failure
    pub max_retries: u32,
    /// Base delay for linear retry backoff
    pub retry_delay: Duration,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            concurrency_limit: DEFAULT_CONCURRENCY_LIMIT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            run_deadline: None,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl From<&ProbeConfig> for ProbeSettings {
    fn from(config: &ProbeConfig) -> Self {
        Self {
            concurrency_limit: config.concurrency,
            request_timeout: Duration::from_secs(config.timeout_secs),
            run_deadline: config.run_deadline_secs.map(Duration::from_secs),
            max_retries: config.max_retries,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        }
    }
}

impl ProbeSettings {
    /// Check the settings can drive a run.
    pub fn validate(&self) -> Result<()> {
        if self.concurrency_limit == 0 {
            return Err(invalid("concurrency_limit", "must be at least 1"));
        }
        if self.request_timeout.is_zero() {
            return Err(invalid("request_timeout", "must be greater than zero"));
        }
        if self.run_deadline.is_some_and(|deadline| deadline.is_zero()) {
            return Err(invalid("run_deadline", "must be greater than zero when set"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> ScanError {
    ScanError::InvalidSettings {
        field,
        reason: reason.to_string(),
    }
}

/// One unit of work: a platform and its resolved profile URL.
struct ProbeRequest<'a> {
    platform: &'a PlatformDescriptor,
    url: String,
}

/// Orchestrates probing a username across platforms.
pub struct ProbeOrchestrator {
    /// Fetcher shared by every probe
    fetcher: Arc<dyn Fetcher>,
    settings: ProbeSettings,
    filter: PlatformFilter,
}

impl ProbeOrchestrator {
    /// Create a new orchestrator, rejecting invalid settings.
    pub fn new(fetcher: Arc<dyn Fetcher>, settings: ProbeSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            fetcher,
            settings,
            filter: PlatformFilter::All,
        })
    }

    /// Restrict runs to the platforms a filter selects.
    #[must_use]
    pub fn with_filter(mut self, filter: PlatformFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Settings in use.
    #[must_use]
    pub fn settings(&self) -> &ProbeSettings {
        &self.settings
    }

    /// Probe `username` on every selected platform of `catalog`.
    ///
    /// The username is validated before any request is made. Individual
    /// platform failures never fail the run; they show up as `Uncertain`
    /// outcomes. When `cancel` fires or the run deadline passes, finished
    /// outcomes are kept and unfinished platforms are reported as cancelled.
    pub async fn run(
        &self,
        username: &str,
        catalog: &PlatformCatalog,
        cancel: CancellationToken,
    ) -> Result<ProbeReport> {
        let username = normalize_username(username)?;
        let run_id = RunId::generate();
        let started_at = Timestamp::now();
        let clock = Instant::now();

        let requests: Vec<ProbeRequest<'_>> = catalog
            .iter()
            .filter(|platform| self.filter.matches(platform))
            .map(|platform| ProbeRequest {
                platform,
                url: build_profile_url(platform, &username),
            })
            .collect();

        tracing::info!(
            %run_id,
            username = %username,
            platforms = requests.len(),
            concurrency = self.settings.concurrency_limit,
            "Starting probe run"
        );

        let mut slots: Vec<Option<ProbeOutcome>> = (0..requests.len()).map(|_| None).collect();
        let completion = self.drive(&requests, &mut slots, &cancel).await;

        let outcomes: Vec<ProbeOutcome> = requests
            .iter()
            .zip(slots)
            .map(|(request, slot)| {
                slot.unwrap_or_else(|| {
                    ProbeOutcome::cancelled(
                        request.platform.id.clone(),
                        request.platform.name.clone(),
                        request.url.clone(),
                    )
                })
            })
            .collect();

        let report = ProbeReport {
            run_id,
            username,
            started_at,
            elapsed: clock.elapsed(),
            completion,
            outcomes,
        };

        let summary = report.summary();
        tracing::info!(
            %run_id,
            ?completion,
            found = summary.found,
            not_found = summary.not_found,
            uncertain = summary.uncertain,
            elapsed_ms = u64::try_from(report.elapsed.as_millis()).unwrap_or(u64::MAX),
            "Probe run finished"
        );

        Ok(report)
    }

    /// Run every request through the bounded pool, filling `slots` by index.
    async fn drive(
        &self,
        requests: &[ProbeRequest<'_>],
        slots: &mut [Option<ProbeOutcome>],
        cancel: &CancellationToken,
    ) -> RunCompletion {
        // A limit past the end of the clock never fires.
        let deadline = self
            .settings
            .run_deadline
            .and_then(|limit| Instant::now().checked_add(limit));
        let deadline_reached = async move {
            match deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(deadline_reached);

        let mut in_flight = FuturesUnordered::new();
        let mut next = 0;

        loop {
            while in_flight.len() < self.settings.concurrency_limit
                && next < requests.len()
                && !cancel.is_cancelled()
            {
                let index = next;
                in_flight.push(
                    self.probe_isolated(&requests[index], cancel)
                        .map(move |outcome| (index, outcome)),
                );
                next += 1;
            }

            if in_flight.is_empty() {
                return if next >= requests.len() {
                    RunCompletion::Complete
                } else {
                    RunCompletion::Cancelled
                };
            }

            let unfinished = in_flight.len() + requests.len() - next;
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    tracing::warn!(unfinished, "Probe run cancelled");
                    return RunCompletion::Cancelled;
                }
                () = &mut deadline_reached => {
                    tracing::warn!(unfinished, "Probe run deadline exceeded");
                    return RunCompletion::DeadlineExceeded;
                }
                Some((index, outcome)) = in_flight.next() => {
                    slots[index] = Some(outcome);
                }
            }
        }
    }

    /// Probe one platform, turning a panic into an `Uncertain` outcome.
    async fn probe_isolated(
        &self,
        request: &ProbeRequest<'_>,
        cancel: &CancellationToken,
    ) -> ProbeOutcome {
        let started = Instant::now();
        match AssertUnwindSafe(self.probe(request, cancel))
            .catch_unwind()
            .await
        {
            Ok(outcome) => outcome,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::error!(
                    platform = %request.platform.id,
                    %message,
                    "Probe panicked"
                );
                ProbeOutcome {
                    platform_id: request.platform.id.clone(),
                    platform_name: request.platform.name.clone(),
                    url: request.url.clone(),
                    verdict: Verdict::internal(message),
                    metadata: None,
                    attempts: 1,
                    elapsed: started.elapsed(),
                }
            }
        }
    }

    /// Fetch with retry, classify, and extract metadata for found profiles.
    async fn probe(&self, request: &ProbeRequest<'_>, cancel: &CancellationToken) -> ProbeOutcome {
        let started = Instant::now();
        let mut attempts = 0u32;

        let fetch = loop {
            attempts += 1;
            let fetch = self.fetch_once(&request.url).await;

            match fetch.failure() {
                Some(failure)
                    if failure.is_transient()
                        && attempts <= self.settings.max_retries
                        && !cancel.is_cancelled() =>
                {
                    let delay = retry_backoff(self.settings.retry_delay, attempts);
                    tracing::warn!(
                        platform = %request.platform.id,
                        attempt = attempts,
                        max_retries = self.settings.max_retries,
                        error = %failure,
                        "Transient fetch failure, retrying in {:?}",
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                _ => break fetch,
            }
        };

        let verdict = decide(request.platform, &fetch);
        let metadata = if verdict.is_found() {
            fetch
                .body()
                .map(|body| extract_with_base(body, &fetch.final_url))
        } else {
            None
        };

        tracing::debug!(
            platform = %request.platform.id,
            verdict = ?verdict.kind,
            rule = ?verdict.rule,
            status = ?fetch.status(),
            attempts,
            "Probe finished"
        );

        ProbeOutcome {
            platform_id: request.platform.id.clone(),
            platform_name: request.platform.name.clone(),
            url: request.url.clone(),
            verdict,
            metadata,
            attempts,
            elapsed: started.elapsed(),
        }
    }

    /// One fetch attempt, bounded by the request timeout even if the
    /// fetcher ignores it.
    async fn fetch_once(&self, url: &str) -> FetchResult {
        let timeout = self.settings.request_timeout;
        match tokio::time::timeout(timeout, self.fetcher.get(url, timeout)).await {
            Ok(fetch) => fetch,
            Err(_) => FetchResult::failed(url, FetchFailure::Timeout),
        }
    }
}

/// Linear backoff before retry `attempt`, saturating instead of overflowing.
fn retry_backoff(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(attempt)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "probe panicked".to_string()
    }
}
