//! Handlescan Scanner - Concurrent username probing.
//!
//! This crate checks whether a username exists on each platform of a
//! [`PlatformCatalog`](handlescan_catalog::PlatformCatalog). It fetches every
//! platform's profile URL under a concurrency cap, classifies each response
//! with ordered heuristics, and extracts preview metadata from profiles that
//! were found.
//!
//! # Features
//!
//! - Bounded concurrency with order-stable reports (catalog order)
//! - Per-platform isolation: network failures become `Uncertain` verdicts
//! - Retry of transient failures with linear backoff
//! - Cancellation token and overall deadline with partial results preserved
//! - Open Graph / meta-description extraction for found profiles
//!
//! # Example
//!
//! ```rust,ignore
//! use handlescan_catalog::PlatformCatalog;
//! use handlescan_scanner::{HttpFetcher, FetcherConfig, ProbeOrchestrator, ProbeSettings};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! let catalog = PlatformCatalog::builtin()?;
//! let fetcher = Arc::new(HttpFetcher::new(FetcherConfig::default())?);
//! let orchestrator = ProbeOrchestrator::new(fetcher, ProbeSettings::default())?;
//!
//! let report = orchestrator
//!     .run("octocat", &catalog, CancellationToken::new())
//!     .await?;
//! println!("{:?}", report.summary());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod classifier;
#[allow(missing_docs)]
pub mod error;
pub mod fetcher;
pub mod filter;
pub mod metadata;
pub mod orchestrator;
pub mod report;
#[allow(missing_docs)]
pub mod url_builder;

// Re-export commonly used types
pub use classifier::{decide, DecisionRule, Evidence, UncertainReason, Verdict, VerdictKind};
pub use error::{Result, ScanError};
pub use fetcher::{
    FetchFailure, FetchOutcome, FetchResult, Fetcher, FetcherConfig, HttpFetcher,
};
pub use filter::PlatformFilter;
pub use metadata::{extract, extract_with_base, ProfileMetadata};
pub use orchestrator::{ProbeOrchestrator, ProbeSettings};
pub use report::{ProbeOutcome, ProbeReport, ProbeSummary, RunCompletion};
pub use url_builder::{build_profile_url, normalize_username};
