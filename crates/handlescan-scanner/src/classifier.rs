//! Existence heuristics.
//!
//! [`decide`] turns a platform descriptor and one fetch result into a
//! [`Verdict`]. Rules are applied in a fixed order and the first one that
//! applies wins:
//!
//! 1. fetch failure → `Uncertain`
//! 2. status in the platform's not-found set → `NotFound`
//! 3. a not-found marker in the body (or, after a redirect, in the final
//!    URL) → `NotFound`, even on 200
//! 4. status in the platform's expected set → `Found`
//! 5. anything else → `Uncertain`
//!
//! Markers are checked before the expected-status rule because several
//! platforms serve their "user not found" page with status 200.

use crate::fetcher::{FetchFailure, FetchOutcome, FetchResult};
use handlescan_catalog::PlatformDescriptor;
use serde::{Deserialize, Serialize};

/// Tri-state existence conclusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictKind {
    /// The profile exists
    Found,
    /// The profile does not exist
    NotFound,
    /// Existence could not be determined
    Uncertain,
}

/// Which heuristic produced a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionRule {
    /// No response was received
    FetchFailure,
    /// Status in the not-found set
    NotFoundStatus,
    /// Not-found marker found in the body
    BodyMarker,
    /// Redirected to a URL containing a not-found marker
    UrlMarker,
    /// Status in the expected set
    ExpectedStatus,
    /// No rule matched
    Fallthrough,
    /// The probe was cancelled before it finished
    Cancelled,
    /// The probe failed internally
    Internal,
}

/// Why a verdict is `Uncertain`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum UncertainReason {
    /// The fetch produced no response
    FetchFailed(FetchFailure),
    /// A response arrived with a status no rule covers
    UnexpectedStatus(u16),
    /// The run was cancelled or hit its deadline first
    Cancelled,
    /// The probe panicked
    Internal(String),
}

impl std::fmt::Display for UncertainReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FetchFailed(failure) => write!(f, "{failure}"),
            Self::UnexpectedStatus(status) => write!(f, "unexpected HTTP status {status}"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Internal(message) => write!(f, "internal error: {message}"),
        }
    }
}

/// Signals a verdict was based on, kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Evidence {
    /// Final HTTP status, if a response arrived
    pub status: Option<u16>,
    /// URL reached after redirects, if a request was made
    pub final_url: Option<String>,
    /// Whether a redirect was followed
    pub redirected: bool,
    /// The marker that matched, for marker rules
    pub matched_marker: Option<String>,
    /// Why the verdict is uncertain, for `Uncertain` verdicts
    pub reason: Option<UncertainReason>,
}

/// Existence conclusion plus its evidentiary basis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    /// The conclusion
    pub kind: VerdictKind,
    /// The rule that decided it
    pub rule: DecisionRule,
    /// What was observed
    pub evidence: Evidence,
}

impl Verdict {
    /// Verdict for a probe that was cancelled before it finished.
    #[must_use]
    pub fn cancelled() -> Self {
        Self {
            kind: VerdictKind::Uncertain,
            rule: DecisionRule::Cancelled,
            evidence: Evidence {
                reason: Some(UncertainReason::Cancelled),
                ..Evidence::default()
            },
        }
    }

    /// Verdict for a probe that failed internally.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: VerdictKind::Uncertain,
            rule: DecisionRule::Internal,
            evidence: Evidence {
                reason: Some(UncertainReason::Internal(message.into())),
                ..Evidence::default()
            },
        }
    }

    /// Whether the profile was found.
    #[must_use]
    pub fn is_found(&self) -> bool {
        self.kind == VerdictKind::Found
    }
}

/// Classify one fetch result for one platform.
///
/// Pure: the same inputs always give the same verdict.
#[must_use]
pub fn decide(platform: &PlatformDescriptor, fetch: &FetchResult) -> Verdict {
    let mut evidence = Evidence {
        status: fetch.status(),
        final_url: Some(fetch.final_url.clone()),
        redirected: fetch.redirected,
        ..Evidence::default()
    };

    let (status, body) = match &fetch.outcome {
        FetchOutcome::Failed(failure) => {
            evidence.reason = Some(UncertainReason::FetchFailed(failure.clone()));
            return verdict(VerdictKind::Uncertain, DecisionRule::FetchFailure, evidence);
        }
        FetchOutcome::Response { status, body, .. } => (*status, body.as_str()),
    };

    if platform.not_found_status().contains(&status) {
        return verdict(VerdictKind::NotFound, DecisionRule::NotFoundStatus, evidence);
    }

    if let Some(marker) = platform
        .not_found_markers
        .iter()
        .find(|marker| body.contains(marker.as_str()))
    {
        evidence.matched_marker = Some(marker.clone());
        return verdict(VerdictKind::NotFound, DecisionRule::BodyMarker, evidence);
    }

    if fetch.redirected {
        if let Some(marker) = platform
            .not_found_url_markers
            .iter()
            .find(|marker| fetch.final_url.contains(marker.as_str()))
        {
            evidence.matched_marker = Some(marker.clone());
            return verdict(VerdictKind::NotFound, DecisionRule::UrlMarker, evidence);
        }
    }

    if platform.expected_status().contains(&status) {
        return verdict(VerdictKind::Found, DecisionRule::ExpectedStatus, evidence);
    }

    evidence.reason = Some(UncertainReason::UnexpectedStatus(status));
    verdict(VerdictKind::Uncertain, DecisionRule::Fallthrough, evidence)
}

fn verdict(kind: VerdictKind, rule: DecisionRule, evidence: Evidence) -> Verdict {
    Verdict {
        kind,
        rule,
        evidence,
    }
}
