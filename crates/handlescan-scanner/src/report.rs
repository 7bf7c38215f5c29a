//! Per-platform outcomes and the aggregate run report.

use crate::classifier::{Verdict, VerdictKind};
use crate::metadata::ProfileMetadata;
use handlescan_core::{PlatformId, RunId, Timestamp};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Result of probing one platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeOutcome {
    /// Platform that was probed
    pub platform_id: PlatformId,
    /// Display name of the platform
    pub platform_name: String,
    /// Profile URL that was requested
    pub url: String,
    /// Existence verdict
    pub verdict: Verdict,
    /// Preview metadata, only for found profiles
    pub metadata: Option<ProfileMetadata>,
    /// Fetch attempts made, including retries
    pub attempts: u32,
    /// Wall time spent on this platform
    pub elapsed: Duration,
}

impl ProbeOutcome {
    /// Outcome for a platform that never finished because the run stopped.
    #[must_use]
    pub fn cancelled(
        platform_id: PlatformId,
        platform_name: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            platform_id,
            platform_name: platform_name.into(),
            url: url.into(),
            verdict: Verdict::cancelled(),
            metadata: None,
            attempts: 0,
            elapsed: Duration::ZERO,
        }
    }

    /// Shortcut for the verdict kind.
    #[must_use]
    pub fn kind(&self) -> VerdictKind {
        self.verdict.kind
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunCompletion {
    /// Every selected platform was probed
    Complete,
    /// The caller cancelled the run
    Cancelled,
    /// The run deadline elapsed
    DeadlineExceeded,
}

/// Verdict counts for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeSummary {
    /// Profiles found
    pub found: usize,
    /// Profiles confirmed missing
    pub not_found: usize,
    /// Platforms with no conclusion
    pub uncertain: usize,
}

impl ProbeSummary {
    /// Total number of outcomes counted.
    #[must_use]
    pub fn total(&self) -> usize {
        self.found + self.not_found + self.uncertain
    }
}

/// Everything a probe run produced, in catalog order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeReport {
    /// Run identifier
    pub run_id: RunId,
    /// Normalized username that was probed
    pub username: String,
    /// When the run started
    pub started_at: Timestamp,
    /// Total wall time of the run
    pub elapsed: Duration,
    /// How the run ended
    pub completion: RunCompletion,
    /// One outcome per selected platform
    pub outcomes: Vec<ProbeOutcome>,
}

impl ProbeReport {
    /// Count outcomes by verdict kind.
    #[must_use]
    pub fn summary(&self) -> ProbeSummary {
        self.outcomes
            .iter()
            .fold(ProbeSummary::default(), |mut summary, outcome| {
                match outcome.kind() {
                    VerdictKind::Found => summary.found += 1,
                    VerdictKind::NotFound => summary.not_found += 1,
                    VerdictKind::Uncertain => summary.uncertain += 1,
                }
                summary
            })
    }

    /// Whether every platform was probed to completion.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completion == RunCompletion::Complete
    }

    /// Outcomes with a `Found` verdict.
    pub fn found(&self) -> impl Iterator<Item = &ProbeOutcome> {
        self.outcomes.iter().filter(|o| o.verdict.is_found())
    }

    /// Outcome for one platform, if it was selected.
    #[must_use]
    pub fn outcome(&self, platform_id: &PlatformId) -> Option<&ProbeOutcome> {
        self.outcomes.iter().find(|o| &o.platform_id == platform_id)
    }
}
