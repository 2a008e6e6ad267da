use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
/// Why a judged document was rejected.
pub enum RejectReason {
    /// The oracle answered and the document did not qualify.
    NotQualified,
    /// The oracle call failed (transport, backend error).
    OracleError,
    /// The oracle answered with something unreadable.
    Malformed,
    /// No answer within the judgment ceiling.
    Timeout,
    /// An operator skipped the item.
    Skipped,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::NotQualified => "not_qualified",
            RejectReason::OracleError => "oracle_error",
            RejectReason::Malformed => "malformed",
            RejectReason::Timeout => "timeout",
            RejectReason::Skipped => "skipped",
        }
    }

    /// True when the oracle never produced a usable verdict.
    pub fn is_failure(&self) -> bool {
        !matches!(self, RejectReason::NotQualified)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "SCREAMING_SNAKE_CASE")]
/// Outcome of qualifying one document.
///
/// Everything except [`QualificationOutcome::PendingJudgment`] is terminal and
/// written exactly once.
pub enum QualificationOutcome {
    /// Failed both pre-filter thresholds.
    FilteredOut,
    /// In flight at the oracle. Never emitted as a final result.
    PendingJudgment,
    Rejected {
        reason: RejectReason,
    },
    /// Judged and accepted.
    Qualified,
    /// Accepted without judgment once the fast path locked in.
    QualifiedFastPath,
    /// Pre-filtered after fail-fast triggered.
    AbortedLowYield,
}

impl QualificationOutcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, QualificationOutcome::PendingJudgment)
    }

    pub fn is_qualified(&self) -> bool {
        matches!(
            self,
            QualificationOutcome::Qualified | QualificationOutcome::QualifiedFastPath
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            QualificationOutcome::FilteredOut => "FILTERED_OUT",
            QualificationOutcome::PendingJudgment => "PENDING_JUDGMENT",
            QualificationOutcome::Rejected { .. } => "REJECTED",
            QualificationOutcome::Qualified => "QUALIFIED",
            QualificationOutcome::QualifiedFastPath => "QUALIFIED_FAST_PATH",
            QualificationOutcome::AbortedLowYield => "ABORTED_LOW_YIELD",
        }
    }
}

impl std::fmt::Display for QualificationOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QualificationOutcome::Rejected { reason } => {
                write!(f, "REJECTED ({})", reason.as_str())
            }
            other => f.write_str(other.label()),
        }
    }
}
