use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::Cancelled;
use super::control::{OperatorAction, OverrideInbox};
use super::judgment::{JudgmentResolution, race_judgment};
use super::outcome::{QualificationOutcome, RejectReason};
use super::state::CycleState;
use crate::config::{QueryThresholds, SpeedupPolicy};
use crate::constants::{MAX_OPERATOR_RETRIES, ORACLE_SCORE_OVERRIDE};
use crate::document::Document;
use crate::oracle::{CorrectionContext, JudgmentOracle, JudgmentRequest, OracleError, OracleVerdict};
use crate::scoring::ScoreResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Result of the synchronous part of a decision (pre-filter and speedup policy).
pub enum Classification {
    FilteredOut,
    /// `newly_triggered` is set on the document that tripped fail-fast.
    AbortedLowYield { newly_triggered: bool },
    /// `newly_activated` is set on the document that locked the fast path.
    FastPath { newly_activated: bool },
    /// Needs the oracle.
    Judge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// One-time policy transitions observed while deciding a document.
pub enum EngineSignal {
    FastPathActivated,
    FailFastTriggered,
}

#[derive(Debug, Clone)]
/// Everything the engine decided about one document.
pub struct Decision {
    pub outcome: QualificationOutcome,
    /// Verdict that drove the outcome, if the oracle answered.
    pub verdict: Option<OracleVerdict>,
    /// State to commit once the document is finalized.
    pub state: CycleState,
    pub signal: Option<EngineSignal>,
    pub oracle_calls: u32,
    /// Human-readable reason for failure rejections.
    pub detail: Option<String>,
}

/// Per-query inputs to [`DecisionEngine::decide`].
pub struct JudgmentContext<'a> {
    pub topics: &'a [String],
    pub thresholds: QueryThresholds,
    pub cancel: &'a CancellationToken,
    pub overrides: Option<&'a mut OverrideInbox>,
}

enum Judged {
    Verdict(OracleVerdict),
    Failed(RejectReason, String),
}

/// Decides the outcome of each scored document.
pub struct DecisionEngine {
    policy: SpeedupPolicy,
    oracle: Arc<dyn JudgmentOracle>,
    judgment_timeout: Duration,
}

impl std::fmt::Debug for DecisionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecisionEngine")
            .field("policy", &self.policy)
            .field("judgment_timeout", &self.judgment_timeout)
            .finish_non_exhaustive()
    }
}

impl DecisionEngine {
    pub fn new(
        policy: SpeedupPolicy,
        oracle: Arc<dyn JudgmentOracle>,
        judgment_timeout: Duration,
    ) -> Self {
        Self {
            policy,
            oracle,
            judgment_timeout,
        }
    }

    pub fn policy(&self) -> &SpeedupPolicy {
        &self.policy
    }

    /// Applies the pre-filter and the speedup policy, updating `state` in place.
    ///
    /// Filtered documents leave `state` untouched. Everything else counts as
    /// processed before fail-fast and fast-path eligibility are evaluated.
    pub fn classify(&self, state: &mut CycleState, scores: &ScoreResult) -> Classification {
        if !scores.passed() {
            return Classification::FilteredOut;
        }

        state.record_processed();

        if state.fail_fast_triggered {
            return Classification::AbortedLowYield {
                newly_triggered: false,
            };
        }

        if self.policy.fail_fast
            && !state.speedup_locked
            && state.processed >= self.policy.sample_size
            && state.qualified == 0
        {
            state.fail_fast_triggered = true;
            return Classification::AbortedLowYield {
                newly_triggered: true,
            };
        }

        if state.speedup_locked {
            state.record_qualified();
            return Classification::FastPath {
                newly_activated: false,
            };
        }

        let past_first = state.processed > 1;
        let has_evidence = state.processed > self.policy.sample_size || state.qualified > 0;
        if past_first
            && has_evidence
            && state.current_yield() >= self.policy.target_qualify_rate
        {
            state.speedup_locked = true;
            state.record_qualified();
            return Classification::FastPath {
                newly_activated: true,
            };
        }

        Classification::Judge
    }

    /// Decides one document against `state`.
    ///
    /// The returned [`Decision::state`] must be committed by the caller. On
    /// cancellation nothing is returned and `state` stays as it was.
    pub async fn decide(
        &self,
        state: CycleState,
        document: &Document,
        scores: &ScoreResult,
        ctx: JudgmentContext<'_>,
    ) -> Result<Decision, Cancelled> {
        let mut next = state;
        let classification = self.classify(&mut next, scores);

        let (outcome, signal) = match classification {
            Classification::FilteredOut => (QualificationOutcome::FilteredOut, None),
            Classification::AbortedLowYield { newly_triggered } => {
                let signal = newly_triggered.then_some(EngineSignal::FailFastTriggered);
                (QualificationOutcome::AbortedLowYield, signal)
            }
            Classification::FastPath { newly_activated } => {
                let signal = newly_activated.then_some(EngineSignal::FastPathActivated);
                (QualificationOutcome::QualifiedFastPath, signal)
            }
            Classification::Judge => {
                return self.judge(next, document, scores, ctx).await;
            }
        };

        Ok(Decision {
            outcome,
            verdict: None,
            state: next,
            signal,
            oracle_calls: 0,
            detail: None,
        })
    }

    async fn judge(
        &self,
        mut state: CycleState,
        document: &Document,
        scores: &ScoreResult,
        mut ctx: JudgmentContext<'_>,
    ) -> Result<Decision, Cancelled> {
        let request = JudgmentRequest::new(document.clone(), ctx.topics.to_vec());
        let mut oracle_calls = 0;

        if let Some(inbox) = ctx.overrides.as_deref_mut() {
            let dropped = inbox.drain_stale();
            if dropped > 0 {
                debug!(dropped, "Discarded operator commands issued between judgments");
            }
        }

        let first = self.run_judgment(&request, &mut ctx, &mut oracle_calls).await?;
        let mut verdict = match first {
            Judged::Verdict(verdict) => verdict,
            Judged::Failed(reason, detail) => {
                return Ok(rejected(state, reason, detail, oracle_calls));
            }
        };

        // A zero probability after passing the pre-filter contradicts the
        // similarity evidence. Ask once more with that context.
        if verdict.probability == 0.0 {
            debug!(doc_id = %document.id, "Zero probability on pre-filtered document, re-querying");
            let corrective = request.corrective(CorrectionContext {
                vector_score: scores.vector_score,
                composite_score: scores.composite_score,
                previous_summary: verdict.summary.clone(),
            });
            match self.run_judgment(&corrective, &mut ctx, &mut oracle_calls).await? {
                Judged::Verdict(corrected) if corrected.probability > 0.0 => verdict = corrected,
                Judged::Verdict(_) => {}
                Judged::Failed(RejectReason::Skipped, detail) => {
                    return Ok(rejected(state, RejectReason::Skipped, detail, oracle_calls));
                }
                Judged::Failed(reason, detail) => {
                    debug!(doc_id = %document.id, reason = reason.as_str(), %detail, "Corrective re-query failed, keeping first verdict");
                }
            }
        }

        let outcome = if verdict.qualifies(ORACLE_SCORE_OVERRIDE, ctx.thresholds.probability_min) {
            state.record_qualified();
            QualificationOutcome::Qualified
        } else {
            QualificationOutcome::Rejected {
                reason: RejectReason::NotQualified,
            }
        };

        Ok(Decision {
            outcome,
            verdict: Some(verdict),
            state,
            signal: None,
            oracle_calls,
            detail: None,
        })
    }

    /// One judgment, re-issued while an operator asks to retry.
    async fn run_judgment(
        &self,
        request: &JudgmentRequest,
        ctx: &mut JudgmentContext<'_>,
        oracle_calls: &mut u32,
    ) -> Result<Judged, Cancelled> {
        let doc_id = request.document.id.as_str();
        let mut operator_retries = 0;

        loop {
            if ctx.cancel.is_cancelled() {
                return Err(Cancelled);
            }

            *oracle_calls += 1;
            let resolution = race_judgment(
                self.oracle.as_ref(),
                request,
                self.judgment_timeout,
                ctx.overrides.as_deref_mut(),
                ctx.cancel,
            )
            .await
            .ok_or(Cancelled)?;

            if ctx.cancel.is_cancelled() {
                return Err(Cancelled);
            }

            let judged = match resolution {
                JudgmentResolution::Completed(Ok(verdict)) => Judged::Verdict(verdict.normalized()),
                JudgmentResolution::Completed(Err(e)) => {
                    debug!(doc_id, error = %e, "Judgment failed");
                    let reason = match e {
                        OracleError::Transport(_) => RejectReason::OracleError,
                        OracleError::EmptyResponse | OracleError::Malformed { .. } => {
                            RejectReason::Malformed
                        }
                    };
                    Judged::Failed(reason, e.to_string())
                }
                JudgmentResolution::TimedOut => {
                    debug!(doc_id, timeout = ?self.judgment_timeout, "Judgment timed out");
                    Judged::Failed(
                        RejectReason::Timeout,
                        format!("no verdict within {:?}", self.judgment_timeout),
                    )
                }
                JudgmentResolution::Overridden(OperatorAction::Skip) => {
                    debug!(doc_id, "Operator skipped judgment");
                    Judged::Failed(RejectReason::Skipped, "skipped by operator".to_string())
                }
                JudgmentResolution::Overridden(OperatorAction::Retry) => {
                    if operator_retries >= MAX_OPERATOR_RETRIES {
                        debug!(doc_id, operator_retries, "Operator retry limit reached");
                        Judged::Failed(
                            RejectReason::Skipped,
                            format!("operator retry limit ({}) reached", MAX_OPERATOR_RETRIES),
                        )
                    } else {
                        operator_retries += 1;
                        debug!(doc_id, operator_retries, "Operator requested retry");
                        continue;
                    }
                }
            };

            return Ok(judged);
        }
    }
}

fn rejected(state: CycleState, reason: RejectReason, detail: String, oracle_calls: u32) -> Decision {
    Decision {
        outcome: QualificationOutcome::Rejected { reason },
        verdict: None,
        state,
        signal: None,
        oracle_calls,
        detail: Some(detail),
    }
}
