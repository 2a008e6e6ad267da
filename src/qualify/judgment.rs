//! The judgment race: one oracle call against its deadline, operator
//! overrides and cooperative cancellation.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::control::{OperatorAction, OverrideInbox};
use crate::oracle::{JudgmentOracle, JudgmentRequest, OracleResult, OracleVerdict};

#[derive(Debug)]
/// How a single judgment call ended.
pub enum JudgmentResolution {
    /// The oracle answered, successfully or not.
    Completed(OracleResult<OracleVerdict>),
    /// The judgment ceiling elapsed first.
    TimedOut,
    /// An operator intervened; the in-flight call was dropped.
    Overridden(OperatorAction),
}

/// Races one oracle call. Returns `None` if cancelled.
///
/// Polled in fixed priority: cancellation, overrides, the oracle, then the
/// deadline, so a verdict that lands together with the deadline still counts.
pub async fn race_judgment(
    oracle: &dyn JudgmentOracle,
    request: &JudgmentRequest,
    timeout: Duration,
    overrides: Option<&mut OverrideInbox>,
    cancel: &CancellationToken,
) -> Option<JudgmentResolution> {
    let doc_id = request.document.id.as_str();
    let override_signal = async move {
        match overrides {
            Some(inbox) => inbox.next_for(doc_id).await,
            None => std::future::pending().await,
        }
    };

    tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        action = override_signal => Some(JudgmentResolution::Overridden(action)),
        result = oracle.judge(request) => Some(JudgmentResolution::Completed(result)),
        _ = tokio::time::sleep(timeout) => Some(JudgmentResolution::TimedOut),
    }
}
