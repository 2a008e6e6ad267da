//! Scripted oracle for tests.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::JudgmentOracle;
use super::error::{OracleError, OracleResult};
use super::types::{JudgmentRequest, OracleVerdict};

#[derive(Debug, Clone)]
/// One scripted reply.
pub enum MockResponse {
    Verdict(OracleVerdict),
    /// Verdict delivered after a delay.
    Delayed(Duration, OracleVerdict),
    Error(String),
    Malformed,
    /// Never resolves.
    Hang,
}

impl MockResponse {
    pub fn qualified(score: f32) -> Self {
        MockResponse::Verdict(OracleVerdict::new(true, score, score))
    }

    pub fn rejected() -> Self {
        MockResponse::Verdict(OracleVerdict::new(false, 1.0, 1.0))
    }
}

#[derive(Debug, Clone, PartialEq)]
/// A recorded call.
pub struct MockCall {
    pub doc_id: String,
    pub corrective: bool,
}

/// Replies from per-document scripts, falling back to a default reply.
pub struct MockOracle {
    scripts: Mutex<HashMap<String, VecDeque<MockResponse>>>,
    default: MockResponse,
    calls: Mutex<Vec<MockCall>>,
}

impl Default for MockOracle {
    fn default() -> Self {
        Self::new(MockResponse::rejected())
    }
}

impl MockOracle {
    pub fn new(default: MockResponse) -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            default,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queues `responses` for `doc_id`, consumed in order.
    pub fn script(self, doc_id: impl Into<String>, responses: Vec<MockResponse>) -> Self {
        self.scripts
            .lock()
            .insert(doc_id.into(), responses.into_iter().collect());
        self
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn calls_for(&self, doc_id: &str) -> usize {
        self.calls.lock().iter().filter(|c| c.doc_id == doc_id).count()
    }

    fn next_response(&self, doc_id: &str) -> MockResponse {
        self.scripts
            .lock()
            .get_mut(doc_id)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| self.default.clone())
    }
}

#[async_trait]
impl JudgmentOracle for MockOracle {
    async fn judge(&self, request: &JudgmentRequest) -> OracleResult<OracleVerdict> {
        let doc_id = request.document.id.clone();
        self.calls.lock().push(MockCall {
            doc_id: doc_id.clone(),
            corrective: request.is_corrective(),
        });

        match self.next_response(&doc_id) {
            MockResponse::Verdict(verdict) => Ok(verdict.normalized()),
            MockResponse::Delayed(delay, verdict) => {
                tokio::time::sleep(delay).await;
                Ok(verdict.normalized())
            }
            MockResponse::Error(reason) => Err(OracleError::Transport(reason)),
            MockResponse::Malformed => Err(OracleError::Malformed {
                reason: "mock malformed response".to_string(),
            }),
            MockResponse::Hang => std::future::pending().await,
        }
    }
}
