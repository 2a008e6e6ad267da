//! Judgment oracle: the expensive qualitative assessment step.
//!
//! The oracle is opaque. Only its contract matters: given a document and the
//! configured topics it returns an [`OracleVerdict`] or fails. Verdicts are
//! normalized on the way in because backends routinely return out-of-range or
//! 0..1-scaled numbers.

pub mod error;
pub mod llm;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod parse;
pub mod prompt;
pub mod types;


use async_trait::async_trait;

pub use error::{OracleError, OracleResult};
pub use llm::GenaiOracle;
#[cfg(any(test, feature = "mock"))]
pub use mock::{MockOracle, MockResponse};
pub use parse::parse_verdict;
pub use types::{CorrectionContext, JudgmentRequest, OracleVerdict, normalize_scale};

#[async_trait]
/// External qualitative-assessment service.
pub trait JudgmentOracle: Send + Sync {
    /// Judges one document. May be slow; callers enforce their own timeout.
    async fn judge(&self, request: &JudgmentRequest) -> OracleResult<OracleVerdict>;
}
