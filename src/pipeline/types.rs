use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{PipelineConfig, QueryThresholds};
use crate::constants::DEFAULT_RECORD_LIMIT;
use crate::document::Document;
use crate::oracle::OracleVerdict;
use crate::qualify::{CycleState, QualificationOutcome, YieldSnapshot};
use crate::scoring::ScoreResult;

#[derive(Debug, Clone, PartialEq)]
/// One query to run.
pub struct QueryRequest {
    pub query: String,
    /// Topics handed to the oracle.
    pub topics: Vec<String>,
    pub thresholds: QueryThresholds,
    /// Offset of the first page.
    pub offset: usize,
    /// Maximum documents fetched.
    pub record_limit: usize,
}

impl QueryRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            topics: Vec::new(),
            thresholds: QueryThresholds::default(),
            offset: 0,
            record_limit: DEFAULT_RECORD_LIMIT,
        }
    }

    /// Request with thresholds, topics and paging taken from `config`.
    pub fn from_config(query: impl Into<String>, config: &PipelineConfig) -> Self {
        Self {
            query: query.into(),
            topics: config.topics.clone(),
            thresholds: config.thresholds,
            offset: config.start_offset,
            record_limit: config.record_limit,
        }
    }

    pub fn with_topics(mut self, topics: Vec<String>) -> Self {
        self.topics = topics;
        self
    }

    pub fn with_thresholds(mut self, thresholds: QueryThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_record_limit(mut self, record_limit: usize) -> Self {
        self.record_limit = record_limit;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
/// Why a query stopped.
pub enum QueryTermination {
    /// The source returned a short or empty page.
    Exhausted,
    LimitReached,
    FailFast,
    Cancelled,
    /// A page could not be fetched after retries.
    SourceFailed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A finalized document on the result feed.
pub struct QualificationRecord {
    pub run_id: Uuid,
    pub query: String,
    pub document: Document,
    pub scores: ScoreResult,
    pub outcome: QualificationOutcome,
    /// Present whenever the oracle produced the deciding verdict.
    pub verdict: Option<OracleVerdict>,
    /// Failure detail for rejections without a verdict.
    pub detail: Option<String>,
    /// Cycle state right after this document.
    pub snapshot: YieldSnapshot,
    pub finalized_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Per-query totals.
pub struct QuerySummary {
    pub run_id: Uuid,
    pub query: String,
    /// Documents returned by the source.
    pub fetched: usize,
    /// Documents that passed the pre-filter.
    pub processed: u32,
    /// Judged and accepted.
    pub qualified: u32,
    pub fast_path: u32,
    pub rejected: u32,
    pub filtered: u32,
    pub aborted: u32,
    pub final_yield: f32,
    pub fast_path_activated: bool,
    pub fail_fast_triggered: bool,
    pub oracle_calls: u32,
    pub termination: QueryTermination,
}

impl QuerySummary {
    pub fn new(run_id: Uuid, query: impl Into<String>) -> Self {
        Self {
            run_id,
            query: query.into(),
            fetched: 0,
            processed: 0,
            qualified: 0,
            fast_path: 0,
            rejected: 0,
            filtered: 0,
            aborted: 0,
            final_yield: 0.0,
            fast_path_activated: false,
            fail_fast_triggered: false,
            oracle_calls: 0,
            termination: QueryTermination::Exhausted,
        }
    }

    /// All qualified documents, judged or fast-pathed.
    pub fn total_qualified(&self) -> u32 {
        self.qualified + self.fast_path
    }

    /// Number of finalized records.
    pub fn finalized(&self) -> u32 {
        self.qualified + self.fast_path + self.rejected + self.filtered + self.aborted
    }

    pub(crate) fn record(&mut self, outcome: &QualificationOutcome, oracle_calls: u32) {
        match outcome {
            QualificationOutcome::FilteredOut => self.filtered += 1,
            QualificationOutcome::Rejected { .. } => self.rejected += 1,
            QualificationOutcome::Qualified => self.qualified += 1,
            QualificationOutcome::QualifiedFastPath => self.fast_path += 1,
            QualificationOutcome::AbortedLowYield => self.aborted += 1,
            QualificationOutcome::PendingJudgment => {}
        }
        self.oracle_calls += oracle_calls;
    }

    pub(crate) fn finish(&mut self, state: &CycleState, termination: QueryTermination) {
        self.processed = state.processed();
        self.final_yield = state.current_yield();
        self.fast_path_activated = state.is_speedup_locked();
        self.fail_fast_triggered = state.is_fail_fast_triggered();
        self.termination = termination;
    }
}
