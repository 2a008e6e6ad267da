//! Triage library crate (used by the CLI binary and integration tests).
//!
//! Ingests a paginated stream of candidate documents for a search query and
//! decides, document by document, whether to accept it outright, send it to a
//! costly judgment oracle, reject it, or abort the whole query for poor yield.
//!
//! # Public API Surface
//!
//! ## Scoring
//! - [`cosine_similarity`] - Vector scorer
//! - [`RuleScorer`], [`PreparedRule`], [`SemanticRule`] - Weighted semantic rules
//! - [`ScoreResult`], [`RuleMatch`] - Per-document scores and explainability
//!
//! ## Qualification
//! - [`DecisionEngine`] - Per-document state machine
//! - [`CycleState`], [`YieldSnapshot`] - Per-query running statistics
//! - [`QualificationOutcome`], [`RejectReason`] - Terminal outcomes
//!
//! ## Orchestration
//! - [`Orchestrator`], [`QueryRequest`], [`QuerySummary`] - Pagination driver
//! - [`EventBus`], [`PipelineEvent`] - Typed event stream for observers
//! - [`ResultSink`], [`MemorySink`], [`ChannelSink`] - Result consumers
//! - [`OperatorControl`] - Retry/skip overrides for in-flight judgments
//!
//! ## Collaborators
//! - [`EmbeddingProvider`], [`JudgmentOracle`], [`CandidateSource`]
//!
//! ## Test/Mock Support
//! Mock implementations are available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod config;
pub mod constants;
pub mod document;
pub mod embedding;
pub mod oracle;
pub mod pipeline;
pub mod qualify;
pub mod scoring;
pub mod source;

pub use config::{ConfigError, PipelineConfig, QueryThresholds, SpeedupPolicy};
pub use document::{Document, Embedding};
pub use embedding::{
    CachedEmbeddingProvider, EmbeddingError, EmbeddingProvider, HttpEmbeddingConfig,
    HttpEmbeddingProvider, prepare_rules,
};
#[cfg(any(test, feature = "mock"))]
pub use embedding::MockEmbeddingProvider;
pub use oracle::{GenaiOracle, JudgmentOracle, JudgmentRequest, OracleError, OracleVerdict};
#[cfg(any(test, feature = "mock"))]
pub use oracle::MockOracle;
pub use pipeline::{
    ChannelSink, EventBus, MemorySink, Orchestrator, PipelineError, PipelineEvent,
    QualificationRecord, QueryRequest, QuerySummary, QueryTermination, ResultSink, SinkError,
    spawn_event_logger,
};
pub use qualify::{
    CycleState, DecisionEngine, OperatorAction, OperatorControl, QualificationOutcome,
    RejectReason, YieldSnapshot,
};
pub use scoring::{
    PreparedRule, RuleMatch, RulePolarity, RuleScorer, ScoreResult, SemanticRule,
    cosine_similarity,
};
pub use source::{CandidateSource, JsonFileSource, RetryingSource, SourceError};
#[cfg(any(test, feature = "mock"))]
pub use source::MockSource;
