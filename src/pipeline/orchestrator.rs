use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures_util::future::join_all;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use super::error::PipelineError;
use super::events::{EventBus, PipelineEvent};
use super::sink::ResultSink;
use super::types::{QualificationRecord, QueryRequest, QuerySummary, QueryTermination};
use crate::config::{PipelineConfig, QueryThresholds};
use crate::document::{Document, Embedding};
use crate::embedding::{EmbeddingProvider, embed_or_absent};
use crate::oracle::JudgmentOracle;
use crate::qualify::{
    CycleState, DecisionEngine, EngineSignal, JudgmentContext, OperatorControl, OverrideInbox,
    operator_channel,
};
use crate::scoring::vector::optional_similarity;
use crate::scoring::{RuleScorer, ScoreResult};
use crate::source::CandidateSource;

/// Drives queries through fetch, embed, score and decide.
///
/// Documents are decided strictly one at a time in arrival order, so the
/// cycle state a document sees reflects every document before it.
pub struct Orchestrator {
    source: Arc<dyn CandidateSource>,
    embedder: Arc<dyn EmbeddingProvider>,
    scorer: RuleScorer,
    engine: DecisionEngine,
    sink: Arc<dyn ResultSink>,
    events: EventBus,
    page_size: usize,
    embed_chunk_size: usize,
    embed_chunk_delay: Duration,
    overrides: Option<Mutex<OverrideInbox>>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("rules", &self.scorer.rules().len())
            .field("engine", &self.engine)
            .field("page_size", &self.page_size)
            .field("embed_chunk_size", &self.embed_chunk_size)
            .field("embed_chunk_delay", &self.embed_chunk_delay)
            .field("operator_control", &self.overrides.is_some())
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    pub fn new(
        config: &PipelineConfig,
        source: Arc<dyn CandidateSource>,
        embedder: Arc<dyn EmbeddingProvider>,
        oracle: Arc<dyn JudgmentOracle>,
        scorer: RuleScorer,
        sink: Arc<dyn ResultSink>,
    ) -> Self {
        Self {
            source,
            embedder,
            scorer,
            engine: DecisionEngine::new(config.speedup, oracle, config.judgment_timeout),
            sink,
            events: EventBus::default(),
            page_size: config.page_size.max(1),
            embed_chunk_size: config.embed_chunk_size.max(1),
            embed_chunk_delay: config.embed_chunk_delay,
            overrides: None,
        }
    }

    pub fn with_event_bus(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    /// Enables operator overrides and returns the handle that sends them.
    ///
    /// Calling this again replaces the previous handle.
    pub fn operator_control(&mut self) -> OperatorControl {
        let (control, inbox) = operator_channel();
        self.overrides = Some(Mutex::new(inbox));
        control
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Runs one query to completion, cancellation, fail-fast or source failure.
    ///
    /// Only a failing result sink is an error. Every record written before
    /// cancellation is complete; no partially decided document is emitted.
    #[instrument(skip(self, request, cancel), fields(query = %request.query))]
    pub async fn run_query(
        &self,
        request: QueryRequest,
        cancel: &CancellationToken,
    ) -> Result<QuerySummary, PipelineError> {
        let run_id = Uuid::new_v4();
        let mut summary = QuerySummary::new(run_id, request.query.clone());
        let mut state = CycleState::new();

        self.events.emit_lossy(PipelineEvent::QueryStarted {
            run_id,
            query: request.query.clone(),
            timestamp: Utc::now(),
        });

        // On cancellation the page loop below ends the query before fetching.
        let query_embedding = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            embedding = embed_or_absent(self.embedder.as_ref(), &request.query) => {
                if embedding.is_none() {
                    warn!("Query embedding unavailable, vector scores will be zero");
                }
                embedding
            }
        };

        let mut inbox = match &self.overrides {
            Some(overrides) => Some(overrides.lock().await),
            None => None,
        };

        let mut offset = request.offset;
        let termination = 'pages: loop {
            if cancel.is_cancelled() {
                break QueryTermination::Cancelled;
            }
            if state.is_fail_fast_triggered() {
                break QueryTermination::FailFast;
            }
            if summary.fetched >= request.record_limit {
                break QueryTermination::LimitReached;
            }

            let limit = self.page_size.min(request.record_limit - summary.fetched);
            let fetched = tokio::select! {
                biased;
                _ = cancel.cancelled() => break 'pages QueryTermination::Cancelled,
                page = self.source.fetch_page(&request.query, offset, limit) => page,
            };
            let page = match fetched {
                Ok(page) => page,
                Err(e) => {
                    error!(offset, error = %e, "Candidate source failed, ending query");
                    break QueryTermination::SourceFailed {
                        reason: e.to_string(),
                    };
                }
            };

            let page_len = page.len();
            self.events.emit_lossy(PipelineEvent::PageFetched {
                run_id,
                offset,
                count: page_len,
            });
            if page_len == 0 {
                break QueryTermination::Exhausted;
            }
            summary.fetched += page_len;
            offset += page_len;

            let Some(embeddings) = self.embed_page(&page, cancel).await else {
                break QueryTermination::Cancelled;
            };

            for (document, embedding) in page.into_iter().zip(embeddings) {
                if cancel.is_cancelled() {
                    break 'pages QueryTermination::Cancelled;
                }

                let scores = self.score(
                    query_embedding.as_deref(),
                    embedding.as_deref(),
                    &request.thresholds,
                );
                self.events.emit_lossy(PipelineEvent::DocumentScored {
                    run_id,
                    doc_id: document.id.clone(),
                    vector_score: scores.vector_score,
                    composite_score: scores.composite_score,
                    passed: scores.passed(),
                });

                let ctx = JudgmentContext {
                    topics: &request.topics,
                    thresholds: request.thresholds,
                    cancel,
                    overrides: inbox.as_deref_mut(),
                };
                let Ok(decision) = self.engine.decide(state, &document, &scores, ctx).await else {
                    info!(doc_id = %document.id, "Cancelled mid-document, discarding");
                    break 'pages QueryTermination::Cancelled;
                };

                state = decision.state;
                let snapshot = state.snapshot();
                match decision.signal {
                    Some(EngineSignal::FastPathActivated) => {
                        self.events.emit_lossy(PipelineEvent::FastPathActivated {
                            run_id,
                            doc_id: document.id.clone(),
                            snapshot,
                        });
                    }
                    Some(EngineSignal::FailFastTriggered) => {
                        self.events.emit_lossy(PipelineEvent::FailFastTriggered {
                            run_id,
                            doc_id: document.id.clone(),
                            snapshot,
                        });
                    }
                    None => {}
                }

                summary.record(&decision.outcome, decision.oracle_calls);
                let doc_id = document.id.clone();
                self.sink
                    .accept(QualificationRecord {
                        run_id,
                        query: request.query.clone(),
                        document,
                        scores,
                        outcome: decision.outcome,
                        verdict: decision.verdict,
                        detail: decision.detail,
                        snapshot,
                        finalized_at: Utc::now(),
                    })
                    .await?;

                self.events.emit_lossy(PipelineEvent::DocumentFinalized {
                    run_id,
                    doc_id,
                    outcome: decision.outcome,
                    snapshot,
                });
            }

            if state.is_fail_fast_triggered() {
                break QueryTermination::FailFast;
            }
        };

        summary.finish(&state, termination);
        debug!(
            fetched = summary.fetched,
            final_yield = summary.final_yield,
            "Query finished"
        );
        self.events.emit_lossy(PipelineEvent::QueryCompleted {
            run_id,
            summary: summary.clone(),
        });

        Ok(summary)
    }

    /// Runs queries one after another, each with fresh cycle state.
    ///
    /// Stops after the query during which `cancel` fired.
    pub async fn run_queue(
        &self,
        requests: Vec<QueryRequest>,
        cancel: &CancellationToken,
    ) -> Result<Vec<QuerySummary>, PipelineError> {
        let total = requests.len();
        let mut summaries = Vec::with_capacity(total);

        for (index, request) in requests.into_iter().enumerate() {
            if cancel.is_cancelled() {
                info!(remaining = total - index, "Queue cancelled");
                break;
            }
            debug!(position = index + 1, total, "Starting queued query");
            summaries.push(self.run_query(request, cancel).await?);
        }

        Ok(summaries)
    }

    /// Embeds a page in bounded concurrent chunks. `None` if cancelled.
    async fn embed_page(
        &self,
        page: &[Document],
        cancel: &CancellationToken,
    ) -> Option<Vec<Option<Embedding>>> {
        let mut embeddings = Vec::with_capacity(page.len());

        for (index, chunk) in page.chunks(self.embed_chunk_size).enumerate() {
            if index > 0 && !self.embed_chunk_delay.is_zero() {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return None,
                    _ = tokio::time::sleep(self.embed_chunk_delay) => {}
                }
            }
            if cancel.is_cancelled() {
                return None;
            }

            let texts: Vec<String> = chunk.iter().map(Document::embedding_text).collect();
            let requests = texts
                .iter()
                .map(|text| embed_or_absent(self.embedder.as_ref(), text));
            let batch = tokio::select! {
                biased;
                _ = cancel.cancelled() => return None,
                batch = join_all(requests) => batch,
            };
            embeddings.extend(batch);
        }

        Some(embeddings)
    }

    fn score(
        &self,
        query: Option<&[f32]>,
        document: Option<&[f32]>,
        thresholds: &QueryThresholds,
    ) -> ScoreResult {
        let vector_score = optional_similarity(query, document);
        let rule_score = self.scorer.score(document);
        ScoreResult::evaluate(
            vector_score,
            rule_score,
            thresholds.vector_min,
            thresholds.composite_min,
        )
    }
}
