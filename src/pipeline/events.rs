//! Pipeline events, fanned out over a broadcast channel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::types::QuerySummary;
use crate::constants::EVENT_CHANNEL_CAPACITY;
use crate::qualify::{QualificationOutcome, YieldSnapshot};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PipelineEvent {
    QueryStarted {
        run_id: Uuid,
        query: String,
        timestamp: DateTime<Utc>,
    },
    PageFetched {
        run_id: Uuid,
        offset: usize,
        count: usize,
    },
    DocumentScored {
        run_id: Uuid,
        doc_id: String,
        vector_score: f32,
        composite_score: f32,
        passed: bool,
    },
    /// Emitted once per query, on the document that locked the fast path.
    FastPathActivated {
        run_id: Uuid,
        doc_id: String,
        snapshot: YieldSnapshot,
    },
    FailFastTriggered {
        run_id: Uuid,
        doc_id: String,
        snapshot: YieldSnapshot,
    },
    DocumentFinalized {
        run_id: Uuid,
        doc_id: String,
        outcome: QualificationOutcome,
        snapshot: YieldSnapshot,
    },
    QueryCompleted {
        run_id: Uuid,
        summary: QuerySummary,
    },
}

impl PipelineEvent {
    pub fn run_id(&self) -> Uuid {
        match self {
            PipelineEvent::QueryStarted { run_id, .. }
            | PipelineEvent::PageFetched { run_id, .. }
            | PipelineEvent::DocumentScored { run_id, .. }
            | PipelineEvent::FastPathActivated { run_id, .. }
            | PipelineEvent::FailFastTriggered { run_id, .. }
            | PipelineEvent::DocumentFinalized { run_id, .. }
            | PipelineEvent::QueryCompleted { run_id, .. } => *run_id,
        }
    }
}

#[derive(Debug, Clone)]
/// Broadcast bus for [`PipelineEvent`]s.
///
/// Slow subscribers lag and lose events; the pipeline never waits on them.
pub struct EventBus {
    tx: broadcast::Sender<PipelineEvent>,
    capacity: usize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(EVENT_CHANNEL_CAPACITY)
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx, capacity }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.tx.subscribe()
    }

    /// Subscribes as a `Stream`. Lag shows up as `Err` items.
    pub fn subscribe_stream(&self) -> BroadcastStream<PipelineEvent> {
        BroadcastStream::new(self.tx.subscribe())
    }

    /// Sends to current subscribers. Fails if nobody is listening.
    pub fn emit(
        &self,
        event: PipelineEvent,
    ) -> Result<usize, broadcast::error::SendError<PipelineEvent>> {
        self.tx.send(event)
    }

    /// Sends, ignoring the absence of subscribers.
    pub fn emit_lossy(&self, event: PipelineEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Logs every event on `bus` through `tracing` until the bus is dropped.
pub fn spawn_event_logger(bus: &EventBus) -> JoinHandle<()> {
    let mut events = bus.subscribe_stream();
    tokio::spawn(async move {
        while let Some(item) = events.next().await {
            match item {
                Ok(event) => log_event(&event),
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    warn!(skipped, "Event logger lagged");
                }
            }
        }
    })
}

fn log_event(event: &PipelineEvent) {
    match event {
        PipelineEvent::QueryStarted { run_id, query, .. } => {
            info!(%run_id, query = %query, "Query started");
        }
        PipelineEvent::PageFetched {
            run_id,
            offset,
            count,
        } => {
            debug!(%run_id, offset, count, "Page fetched");
        }
        PipelineEvent::DocumentScored {
            doc_id,
            vector_score,
            composite_score,
            passed,
            ..
        } => {
            debug!(doc_id = %doc_id, vector_score, composite_score, passed, "Document scored");
        }
        PipelineEvent::FastPathActivated {
            doc_id, snapshot, ..
        } => {
            info!(
                doc_id = %doc_id,
                processed = snapshot.processed,
                yield_rate = snapshot.yield_rate,
                "Fast path active for remainder of query"
            );
        }
        PipelineEvent::FailFastTriggered {
            doc_id, snapshot, ..
        } => {
            warn!(doc_id = %doc_id, processed = snapshot.processed, "Query aborted for low yield");
        }
        PipelineEvent::DocumentFinalized {
            doc_id, outcome, ..
        } => {
            debug!(doc_id = %doc_id, outcome = %outcome, "Document finalized");
        }
        PipelineEvent::QueryCompleted { run_id, summary } => {
            info!(
                %run_id,
                processed = summary.processed,
                qualified = summary.total_qualified(),
                oracle_calls = summary.oracle_calls,
                termination = ?summary.termination,
                "Query completed"
            );
        }
    }
}
