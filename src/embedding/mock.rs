//! In-memory embedding provider for tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::document::Embedding;

use super::error::{EmbeddingError, EmbeddingResult};
use super::provider::EmbeddingProvider;

/// Returns canned embeddings keyed by exact input text.
///
/// Unknown text yields an empty vector (treated as absent by the pipeline).
#[derive(Default)]
pub struct MockEmbeddingProvider {
    embeddings: RwLock<HashMap<String, Embedding>>,
    failing: RwLock<HashSet<String>>,
    delays: RwLock<HashMap<String, Duration>>,
    latency: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl MockEmbeddingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the embedding returned for `text`.
    pub fn with(self, text: impl Into<String>, embedding: Embedding) -> Self {
        self.embeddings.write().insert(text.into(), embedding);
        self
    }

    /// Makes every call for `text` fail.
    pub fn failing_on(self, text: impl Into<String>) -> Self {
        self.failing.write().insert(text.into());
        self
    }

    /// Delays the response for `text`, to shuffle completion order.
    pub fn delayed(self, text: impl Into<String>, delay: Duration) -> Self {
        self.delays.write().insert(text.into(), delay);
        self
    }

    /// Delays every response by `latency`, on top of any per-text delay.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn insert(&self, text: impl Into<String>, embedding: Embedding) {
        self.embeddings.write().insert(text.into(), embedding);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of `embed` calls that were running at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

/// Counts a call as in flight until dropped, including when it is cancelled.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize, peak: &AtomicUsize) -> Self {
        let now = counter.fetch_add(1, Ordering::SeqCst) + 1;
        peak.fetch_max(now, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed(&self, text: &str) -> EmbeddingResult<Embedding> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let _in_flight = InFlight::enter(&self.in_flight, &self.peak_in_flight);

        let delay = self.delays.read().get(text).copied().unwrap_or_default();
        let delay = delay + self.latency;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if self.failing.read().contains(text) {
            return Err(EmbeddingError::RequestFailed {
                reason: format!("mock failure for '{}'", text),
            });
        }

        Ok(self.embeddings.read().get(text).cloned().unwrap_or_default())
    }

    fn model_name(&self) -> &str {
        "mock-embedding"
    }
}
