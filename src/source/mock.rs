//! In-memory source for tests.

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::CandidateSource;
use super::error::{SourceError, SourceResult};
use crate::document::Document;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchCall {
    pub query: String,
    pub offset: usize,
    pub limit: usize,
}

/// Paginates a fixed document list and can fail on demand.
pub struct MockSource {
    documents: Vec<Document>,
    transient_failures: AtomicU32,
    fail_at_offset: Option<usize>,
    page_cap: Option<usize>,
    calls: Mutex<Vec<FetchCall>>,
}

impl MockSource {
    pub fn new(documents: Vec<Document>) -> Self {
        Self {
            documents,
            transient_failures: AtomicU32::new(0),
            fail_at_offset: None,
            page_cap: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// The next `count` fetches fail with a transport error.
    pub fn failing_times(self, count: u32) -> Self {
        self.transient_failures.store(count, Ordering::SeqCst);
        self
    }

    /// Every fetch at `offset` fails.
    pub fn failing_at(mut self, offset: usize) -> Self {
        self.fail_at_offset = Some(offset);
        self
    }

    /// Never returns more than `cap` documents, whatever `limit` asks for.
    pub fn capped_at(mut self, cap: usize) -> Self {
        self.page_cap = Some(cap);
        self
    }

    pub fn calls(&self) -> Vec<FetchCall> {
        self.calls.lock().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl CandidateSource for MockSource {
    async fn fetch_page(
        &self,
        query: &str,
        offset: usize,
        limit: usize,
    ) -> SourceResult<Vec<Document>> {
        self.calls.lock().push(FetchCall {
            query: query.to_string(),
            offset,
            limit,
        });

        if self.fail_at_offset == Some(offset) {
            return Err(SourceError::Transport(format!("mock failure at offset {}", offset)));
        }

        let remaining = self.transient_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.transient_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(SourceError::Transport("mock transient failure".to_string()));
        }

        Ok(self
            .documents
            .iter()
            .skip(offset)
            .take(self.page_cap.map_or(limit, |cap| cap.min(limit)))
            .cloned()
            .collect())
    }
}
