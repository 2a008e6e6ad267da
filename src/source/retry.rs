use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use super::CandidateSource;
use super::error::{SourceError, SourceResult};
use crate::config::PipelineConfig;
use crate::document::Document;

/// Retries transient page failures with a fixed backoff.
pub struct RetryingSource<S> {
    inner: S,
    attempts: u32,
    backoff: Duration,
}

impl<S> RetryingSource<S> {
    /// `attempts` counts the first try; at least one is always made.
    pub fn new(inner: S, attempts: u32, backoff: Duration) -> Self {
        Self {
            inner,
            attempts: attempts.max(1),
            backoff,
        }
    }

    pub fn from_config(inner: S, config: &PipelineConfig) -> Self {
        let attempts = u32::try_from(config.source_retries).unwrap_or(u32::MAX);
        Self::new(inner, attempts, config.source_backoff)
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: CandidateSource> CandidateSource for RetryingSource<S> {
    async fn fetch_page(
        &self,
        query: &str,
        offset: usize,
        limit: usize,
    ) -> SourceResult<Vec<Document>> {
        let attempts = self.attempts;
        let mut last_error = None;

        for attempt in 1..=attempts {
            match self.inner.fetch_page(query, offset, limit).await {
                Ok(page) => return Ok(page),
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) => {
                    warn!(
                        attempt,
                        attempts,
                        offset,
                        error = %e,
                        "Page fetch failed"
                    );
                    last_error = Some(e);
                    if attempt < attempts {
                        tokio::time::sleep(self.backoff).await;
                    }
                }
            }
        }

        Err(SourceError::Exhausted {
            attempts,
            reason: last_error.map(|e| e.to_string()).unwrap_or_default(),
        })
    }
}
