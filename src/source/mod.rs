//! Candidate sources: paginated providers of documents for a query.

pub mod error;
pub mod json;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod retry;

#[cfg(test)]
mod tests;

use async_trait::async_trait;

use crate::document::Document;

pub use error::{SourceError, SourceResult};
pub use json::JsonFileSource;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockSource;
pub use retry::RetryingSource;

#[async_trait]
/// Paginated candidate retrieval.
///
/// Only an empty page means the source is exhausted for this query. A
/// source may return fewer than `limit` documents at any time; the caller
/// advances `offset` by what it received and keeps fetching.
pub trait CandidateSource: Send + Sync {
    async fn fetch_page(&self, query: &str, offset: usize, limit: usize)
    -> SourceResult<Vec<Document>>;
}

#[async_trait]
impl<S: CandidateSource + ?Sized> CandidateSource for std::sync::Arc<S> {
    async fn fetch_page(
        &self,
        query: &str,
        offset: usize,
        limit: usize,
    ) -> SourceResult<Vec<Document>> {
        (**self).fetch_page(query, offset, limit).await
    }
}
