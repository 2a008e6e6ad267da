//! Embedding providers.
//!
//! - [`provider`] defines [`EmbeddingProvider`] plus the caching wrapper and
//!   rule preparation.
//! - [`http`] talks to an OpenAI-compatible `/embeddings` endpoint.
//!
//! Providers return `Result`, but the pipeline never lets an embedding failure
//! escape a document: see [`embed_or_absent`].

mod error;
pub mod http;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod provider;

#[cfg(test)]
mod tests;

pub use error::{EmbeddingError, EmbeddingResult};
pub use http::{HttpEmbeddingConfig, HttpEmbeddingProvider};
#[cfg(any(test, feature = "mock"))]
pub use mock::MockEmbeddingProvider;
pub use provider::{CachedEmbeddingProvider, EmbeddingProvider, embed_or_absent, prepare_rules};
