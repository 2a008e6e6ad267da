use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::join_all;
use moka::sync::Cache;
use tracing::{debug, warn};

use crate::constants::EMBEDDING_CACHE_CAPACITY;
use crate::document::Embedding;
use crate::scoring::{PreparedRule, SemanticRule};

use super::error::EmbeddingResult;

#[async_trait]
/// Turns text into an embedding vector.
pub trait EmbeddingProvider: Send + Sync {
    /// Embeds `text`. Implementations should not fail for ordinary content.
    async fn embed(&self, text: &str) -> EmbeddingResult<Embedding>;

    /// Model identifier, used for logging and cache scoping.
    fn model_name(&self) -> &str;
}

#[async_trait]
impl<P: EmbeddingProvider + ?Sized> EmbeddingProvider for Arc<P> {
    async fn embed(&self, text: &str) -> EmbeddingResult<Embedding> {
        (**self).embed(text).await
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}

/// Embeds `text`, mapping any failure (or an empty vector) to `None`.
pub async fn embed_or_absent<P: EmbeddingProvider + ?Sized>(
    provider: &P,
    text: &str,
) -> Option<Embedding> {
    if text.trim().is_empty() {
        return None;
    }

    match provider.embed(text).await {
        Ok(embedding) if !embedding.is_empty() => Some(embedding),
        Ok(_) => {
            debug!(model = provider.model_name(), "Provider returned an empty embedding");
            None
        }
        Err(e) => {
            warn!(model = provider.model_name(), error = %e, "Embedding failed, treating as absent");
            None
        }
    }
}

/// Precomputes embeddings for every enabled rule.
///
/// Disabled rules are kept (so the scorer can report them) but not embedded.
/// A rule whose embedding fails keeps `None` and simply stops contributing.
pub async fn prepare_rules<P: EmbeddingProvider + ?Sized>(
    provider: &P,
    rules: Vec<SemanticRule>,
) -> Vec<PreparedRule> {
    let embeddings = join_all(rules.iter().map(|rule| async move {
        if rule.enabled {
            embed_or_absent(provider, &rule.text).await
        } else {
            None
        }
    }))
    .await;

    let prepared: Vec<PreparedRule> = rules
        .into_iter()
        .zip(embeddings)
        .map(|(rule, embedding)| PreparedRule::new(rule, embedding))
        .collect();

    debug!(
        rules = prepared.len(),
        embedded = prepared.iter().filter(|r| r.embedding.is_some()).count(),
        "Prepared semantic rules"
    );

    prepared
}

/// Memoizes successful embeddings by content hash.
///
/// Failures are not cached, so a transient error is retried the next time the
/// same text shows up.
pub struct CachedEmbeddingProvider<P> {
    inner: P,
    cache: Cache<blake3::Hash, Arc<Embedding>>,
}

impl<P: EmbeddingProvider> std::fmt::Debug for CachedEmbeddingProvider<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedEmbeddingProvider")
            .field("model", &self.inner.model_name())
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

impl<P: EmbeddingProvider> CachedEmbeddingProvider<P> {
    pub fn new(inner: P) -> Self {
        Self::with_capacity(inner, EMBEDDING_CACHE_CAPACITY)
    }

    pub fn with_capacity(inner: P, capacity: u64) -> Self {
        Self {
            inner,
            cache: Cache::new(capacity),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    fn key(&self, text: &str) -> blake3::Hash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.inner.model_name().as_bytes());
        hasher.update(&[0]);
        hasher.update(text.as_bytes());
        hasher.finalize()
    }
}

#[async_trait]
impl<P: EmbeddingProvider> EmbeddingProvider for CachedEmbeddingProvider<P> {
    async fn embed(&self, text: &str) -> EmbeddingResult<Embedding> {
        let key = self.key(text);
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit.as_ref().clone());
        }

        let embedding = self.inner.embed(text).await?;
        self.cache.insert(key, Arc::new(embedding.clone()));
        Ok(embedding)
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}
