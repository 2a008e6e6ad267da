use std::sync::Arc;

use super::error::EmbeddingError;
use super::http::{HttpEmbeddingConfig, HttpEmbeddingProvider};
use super::mock::MockEmbeddingProvider;
use super::provider::{CachedEmbeddingProvider, EmbeddingProvider, embed_or_absent, prepare_rules};
use crate::scoring::SemanticRule;

#[tokio::test]
async fn test_embed_or_absent_maps_failures_to_none() {
    let provider = MockEmbeddingProvider::new()
        .with("known", vec![1.0, 0.0])
        .failing_on("broken");

    assert_eq!(embed_or_absent(&provider, "known").await, Some(vec![1.0, 0.0]));
    assert_eq!(embed_or_absent(&provider, "broken").await, None);
    assert_eq!(embed_or_absent(&provider, "unknown").await, None);
}

#[tokio::test]
async fn test_embed_or_absent_skips_blank_text() {
    let provider = MockEmbeddingProvider::new();

    assert_eq!(embed_or_absent(&provider, "   ").await, None);
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn test_prepare_rules_embeds_enabled_only() {
    let provider = MockEmbeddingProvider::new()
        .with("wanted", vec![1.0, 0.0])
        .with("off", vec![0.0, 1.0])
        .failing_on("flaky");

    let prepared = prepare_rules(
        &provider,
        vec![
            SemanticRule::requirement("a", "wanted"),
            SemanticRule::penalty("b", "off").disabled(),
            SemanticRule::requirement("c", "flaky"),
        ],
    )
    .await;

    assert_eq!(prepared.len(), 3);
    assert_eq!(prepared[0].embedding, Some(vec![1.0, 0.0]));
    assert_eq!(prepared[1].embedding, None);
    assert_eq!(prepared[2].embedding, None);
    assert_eq!(provider.call_count(), 2);
}

#[tokio::test]
async fn test_cached_provider_memoizes_hits() {
    let inner = Arc::new(MockEmbeddingProvider::new().with("text", vec![0.5, 0.5]));
    let cached = CachedEmbeddingProvider::new(Arc::clone(&inner));

    let first = cached.embed("text").await.expect("embed");
    let second = cached.embed("text").await.expect("embed");

    assert_eq!(first, second);
    assert_eq!(inner.call_count(), 1);
    assert_eq!(cached.model_name(), "mock-embedding");
}

#[tokio::test]
async fn test_cached_provider_does_not_cache_failures() {
    let inner = Arc::new(MockEmbeddingProvider::new().failing_on("bad"));
    let cached = CachedEmbeddingProvider::new(Arc::clone(&inner));

    assert!(cached.embed("bad").await.is_err());
    assert!(cached.embed("bad").await.is_err());
    assert_eq!(inner.call_count(), 2);
}

#[test]
fn test_http_provider_rejects_empty_config() {
    let result = HttpEmbeddingProvider::new(HttpEmbeddingConfig::new("", "model"));
    assert!(matches!(result, Err(EmbeddingError::InvalidConfig { .. })));

    let result = HttpEmbeddingProvider::new(HttpEmbeddingConfig::new("http://localhost", " "));
    assert!(matches!(result, Err(EmbeddingError::InvalidConfig { .. })));
}

#[tokio::test]
async fn test_http_provider_rejects_empty_input() {
    let provider =
        HttpEmbeddingProvider::new(HttpEmbeddingConfig::new("http://127.0.0.1:9", "model"))
            .expect("valid config");

    assert!(matches!(
        provider.embed("").await,
        Err(EmbeddingError::EmptyInput)
    ));
}

#[tokio::test]
async fn test_http_provider_connection_failure_is_error() {
    let provider =
        HttpEmbeddingProvider::new(HttpEmbeddingConfig::new("http://127.0.0.1:9", "model"))
            .expect("valid config");

    assert!(embed_or_absent(&provider, "text").await.is_none());
}
