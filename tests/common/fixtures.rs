use std::sync::Arc;
use std::time::Duration;

use triage::{
    Document, MemorySink, MockEmbeddingProvider, MockOracle, MockSource, Orchestrator,
    PipelineConfig, RuleScorer, SpeedupPolicy,
};

pub const QUERY: &str = "solid-state electrolytes";

/// A document that embeds at `similarity` to the query.
pub fn doc_at(id: &str, similarity: f32) -> (Document, Vec<f32>) {
    let similarity = similarity.clamp(-1.0, 1.0);
    let document = Document::new(id, format!("Paper {}", id), format!("Abstract of {}", id));
    let embedding = vec![similarity, (1.0 - similarity * similarity).sqrt()];
    (document, embedding)
}

/// `count` documents that all pass the vector pre-filter.
pub fn passing_docs(count: usize) -> Vec<(Document, Vec<f32>)> {
    (1..=count).map(|i| doc_at(&format!("d{:02}", i), 0.9)).collect()
}

pub fn config(sample_size: u32, target_qualify_rate: f32, fail_fast: bool) -> PipelineConfig {
    PipelineConfig {
        speedup: SpeedupPolicy {
            sample_size,
            target_qualify_rate,
            fail_fast,
        },
        page_size: 4,
        embed_chunk_size: 2,
        embed_chunk_delay: Duration::ZERO,
        judgment_timeout: Duration::from_secs(5),
        ..Default::default()
    }
}

pub struct Pipeline {
    pub orchestrator: Orchestrator,
    pub sink: MemorySink,
    pub oracle: Arc<MockOracle>,
    pub embedder: Arc<MockEmbeddingProvider>,
}

pub fn pipeline(
    config: &PipelineConfig,
    documents: Vec<(Document, Vec<f32>)>,
    oracle: MockOracle,
) -> Pipeline {
    let embedder = MockEmbeddingProvider::new().with(QUERY, vec![1.0, 0.0]);
    for (document, embedding) in &documents {
        embedder.insert(document.embedding_text(), embedding.clone());
    }
    let embedder = Arc::new(embedder);
    let oracle = Arc::new(oracle);
    let sink = MemorySink::new();
    let source = MockSource::new(documents.into_iter().map(|(d, _)| d).collect());

    let orchestrator = Orchestrator::new(
        config,
        Arc::new(source),
        embedder.clone(),
        oracle.clone(),
        RuleScorer::default(),
        Arc::new(sink.clone()),
    );

    Pipeline {
        orchestrator,
        sink,
        oracle,
        embedder,
    }
}
