//! Triage CLI entrypoint.
//!
//! Usage: `triage <candidates.json> <query> [<query> ...]`
//!
//! Qualification records are written to stdout as JSON lines, followed by one
//! summary line per query.

use std::sync::Arc;

use anyhow::{Context, bail};
use mimalloc::MiMalloc;
use tokio::signal;
use tokio_util::sync::CancellationToken;

use triage::embedding::CachedEmbeddingProvider;
use triage::{
    ChannelSink, GenaiOracle, HttpEmbeddingConfig, HttpEmbeddingProvider, JsonFileSource,
    Orchestrator, PipelineConfig, QueryRequest, RetryingSource, RuleScorer, prepare_rules,
    spawn_event_logger,
};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const RECORD_BUFFER: usize = 256;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let Some(candidates_path) = args.next() else {
        bail!("usage: triage <candidates.json> <query> [<query> ...]");
    };
    let queries: Vec<String> = args.filter(|q| !q.trim().is_empty()).collect();
    if queries.is_empty() {
        bail!("at least one query is required");
    }

    let config = PipelineConfig::from_env()?;
    config.validate()?;

    tracing::info!(
        candidates = %candidates_path,
        queries = queries.len(),
        oracle_model = %config.oracle_model,
        embedding_model = %config.embedding_model,
        "Triage starting"
    );

    let source = JsonFileSource::open(&candidates_path)
        .with_context(|| format!("loading candidates from {}", candidates_path))?;
    let source = RetryingSource::from_config(source, &config);

    let embedder = HttpEmbeddingProvider::new(HttpEmbeddingConfig::from_pipeline_config(&config))?;
    let embedder = Arc::new(CachedEmbeddingProvider::new(embedder));

    let rules = prepare_rules(embedder.as_ref(), config.load_rules()?).await;
    let scorer = RuleScorer::new(rules);
    tracing::info!(
        rules = scorer.rules().len(),
        usable = scorer.usable_rules(),
        "Semantic rules prepared"
    );

    let oracle = Arc::new(GenaiOracle::new(config.oracle_model.clone()));
    let (sink, mut records) = ChannelSink::channel(RECORD_BUFFER);

    let orchestrator = Orchestrator::new(
        &config,
        Arc::new(source),
        embedder,
        oracle,
        scorer,
        Arc::new(sink),
    );
    let logger = spawn_event_logger(orchestrator.events());

    let printer = tokio::spawn(async move {
        while let Some(record) = records.recv().await {
            match serde_json::to_string(&record) {
                Ok(line) => println!("{}", line),
                Err(e) => tracing::error!(doc_id = %record.document.id, error = %e, "Failed to serialize record"),
            }
        }
    });

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_signal(cancel.clone()));

    let requests = queries
        .into_iter()
        .map(|query| QueryRequest::from_config(query, &config))
        .collect();
    let summaries = orchestrator.run_queue(requests, &cancel).await?;

    // Closes the record channel and the event bus.
    drop(orchestrator);
    printer.await?;
    logger.await?;

    for summary in &summaries {
        println!("{}", serde_json::to_string(summary)?);
    }

    tracing::info!(queries = summaries.len(), "Triage complete");
    Ok(())
}

async fn cancel_on_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, cancelling after the current document");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, cancelling after the current document");
        }
    }

    cancel.cancel();
}
