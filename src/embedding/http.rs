//! OpenAI-compatible embeddings client.
//!
//! Works with any server exposing `POST /embeddings` with the OpenAI request and
//! response shape (OpenAI, Ollama, vLLM, LM Studio, ...).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::PipelineConfig;
use crate::document::Embedding;

use super::error::{EmbeddingError, EmbeddingResult};
use super::provider::EmbeddingProvider;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_ERROR_BODY_CHARS: usize = 512;

#[derive(Debug, Clone)]
/// Endpoint settings for [`HttpEmbeddingProvider`].
pub struct HttpEmbeddingConfig {
    pub url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl HttpEmbeddingConfig {
    pub fn new(url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            model: model.into(),
            api_key: None,
            timeout: REQUEST_TIMEOUT,
        }
    }

    pub fn from_pipeline_config(config: &PipelineConfig) -> Self {
        Self {
            url: config.embedding_url.clone(),
            model: config.embedding_model.clone(),
            api_key: config.embedding_api_key.clone(),
            timeout: REQUEST_TIMEOUT,
        }
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}

/// Embedding provider backed by an HTTP endpoint.
pub struct HttpEmbeddingProvider {
    http: HttpClient,
    config: HttpEmbeddingConfig,
}

impl std::fmt::Debug for HttpEmbeddingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpEmbeddingProvider")
            .field("url", &self.config.url)
            .field("model", &self.config.model)
            .field("has_api_key", &self.config.api_key.is_some())
            .finish()
    }
}

impl HttpEmbeddingProvider {
    pub fn new(config: HttpEmbeddingConfig) -> EmbeddingResult<Self> {
        if config.url.trim().is_empty() {
            return Err(EmbeddingError::InvalidConfig {
                reason: "embedding url is empty".to_string(),
            });
        }
        if config.model.trim().is_empty() {
            return Err(EmbeddingError::InvalidConfig {
                reason: "embedding model is empty".to_string(),
            });
        }

        let http = HttpClient::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| EmbeddingError::InvalidConfig {
                reason: e.to_string(),
            })?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &HttpEmbeddingConfig {
        &self.config
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    async fn embed(&self, text: &str) -> EmbeddingResult<Embedding> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::EmptyInput);
        }

        let mut request = self.http.post(&self.config.url).json(&EmbeddingRequest {
            model: &self.config.model,
            input: text,
        });
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::BadStatus {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        let parsed: EmbeddingResponse =
            response
                .json()
                .await
                .map_err(|e| EmbeddingError::MalformedResponse {
                    reason: e.to_string(),
                })?;

        let embedding = parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| EmbeddingError::MalformedResponse {
                reason: "response contained no embeddings".to_string(),
            })?;

        debug!(
            model = %self.config.model,
            dim = embedding.len(),
            text_len = text.len(),
            "Embedded text"
        );

        Ok(embedding)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
