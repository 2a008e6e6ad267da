//! Oracle backed by a chat model through `genai`.
//!
//! Provider selection and credentials follow `genai`'s conventions (the model
//! name picks the adapter, keys come from the usual `*_API_KEY` variables).

use async_trait::async_trait;
use ::genai::Client;
use ::genai::chat::{ChatMessage, ChatOptions, ChatRequest};
use tracing::debug;

use super::JudgmentOracle;
use super::error::{OracleError, OracleResult};
use super::parse::parse_verdict;
use super::prompt::{SYSTEM_PROMPT, build_user_prompt};
use super::types::{JudgmentRequest, OracleVerdict};

pub struct GenaiOracle {
    client: Client,
    model: String,
    options: ChatOptions,
}

impl std::fmt::Debug for GenaiOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenaiOracle")
            .field("model", &self.model)
            .finish()
    }
}

impl GenaiOracle {
    pub fn new(model: impl Into<String>) -> Self {
        Self::with_client(Client::default(), model)
    }

    pub fn with_client(client: Client, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            options: ChatOptions::default().with_temperature(0.0),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(request: &JudgmentRequest) -> ChatRequest {
        ChatRequest::new(vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(build_user_prompt(request)),
        ])
    }
}

#[async_trait]
impl JudgmentOracle for GenaiOracle {
    async fn judge(&self, request: &JudgmentRequest) -> OracleResult<OracleVerdict> {
        let chat_request = Self::build_request(request);

        let response = self
            .client
            .exec_chat(&self.model, chat_request, Some(&self.options))
            .await
            .map_err(|e| OracleError::Transport(e.to_string()))?;

        let text = response.first_text().ok_or(OracleError::EmptyResponse)?;

        debug!(
            model = %self.model,
            doc_id = %request.document.id,
            corrective = request.is_corrective(),
            response_len = text.len(),
            "Oracle responded"
        );

        parse_verdict(text)
    }
}
