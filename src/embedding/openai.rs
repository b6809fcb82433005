use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::debug;

use super::{EmbeddingBackend, EmbeddingError, ensure_success, non_empty};
use crate::model::Embedding;

pub const OPENAI_EMBEDDING_MODEL: &str = "text-embedding-ada-002";
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI `/embeddings` backend; any compatible host works through `with_base_url`.
pub struct OpenAiBackend {
    api_key: String,
    base_url: String,
    model: String,
    client: Client,
}

impl OpenAiBackend {
    pub fn new(api_key: impl Into<String>, client: Client) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: OPENAI_BASE_URL.to_string(),
            model: OPENAI_EMBEDDING_MODEL.to_string(),
            client,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl EmbeddingBackend for OpenAiBackend {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn request_embedding(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        debug!(model = %self.model, chars = text.chars().count(), "requesting openai embedding");

        let body = serde_json::json!({
            "input": [text],
            "model": self.model
        });

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url.trim_end_matches('/')))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()?;

        let parsed: EmbeddingsResponse = ensure_success(response)?.json()?;
        let first = parsed.data.into_iter().next().ok_or_else(|| {
            EmbeddingError::InvalidResponse("no embedding in response".to_string())
        })?;
        non_empty(first.embedding)
    }
}
