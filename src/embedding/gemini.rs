use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::debug;

use super::{EmbeddingBackend, EmbeddingError, ensure_success, non_empty};
use crate::model::Embedding;

pub const GEMINI_EMBEDDING_MODEL: &str = "models/embedding-001";
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Google Gemini `embedContent` backend.
pub struct GeminiBackend {
    api_key: String,
    base_url: String,
    model: String,
    client: Client,
}

impl GeminiBackend {
    pub fn new(api_key: impl Into<String>, client: Client) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: GEMINI_BASE_URL.to_string(),
            model: GEMINI_EMBEDDING_MODEL.to_string(),
            client,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Accepts either `embedding-001` or the fully qualified `models/embedding-001`.
    pub fn with_model(mut self, model: &str) -> Self {
        let model = model.trim();
        self.model = if model.starts_with("models/") {
            model.to_string()
        } else {
            format!("models/{model}")
        };
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/{}:embedContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

#[derive(Debug, Deserialize)]
struct EmbedContentResponse {
    embedding: ContentEmbedding,
}

#[derive(Debug, Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

impl EmbeddingBackend for GeminiBackend {
    fn name(&self) -> &'static str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn request_embedding(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        debug!(model = %self.model, chars = text.chars().count(), "requesting gemini embedding");

        let body = serde_json::json!({
            "model": self.model,
            "content": { "parts": [{ "text": text }] }
        });

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()?;

        let parsed: EmbedContentResponse = ensure_success(response)?.json()?;
        non_empty(parsed.embedding.values)
    }
}
