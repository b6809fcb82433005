//! Embedding providers behind one blocking interface.
//!
//! ```text
//! Embedder ──► EmbeddingClient ──► RateLimiter (Gemini only)
//!                    │
//!                    ▼
//!            EmbeddingBackend ──► GeminiBackend / OpenAiBackend
//! ```
//!
//! A failed embedding is reported as `None` after the retry budget is spent;
//! callers turn that into an in-band status instead of aborting the run.

mod client;
pub mod clock;
mod error;
mod gemini;
mod openai;
mod provider;
pub mod rate_limit;

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};

pub use client::{Embedder, EmbeddingClient};
pub use error::EmbeddingError;
pub use gemini::GeminiBackend;
pub use openai::OpenAiBackend;
pub use provider::{
    ProviderCredentials, ProviderKind, ProviderSettings, build_embedder, resolve_provider,
};

use crate::model::Embedding;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// One provider request, no retries.
pub trait EmbeddingBackend: Send + Sync {
    fn name(&self) -> &'static str;

    fn model(&self) -> &str;

    fn request_embedding(&self, text: &str) -> Result<Embedding, EmbeddingError>;
}

pub fn http_client() -> Result<Client, EmbeddingError> {
    Ok(Client::builder().timeout(HTTP_TIMEOUT).build()?)
}

fn ensure_success(response: Response) -> Result<Response, EmbeddingError> {
    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(EmbeddingError::RateLimited);
    }
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(EmbeddingError::Api {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response)
}

fn non_empty(embedding: Embedding) -> Result<Embedding, EmbeddingError> {
    if embedding.is_empty() {
        return Err(EmbeddingError::InvalidResponse(
            "provider returned an empty embedding".to_string(),
        ));
    }
    Ok(embedding)
}
