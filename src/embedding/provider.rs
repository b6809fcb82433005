use std::sync::Arc;

use clap::ValueEnum;
use tracing::info;

use super::clock::Clock;
use super::rate_limit::{DEFAULT_REQUESTS_PER_MINUTE, RateLimiter};
use super::{
    Embedder, EmbeddingBackend, EmbeddingClient, EmbeddingError, GeminiBackend, OpenAiBackend,
    http_client,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum ProviderKind {
    Gemini,
    #[value(name = "openai")]
    OpenAi,
}

impl ProviderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::OpenAi => "openai",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderCredentials {
    pub gemini_api_key: Option<String>,
    pub openai_api_key: Option<String>,
}

/// Explicit choice first, then OpenAI when its key is present, else Gemini.
pub fn resolve_provider(
    explicit: Option<ProviderKind>,
    credentials: &ProviderCredentials,
) -> ProviderKind {
    if let Some(kind) = explicit {
        return kind;
    }
    if credentials.openai_api_key.is_some() {
        ProviderKind::OpenAi
    } else {
        ProviderKind::Gemini
    }
}

#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub provider: ProviderKind,
    pub credentials: ProviderCredentials,
    pub model: Option<String>,
    pub gemini_base_url: Option<String>,
    pub openai_base_url: Option<String>,
    pub requests_per_minute: usize,
}

impl ProviderSettings {
    pub fn new(provider: ProviderKind, credentials: ProviderCredentials) -> Self {
        Self {
            provider,
            credentials,
            model: None,
            gemini_base_url: None,
            openai_base_url: None,
            requests_per_minute: DEFAULT_REQUESTS_PER_MINUTE,
        }
    }
}

/// Builds the embedder for the resolved provider. Only Gemini carries a
/// request quota.
pub fn build_embedder(
    settings: &ProviderSettings,
    clock: Arc<dyn Clock>,
) -> Result<Box<dyn Embedder>, EmbeddingError> {
    let client = http_client()?;

    match settings.provider {
        ProviderKind::Gemini => {
            let api_key = settings
                .credentials
                .gemini_api_key
                .clone()
                .ok_or(EmbeddingError::MissingApiKey("gemini"))?;
            let mut backend = GeminiBackend::new(api_key, client);
            if let Some(url) = &settings.gemini_base_url {
                backend = backend.with_base_url(url.as_str());
            }
            if let Some(model) = &settings.model {
                backend = backend.with_model(model);
            }
            let limiter = RateLimiter::new(settings.requests_per_minute, clock.clone());
            info!(
                provider = "gemini",
                model = %backend.model(),
                requests_per_minute = limiter.limit(),
                "embedding provider ready"
            );
            Ok(Box::new(
                EmbeddingClient::new(backend, clock).with_rate_limiter(limiter),
            ))
        }
        ProviderKind::OpenAi => {
            let api_key = settings
                .credentials
                .openai_api_key
                .clone()
                .ok_or(EmbeddingError::MissingApiKey("openai"))?;
            let mut backend = OpenAiBackend::new(api_key, client);
            if let Some(url) = &settings.openai_base_url {
                backend = backend.with_base_url(url.as_str());
            }
            if let Some(model) = &settings.model {
                backend = backend.with_model(model.as_str());
            }
            info!(
                provider = "openai",
                model = %backend.model(),
                "embedding provider ready"
            );
            Ok(Box::new(EmbeddingClient::new(backend, clock)))
        }
    }
}
