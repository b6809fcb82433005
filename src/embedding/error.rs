use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("embedding provider `{0}` has no API key configured")]
    MissingApiKey(&'static str),

    #[error("provider returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("provider rate limit exceeded (HTTP 429)")]
    RateLimited,

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}
