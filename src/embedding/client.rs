use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use super::EmbeddingBackend;
use super::clock::Clock;
use super::rate_limit::RateLimiter;
use crate::model::Embedding;

/// Source of embeddings for the evaluators. `None` means no embedding is
/// available for this text.
pub trait Embedder {
    fn embed(&self, text: &str) -> Option<Embedding>;
}

impl<F> Embedder for F
where
    F: Fn(&str) -> Option<Embedding>,
{
    fn embed(&self, text: &str) -> Option<Embedding> {
        self(text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Delay after the failed 0-based `attempt`: base, 2x base, 4x base, ...
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2_u32.saturating_pow(attempt))
    }
}

/// Backend wrapped with retry, backoff and an optional request quota.
pub struct EmbeddingClient<B> {
    backend: B,
    retry: RetryPolicy,
    limiter: Option<RateLimiter>,
    clock: Arc<dyn Clock>,
}

impl<B: EmbeddingBackend> EmbeddingClient<B> {
    pub fn new(backend: B, clock: Arc<dyn Clock>) -> Self {
        Self {
            backend,
            retry: RetryPolicy::default(),
            limiter: None,
            clock,
        }
    }

    pub fn with_rate_limiter(mut self, limiter: RateLimiter) -> Self {
        self.limiter = Some(limiter);
        self
    }
}

impl<B: EmbeddingBackend> Embedder for EmbeddingClient<B> {
    fn embed(&self, text: &str) -> Option<Embedding> {
        if let Some(limiter) = &self.limiter {
            limiter.acquire();
        }

        let max_attempts = self.retry.max_attempts.max(1);
        for attempt in 0..max_attempts {
            match self.backend.request_embedding(text) {
                Ok(embedding) => return Some(embedding),
                Err(err) => {
                    warn!(
                        provider = self.backend.name(),
                        model = %self.backend.model(),
                        attempt = attempt + 1,
                        max_attempts,
                        error = %err,
                        "embedding request failed"
                    );
                    if attempt + 1 < max_attempts {
                        self.clock.sleep(self.retry.backoff(attempt));
                    }
                }
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::embedding::EmbeddingError;
    use crate::embedding::clock::manual::ManualClock;

    struct FlakyBackend {
        failures_before_success: usize,
        calls: AtomicUsize,
    }

    impl FlakyBackend {
        fn new(failures_before_success: usize) -> Self {
            Self {
                failures_before_success,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl EmbeddingBackend for FlakyBackend {
        fn name(&self) -> &'static str {
            "flaky"
        }

        fn model(&self) -> &str {
            "test-model"
        }

        fn request_embedding(&self, _text: &str) -> Result<Embedding, EmbeddingError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures_before_success {
                return Err(EmbeddingError::InvalidResponse("boom".to_string()));
            }
            Ok(vec![1.0, 0.0])
        }
    }

    #[test]
    fn backoff_doubles_from_base_delay() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(0), Duration::from_secs(1));
        assert_eq!(policy.backoff(1), Duration::from_secs(2));
        assert_eq!(policy.backoff(2), Duration::from_secs(4));
    }

    #[test]
    fn retries_until_success() {
        let clock = ManualClock::new();
        let client = EmbeddingClient::new(FlakyBackend::new(2), Arc::new(clock.clone()));

        assert_eq!(client.embed("text"), Some(vec![1.0, 0.0]));
        assert_eq!(
            clock.sleeps(),
            vec![Duration::from_secs(1), Duration::from_secs(2)]
        );
    }

    #[test]
    fn gives_up_after_three_attempts_without_trailing_sleep() {
        let clock = ManualClock::new();
        let client = EmbeddingClient::new(FlakyBackend::new(usize::MAX), Arc::new(clock.clone()));

        assert_eq!(client.embed("text"), None);
        assert_eq!(client.backend.calls.load(Ordering::SeqCst), 3);
        assert_eq!(
            clock.sleeps(),
            vec![Duration::from_secs(1), Duration::from_secs(2)]
        );
    }

    #[test]
    fn rate_limiter_counts_calls_not_attempts() {
        let clock = ManualClock::new();
        let shared: Arc<dyn Clock> = Arc::new(clock.clone());
        let client = EmbeddingClient::new(FlakyBackend::new(0), shared.clone())
            .with_rate_limiter(RateLimiter::new(2, shared));

        client.embed("a");
        client.embed("b");
        assert!(clock.sleeps().is_empty());

        client.embed("c");
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(60)]);
    }

    #[test]
    fn closures_act_as_embedders() {
        let embedder = |text: &str| (text == "known").then(|| vec![0.5_f32]);
        assert_eq!(embedder.embed("known"), Some(vec![0.5]));
        assert_eq!(embedder.embed("other"), None);
    }
}
