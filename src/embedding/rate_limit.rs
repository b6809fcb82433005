use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::warn;

use super::clock::Clock;

pub const DEFAULT_REQUESTS_PER_MINUTE: usize = 150;
const WINDOW: Duration = Duration::from_secs(60);

#[derive(Debug)]
struct WindowState {
    count: usize,
    window_start: DateTime<Utc>,
}

/// Fixed-quota limiter over a 60-second window.
///
/// Once `limit` requests were counted inside the current window the caller
/// blocks for the rest of the window; the window then restarts at the moment
/// the wait ends.
pub struct RateLimiter {
    limit: usize,
    clock: Arc<dyn Clock>,
    state: Mutex<WindowState>,
}

impl RateLimiter {
    pub fn new(limit: usize, clock: Arc<dyn Clock>) -> Self {
        let window_start = clock.now();
        Self {
            limit: limit.max(1),
            clock,
            state: Mutex::new(WindowState {
                count: 0,
                window_start,
            }),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Counts one request, blocking first when the quota is spent.
    ///
    /// Returns how long the caller was held back, if at all.
    pub fn acquire(&self) -> Option<Duration> {
        let mut state = self.state.lock();
        let elapsed = (self.clock.now() - state.window_start)
            .to_std()
            .unwrap_or(Duration::ZERO);

        let mut waited = None;
        if elapsed < WINDOW && state.count >= self.limit {
            let wait = WINDOW - elapsed;
            warn!(
                wait_secs = wait.as_secs_f64(),
                limit = self.limit,
                "requests-per-minute limit reached; waiting"
            );
            self.clock.sleep(wait);
            state.count = 0;
            state.window_start = self.clock.now();
            waited = Some(wait);
        } else if elapsed >= WINDOW {
            state.count = 0;
            state.window_start = self.clock.now();
        }

        state.count += 1;
        waited
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::clock::manual::ManualClock;

    fn manual_limiter(limit: usize) -> (RateLimiter, ManualClock) {
        let clock = ManualClock::new();
        let limiter = RateLimiter::new(limit, Arc::new(clock.clone()));
        (limiter, clock)
    }

    #[test]
    fn blocks_once_quota_is_reached_within_window() {
        let (limiter, clock) = manual_limiter(DEFAULT_REQUESTS_PER_MINUTE);

        for _ in 0..DEFAULT_REQUESTS_PER_MINUTE {
            assert_eq!(limiter.acquire(), None);
        }
        assert!(clock.sleeps().is_empty());

        assert_eq!(limiter.acquire(), Some(Duration::from_secs(60)));
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(60)]);
    }

    #[test]
    fn waits_only_for_the_remainder_of_the_window() {
        let (limiter, clock) = manual_limiter(3);
        for _ in 0..3 {
            limiter.acquire();
        }
        clock.advance(Duration::from_secs(45));

        assert_eq!(limiter.acquire(), Some(Duration::from_secs(15)));
    }

    #[test]
    fn window_restarts_after_forced_wait() {
        let (limiter, clock) = manual_limiter(2);
        limiter.acquire();
        limiter.acquire();
        assert!(limiter.acquire().is_some());

        // The wait reset the window and counted one request in it.
        assert_eq!(limiter.acquire(), None);
        assert_eq!(limiter.acquire(), Some(Duration::from_secs(60)));
        assert_eq!(clock.sleeps().len(), 2);
    }

    #[test]
    fn counter_resets_when_window_elapses_without_waiting() {
        let (limiter, clock) = manual_limiter(2);
        limiter.acquire();
        limiter.acquire();
        clock.advance(Duration::from_secs(61));

        assert_eq!(limiter.acquire(), None);
        assert_eq!(limiter.acquire(), None);
        assert!(clock.sleeps().is_empty());
    }
}
