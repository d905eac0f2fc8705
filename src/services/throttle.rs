use std::num::NonZeroU32;
use std::time::Duration;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};

/// Process-wide pacing for outbound requests
///
/// Allows one request per `min_interval` with no burst. A zero interval
/// disables pacing entirely.
pub struct Throttle {
    limiter: Option<DefaultDirectRateLimiter>,
    min_interval: Duration,
}

impl Throttle {
    pub fn new(min_interval: Duration) -> Self {
        let limiter = Quota::with_period(min_interval)
            .map(|quota| RateLimiter::direct(quota.allow_burst(NonZeroU32::MIN)));

        Self {
            limiter,
            min_interval,
        }
    }

    /// Pacing disabled
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Waits until the next request may be sent
    pub async fn wait(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn test_disabled_throttle_does_not_wait() {
        let throttle = Throttle::disabled();
        let start = Instant::now();
        for _ in 0..5 {
            throttle.wait().await;
        }
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_first_request_passes_immediately() {
        let throttle = Throttle::new(Duration::from_secs(1));
        let start = Instant::now();
        throttle.wait().await;
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_consecutive_requests_are_spaced() {
        let interval = Duration::from_millis(150);
        let throttle = Throttle::new(interval);

        let start = Instant::now();
        throttle.wait().await;
        throttle.wait().await;
        throttle.wait().await;

        // Two waits after the first must each take roughly one interval
        assert!(start.elapsed() >= interval * 2 - Duration::from_millis(10));
    }
}
