use std::sync::Arc;
use std::time::Duration;

use crate::{
    cached,
    error::AppResult,
    services::providers::ImageProvider,
    store::{Cache, CacheKey},
};

/// Resolves display names to image URLs. Never fails.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ImageResolver: Send + Sync {
    /// Image URL for `name`, or a fallback placeholder when none can be found
    async fn resolve(&self, name: &str) -> String;
}

/// Bounded retry for transient lookup failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, first one included
    pub max_attempts: u32,
    /// Pause between consecutive attempts
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

/// [`ImageResolver`] backed by an [`ImageProvider`]
///
/// Retries transient failures per [`RetryPolicy`], memoizes answers by display
/// name and degrades every failure to the fallback URL. The settled outcome is
/// memoized whatever it was, failures included; set a cache TTL to give failed
/// names another chance later.
pub struct CachingImageResolver {
    provider: Arc<dyn ImageProvider>,
    cache: Cache<Option<String>>,
    cache_ttl: Option<Duration>,
    retry: RetryPolicy,
    fallback_url: String,
}

impl CachingImageResolver {
    pub fn new(
        provider: Arc<dyn ImageProvider>,
        cache: Cache<Option<String>>,
        cache_ttl: Option<Duration>,
        retry: RetryPolicy,
        fallback_url: String,
    ) -> Self {
        Self {
            provider,
            cache,
            cache_ttl,
            retry,
            fallback_url,
        }
    }

    async fn lookup_cached(&self, name: &str) -> AppResult<Option<String>> {
        cached!(
            self.cache,
            CacheKey::ImageLookup(name.to_string()),
            self.cache_ttl,
            self.lookup_settled(name)
        )
    }

    /// Final answer for `name`: a failure after retries settles to `None`
    async fn lookup_settled(&self, name: &str) -> AppResult<Option<String>> {
        match self.lookup_with_retry(name).await {
            Ok(found) => Ok(found),
            Err(e) => {
                tracing::warn!(
                    anime = %name,
                    provider = self.provider.name(),
                    error = %e,
                    "Thumbnail lookup failed, using fallback"
                );
                Ok(None)
            }
        }
    }

    async fn lookup_with_retry(&self, name: &str) -> AppResult<Option<String>> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.provider.find_thumbnail(name).await {
                Ok(found) => return Ok(found),
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    tracing::warn!(
                        anime = %name,
                        attempt,
                        max_attempts,
                        provider = self.provider.name(),
                        error = %e,
                        "Thumbnail lookup attempt failed, retrying"
                    );
                    tokio::time::sleep(self.retry.delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait::async_trait]
impl ImageResolver for CachingImageResolver {
    async fn resolve(&self, name: &str) -> String {
        match self.lookup_cached(name).await {
            Ok(Some(url)) => url,
            Ok(None) => {
                tracing::debug!(anime = %name, "No thumbnail available, using fallback");
                self.fallback_url.clone()
            }
            Err(e) => {
                tracing::error!(anime = %name, error = %e, "Image cache lookup failed");
                self.fallback_url.clone()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::services::providers::MockImageProvider;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::time::Instant;

    const FALLBACK: &str = "https://via.placeholder.com/150x200.png?text=No+Image";

    /// Fails with a transient error `failures` times, then answers `answer`
    struct FlakyProvider {
        failures: usize,
        answer: Option<String>,
        calls: AtomicUsize,
        call_times: Mutex<Vec<Instant>>,
    }

    impl FlakyProvider {
        fn new(failures: usize, answer: Option<&str>) -> Self {
            Self {
                failures,
                answer: answer.map(str::to_string),
                calls: AtomicUsize::new(0),
                call_times: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl ImageProvider for FlakyProvider {
        async fn find_thumbnail(&self, _name: &str) -> AppResult<Option<String>> {
            self.call_times.lock().unwrap().push(Instant::now());
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(AppError::ExternalApi("status 503".to_string()))
            } else {
                Ok(self.answer.clone())
            }
        }

        fn name(&self) -> &'static str {
            "flaky"
        }
    }

    fn resolver_with(provider: Arc<dyn ImageProvider>) -> CachingImageResolver {
        CachingImageResolver::new(
            provider,
            Cache::unbounded(),
            None,
            RetryPolicy::default(),
            FALLBACK.to_string(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_then_succeeds() {
        let provider = Arc::new(FlakyProvider::new(2, Some("https://img/naruto.jpg")));
        let resolver = resolver_with(provider.clone());

        let start = Instant::now();
        let url = resolver.resolve("Naruto").await;

        assert_eq!(url, "https://img/naruto.jpg");
        assert_eq!(provider.calls(), 3);
        assert!(start.elapsed() >= Duration::from_secs(4));

        let times = provider.call_times.lock().unwrap().clone();
        assert!(times[1] - times[0] >= Duration::from_secs(2));
        assert!(times[2] - times[1] >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_fall_back() {
        let provider = Arc::new(FlakyProvider::new(usize::MAX, None));
        let resolver = resolver_with(provider.clone());

        assert_eq!(resolver.resolve("Naruto").await, FALLBACK);
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_lookup_is_memoized() {
        let provider = Arc::new(FlakyProvider::new(3, Some("https://img/naruto.jpg")));
        let resolver = resolver_with(provider.clone());

        let first = resolver.resolve("Naruto").await;
        let second = resolver.resolve("Naruto").await;

        assert_eq!(first, FALLBACK);
        assert_eq!(first, second);
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_lookup_retried_after_ttl() {
        let provider = Arc::new(FlakyProvider::new(3, Some("https://img/naruto.jpg")));
        let resolver = CachingImageResolver::new(
            provider.clone(),
            Cache::unbounded(),
            Some(Duration::from_secs(60)),
            RetryPolicy::default(),
            FALLBACK.to_string(),
        );

        assert_eq!(resolver.resolve("Naruto").await, FALLBACK);
        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(resolver.resolve("Naruto").await, "https://img/naruto.jpg");
        assert_eq!(provider.calls(), 4);
    }

    /// Answers after a pause, counting calls
    #[derive(Default)]
    struct SlowProvider {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl ImageProvider for SlowProvider {
        async fn find_thumbnail(&self, name: &str) -> AppResult<Option<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(1)).await;
            Ok(Some(format!("https://img/{}.jpg", name)))
        }

        fn name(&self) -> &'static str {
            "slow"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_misses_share_one_lookup() {
        let provider = Arc::new(SlowProvider::default());
        let resolver = resolver_with(provider.clone());

        let (a, b, c) = tokio::join!(
            resolver.resolve("Bleach"),
            resolver.resolve("Bleach"),
            resolver.resolve("Bleach")
        );

        assert_eq!(a, "https://img/Bleach.jpg");
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_memoizes_successful_lookup() {
        let provider = Arc::new(FlakyProvider::new(0, Some("https://img/bleach.jpg")));
        let resolver = resolver_with(provider.clone());

        let first = resolver.resolve("Bleach").await;
        let second = resolver.resolve("Bleach").await;

        assert_eq!(first, second);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_missing_image_falls_back_without_retry_and_is_memoized() {
        let provider = Arc::new(FlakyProvider::new(0, None));
        let resolver = resolver_with(provider.clone());

        assert_eq!(resolver.resolve("Obscure OVA").await, FALLBACK);
        assert_eq!(resolver.resolve("Obscure OVA").await, FALLBACK);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_response_is_retried() {
        let mut provider = MockImageProvider::new();
        provider
            .expect_find_thumbnail()
            .times(3)
            .returning(|_| Err(AppError::MalformedResponse("bad json".to_string())));
        provider.expect_name().return_const("mock");

        let resolver = resolver_with(Arc::new(provider));
        assert_eq!(resolver.resolve("Naruto").await, FALLBACK);
    }

    #[tokio::test]
    async fn test_distinct_names_are_cached_separately() {
        let mut provider = MockImageProvider::new();
        provider
            .expect_find_thumbnail()
            .times(2)
            .returning(|name| Ok(Some(format!("https://img/{}.jpg", name))));
        provider.expect_name().return_const("mock");

        let resolver = resolver_with(Arc::new(provider));
        assert_eq!(resolver.resolve("A").await, "https://img/A.jpg");
        assert_eq!(resolver.resolve("B").await, "https://img/B.jpg");
        assert_eq!(resolver.resolve("A").await, "https://img/A.jpg");
    }
}
