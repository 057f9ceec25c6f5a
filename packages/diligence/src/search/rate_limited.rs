//! Rate-limited searcher wrapper.
//!
//! Wraps any [`WebSearcher`] with a request quota using the governor
//! crate. The aggregator bounds how many calls are in flight; this bounds
//! how many start per second, which is what provider plans meter.

use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use nonzero_ext::nonzero;
use std::num::NonZeroU32;
use std::sync::Arc;

use crate::error::SearchResult;
use crate::traits::searcher::WebSearcher;
use crate::types::config::SearchOptions;
use crate::types::hit::SearchResponse;

type DefaultRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

pub struct RateLimitedSearcher<S: WebSearcher> {
    inner: S,
    limiter: Arc<DefaultRateLimiter>,
}

impl<S: WebSearcher> RateLimitedSearcher<S> {
    /// `requests_per_second` of zero is treated as one.
    pub fn new(searcher: S, requests_per_second: u32) -> Self {
        let rate = NonZeroU32::new(requests_per_second).unwrap_or(nonzero!(1u32));
        Self::with_quota(searcher, Quota::per_second(rate))
    }

    /// Sustained rate plus a burst allowance.
    pub fn with_burst(searcher: S, requests_per_second: u32, burst: u32) -> Self {
        let rate = NonZeroU32::new(requests_per_second).unwrap_or(nonzero!(1u32));
        let burst = NonZeroU32::new(burst).unwrap_or(rate);
        Self::with_quota(searcher, Quota::per_second(rate).allow_burst(burst))
    }

    pub fn with_quota(searcher: S, quota: Quota) -> Self {
        Self {
            inner: searcher,
            limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: WebSearcher> WebSearcher for RateLimitedSearcher<S> {
    async fn search(&self, query: &str, options: &SearchOptions) -> SearchResult<SearchResponse> {
        self.limiter.until_ready().await;
        self.inner.search(query, options).await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

/// Extension trait for easy rate limiting.
pub trait WebSearcherExt: WebSearcher + Sized {
    fn rate_limited(self, requests_per_second: u32) -> RateLimitedSearcher<Self> {
        RateLimitedSearcher::new(self, requests_per_second)
    }

    fn rate_limited_with_burst(self, requests_per_second: u32, burst: u32) -> RateLimitedSearcher<Self> {
        RateLimitedSearcher::with_burst(self, requests_per_second, burst)
    }
}

impl<S: WebSearcher + Sized> WebSearcherExt for S {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockWebSearcher;
    use std::time::Instant;

    #[tokio::test]
    async fn test_rate_limiting() {
        let searcher = MockWebSearcher::new().rate_limited(2);
        let options = SearchOptions::default();

        let start = Instant::now();
        for q in ["a", "b", "c"] {
            searcher.search(q, &options).await.unwrap();
        }

        // First call is immediate, the next two wait for the quota.
        assert!(start.elapsed().as_millis() >= 500, "{:?}", start.elapsed());
        assert_eq!(searcher.inner().calls(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_zero_rate_is_clamped() {
        let searcher = MockWebSearcher::new().rate_limited_with_burst(0, 0);
        assert!(searcher.search("q", &SearchOptions::default()).await.is_ok());
        assert_eq!(searcher.name(), "mock");
    }
}
