//! Web search collaborator.

use async_trait::async_trait;

use crate::error::SearchResult;
use crate::types::config::SearchOptions;
use crate::types::hit::SearchResponse;

/// Web search provider.
///
/// # Implementations
///
/// - [`crate::search::SerperSearcher`] - Google results via Serper
/// - [`crate::search::TavilySearcher`] - Tavily API
/// - [`crate::search::RateLimitedSearcher`] - quota wrapper for any searcher
/// - [`crate::testing::MockWebSearcher`] - For testing
///
/// Implementations should not retry internally; the aggregator treats one
/// failed call as one skipped query.
#[async_trait]
pub trait WebSearcher: Send + Sync {
    /// Run one query.
    async fn search(&self, query: &str, options: &SearchOptions) -> SearchResult<SearchResponse>;

    /// Provider name for logs.
    fn name(&self) -> &str;
}
