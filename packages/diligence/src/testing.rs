//! Testing utilities including mock implementations.
//!
//! These are useful for testing applications that use the diligence
//! library without making real search, model, or network calls.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::error::{FetchError, FetchResult, LlmError, LlmResult, SearchError, SearchResult, StoreError, StoreResult};
use crate::traits::{
    fetcher::{PageFetcher, PageText},
    llm::{CompletionRequest, LanguageModel},
    searcher::WebSearcher,
    store::{BlobStore, RecordStore, StoredRecord},
};
use crate::types::config::SearchOptions;
use crate::types::hit::{Hit, SearchResponse};
use crate::types::query::TaskKind;

/// A mock web searcher for testing.
///
/// Unknown queries return an empty response.
#[derive(Default)]
pub struct MockWebSearcher {
    /// Predefined responses by query text
    responses: Arc<RwLock<HashMap<String, SearchResponse>>>,

    /// Queries that fail with a provider error
    failing: Arc<RwLock<HashSet<String>>>,

    /// Latency applied to every call
    latency: Option<Duration>,

    /// Per-query latency overrides
    query_latency: Arc<RwLock<HashMap<String, Duration>>>,

    /// Call tracking for assertions
    calls: Arc<RwLock<Vec<String>>>,
}

impl MockWebSearcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `query` with these hits.
    pub fn with_hits(self, query: impl Into<String>, hits: Vec<Hit>) -> Self {
        self.with_response(query, SearchResponse::new(hits))
    }

    /// Answer `query` with a full response.
    pub fn with_response(self, query: impl Into<String>, response: SearchResponse) -> Self {
        self.responses
            .write()
            .unwrap()
            .insert(query.into(), response);
        self
    }

    /// Fail every call for `query`.
    pub fn failing(self, query: impl Into<String>) -> Self {
        self.failing.write().unwrap().insert(query.into());
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn with_query_latency(self, query: impl Into<String>, latency: Duration) -> Self {
        self.query_latency
            .write()
            .unwrap()
            .insert(query.into(), latency);
        self
    }

    /// Queries received, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl WebSearcher for MockWebSearcher {
    async fn search(&self, query: &str, _options: &SearchOptions) -> SearchResult<SearchResponse> {
        self.calls.write().unwrap().push(query.to_string());

        let latency = self
            .query_latency
            .read()
            .unwrap()
            .get(query)
            .copied()
            .or(self.latency);
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        if self.failing.read().unwrap().contains(query) {
            return Err(SearchError::Status {
                status: 500,
                body: format!("mock failure for {}", query),
            });
        }

        Ok(self
            .responses
            .read()
            .unwrap()
            .get(query)
            .cloned()
            .unwrap_or_default())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// A mock language model for testing.
///
/// Replies are served in order; the last one repeats once the queue is
/// down to it. With no replies configured the model answers `{}`.
#[derive(Default)]
pub struct MockLanguageModel {
    replies: Arc<RwLock<VecDeque<String>>>,

    /// Fail every call as if the provider were down
    unavailable: bool,

    /// Call tracking for assertions
    requests: Arc<RwLock<Vec<CompletionRequest>>>,
}

impl MockLanguageModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply.
    pub fn with_response(self, text: impl Into<String>) -> Self {
        self.replies.write().unwrap().push_back(text.into());
        self
    }

    /// Queue several replies.
    pub fn with_responses<I, S>(self, texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.replies
            .write()
            .unwrap()
            .extend(texts.into_iter().map(Into::into));
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    /// Requests received, in call order.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.read().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for MockLanguageModel {
    async fn complete(&self, request: &CompletionRequest) -> LlmResult<String> {
        self.requests.write().unwrap().push(request.clone());

        if self.unavailable {
            return Err(LlmError::Unavailable("mock model unavailable".into()));
        }

        let mut replies = self.replies.write().unwrap();
        let reply = if replies.len() > 1 {
            replies.pop_front()
        } else {
            replies.front().cloned()
        };
        Ok(reply.unwrap_or_else(|| "{}".to_string()))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// A mock page fetcher for testing.
///
/// Unknown URLs fail with a 404.
#[derive(Default)]
pub struct MockPageFetcher {
    pages: Arc<RwLock<HashMap<String, String>>>,
    failing: Arc<RwLock<HashSet<String>>>,
    calls: Arc<RwLock<Vec<String>>>,
}

impl MockPageFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, url: impl Into<String>, text: impl Into<String>) -> Self {
        self.pages.write().unwrap().insert(url.into(), text.into());
        self
    }

    /// Fail fetches of `url` with a timeout.
    pub fn failing(self, url: impl Into<String>) -> Self {
        self.failing.write().unwrap().insert(url.into());
        self
    }

    /// URLs fetched, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for MockPageFetcher {
    async fn fetch(&self, url: &str) -> FetchResult<PageText> {
        self.calls.write().unwrap().push(url.to_string());

        if self.failing.read().unwrap().contains(url) {
            return Err(FetchError::Timeout {
                url: url.to_string(),
            });
        }

        match self.pages.read().unwrap().get(url) {
            Some(text) => Ok(PageText {
                url: url.to_string(),
                title: None,
                text: text.clone(),
            }),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

/// A store whose every operation fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingStore;

impl FailingStore {
    fn error() -> StoreError {
        StoreError::Backend("mock store unavailable".into())
    }
}

#[async_trait]
impl RecordStore for FailingStore {
    async fn upsert(&self, _record: &StoredRecord) -> StoreResult<()> {
        Err(Self::error())
    }

    async fn query_latest(
        &self,
        _entity_id: &str,
        _task: TaskKind,
    ) -> StoreResult<Option<StoredRecord>> {
        Err(Self::error())
    }

    async fn versions(&self, _entity_id: &str, _task: TaskKind) -> StoreResult<Vec<StoredRecord>> {
        Err(Self::error())
    }
}

#[async_trait]
impl BlobStore for FailingStore {
    async fn put_object(&self, _key: &str, _body: &serde_json::Value) -> StoreResult<()> {
        Err(Self::error())
    }

    async fn get_object(&self, _key: &str) -> StoreResult<Option<serde_json::Value>> {
        Err(Self::error())
    }
}
