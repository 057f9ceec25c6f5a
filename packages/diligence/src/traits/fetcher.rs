//! Page fetch collaborator used to enrich evidence.

use async_trait::async_trait;

use crate::error::FetchResult;

/// A fetched page reduced to plain text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    pub url: String,
    pub title: Option<String>,
    pub text: String,
}

/// Fetches a URL and returns its cleaned text.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> FetchResult<PageText>;
}
