//! Tavily search backend.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{SearchError, SearchResult};
use crate::security::SecretString;
use crate::traits::searcher::WebSearcher;
use crate::types::config::{SearchKind, SearchOptions};
use crate::types::hit::{Hit, SearchResponse};

const TAVILY_URL: &str = "https://api.tavily.com/search";

/// Tavily-backed web searcher.
///
/// Tavily has no knowledge-graph panel and no country filter; `country`
/// and `language` are ignored.
pub struct TavilySearcher {
    api_key: SecretString,
    client: reqwest::Client,
    search_depth: String,
}

impl TavilySearcher {
    pub fn new(api_key: impl Into<SecretString>) -> Self {
        Self {
            api_key: api_key.into(),
            client: reqwest::Client::new(),
            search_depth: "basic".to_string(),
        }
    }

    /// `basic` or `advanced`.
    pub fn with_search_depth(mut self, depth: impl Into<String>) -> Self {
        self.search_depth = depth.into();
        self
    }
}

#[derive(Serialize)]
struct Request<'a> {
    query: &'a str,
    search_depth: &'a str,
    max_results: usize,
    topic: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    time_range: Option<&'static str>,
}

#[derive(Deserialize)]
struct Response {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Deserialize)]
struct TavilyResult {
    url: String,
    title: Option<String>,
    content: Option<String>,
}

/// Map a Serper-style `qdr:` filter onto Tavily's named ranges.
fn time_range(filter: Option<&str>) -> Option<&'static str> {
    match filter? {
        "qdr:d" => Some("day"),
        "qdr:w" => Some("week"),
        "qdr:m" => Some("month"),
        "qdr:y" => Some("year"),
        _ => None,
    }
}

#[async_trait]
impl WebSearcher for TavilySearcher {
    async fn search(&self, query: &str, options: &SearchOptions) -> SearchResult<SearchResponse> {
        let request = Request {
            query,
            search_depth: &self.search_depth,
            max_results: options.num_results,
            topic: match options.kind {
                SearchKind::Web => "general",
                SearchKind::News => "news",
            },
            time_range: time_range(options.time_range.as_deref()),
        };

        let response = self
            .client
            .post(TAVILY_URL)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key.expose()))
            .json(&request)
            .send()
            .await
            .map_err(|e| SearchError::Http(Box::new(e)))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Status { status, body });
        }

        let parsed: Response = response
            .json()
            .await
            .map_err(|e| SearchError::Decode(Box::new(e)))?;

        let hits = parsed
            .results
            .into_iter()
            .filter(|r| url::Url::parse(&r.url).is_ok())
            .map(|r| {
                Hit::new(r.url)
                    .with_title(r.title.unwrap_or_default())
                    .with_snippet(r.content.unwrap_or_default())
            })
            .collect();

        Ok(SearchResponse::new(hits))
    }

    fn name(&self) -> &str {
        "tavily"
    }
}
