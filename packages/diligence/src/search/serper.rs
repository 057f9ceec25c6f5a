//! Serper (Google SERP) search backend.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{SearchError, SearchResult};
use crate::security::SecretString;
use crate::traits::searcher::WebSearcher;
use crate::types::config::{SearchKind, SearchOptions};
use crate::types::hit::{Hit, SearchResponse};

const DEFAULT_BASE_URL: &str = "https://google.serper.dev";
const CLIENT_TIMEOUT: Duration = Duration::from_secs(30);

/// Serper-backed web searcher.
///
/// Web searches go to `/search`, news searches to `/news`. Organic and
/// news results both become hits; the knowledge-graph panel, when
/// present, is passed through untouched.
pub struct SerperSearcher {
    api_key: SecretString,
    client: reqwest::Client,
    base_url: String,
}

impl SerperSearcher {
    pub fn new(api_key: impl Into<SecretString>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(CLIENT_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            api_key: api_key.into(),
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point at a different host (proxies, test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self, kind: SearchKind) -> String {
        match kind {
            SearchKind::Web => format!("{}/search", self.base_url),
            SearchKind::News => format!("{}/news", self.base_url),
        }
    }
}

#[derive(Debug, Serialize)]
struct SerperRequest<'a> {
    q: &'a str,
    num: usize,
    gl: &'a str,
    hl: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    tbs: Option<&'a str>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SerperResponse {
    organic: Vec<SerperResult>,
    news: Vec<SerperResult>,
    knowledge_graph: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SerperResult {
    title: String,
    link: String,
    snippet: String,
    date: Option<String>,
    source: Option<String>,
}

impl SerperResult {
    fn into_hit(self) -> Option<Hit> {
        if self.link.trim().is_empty() {
            return None;
        }
        // News results carry date and publisher outside the snippet.
        let prefix = [self.date, self.source]
            .into_iter()
            .flatten()
            .filter(|s| !s.trim().is_empty())
            .collect::<Vec<_>>()
            .join(", ");
        let snippet = if prefix.is_empty() {
            self.snippet
        } else {
            format!("{} - {}", prefix, self.snippet)
        };
        Some(Hit::new(self.link).with_title(self.title).with_snippet(snippet))
    }
}

fn into_search_response(response: SerperResponse) -> SearchResponse {
    let hits = response
        .organic
        .into_iter()
        .chain(response.news)
        .filter_map(SerperResult::into_hit)
        .collect();
    let mut out = SearchResponse::new(hits);
    if let Some(graph) = response.knowledge_graph.filter(|g| !g.is_null()) {
        out = out.with_knowledge_graph(graph);
    }
    out
}

#[async_trait]
impl WebSearcher for SerperSearcher {
    async fn search(&self, query: &str, options: &SearchOptions) -> SearchResult<SearchResponse> {
        let request = SerperRequest {
            q: query,
            num: options.num_results,
            gl: &options.country,
            hl: &options.language,
            tbs: options.time_range.as_deref(),
        };

        let response = self
            .client
            .post(self.endpoint(options.kind))
            .header("X-API-KEY", self.api_key.expose())
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| SearchError::Http(Box::new(e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: SerperResponse = response
            .json()
            .await
            .map_err(|e| SearchError::Decode(Box::new(e)))?;

        let out = into_search_response(parsed);
        tracing::debug!(
            query = %query,
            hits = out.hits.len(),
            knowledge_graph = out.knowledge_graph.is_some(),
            "Serper search complete"
        );
        Ok(out)
    }

    fn name(&self) -> &str {
        "serper"
    }
}
