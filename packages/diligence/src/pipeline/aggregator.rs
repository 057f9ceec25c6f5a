//! Concurrent search execution.
//!
//! Runs every planned query through the search collaborator with bounded
//! concurrency. A query that errors or overruns its deadline is logged and
//! skipped; it never fails the batch. When every query fails the batch is
//! simply empty, which callers treat as "no evidence".

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::pipeline::fanout::{fan_out, FanOutLimits};
use crate::traits::searcher::WebSearcher;
use crate::types::config::AggregatorConfig;
use crate::types::hit::{Hit, SearchResponse};
use crate::types::query::SearchQuery;

/// A query that contributed no hits because its call failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryFailure {
    pub query: String,
    pub reason: String,
}

/// Everything one round of searching produced.
#[derive(Debug, Clone, Default)]
pub struct SearchBatch {
    /// Hits of every successful query, grouped by query in plan order;
    /// each query's own hit order is preserved.
    pub hits: Vec<Hit>,
    pub failures: Vec<QueryFailure>,
    /// First knowledge-graph block any query returned.
    pub knowledge_graph: Option<serde_json::Value>,
    pub queries_run: usize,
}

impl SearchBatch {
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

/// Fans queries out to a [`WebSearcher`].
pub struct SearchAggregator {
    searcher: Arc<dyn WebSearcher>,
    config: AggregatorConfig,
}

impl SearchAggregator {
    pub fn new(searcher: Arc<dyn WebSearcher>, config: AggregatorConfig) -> Self {
        Self { searcher, config }
    }

    /// Run every query and merge the results.
    pub async fn gather(&self, queries: &[SearchQuery]) -> SearchBatch {
        let texts: Vec<String> = queries.iter().map(|q| q.text.clone()).collect();
        let limits = FanOutLimits::new(self.config.concurrency, self.config.per_query_timeout());

        let searcher = Arc::clone(&self.searcher);
        let options = Arc::new(self.config.search.clone());
        let outcomes = fan_out(texts.clone(), limits, move |query: String| {
            let searcher = Arc::clone(&searcher);
            let options = Arc::clone(&options);
            async move { searcher.search(&query, &options).await }
        })
        .await;

        let mut batch = SearchBatch {
            queries_run: queries.len(),
            ..Default::default()
        };

        for (query, outcome) in texts.into_iter().zip(outcomes) {
            match outcome {
                Ok(SearchResponse {
                    hits,
                    knowledge_graph,
                }) => {
                    tracing::debug!(query = %query, hits = hits.len(), "Query returned");
                    if batch.knowledge_graph.is_none() {
                        batch.knowledge_graph = knowledge_graph;
                    }
                    batch
                        .hits
                        .extend(hits.into_iter().map(|hit| hit.with_source_query(&query)));
                }
                Err(e) => {
                    tracing::warn!(
                        query = %query,
                        provider = self.searcher.name(),
                        error = %e,
                        "Search query failed, skipping"
                    );
                    batch.failures.push(QueryFailure {
                        query,
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            queries = batch.queries_run,
            failed = batch.failures.len(),
            hits = batch.hits.len(),
            "Search batch complete"
        );

        batch
    }
}
