//! Raw search results.

use serde::{Deserialize, Serialize};

/// One result returned by the search collaborator.
///
/// Several hits may share a URL when different queries surface the same
/// page; deduplication happens in the scorer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hit {
    pub title: String,
    pub snippet: String,
    pub url: String,
    /// Text of the query that produced this hit.
    pub source_query: String,
}

impl Hit {
    /// Create a hit for a URL with empty title and snippet.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Add a title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Add a snippet.
    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = snippet.into();
        self
    }

    /// Record the originating query.
    pub fn with_source_query(mut self, query: impl Into<String>) -> Self {
        self.source_query = query.into();
        self
    }
}

/// Response of one search call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    pub hits: Vec<Hit>,

    /// Provider-specific entity panel (e.g. Serper's `knowledgeGraph`).
    pub knowledge_graph: Option<serde_json::Value>,
}

impl SearchResponse {
    pub fn new(hits: Vec<Hit>) -> Self {
        Self {
            hits,
            knowledge_graph: None,
        }
    }

    pub fn with_knowledge_graph(mut self, graph: serde_json::Value) -> Self {
        self.knowledge_graph = Some(graph);
        self
    }
}
