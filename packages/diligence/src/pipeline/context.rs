//! Evidence assembly.
//!
//! Turns ranked candidates into one bounded block of text. Each block body
//! is capped on its own and blocks are added in rank order until the next
//! one would break the total cap; the rest are dropped. Given the same
//! candidates (and the same fetch outcomes) the output is identical.

use std::sync::Arc;

use crate::pipeline::fanout::{fan_out, FanOutLimits};
use crate::text::truncate_chars;
use crate::traits::fetcher::{PageFetcher, PageText};
use crate::types::candidate::ScoredCandidate;
use crate::types::config::ContextConfig;
use crate::types::evidence::{rendered_len, EvidenceBlock, EvidenceContext, KNOWLEDGE_GRAPH_LABEL};

/// Page fetches run at most this many at a time.
const FETCH_CONCURRENCY: usize = 3;

/// Builds an [`EvidenceContext`] from ranked candidates.
pub struct EvidenceContextBuilder {
    config: ContextConfig,
    fetcher: Option<Arc<dyn PageFetcher>>,
}

impl EvidenceContextBuilder {
    pub fn new(config: ContextConfig) -> Self {
        Self {
            config,
            fetcher: None,
        }
    }

    /// Fetch full pages for the leading candidates.
    pub fn with_fetcher(mut self, fetcher: Arc<dyn PageFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub async fn build(
        &self,
        candidates: &[ScoredCandidate],
        knowledge_graph: Option<&serde_json::Value>,
    ) -> EvidenceContext {
        let top: Vec<&ScoredCandidate> = candidates.iter().take(self.config.top_k).collect();
        let pages = self.fetch_head(&top).await;

        let mut blocks = Vec::with_capacity(top.len() + 1);
        for (index, candidate) in top.iter().enumerate() {
            let hit = &candidate.hit;
            let (body, fetched) = match pages.get(index).and_then(Option::as_ref) {
                Some(page) => (page.text.as_str(), true),
                None => (hit.snippet.as_str(), false),
            };
            let block = EvidenceBlock {
                label: format!("Source {}", index + 1),
                title: hit.title.clone(),
                url: Some(hit.url.clone()),
                body: truncate_chars(body, self.config.per_item_chars),
                fetched,
            };
            if !self.push_bounded(&mut blocks, block) {
                tracing::debug!(
                    kept = blocks.len(),
                    dropped = top.len() - index,
                    "Evidence cap reached"
                );
                break;
            }
        }

        if let Some(graph) = knowledge_graph {
            let body = serde_json::to_string(graph).unwrap_or_default();
            let block = EvidenceBlock {
                label: KNOWLEDGE_GRAPH_LABEL.to_string(),
                title: graph
                    .get("title")
                    .and_then(|t| t.as_str())
                    .unwrap_or("Entity panel")
                    .to_string(),
                url: None,
                body: truncate_chars(&body, self.config.per_item_chars),
                fetched: false,
            };
            self.push_bounded(&mut blocks, block);
        }

        EvidenceContext::new(blocks)
    }

    /// Append `block` if it fits the total cap. The first block is cut to
    /// fit rather than dropped, so a tiny cap still yields evidence.
    fn push_bounded(&self, blocks: &mut Vec<EvidenceBlock>, mut block: EvidenceBlock) -> bool {
        let used = rendered_len(blocks);
        let separator = usize::from(!blocks.is_empty());
        if used + separator + block.render().chars().count() <= self.config.total_chars {
            blocks.push(block);
            return true;
        }

        if blocks.is_empty() {
            let mut shell = block.clone();
            shell.body.clear();
            let room = self
                .config
                .total_chars
                .saturating_sub(shell.render().chars().count());
            if room > 0 {
                block.body = truncate_chars(&block.body, room);
                blocks.push(block);
                return true;
            }
        }
        false
    }

    /// Fetch the head subset; slot `i` is `None` when candidate `i` was
    /// not fetched or its fetch failed.
    async fn fetch_head(&self, top: &[&ScoredCandidate]) -> Vec<Option<PageText>> {
        let Some(fetcher) = &self.fetcher else {
            return Vec::new();
        };
        let head = self.config.fetch_head.min(top.len());
        if head == 0 {
            return Vec::new();
        }

        let urls: Vec<String> = top[..head].iter().map(|c| c.hit.url.clone()).collect();
        let fetcher = Arc::clone(fetcher);
        let limits = FanOutLimits::new(FETCH_CONCURRENCY, self.config.fetch_timeout());
        let outcomes = fan_out(urls.clone(), limits, move |url: String| {
            let fetcher = Arc::clone(&fetcher);
            async move { fetcher.fetch(&url).await }
        })
        .await;

        urls.iter()
            .zip(outcomes)
            .map(|(url, outcome)| match outcome {
                Ok(page) if !page.text.trim().is_empty() => Some(page),
                Ok(_) => {
                    tracing::warn!(url = %url, "Fetched page was empty, using snippet");
                    None
                }
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "Page fetch failed, using snippet");
                    None
                }
            })
            .collect()
    }
}
