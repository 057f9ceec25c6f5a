//! Bounded evidence handed to the extraction collaborator.

use serde::{Deserialize, Serialize};

/// Label of the block built from the search engine's knowledge panel.
pub(crate) const KNOWLEDGE_GRAPH_LABEL: &str = "Knowledge Graph";

/// One labeled unit of evidence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceBlock {
    pub label: String,
    pub title: String,
    pub url: Option<String>,
    pub body: String,
    /// Body is cleaned page text rather than the search snippet.
    pub fetched: bool,
}

impl EvidenceBlock {
    /// Text form used in prompts.
    pub fn render(&self) -> String {
        let mut out = format!("[{}] {}\n", self.label, self.title);
        if let Some(url) = &self.url {
            out.push_str("URL: ");
            out.push_str(url);
            out.push('\n');
        }
        out.push_str(if self.fetched { "Content: " } else { "Snippet: " });
        out.push_str(&self.body);
        out.push('\n');
        out
    }
}

/// Ordered evidence blocks and their concatenated text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceContext {
    blocks: Vec<EvidenceBlock>,
    text: String,
}

impl EvidenceContext {
    pub fn new(blocks: Vec<EvidenceBlock>) -> Self {
        let text = blocks
            .iter()
            .map(EvidenceBlock::render)
            .collect::<Vec<_>>()
            .join("\n");
        Self { blocks, text }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn blocks(&self) -> &[EvidenceBlock] {
        &self.blocks
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// URLs of every block that has one, in block order.
    pub fn sources(&self) -> Vec<String> {
        self.blocks.iter().filter_map(|b| b.url.clone()).collect()
    }
}

/// Render-length of a block list once joined, in chars.
pub(crate) fn rendered_len(blocks: &[EvidenceBlock]) -> usize {
    let body: usize = blocks.iter().map(|b| b.render().chars().count()).sum();
    body + blocks.len().saturating_sub(1)
}
