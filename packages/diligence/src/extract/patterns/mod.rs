//! Deterministic extraction rules, one module per record type.
//!
//! These run when the language model is unavailable or its answer cannot
//! be parsed. They only fill fields they can read directly off the
//! evidence; everything else stays unfilled.

pub mod adverse;
pub mod company;
pub mod executives;
pub mod private;
pub mod sanctions;

use crate::types::entity::EntityContext;
use crate::types::evidence::EvidenceBlock;

/// Title and body of a block, lowercased.
pub(crate) fn block_text_lower(block: &EvidenceBlock) -> String {
    format!("{}\n{}", block.title, block.body).to_lowercase()
}

/// Whether lowercased `text` names the entity, in full or by every
/// distinctive part of its name.
pub(crate) fn mentions_entity(text_lower: &str, entity: &EntityContext) -> bool {
    if text_lower.contains(&entity.name.to_lowercase()) {
        return true;
    }
    let parts = entity.name_parts();
    !parts.is_empty() && parts.iter().all(|p| text_lower.contains(p.as_str()))
}

/// Host of a URL without `www.`.
pub(crate) fn host_of(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    Some(host.trim_start_matches("www.").to_string())
}

/// Split text into rough sentences.
pub(crate) fn sentences(text: &str) -> impl Iterator<Item = &str> {
    text.split(['.', '\n', ';'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
