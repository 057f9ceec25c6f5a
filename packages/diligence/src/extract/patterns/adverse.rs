//! Pattern rules for [`AdverseMediaReport`].
//!
//! A block becomes an item when it names the entity, carries no
//! positive-news marker, and has at least two adverse keywords (or one
//! in its title).

use std::sync::LazyLock;

use regex::Regex;

use super::{block_text_lower, host_of, mentions_entity};
use crate::text::truncate_chars;
use crate::types::entity::EntityContext;
use crate::types::evidence::{EvidenceBlock, EvidenceContext};
use crate::types::field::Field;
use crate::types::records::{AdverseMediaItem, AdverseMediaReport};

/// Keyword, category, severity (1-10).
const ADVERSE_KEYWORDS: &[(&str, &str, u8)] = &[
    ("lawsuit", "legal", 5),
    ("litigation", "legal", 5),
    ("sued", "legal", 5),
    ("class action", "legal", 6),
    ("indictment", "legal", 9),
    ("indicted", "legal", 9),
    ("convicted", "legal", 9),
    ("guilty", "legal", 8),
    ("prosecution", "legal", 8),
    ("settlement", "legal", 4),
    ("fined", "regulatory", 6),
    ("penalty", "regulatory", 6),
    ("consent order", "regulatory", 6),
    ("cease and desist", "regulatory", 6),
    ("enforcement action", "regulatory", 7),
    ("non-compliance", "regulatory", 5),
    ("violation", "regulatory", 5),
    ("sec charges", "regulatory", 8),
    ("investigation", "regulatory", 6),
    ("probe", "regulatory", 6),
    ("subpoena", "regulatory", 6),
    ("fraud", "financial", 9),
    ("embezzlement", "financial", 9),
    ("accounting irregularities", "financial", 8),
    ("bankruptcy", "financial", 8),
    ("insolvent", "financial", 8),
    ("default", "financial", 6),
    ("bribery", "ethics", 9),
    ("corruption", "ethics", 9),
    ("kickback", "ethics", 8),
    ("money laundering", "ethics", 9),
    ("scandal", "ethics", 6),
    ("misconduct", "ethics", 6),
    ("wrongdoing", "ethics", 6),
    ("whistleblower", "ethics", 5),
    ("pollution", "environmental", 6),
    ("spill", "environmental", 6),
    ("toxic", "environmental", 6),
    ("discrimination", "labor", 6),
    ("harassment", "labor", 6),
    ("wage theft", "labor", 6),
    ("osha", "labor", 5),
    ("unsafe", "labor", 5),
    ("data breach", "cyber", 7),
    ("cyberattack", "cyber", 7),
    ("ransomware", "cyber", 7),
    ("hacked", "cyber", 6),
    ("recall", "product", 5),
    ("defect", "product", 5),
    ("ousted", "governance", 5),
    ("resigned amid", "governance", 6),
    ("governance failure", "governance", 6),
    ("sanctions violation", "sanctions", 9),
    ("export control", "sanctions", 7),
];

/// Markers of positive or routine corporate news.
const EXCLUSION_KEYWORDS: &[&str] = &[
    "acquires",
    "acquisition",
    "partnership",
    "collaboration",
    "launches",
    "announces",
    "introduces",
    "expands",
    "awards",
    "recognition",
    "achievement",
    "milestone",
];

static RE_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(\d{4}-\d{2}-\d{2}|(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Sept|Oct|Nov|Dec)[a-z]*\.?\s+\d{1,2},\s+\d{4}|\d+\s+(?:hours?|days?|weeks?|months?)\s+ago)\b",
    )
    .expect("date regex")
});

const DESCRIPTION_CHARS: usize = 300;

pub fn extract(entity: &EntityContext, evidence: &EvidenceContext) -> AdverseMediaReport {
    let items: Vec<AdverseMediaItem> = evidence
        .blocks()
        .iter()
        .filter(|b| b.url.is_some())
        .filter_map(|b| item_from_block(entity, b))
        .collect();

    let max_severity = items
        .iter()
        .filter_map(|i| i.severity.value()?.parse::<u8>().ok())
        .max()
        .unwrap_or(0);

    AdverseMediaReport {
        overall_risk_level: Field::new(risk_level(items.len(), max_severity)),
        summary: Field::new(summary(entity, &items)),
        items,
    }
}

fn item_from_block(entity: &EntityContext, block: &EvidenceBlock) -> Option<AdverseMediaItem> {
    let text = block_text_lower(block);
    let title = block.title.to_lowercase();

    if !mentions_entity(&text, entity) {
        return None;
    }
    if EXCLUSION_KEYWORDS.iter().any(|k| text.contains(k)) {
        return None;
    }

    let hits: Vec<&(&str, &str, u8)> = ADVERSE_KEYWORDS
        .iter()
        .filter(|(k, _, _)| text.contains(k))
        .collect();
    let in_title = hits.iter().any(|(k, _, _)| title.contains(k));
    if hits.len() < 2 && !in_title {
        return None;
    }

    let (_, category, severity) = hits.iter().max_by_key(|(_, _, s)| *s)?;
    let url = block.url.clone().unwrap_or_default();

    Some(AdverseMediaItem {
        title: Field::new(block.title.clone()),
        source: Field::from_option(host_of(&url)),
        published_date: Field::from_option(
            RE_DATE
                .captures(&block.body)
                .map(|c| c[1].to_string()),
        ),
        category: Field::new(*category),
        severity: Field::new(severity.to_string()),
        description: Field::new(truncate_chars(&block.body, DESCRIPTION_CHARS)),
        url: Field::new(url),
    })
}

fn risk_level(items: usize, max_severity: u8) -> &'static str {
    match (items, max_severity) {
        (0, _) => "Low",
        (n, s) if s >= 8 && n >= 3 => "Critical",
        (_, s) if s >= 8 => "High",
        (n, _) if n >= 3 => "High",
        _ => "Medium",
    }
}

fn summary(entity: &EntityContext, items: &[AdverseMediaItem]) -> String {
    if items.is_empty() {
        return format!("No adverse media found for {} in the reviewed sources.", entity.name);
    }
    let mut categories: Vec<&str> = items.iter().filter_map(|i| i.category.value()).collect();
    categories.sort_unstable();
    categories.dedup();
    format!(
        "Found {} adverse media item(s) for {} across categories: {}.",
        items.len(),
        entity.name,
        categories.join(", ")
    )
}
