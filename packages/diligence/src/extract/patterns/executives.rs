//! Pattern rules for [`ExecutiveRoster`].

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use super::sentences;
use crate::text::truncate_chars;
use crate::types::entity::EntityContext;
use crate::types::evidence::{EvidenceBlock, EvidenceContext, KNOWLEDGE_GRAPH_LABEL};
use crate::types::field::Field;
use crate::types::records::{Executive, ExecutiveRoster};

const NAME: &str = r"([A-Z][a-z]+(?: +[A-Z]\.)? +[A-Z][a-z]+(?:-[A-Z][a-z]+)?)";
const TITLE: &str = r"((?i:chief\s+executive\s+officer|chief\s+financial\s+officer|chief\s+technology\s+officer|chief\s+operating\s+officer|chief\s+[a-z]+\s+officer|ceo|cfo|cto|coo|president|chairman|chairwoman|chair|founder))";

/// Each pattern captures (name, title) in that group order.
static RE_NAME_TITLE: LazyLock<Vec<(Regex, bool)>> = LazyLock::new(|| {
    vec![
        // "Jane Roe, Chief Executive Officer" / "Jane Roe - CEO"
        (
            Regex::new(&format!(r"{NAME}\s*(?:,|-|–|\|)\s*(?:is\s+)?(?:the\s+)?(?:our\s+)?{TITLE}\b"))
                .expect("name-title regex"),
            false,
        ),
        // "CEO Jane Roe" / "Chief Financial Officer: John Doe"
        (
            Regex::new(&format!(r"\b{TITLE}[:,]?\s+{NAME}\b")).expect("title-name regex"),
            true,
        ),
        // "Jane Roe serves as CEO"
        (
            Regex::new(&format!(
                r"{NAME}\s+(?i:serves\s+as|is\s+the|acts\s+as|was\s+appointed|was\s+named)\s+(?:our\s+)?{TITLE}\b"
            ))
            .expect("serves-as regex"),
            false,
        ),
    ]
});

static RE_SINCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:since|in)\s+((?:19|20)\d{2})\b").expect("tenure regex")
});

static RE_GRAPH_CEO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""ceo"\s*:\s*"([^"]+)""#).expect("graph ceo regex"));

/// Capitalized words the name pattern would otherwise accept.
const NOT_NAMES: &[&str] = &[
    "the", "our", "new", "former", "interim", "acting", "vice", "senior", "executive", "chief",
    "board", "company", "inc", "corp", "read", "meet", "about", "view",
];

const DESCRIPTION_CHARS: usize = 200;

pub fn extract(entity: &EntityContext, evidence: &EvidenceContext) -> ExecutiveRoster {
    let mut found = Vec::new();

    for block in evidence.blocks() {
        if block.label == KNOWLEDGE_GRAPH_LABEL {
            found.extend(from_knowledge_graph(block));
        } else {
            found.extend(from_block(block));
        }
    }

    let mut executives = dedup(found);
    executives.sort_by_key(|e| role_priority(e.role_category.value().unwrap_or_default()));

    ExecutiveRoster {
        company_name: if executives.is_empty() {
            Field::unfilled()
        } else {
            Field::new(entity.name.clone())
        },
        executives,
    }
}

fn from_block(block: &EvidenceBlock) -> Vec<Executive> {
    let text = format!("{}\n{}", block.title, block.body);
    let mut out = Vec::new();

    for (re, title_first) in RE_NAME_TITLE.iter() {
        for captures in re.captures_iter(&text) {
            let (name, title) = if *title_first {
                (&captures[2], &captures[1])
            } else {
                (&captures[1], &captures[2])
            };
            if !plausible_name(name) {
                continue;
            }
            let title = normalize_title(title);
            out.push(Executive {
                name: Field::new(name),
                role_category: Field::new(categorize_role(&title)),
                title: Field::new(title),
                description: Field::from_option(description(&text, name)),
                tenure: Field::from_option(tenure(&text, name)),
                ..Default::default()
            });
        }
    }
    out
}

fn from_knowledge_graph(block: &EvidenceBlock) -> Option<Executive> {
    let name = RE_GRAPH_CEO.captures(&block.body)?[1].trim().to_string();
    Some(Executive {
        name: Field::new(name),
        title: Field::new("Chief Executive Officer"),
        role_category: Field::new("CEO"),
        ..Default::default()
    })
}

fn plausible_name(name: &str) -> bool {
    name.split_whitespace()
        .all(|w| !NOT_NAMES.contains(&w.trim_end_matches('.').to_lowercase().as_str()))
}

/// Expand acronyms and fix casing of bare titles.
pub(crate) fn normalize_title(title: &str) -> String {
    let collapsed = title.split_whitespace().collect::<Vec<_>>().join(" ");
    match collapsed.to_uppercase().as_str() {
        "CEO" => "Chief Executive Officer".to_string(),
        "CFO" => "Chief Financial Officer".to_string(),
        "CTO" => "Chief Technology Officer".to_string(),
        "COO" => "Chief Operating Officer".to_string(),
        _ => collapsed
            .split(' ')
            .map(|w| {
                let lower = w.to_lowercase();
                let mut chars = lower.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" "),
    }
}

pub(crate) fn categorize_role(title: &str) -> &'static str {
    let lower = title.to_lowercase();
    if lower.contains("chief executive") || lower == "ceo" {
        "CEO"
    } else if lower.contains("chief financial") || lower == "cfo" {
        "CFO"
    } else if lower.contains("chief operating") || lower == "coo" {
        "COO"
    } else if lower.contains("chief technology") || lower == "cto" {
        "CTO"
    } else if lower.contains("president") {
        "President"
    } else if lower.contains("chair") {
        "Chairman"
    } else if lower.starts_with("chief ") {
        "Other C-Suite"
    } else {
        "Senior Leadership"
    }
}

fn role_priority(category: &str) -> u8 {
    match category {
        "CEO" => 0,
        "President" => 1,
        "Chairman" => 2,
        "CFO" => 3,
        "COO" => 4,
        "CTO" => 5,
        "Other C-Suite" => 6,
        _ => 7,
    }
}

/// First sentence naming the person that says more than the name.
fn description(text: &str, name: &str) -> Option<String> {
    sentences(text)
        .find(|s| s.contains(name) && s.chars().count() > name.chars().count() + 20)
        .map(|s| truncate_chars(s, DESCRIPTION_CHARS))
}

fn tenure(text: &str, name: &str) -> Option<String> {
    sentences(text)
        .filter(|s| s.contains(name))
        .find_map(|s| RE_SINCE.captures(s).map(|c| format!("Since {}", &c[1])))
}

/// One entry per (name, role); the first sighting wins and later ones
/// only fill its gaps.
fn dedup(found: Vec<Executive>) -> Vec<Executive> {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut out: Vec<Executive> = Vec::new();

    for executive in found {
        let key = (
            executive.name.value().unwrap_or_default().to_lowercase(),
            executive
                .role_category
                .value()
                .unwrap_or_default()
                .to_lowercase(),
        );
        if seen.insert(key.clone()) {
            out.push(executive);
            continue;
        }
        if let Some(existing) = out.iter_mut().find(|e| {
            e.name.value().unwrap_or_default().to_lowercase() == key.0
                && e.role_category.value().unwrap_or_default().to_lowercase() == key.1
        }) {
            let current = std::mem::take(existing);
            *existing = Executive {
                description: current.description.or(executive.description),
                tenure: current.tenure.or(executive.tenure),
                ..current
            };
        }
    }
    out
}
