//! The entity a pipeline run is about.

use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Name parts shorter than this are too generic to score on ("Inc", "Co").
const MIN_NAME_PART_LEN: usize = 4;

/// Corporate suffixes ignored when splitting a name into parts.
const LEGAL_SUFFIXES: &[&str] = &[
    "inc", "corp", "corporation", "company", "ltd", "limited", "llc", "plc", "holdings", "group",
];

/// Entity under investigation plus the facts that parameterize planning
/// and scoring.
///
/// `as_of` pins the calendar so planning is reproducible; it defaults to
/// today's UTC date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityContext {
    pub name: String,
    pub ticker: Option<String>,
    pub domain: Option<String>,
    pub location: Option<String>,
    pub as_of: NaiveDate,
}

impl EntityContext {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().trim().to_string(),
            ticker: None,
            domain: None,
            location: None,
            as_of: Utc::now().date_naive(),
        }
    }

    /// Set the exchange ticker.
    pub fn with_ticker(mut self, ticker: impl Into<String>) -> Self {
        self.ticker = Some(ticker.into());
        self
    }

    /// Set the official web domain (scheme and `www.` are dropped).
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        let domain = domain.into();
        let bare = domain
            .trim()
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_start_matches("www.")
            .trim_end_matches('/')
            .to_lowercase();
        self.domain = Some(bare);
        self
    }

    /// Set the headquarters location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Pin the reference date.
    pub fn as_of(mut self, date: NaiveDate) -> Self {
        self.as_of = date;
        self
    }

    pub fn current_year(&self) -> i32 {
        self.as_of.year()
    }

    pub fn previous_year(&self) -> i32 {
        self.as_of.year() - 1
    }

    /// Storage partition key for this entity.
    pub fn id(&self) -> String {
        normalize_entity_id(&self.name)
    }

    /// The official domain, or `<name>.com` built from the name without
    /// its legal suffixes when none was given.
    pub fn domain_or_guess(&self) -> String {
        if let Some(domain) = &self.domain {
            return domain.clone();
        }
        let stem: String = self
            .name
            .split_whitespace()
            .map(|word| {
                word.chars()
                    .filter(char::is_ascii_alphanumeric)
                    .collect::<String>()
                    .to_lowercase()
            })
            .filter(|word| !word.is_empty() && !LEGAL_SUFFIXES.contains(&word.as_str()))
            .collect();
        format!("{}.com", stem)
    }

    /// Distinctive lowercase words of the name, for fuzzy matching.
    pub fn name_parts(&self) -> Vec<String> {
        self.name
            .split(|c: char| !c.is_alphanumeric() && c != '&')
            .map(str::to_lowercase)
            .filter(|part| part.chars().count() >= MIN_NAME_PART_LEN)
            .filter(|part| !LEGAL_SUFFIXES.contains(&part.as_str()))
            .collect()
    }
}

/// Normalize an entity name into a storage key.
///
/// Lowercases, maps whitespace to `_`, drops `,` and `.`, and collapses
/// repeated or edge underscores: `"Acme Corp., Inc."` becomes `acme_corp_inc`.
pub fn normalize_entity_id(name: &str) -> String {
    let mapped: String = name
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| *c != ',' && *c != '.')
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect();

    let mut id = String::with_capacity(mapped.len());
    for c in mapped.chars() {
        if c == '_' && id.ends_with('_') {
            continue;
        }
        id.push(c);
    }
    id.trim_matches('_').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_entity_id() {
        assert_eq!(normalize_entity_id("Acme Corp"), "acme_corp");
        assert_eq!(normalize_entity_id("  Acme Corp., Inc. "), "acme_corp_inc");
        assert_eq!(normalize_entity_id("A  B"), "a_b");
    }

    #[test]
    fn test_name_parts_skip_short_words_and_suffixes() {
        let entity = EntityContext::new("Acme Widget Co Holdings");
        assert_eq!(entity.name_parts(), vec!["acme", "widget"]);
    }

    #[test]
    fn test_domain_is_normalized() {
        let entity = EntityContext::new("Acme").with_domain("https://www.Acme.com/");
        assert_eq!(entity.domain.as_deref(), Some("acme.com"));
    }

    #[test]
    fn test_domain_guess_drops_legal_suffixes() {
        assert_eq!(
            EntityContext::new("Acme Widget Corp., Inc.").domain_or_guess(),
            "acmewidget.com"
        );
        assert_eq!(
            EntityContext::new("Acme").with_domain("acme.io").domain_or_guess(),
            "acme.io"
        );
    }

    #[test]
    fn test_years_follow_as_of() {
        let entity =
            EntityContext::new("Acme").as_of(NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
        assert_eq!(entity.current_year(), 2025);
        assert_eq!(entity.previous_year(), 2024);
    }
}
