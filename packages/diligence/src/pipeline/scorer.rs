//! Candidate deduplication and scoring.
//!
//! Hits are collapsed by normalized URL (first seen wins), scored against a
//! battery of weighted boolean signals, filtered by a minimum score and
//! sorted best first. Ties keep first-seen order.
//!
//! Signal weights are configuration, not code: a [`ScoringProfile`] is
//! plain serde data and can be tuned per deployment. Every weight is a
//! [`NonZeroU32`], so a matching signal always raises the score.

use std::collections::{BTreeSet, HashSet};
use std::num::NonZeroU32;

use nonzero_ext::nonzero;
use serde::{Deserialize, Serialize};

use crate::types::candidate::ScoredCandidate;
use crate::types::entity::EntityContext;
use crate::types::hit::Hit;
use crate::types::query::TaskKind;

/// Part of a hit a condition looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    Url,
    Title,
    Snippet,
    /// Title or snippet.
    Text,
    /// Title, snippet or URL.
    Any,
}

/// Holds when any of `any_of` occurs (case-insensitively) in `scope`.
///
/// Terms may use placeholders resolved per entity: `{entity}`,
/// `{entity_parts}` (each distinctive name word), `{ticker}`, `{domain}`,
/// `{year}` and `{prev_year}`. A placeholder with no value drops the term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub scope: Scope,
    pub any_of: Vec<String>,
}

/// A weighted signal; matches when all its conditions hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalRule {
    pub id: String,
    pub weight: NonZeroU32,
    pub conditions: Vec<Condition>,
}

impl SignalRule {
    pub fn new(id: impl Into<String>, weight: NonZeroU32) -> Self {
        Self {
            id: id.into(),
            weight,
            conditions: Vec::new(),
        }
    }

    /// Add a condition.
    pub fn when(mut self, scope: Scope, any_of: &[&str]) -> Self {
        self.conditions.push(Condition {
            scope,
            any_of: any_of.iter().map(|t| t.to_string()).collect(),
        });
        self
    }
}

/// Signal battery and cut-off for one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringProfile {
    /// Candidates scoring below this are discarded.
    pub min_score: u32,
    pub rules: Vec<SignalRule>,
}

impl Default for ScoringProfile {
    fn default() -> Self {
        Self::for_task(TaskKind::CompanyFilings)
    }
}

impl ScoringProfile {
    pub fn for_task(task: TaskKind) -> Self {
        match task {
            TaskKind::CompanyFilings => filings_profile(),
            TaskKind::Executives => executives_profile(),
            TaskKind::AdverseMedia => adverse_profile(),
            TaskKind::Sanctions => sanctions_profile(),
            TaskKind::PrivateCompany => private_company_profile(),
        }
    }

    pub fn with_min_score(mut self, min_score: u32) -> Self {
        self.min_score = min_score;
        self
    }
}

fn filings_profile() -> ScoringProfile {
    use Scope::*;
    ScoringProfile {
        min_score: 15,
        rules: vec![
            SignalRule::new("authoritative_source", nonzero!(10u32)).when(Url, &["sec.gov", "edgar"]),
            SignalRule::new("filing_keyword", nonzero!(10u32)).when(
                Text,
                &["10-k", "10-q", "8-k", "annual report", "quarterly report", "earnings"],
            ),
            SignalRule::new("temporal_token", nonzero!(20u32)).when(
                Text,
                &["{year}0930", "{year}-09-30", "{year}1231", "{year}-12-31", "fiscal {year}"],
            ),
            SignalRule::new("entity_name", nonzero!(25u32))
                .when(Any, &["{entity}", "{ticker}"]),
            SignalRule::new("current_year_url", nonzero!(25u32)).when(Url, &["{year}"]),
            SignalRule::new("previous_year_url", nonzero!(15u32)).when(Url, &["{prev_year}"]),
            SignalRule::new("annual_filing_title", nonzero!(20u32)).when(Title, &["10-k"]),
            SignalRule::new("current_quarterly_title", nonzero!(18u32))
                .when(Title, &["10-q"])
                .when(Title, &["{year}"]),
            SignalRule::new("earnings", nonzero!(15u32)).when(Text, &["earnings"]),
            SignalRule::new("current_report_title", nonzero!(5u32)).when(Title, &["8-k"]),
            SignalRule::new("current_report_financials", nonzero!(7u32))
                .when(Title, &["8-k"])
                .when(Snippet, &["earnings", "financial"]),
            SignalRule::new("financial_indicator", nonzero!(10u32)).when(
                Snippet,
                &[
                    "revenue",
                    "sales",
                    "income",
                    "earnings",
                    "financial results",
                    "quarterly results",
                ],
            ),
            SignalRule::new("entity_part_url", nonzero!(15u32)).when(Url, &["{entity_parts}"]),
            SignalRule::new("entity_part_title", nonzero!(10u32)).when(Title, &["{entity_parts}"]),
            SignalRule::new("ticker_url", nonzero!(20u32)).when(Url, &["{ticker}"]),
        ],
    }
}

fn executives_profile() -> ScoringProfile {
    use Scope::*;
    ScoringProfile {
        min_score: 15,
        rules: vec![
            SignalRule::new("official_domain", nonzero!(20u32)).when(Url, &["{domain}"]),
            SignalRule::new("leadership_page", nonzero!(15u32)).when(
                Url,
                &["leadership", "management", "executive", "team", "officers", "board"],
            ),
            SignalRule::new("role_keyword", nonzero!(10u32)).when(
                Text,
                &[
                    "chief executive",
                    "ceo",
                    "chief financial",
                    "cfo",
                    "chief operating",
                    "coo",
                    "chief technology",
                    "cto",
                    "president",
                    "chairman",
                ],
            ),
            SignalRule::new("entity_name", nonzero!(15u32)).when(Any, &["{entity}"]),
            SignalRule::new("entity_part", nonzero!(5u32)).when(Any, &["{entity_parts}"]),
            SignalRule::new("profile_source", nonzero!(5u32)).when(
                Url,
                &["linkedin.com", "bloomberg.com", "reuters.com", "crunchbase.com", "forbes.com"],
            ),
        ],
    }
}

fn adverse_profile() -> ScoringProfile {
    use Scope::*;
    const ADVERSE: &[&str] = &[
        "lawsuit",
        "sued",
        "litigation",
        "fraud",
        "investigation",
        "probe",
        "penalty",
        "fined",
        "settlement",
        "violation",
        "scandal",
        "bankruptcy",
        "indicted",
        "charged",
        "breach",
        "recall",
        "bribery",
        "corruption",
        "laundering",
        "misconduct",
        "enforcement",
    ];
    ScoringProfile {
        min_score: 25,
        rules: vec![
            SignalRule::new("entity_name", nonzero!(15u32)).when(Text, &["{entity}"]),
            SignalRule::new("adverse_keyword", nonzero!(10u32)).when(Text, ADVERSE),
            SignalRule::new("adverse_headline", nonzero!(10u32)).when(Title, ADVERSE),
            SignalRule::new("recent", nonzero!(5u32)).when(Text, &["{year}", "{prev_year}"]),
            SignalRule::new("established_outlet", nonzero!(5u32)).when(
                Url,
                &[
                    "reuters.com",
                    "bloomberg.com",
                    "wsj.com",
                    "ft.com",
                    "apnews.com",
                    "nytimes.com",
                    "justice.gov",
                    "sec.gov",
                ],
            ),
        ],
    }
}

fn sanctions_profile() -> ScoringProfile {
    use Scope::*;
    ScoringProfile {
        min_score: 25,
        rules: vec![
            SignalRule::new("official_list", nonzero!(15u32)).when(
                Url,
                &[
                    "treasury.gov",
                    "ofac",
                    "un.org",
                    "europa.eu",
                    "gov.uk",
                    "fincen.gov",
                    "interpol.int",
                    "opensanctions.org",
                ],
            ),
            SignalRule::new("sanctions_keyword", nonzero!(10u32)).when(
                Text,
                &[
                    "sanction",
                    "sdn",
                    "designated",
                    "blocked",
                    "asset freeze",
                    "watchlist",
                    "politically exposed",
                    "pep",
                    "enforcement action",
                ],
            ),
            SignalRule::new("entity_name", nonzero!(15u32)).when(Text, &["{entity}"]),
            SignalRule::new("entity_part", nonzero!(5u32)).when(Any, &["{entity_parts}"]),
        ],
    }
}

fn private_company_profile() -> ScoringProfile {
    use Scope::*;
    ScoringProfile {
        min_score: 15,
        rules: vec![
            SignalRule::new("entity_name", nonzero!(25u32)).when(Any, &["{entity}"]),
            SignalRule::new("entity_part", nonzero!(10u32)).when(Any, &["{entity_parts}"]),
            SignalRule::new("official_domain", nonzero!(15u32)).when(Url, &["{domain}"]),
            SignalRule::new("regulator", nonzero!(15u32)).when(
                Url,
                &["sec.gov", "sosnc.gov", "delaware.gov", "sos.ca.gov", "dos.ny.gov"],
            ),
            SignalRule::new("reference_profile", nonzero!(10u32)).when(
                Url,
                &[
                    "wikipedia.org",
                    "finance.yahoo.com",
                    "bloomberg.com",
                    "crunchbase.com",
                    "pitchbook.com",
                    "privco.com",
                ],
            ),
            SignalRule::new("company_fact", nonzero!(10u32)).when(
                Text,
                &[
                    "founded",
                    "headquarter",
                    "employees",
                    "revenue",
                    "incorporated",
                    "privately held",
                ],
            ),
            SignalRule::new("funding", nonzero!(10u32)).when(
                Text,
                &["funding", "series a", "series b", "series c", "valuation", "valued at", "investors"],
            ),
            SignalRule::new("private_filing", nonzero!(10u32))
                .when(Text, &["form d", "private placement", "offering"]),
            SignalRule::new("recent", nonzero!(5u32)).when(Text, &["{year}", "{prev_year}"]),
        ],
    }
}

/// Normalize a URL for deduplication.
///
/// Drops the scheme, a leading `www.`, any fragment and trailing slashes,
/// and lowercases the host. Paths keep their case.
pub fn normalize_url(url: &str) -> String {
    let url = url.trim();
    let rest = match url.find("://") {
        Some(idx) => &url[idx + 3..],
        None => url,
    };
    let rest = rest.split('#').next().unwrap_or(rest);

    let (host, path) = match rest.find('/') {
        Some(idx) => (&rest[..idx], &rest[idx..]),
        None => (rest, ""),
    };
    let host = host.to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);

    format!("{}{}", host, path).trim_end_matches('/').to_string()
}

/// Keep the first hit for each normalized URL, in first-seen order.
pub fn dedup_hits(hits: Vec<Hit>) -> Vec<Hit> {
    let mut seen = HashSet::new();
    hits.into_iter()
        .filter(|hit| seen.insert(normalize_url(&hit.url)))
        .collect()
}

/// A rule with placeholders resolved for one entity.
struct CompiledRule {
    id: String,
    weight: u32,
    conditions: Vec<(Scope, Vec<String>)>,
}

impl CompiledRule {
    fn matches(&self, haystack: &Haystack) -> bool {
        !self.conditions.is_empty()
            && self.conditions.iter().all(|(scope, terms)| {
                terms
                    .iter()
                    .any(|term| haystack.in_scope(*scope, term))
            })
    }
}

struct Haystack {
    url: String,
    title: String,
    snippet: String,
}

impl Haystack {
    fn new(hit: &Hit) -> Self {
        Self {
            url: hit.url.to_lowercase(),
            title: hit.title.to_lowercase(),
            snippet: hit.snippet.to_lowercase(),
        }
    }

    fn in_scope(&self, scope: Scope, term: &str) -> bool {
        match scope {
            Scope::Url => self.url.contains(term),
            Scope::Title => self.title.contains(term),
            Scope::Snippet => self.snippet.contains(term),
            Scope::Text => self.title.contains(term) || self.snippet.contains(term),
            Scope::Any => {
                self.title.contains(term) || self.snippet.contains(term) || self.url.contains(term)
            }
        }
    }
}

fn expand_term(term: &str, entity: &EntityContext) -> Vec<String> {
    let term = term.to_lowercase();
    if term.contains("{entity_parts}") {
        return entity
            .name_parts()
            .into_iter()
            .map(|part| term.replace("{entity_parts}", &part))
            .collect();
    }

    let mut expanded = term;
    let substitutions = [
        ("{entity}", Some(entity.name.to_lowercase())),
        ("{ticker}", entity.ticker.as_ref().map(|t| t.to_lowercase())),
        ("{domain}", entity.domain.as_ref().map(|d| d.to_lowercase())),
        ("{year}", Some(entity.current_year().to_string())),
        ("{prev_year}", Some(entity.previous_year().to_string())),
    ];
    for (placeholder, value) in substitutions {
        if expanded.contains(placeholder) {
            match value {
                Some(value) if !value.is_empty() => {
                    expanded = expanded.replace(placeholder, &value)
                }
                _ => return Vec::new(),
            }
        }
    }
    vec![expanded]
}

/// Scores and ranks hits against a [`ScoringProfile`].
#[derive(Debug, Clone)]
pub struct CandidateScorer {
    profile: ScoringProfile,
}

impl CandidateScorer {
    pub fn new(profile: ScoringProfile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &ScoringProfile {
        &self.profile
    }

    fn compile(&self, entity: &EntityContext) -> Vec<CompiledRule> {
        self.profile
            .rules
            .iter()
            .map(|rule| CompiledRule {
                id: rule.id.clone(),
                weight: rule.weight.get(),
                conditions: rule
                    .conditions
                    .iter()
                    .map(|c| {
                        let terms = c
                            .any_of
                            .iter()
                            .flat_map(|t| expand_term(t, entity))
                            .collect();
                        (c.scope, terms)
                    })
                    .collect(),
            })
            .collect()
    }

    /// Score one hit without filtering.
    pub fn evaluate(&self, hit: &Hit, entity: &EntityContext) -> (u32, BTreeSet<String>) {
        evaluate_compiled(&self.compile(entity), hit)
    }

    /// Dedup, score, filter and sort.
    pub fn rank(&self, hits: Vec<Hit>, entity: &EntityContext) -> Vec<ScoredCandidate> {
        let rules = self.compile(entity);
        let unique = dedup_hits(hits);
        let total = unique.len();

        let mut candidates: Vec<ScoredCandidate> = unique
            .into_iter()
            .map(|hit| {
                let (score, matched_signals) = evaluate_compiled(&rules, &hit);
                tracing::debug!(url = %hit.url, score, signals = ?matched_signals, "Scored candidate");
                ScoredCandidate {
                    hit,
                    score,
                    matched_signals,
                }
            })
            .filter(|c| c.score >= self.profile.min_score)
            .collect();

        // Stable: equal scores keep first-seen order
        candidates.sort_by(|a, b| b.score.cmp(&a.score));

        tracing::info!(
            unique = total,
            kept = candidates.len(),
            min_score = self.profile.min_score,
            "Ranked candidates"
        );
        candidates
    }
}

fn evaluate_compiled(rules: &[CompiledRule], hit: &Hit) -> (u32, BTreeSet<String>) {
    let haystack = Haystack::new(hit);
    let mut score = 0u32;
    let mut matched = BTreeSet::new();
    for rule in rules {
        if rule.matches(&haystack) {
            score = score.saturating_add(rule.weight);
            matched.insert(rule.id.clone());
        }
    }
    (score, matched)
}
