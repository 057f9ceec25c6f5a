//! Query planning.
//!
//! Expands an entity into the task's fixed catalogue of search queries.
//! Planning is pure: the same [`EntityContext`] (including its `as_of`
//! date) always yields the same ordered, distinct list.

use std::collections::HashSet;

use chrono::Months;

use crate::types::entity::EntityContext;
use crate::types::query::{SearchQuery, TaskKind};

/// Path segments of localized copies of a site, excluded from
/// site-scoped leadership queries.
const LANGUAGE_EXCLUSIONS: &str = "-inurl:/ko/ -inurl:/ja/ -inurl:/zh/ -inurl:/de/ -inurl:/fr/ \
                                   -inurl:/es/ -inurl:/it/ -inurl:/pt/ -inurl:/ru/";

/// Sections that mention executives without listing them.
const NOISE_EXCLUSIONS: &str =
    "-inurl:/news/ -inurl:/blog/ -inurl:/press/ -inurl:/events/ -inurl:/careers/";

/// Leadership page phrasings tried against the official site.
const LEADERSHIP_PHRASES: &[&str] = &[
    "leadership",
    "leadership team",
    "executive team",
    "management team",
    "executive leadership",
    "our leadership",
    "about us leadership",
    "senior management",
    "corporate officers",
    "executive officers",
    "board of directors",
    "management",
    "our team",
    "who we are",
    "company officers",
];

const EXECUTIVE_ROLES: &[(&str, &str)] = &[
    ("CEO", "chief executive officer"),
    ("CFO", "chief financial officer"),
    ("CTO", "chief technology officer"),
    ("COO", "chief operating officer"),
];

/// Adverse news categories and the terms each one searches for.
const ADVERSE_CATEGORIES: &[(&str, &str)] = &[
    ("legal", "lawsuit OR litigation OR sued"),
    ("legal", "court ruling OR judgment OR verdict"),
    ("regulatory", "regulatory action OR enforcement OR consent order"),
    ("regulatory", "fined OR penalty OR settlement"),
    ("investigation", "investigation OR probe OR subpoena"),
    ("financial", "fraud OR embezzlement OR accounting irregularities"),
    ("financial", "bankruptcy OR insolvency OR default"),
    ("ethics", "bribery OR corruption OR kickbacks"),
    ("ethics", "scandal OR misconduct OR whistleblower"),
    ("ethics", "money laundering"),
    ("environmental", "environmental violation OR pollution OR spill"),
    ("labor", "labor violation OR discrimination OR wage theft"),
    ("labor", "workplace safety OR OSHA"),
    ("cyber", "data breach OR cyberattack OR ransomware"),
    ("product", "product recall OR safety defect"),
    ("governance", "executive resigns OR ousted OR governance failure"),
    ("sanctions", "sanctions violation OR export control"),
];

/// How far back adverse media searches reach.
const ADVERSE_LOOKBACK_MONTHS: u32 = 60;

/// Screening lists and the query templates that search each one.
const SANCTIONS_SOURCES: &[(&str, &str)] = &[
    ("OFAC_SDN", "\"{entity}\" OFAC SDN list sanctions site:treasury.gov OR site:ofac.treasury.gov"),
    ("UN", "\"{entity}\" UN Security Council sanctions list site:un.org"),
    ("EU", "\"{entity}\" EU sanctions list consolidated site:europa.eu"),
    ("UK_HMT", "\"{entity}\" UK HM Treasury financial sanctions site:gov.uk"),
    ("FINCEN", "\"{entity}\" FinCEN enforcement action site:fincen.gov"),
    ("INTERPOL", "\"{entity}\" Interpol notice site:interpol.int"),
    ("PEP", "\"{entity}\" politically exposed person PEP sanctions"),
];

/// Years a private company's regulatory footprint search reaches back.
const PRIVATE_FILING_YEARS: i32 = 5;

/// Secretary-of-State registries searched for corporate filings.
const STATE_REGISTRIES: &[&str] = &["sosnc.gov", "delaware.gov", "sos.ca.gov", "dos.ny.gov"];

/// Builds the query list for one task.
#[derive(Debug, Clone, Copy)]
pub struct QueryPlanner {
    task: TaskKind,
}

impl QueryPlanner {
    pub fn new(task: TaskKind) -> Self {
        Self { task }
    }

    pub fn task(&self) -> TaskKind {
        self.task
    }

    /// Ordered, distinct queries for `entity`.
    pub fn plan(&self, entity: &EntityContext) -> Vec<SearchQuery> {
        let queries = match self.task {
            TaskKind::CompanyFilings => filings_queries(entity),
            TaskKind::Executives => executive_queries(entity),
            TaskKind::AdverseMedia => adverse_queries(entity),
            TaskKind::Sanctions => sanctions_queries(entity),
            TaskKind::PrivateCompany => private_company_queries(entity),
        };
        distinct(queries)
    }
}

fn distinct(queries: Vec<SearchQuery>) -> Vec<SearchQuery> {
    let mut seen = HashSet::new();
    queries
        .into_iter()
        .filter(|q| seen.insert(q.text.to_lowercase()))
        .collect()
}

fn filings_queries(entity: &EntityContext) -> Vec<SearchQuery> {
    let name = &entity.name;
    let year = entity.current_year();
    let prev = entity.previous_year();

    let mut queries = vec![
        SearchQuery::new(
            format!("\"{}\" 10-K {} annual report site:sec.gov", name, year),
            "annual_filing",
        )
        .with_source_hint("sec.gov"),
        SearchQuery::new(
            format!("\"{}\" 10-K {} annual report site:sec.gov", name, prev),
            "annual_filing",
        )
        .with_source_hint("sec.gov"),
        SearchQuery::new(
            format!("\"{}\" 10-Q {} quarterly report site:sec.gov", name, year),
            "quarterly_filing",
        )
        .with_source_hint("sec.gov"),
        SearchQuery::new(
            format!("\"{}\" 8-K {} earnings results", name, year),
            "current_report",
        ),
        SearchQuery::new(
            format!("\"{}\" annual revenue {} {} employees", name, prev, year),
            "financials",
        ),
        SearchQuery::new(
            format!("\"{}\" investor relations annual report {}", name, year),
            "investor_relations",
        ),
        SearchQuery::new(
            format!("\"{}\" incorporated headquarters address CIK EDGAR", name),
            "identifiers",
        )
        .with_source_hint("sec.gov"),
        SearchQuery::new(format!("\"{}\" LEI legal entity identifier", name), "identifiers"),
    ];

    if let Some(ticker) = &entity.ticker {
        queries.insert(
            1,
            SearchQuery::new(
                format!("{} 10-K {} site:sec.gov", ticker.to_uppercase(), year),
                "annual_filing",
            )
            .with_source_hint("sec.gov"),
        );
    }

    queries
}

fn executive_queries(entity: &EntityContext) -> Vec<SearchQuery> {
    let name = &entity.name;
    let mut queries = Vec::new();

    if let Some(domain) = &entity.domain {
        for phrase in LEADERSHIP_PHRASES {
            queries.push(
                SearchQuery::new(
                    format!(
                        "site:{} {} {} {}",
                        domain, phrase, LANGUAGE_EXCLUSIONS, NOISE_EXCLUSIONS
                    ),
                    "leadership_page",
                )
                .with_source_hint(domain.clone()),
            );
        }
    }

    for (short, long) in EXECUTIVE_ROLES {
        queries.push(SearchQuery::new(
            format!("\"{}\" {} \"{}\"", name, short, long),
            format!("role_{}", short.to_lowercase()),
        ));
    }

    let place = entity
        .location
        .as_ref()
        .map(|l| format!(" {}", l))
        .unwrap_or_default();
    queries.extend([
        SearchQuery::new(format!("\"{}\"{} leadership team", name, place), "global"),
        SearchQuery::new(format!("\"{}\" executive team management", name), "global"),
        SearchQuery::new(format!("\"{}\" board of directors officers", name), "global"),
        SearchQuery::new(
            format!("\"{}\" executives site:linkedin.com", name),
            "global",
        )
        .with_source_hint("linkedin.com"),
        SearchQuery::new(
            format!("\"{}\" company profile executives", name),
            "global",
        ),
    ]);

    queries
}

fn adverse_queries(entity: &EntityContext) -> Vec<SearchQuery> {
    let since = entity
        .as_of
        .checked_sub_months(Months::new(ADVERSE_LOOKBACK_MONTHS))
        .unwrap_or(entity.as_of);
    let after = since.format("%Y-%m-%d");

    ADVERSE_CATEGORIES
        .iter()
        .map(|(category, terms)| {
            SearchQuery::new(
                format!("\"{}\" ({}) after:{}", entity.name, terms, after),
                *category,
            )
        })
        .collect()
}

fn sanctions_queries(entity: &EntityContext) -> Vec<SearchQuery> {
    SANCTIONS_SOURCES
        .iter()
        .map(|(source, template)| {
            SearchQuery::new(template.replace("{entity}", &entity.name), "sanctions_list")
                .with_source_hint(*source)
        })
        .collect()
}

/// Alternative sources for a company without periodic filings, most
/// authoritative first.
fn private_company_queries(entity: &EntityContext) -> Vec<SearchQuery> {
    let name = &entity.name;
    let year = entity.current_year();
    let recent = format!("({} OR {})", year, entity.previous_year());
    let filing_years = (0..PRIVATE_FILING_YEARS)
        .map(|back| (year - back).to_string())
        .collect::<Vec<_>>()
        .join(" OR ");
    let domain = entity.domain_or_guess();
    let registries = STATE_REGISTRIES
        .iter()
        .map(|site| format!("site:{}", site))
        .collect::<Vec<_>>()
        .join(" OR ");

    vec![
        SearchQuery::new(
            format!("{} site:sec.gov ({})", name, filing_years),
            "sec_any_filing",
        )
        .with_source_hint("sec.gov"),
        SearchQuery::new(
            format!(
                "\"{}\" site:sec.gov (\"Form D\" OR \"private placement\" OR \"offering\" OR \
                 \"Schedule 13\" OR \"beneficial ownership\" OR \"DEF 14A\" OR \"acquisition\" OR \"merger\")",
                name
            ),
            "sec_private_filing",
        )
        .with_source_hint("sec.gov"),
        SearchQuery::new(
            format!(
                "\"{}\" site:sec.gov (\"Form 3\" OR \"Form 4\" OR \"Form 5\" OR \"director\" OR \"officer\" OR \"board member\")",
                name
            ),
            "sec_insider_filing",
        )
        .with_source_hint("sec.gov"),
        SearchQuery::new(
            format!(
                "site:{} (\"CEO\" OR \"CFO\" OR \"founder\" OR \"president\" OR \"leadership team\" OR \"about us\")",
                domain
            ),
            "official_site_leadership",
        )
        .with_source_hint(domain.clone()),
        SearchQuery::new(
            format!(
                "\"{}\" site:wikipedia.org (company OR founded OR headquarters OR employees OR revenue)",
                name
            ),
            "encyclopedia",
        )
        .with_source_hint("wikipedia.org"),
        SearchQuery::new(
            format!(
                "\"{}\" site:finance.yahoo.com (profile OR financials OR revenue OR employees)",
                name
            ),
            "market_profile",
        )
        .with_source_hint("finance.yahoo.com"),
        SearchQuery::new(
            format!(
                "\"{}\" site:bloomberg.com (company OR revenue OR valuation OR profile) {}",
                name, recent
            ),
            "business_news",
        )
        .with_source_hint("bloomberg.com"),
        SearchQuery::new(
            format!(
                "{} ({}) (annual report OR corporate filing OR registration) {}",
                name, registries, recent
            ),
            "state_registry",
        ),
        SearchQuery::new(
            format!(
                "\"{}\" (revenue OR funding OR employees OR \"financial results\" OR acquisition) {}",
                name, recent
            ),
            "press",
        ),
        SearchQuery::new(
            format!(
                "\"{}\" site:{} (about OR investor OR press release OR company) {}",
                name, domain, recent
            ),
            "official_site",
        )
        .with_source_hint(domain),
        SearchQuery::new(
            format!(
                "\"{}\" (site:crunchbase.com OR site:pitchbook.com OR funding OR valuation OR investors) {}",
                name, recent
            ),
            "funding_database",
        ),
    ]
}
