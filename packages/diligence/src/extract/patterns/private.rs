//! Pattern rules for [`PrivateCompanyProfile`].
//!
//! Company facts and officers come from the filings and roster rules;
//! funding, valuation, investors and founders have their own.

use std::sync::LazyLock;

use regex::Regex;

use super::{company, executives};
use crate::types::entity::EntityContext;
use crate::types::evidence::EvidenceContext;
use crate::types::field::Field;
use crate::types::records::{
    Executive, Founder, LeadershipTeam, Officer, PrivateCompanyProfile, PrivateIdentifiers,
};

const PERSON: &str = r"[A-Z][a-z]+(?: +[A-Z]\.)? +[A-Z][a-z]+";

static RE_FUNDING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:raised|raises|closed|secured|announced)\s+(?:an?\s+)?\$\s?([\d,.]+)\s*(million|billion|m|b)\b[^.\n]{0,40}?\b(series\s+[a-h]\+?|seed|pre-seed|growth|venture)\b",
    )
    .expect("funding regex")
});

static RE_VALUATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:valued\s+at|valuation\s+of|worth)\s+(?:about\s+|roughly\s+|over\s+)?\$\s?([\d,.]+)\s*(million|billion)")
        .expect("valuation regex")
});

static RE_INVESTORS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:led\s+by|backed\s+by|investors\s+include)\s+([A-Z][^.\n;]{2,160})")
        .expect("investors regex")
});

static RE_FOUNDED_BY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i:founded|co-founded|started)\s+(?:in\s+((?:19|20)\d{{2}})\s+)?by\s+({PERSON})(?:\s*(?:,|and|&)\s*({PERSON}))?"
    ))
    .expect("founded-by regex")
});

static RE_REGISTRATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:file|entity|registration|company)\s+(?:number|no\.?|#)[:\s]+([A-Z0-9-]{5,15})\b")
        .expect("registration regex")
});

pub fn extract(entity: &EntityContext, evidence: &EvidenceContext) -> PrivateCompanyProfile {
    let text = evidence.text();
    let filings = company::extract(entity, evidence);
    let roster = executives::extract(entity, evidence);

    let identifiers = PrivateIdentifiers {
        registration_number: Field::from_option(
            RE_REGISTRATION.captures(text).map(|c| c[1].to_string()),
        ),
        cik: filings.identifiers.cik,
        duns: filings.identifiers.duns,
        lei: filings.identifiers.lei,
        cusip: filings.identifiers.cusip,
        ..PrivateIdentifiers::default()
    };

    PrivateCompanyProfile {
        registered_legal_name: filings.registered_legal_name,
        country_of_incorporation: filings.country_of_incorporation,
        incorporation_date: filings.incorporation_date,
        registered_business_address: filings.registered_business_address,
        business_description: filings.business_description,
        number_of_employees: filings.number_of_employees,
        annual_revenue: filings.annual_revenue,
        annual_sales: filings.annual_sales,
        website_url: filings.website_url,
        identifiers,
        funding_rounds: Field::from_option(funding_rounds(text)),
        key_investors: Field::from_option(
            RE_INVESTORS
                .captures(text)
                .map(|c| c[1].trim().trim_end_matches(',').to_string()),
        ),
        valuation: Field::from_option(
            RE_VALUATION
                .captures(text)
                .map(|c| format!("${} {}", c[1].replace(',', ""), c[2].to_lowercase())),
        ),
        leadership_team: leadership(&roster.executives, text),
    }
}

/// Every distinct funding announcement, in evidence order.
fn funding_rounds(text: &str) -> Option<String> {
    let mut rounds: Vec<String> = Vec::new();
    for c in RE_FUNDING.captures_iter(text) {
        let unit = match c[2].to_lowercase().as_str() {
            "m" | "million" => "million",
            _ => "billion",
        };
        let round = format!("{} ${} {}", title_case(&c[3]), c[1].replace(',', ""), unit);
        if !rounds.contains(&round) {
            rounds.push(round);
        }
    }
    (!rounds.is_empty()).then(|| rounds.join("; "))
}

fn title_case(words: &str) -> String {
    words
        .split_whitespace()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn officer(executive: &Executive) -> Officer {
    Officer {
        name: executive.name.clone(),
        title: executive.title.clone(),
        background: executive.description.clone(),
        tenure: executive.tenure.clone(),
    }
}

fn leadership(roster: &[Executive], text: &str) -> LeadershipTeam {
    let holder = |category: &str| {
        roster
            .iter()
            .find(|e| e.role_category.value() == Some(category))
            .map(officer)
            .unwrap_or_default()
    };

    let mut founders: Vec<Founder> = Vec::new();
    for c in RE_FOUNDED_BY.captures_iter(text) {
        let year = c.get(1).map(|m| m.as_str().to_string());
        for name in [c.get(2), c.get(3)].into_iter().flatten() {
            push_founder(&mut founders, name.as_str(), year.clone());
        }
    }
    for executive in roster {
        let is_founder = executive
            .title
            .value()
            .is_some_and(|t| t.to_lowercase().contains("founder"));
        if let (true, Some(name)) = (is_founder, executive.name.value()) {
            push_founder(&mut founders, name, None);
        }
    }

    // Current roles for founders still in office
    for founder in &mut founders {
        if let Some(current) = roster
            .iter()
            .find(|e| e.name.value() == founder.name.value())
        {
            founder.current_role = current.title.clone();
        }
    }

    LeadershipTeam {
        ceo: holder("CEO"),
        cfo: holder("CFO"),
        cto: holder("CTO"),
        coo: holder("COO"),
        president: holder("President"),
        founders,
        board_members: Vec::new(),
    }
}

fn push_founder(founders: &mut Vec<Founder>, name: &str, year: Option<String>) {
    if let Some(existing) = founders.iter_mut().find(|f| f.name.value() == Some(name)) {
        let current = std::mem::take(&mut existing.founding_date);
        existing.founding_date = current.or(Field::from_option(year));
        return;
    }
    founders.push(Founder {
        name: Field::new(name),
        founding_date: Field::from_option(year),
        ..Founder::default()
    });
}
