//! Pattern rules for [`CompanyProfile`].

use std::sync::LazyLock;

use regex::Regex;

use super::{mentions_entity, sentences};
use crate::types::entity::EntityContext;
use crate::types::evidence::EvidenceContext;
use crate::types::field::Field;
use crate::types::records::CompanyProfile;

static RE_REVENUE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?:total\s+|net\s+)?revenues?\s+(?:of\s+|were\s+|was\s+|totaled\s+)?\$?\s?([\d,]+\.?\d*)\s*(billion|million)",
        r"\$?([\d,]+\.?\d*)\s*(billion|million)\s+in\s+(?:total\s+)?revenues?",
        r"fiscal\s+year\s+\d{4}[^\d]*revenues?\s+[^\d]*\$?([\d,]+\.?\d*)\s*(billion|million)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("revenue regex"))
    .collect()
});

static RE_SALES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:net|total)\s+sales\s+(?:of\s+|were\s+|was\s+)?\$?\s?([\d,]+\.?\d*)\s*(billion|million)",
    )
    .expect("sales regex")
});

static RE_EMPLOYEES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"employ(?:s|ed)?\s+(?:approximately\s+|about\s+|over\s+|more\s+than\s+)?([\d,]+)\s+(?:full-time\s+)?(?:people|employees)",
        r"([\d,]+)\s+(?:full-time\s+)?employees",
        r"workforce\s+of\s+(?:approximately\s+)?([\d,]+)",
        r"headcount\s+(?:of\s+)?([\d,]+)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("employee regex"))
    .collect()
});

static RE_ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:headquarter(?:s|ed)?\s+(?:are\s+|is\s+)?(?:located\s+)?(?:at|in)\s+|located\s+at\s+|address[:\s]+)(\d[^.\n]{5,160}?\b(?:street|st|avenue|ave|road|rd|drive|dr|way|blvd|boulevard|parkway|plaza|lane)\b[^\n]{0,80}?)(?:\.\s|\n|$)",
    )
    .expect("address regex")
});

static RE_FISCAL_YEAR_END: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)fiscal\s+year\s+end(?:ed|ing)\s+(\w+\s+\d{1,2},\s+\d{4})")
        .expect("fiscal year regex")
});

static RE_INCORPORATED_IN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:incorporated|organized)\s+(?:in|under\s+the\s+laws\s+of)\s+(?:the\s+)?(?:[Ss]tate\s+of\s+)?([A-Z][a-z]+(?:\s[A-Z][a-z]+)?)",
    )
    .expect("incorporation regex")
});

static RE_INCORPORATED_ON: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:incorporated|founded)\s+(?:in|on)\s+(?:[A-Za-z]+\s+)?(?:(\w+\s+\d{1,2},\s+)?(\d{4}))")
        .expect("incorporation date regex")
});

static RE_CIK_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/data/(\d+)/").expect("cik url regex"));
static RE_CIK_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bCIK[:#\s]+(\d{4,10})\b").expect("cik regex"));
static RE_LEI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bLEI[:#\s]+([A-Z0-9]{18}\d{2})\b").expect("lei regex"));
static RE_CUSIP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bCUSIP[:#\s]+([0-9A-Z]{9})\b").expect("cusip regex"));
static RE_DUNS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bD-?U-?N-?S\b[^0-9]{0,20}(\d{2}-?\d{3}-?\d{4})\b").expect("duns regex")
});

/// Verbs that mark a sentence as describing what the company does.
const BUSINESS_VERBS: &[&str] = &[
    " provides ",
    " designs ",
    " develops ",
    " manufactures ",
    " operates ",
    " offers ",
    " is a leading ",
    " is a global ",
    " sells ",
    " produces ",
];

const MIN_EMPLOYEES: u64 = 1_000;
const MAX_EMPLOYEES: u64 = 10_000_000;

pub fn extract(entity: &EntityContext, evidence: &EvidenceContext) -> CompanyProfile {
    let text = evidence.text();
    let lower = text.to_lowercase();

    let fiscal_year_end = RE_FISCAL_YEAR_END
        .captures(text)
        .map(|c| c[1].to_string());
    let with_fy = |amount: String| match &fiscal_year_end {
        Some(fy) => format!("{} (fiscal year ended {})", amount, fy),
        None => amount,
    };

    let mut profile = CompanyProfile {
        registered_legal_name: legal_name(entity, evidence),
        country_of_incorporation: Field::from_option(
            RE_INCORPORATED_IN.captures(text).map(|c| c[1].to_string()),
        ),
        incorporation_date: Field::from_option(RE_INCORPORATED_ON.captures(text).map(|c| {
            c.get(1)
                .map(|m| format!("{}{}", m.as_str(), &c[2]))
                .unwrap_or_else(|| c[2].to_string())
        })),
        registered_business_address: Field::from_option(address(text)),
        business_description: Field::from_option(business_description(entity, text)),
        number_of_employees: Field::from_option(employees(&lower)),
        annual_revenue: Field::from_option(revenue(&lower).map(with_fy)),
        annual_sales: Field::from_option(sales(&lower).map(with_fy)),
        website_url: Field::from_option(entity.domain.as_ref().map(|d| format!("https://{}", d))),
        ..Default::default()
    };

    profile.identifiers.cik = Field::from_option(cik(evidence));
    profile.identifiers.lei = Field::from_option(RE_LEI.captures(text).map(|c| c[1].to_string()));
    profile.identifiers.cusip =
        Field::from_option(RE_CUSIP.captures(text).map(|c| c[1].to_string()));
    profile.identifiers.duns = Field::from_option(RE_DUNS.captures(text).map(|c| c[1].to_string()));

    profile
}

/// The entity name as written in an authoritative block, or the name
/// as given when any block mentions it.
fn legal_name(entity: &EntityContext, evidence: &EvidenceContext) -> Field {
    let escaped = regex::escape(&entity.name);
    let Ok(re) = Regex::new(&format!(
        r"(?i)\b{}\b(?:,?\s+(?:Inc\.?|Incorporated|Corporation|Corp\.?|Ltd\.?|LLC|plc|N\.V\.|S\.A\.))?",
        escaped
    )) else {
        return Field::unfilled();
    };

    let authoritative = evidence.blocks().iter().find_map(|block| {
        let url = block.url.as_deref().unwrap_or_default();
        if !url.contains("sec.gov") {
            return None;
        }
        re.find(&block.title)
            .or_else(|| re.find(&block.body))
            .map(|m| m.as_str().trim_end_matches(',').to_string())
    });

    match authoritative {
        Some(name) => Field::new(name),
        None if mentions_entity(&evidence.text().to_lowercase(), entity) => {
            Field::new(entity.name.clone())
        }
        None => Field::unfilled(),
    }
}

fn parse_amount(raw: &str) -> Option<f64> {
    raw.replace(',', "").parse().ok()
}

fn money(captures: &regex::Captures<'_>) -> Option<String> {
    let raw = captures.get(1)?.as_str();
    let unit = captures.get(2)?.as_str();
    let amount = parse_amount(raw)?;
    let plausible = match unit {
        "billion" => amount > 0.1,
        "million" => amount > 100.0,
        _ => false,
    };
    plausible.then(|| format!("${} {}", raw.replace(',', ""), unit))
}

fn revenue(lower: &str) -> Option<String> {
    RE_REVENUE
        .iter()
        .flat_map(|re| re.captures_iter(lower))
        .find_map(|c| money(&c))
}

fn sales(lower: &str) -> Option<String> {
    RE_SALES.captures_iter(lower).find_map(|c| money(&c))
}

fn employees(lower: &str) -> Option<String> {
    RE_EMPLOYEES
        .iter()
        .flat_map(|re| re.captures_iter(lower))
        .find_map(|c| {
            let raw = c.get(1)?.as_str();
            let count: u64 = raw.replace(',', "").parse().ok()?;
            (MIN_EMPLOYEES..=MAX_EMPLOYEES)
                .contains(&count)
                .then(|| raw.trim_matches(',').to_string())
        })
}

fn address(text: &str) -> Option<String> {
    RE_ADDRESS.captures_iter(text).find_map(|c| {
        let address = crate::text::collapse_whitespace(c.get(1)?.as_str());
        let len = address.chars().count();
        (20..=200).contains(&len).then_some(address)
    })
}

fn business_description(entity: &EntityContext, text: &str) -> Option<String> {
    sentences(text)
        .filter(|s| (40..=600).contains(&s.chars().count()))
        .find(|s| {
            let lower = format!(" {} ", s.to_lowercase());
            mentions_entity(&lower, entity) && BUSINESS_VERBS.iter().any(|v| lower.contains(v))
        })
        .map(|s| format!("{}.", s.trim_start_matches("Snippet: ").trim_start_matches("Content: ")))
}

fn cik(evidence: &EvidenceContext) -> Option<String> {
    evidence
        .sources()
        .iter()
        .find_map(|url| RE_CIK_URL.captures(url).map(|c| c[1].to_string()))
        .or_else(|| RE_CIK_TEXT.captures(evidence.text()).map(|c| c[1].to_string()))
        .map(|digits| format!("{:0>10}", digits))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::evidence::EvidenceBlock;

    fn block(url: &str, title: &str, body: &str) -> EvidenceBlock {
        EvidenceBlock {
            label: "Source".into(),
            title: title.into(),
            url: Some(url.into()),
            body: body.into(),
            fetched: false,
        }
    }

    fn acme_evidence() -> EvidenceContext {
        EvidenceContext::new(vec![
            block(
                "https://www.sec.gov/Archives/edgar/data/12345/000001234525000010/acme-10k.htm",
                "Acme Corp, Inc. Form 10-K",
                "Acme Corp is incorporated in the State of Delaware. Total revenues were $4.2 billion \
                 for the fiscal year ended December 31, 2024. We employ approximately 12,500 employees. \
                 CUSIP: 004567AB1",
            ),
            block(
                "https://news.example.com/acme",
                "Acme profile",
                "Acme Corp designs and manufactures industrial widgets for aerospace and energy customers worldwide. \
                 Headquarters located at 100 Main Street, Springfield, IL 62701.\nNet sales of $3.9 billion",
            ),
        ])
    }

    #[test]
    fn test_extracts_profile_fields() {
        let entity = EntityContext::new("Acme Corp").with_domain("acme.com");
        let profile = extract(&entity, &acme_evidence());

        assert_eq!(profile.registered_legal_name.value(), Some("Acme Corp, Inc."));
        assert_eq!(profile.country_of_incorporation.value(), Some("Delaware"));
        assert_eq!(
            profile.annual_revenue.value(),
            Some("$4.2 billion (fiscal year ended December 31, 2024)")
        );
        assert!(profile.annual_sales.value().unwrap().starts_with("$3.9 billion"));
        assert_eq!(profile.number_of_employees.value(), Some("12,500"));
        assert_eq!(profile.identifiers.cik.value(), Some("0000012345"));
        assert_eq!(profile.identifiers.cusip.value(), Some("004567AB1"));
        assert!(profile
            .registered_business_address
            .value()
            .unwrap()
            .starts_with("100 Main Street"));
        assert!(profile
            .business_description
            .value()
            .unwrap()
            .contains("industrial widgets"));
        assert_eq!(profile.website_url.value(), Some("https://acme.com"));
        assert!(!profile.identifiers.lei.is_filled());
    }

    #[test]
    fn test_implausible_amounts_are_ignored() {
        let lower = "revenue of $12 million and 40 employees";
        assert_eq!(revenue(lower), None);
        assert_eq!(employees(lower), None);
    }

    #[test]
    fn test_empty_evidence_yields_empty_profile() {
        let profile = extract(&EntityContext::new("Acme"), &EvidenceContext::default());
        assert_eq!(profile, CompanyProfile::default());
    }
}
