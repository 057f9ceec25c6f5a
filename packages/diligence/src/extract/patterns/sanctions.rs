//! Pattern rules for [`SanctionsScreening`].
//!
//! Without a model this can only flag possible hits for review: a block
//! that names the entity and uses screening vocabulary becomes a match.
//! Confidence never exceeds Medium.

use super::{block_text_lower, host_of, mentions_entity};
use crate::types::entity::EntityContext;
use crate::types::evidence::{EvidenceBlock, EvidenceContext};
use crate::types::field::Field;
use crate::types::records::{SanctionsMatch, SanctionsScreening};

/// Official list publishers by host suffix.
const LIST_DOMAINS: &[(&str, &str)] = &[
    ("ofac.treasury.gov", "OFAC_SDN"),
    ("sanctionssearch.ofac.treas.gov", "OFAC_SDN"),
    ("treasury.gov", "OFAC_SDN"),
    ("un.org", "UN"),
    ("europa.eu", "EU"),
    ("gov.uk", "UK_HMT"),
    ("fincen.gov", "FINCEN"),
    ("interpol.int", "INTERPOL"),
];

/// Vocabulary keyed to the list it implies when the host is unofficial.
const LIST_TERMS: &[(&str, &str)] = &[
    ("specially designated", "OFAC_SDN"),
    ("sdn list", "OFAC_SDN"),
    ("ofac", "OFAC_SDN"),
    ("security council", "UN"),
    ("european union sanctions", "EU"),
    ("hm treasury", "UK_HMT"),
    ("ofsi", "UK_HMT"),
    ("fincen", "FINCEN"),
    ("red notice", "INTERPOL"),
    ("interpol", "INTERPOL"),
    ("politically exposed", "PEP"),
];

/// Words that must appear for a block to count as a screening hit.
const HIT_TERMS: &[&str] = &[
    "sanctioned",
    "designated",
    "designation",
    "blocked",
    "asset freeze",
    "added to",
    "listed on",
    "red notice",
    "politically exposed",
];

/// Reports that refute a hit.
const CLEAR_TERMS: &[&str] = &["no match", "not sanctioned", "delisted", "removed from"];

pub fn extract(entity: &EntityContext, evidence: &EvidenceContext) -> SanctionsScreening {
    let matches: Vec<SanctionsMatch> = evidence
        .blocks()
        .iter()
        .filter_map(|b| match_from_block(entity, b))
        .collect();

    let risk = overall_risk(&matches);
    let checked = evidence.blocks().iter().filter(|b| b.url.is_some()).count();

    let summary = if matches.is_empty() {
        format!(
            "Reviewed {} source(s); no sanctions list entry naming {} was found.",
            checked, entity.name
        )
    } else {
        let mut lists: Vec<&str> = matches.iter().filter_map(|m| m.list_source.value()).collect();
        lists.sort_unstable();
        lists.dedup();
        format!(
            "Reviewed {} source(s); {} possible match(es) for {} on {}. Manual review required.",
            checked,
            matches.len(),
            entity.name,
            lists.join(", ")
        )
    };

    SanctionsScreening {
        screening_summary: Field::new(summary),
        overall_risk: Field::new(risk),
        matches,
    }
}

fn match_from_block(entity: &EntityContext, block: &EvidenceBlock) -> Option<SanctionsMatch> {
    let url = block.url.as_deref()?;
    let text = block_text_lower(block);

    if !mentions_entity(&text, entity) {
        return None;
    }
    if !HIT_TERMS.iter().any(|t| text.contains(t)) || CLEAR_TERMS.iter().any(|t| text.contains(t))
    {
        return None;
    }

    let host = host_of(url).unwrap_or_default();
    let official = LIST_DOMAINS
        .iter()
        .find(|(suffix, _)| host == *suffix || host.ends_with(&format!(".{}", suffix)))
        .map(|(_, list)| *list);
    let list = official.or_else(|| {
        LIST_TERMS
            .iter()
            .find(|(term, _)| text.contains(term))
            .map(|(_, list)| *list)
    })?;

    let exact = text.contains(&entity.name.to_lowercase());
    let confidence = if exact && official.is_some() {
        "Medium"
    } else {
        "Low"
    };

    Some(SanctionsMatch {
        list_source: Field::new(list),
        match_type: Field::new(if exact { "Exact" } else { "Partial" }),
        confidence_level: Field::new(confidence),
        match_reason: Field::new(format!(
            "{} name match in \"{}\" ({})",
            if exact { "Full" } else { "Partial" },
            block.title,
            if official.is_some() {
                "official list publisher"
            } else {
                "secondary source"
            }
        )),
        source_url: Field::new(url),
    })
}

fn overall_risk(matches: &[SanctionsMatch]) -> &'static str {
    if matches.is_empty() {
        "Clear"
    } else if matches
        .iter()
        .any(|m| m.confidence_level.value() == Some("Medium"))
    {
        "Medium"
    } else {
        "Low"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(url: &str, title: &str, body: &str) -> EvidenceBlock {
        EvidenceBlock {
            label: "Source".into(),
            title: title.into(),
            url: Some(url.into()),
            body: body.into(),
            fetched: false,
        }
    }

    #[test]
    fn test_clear_when_nothing_matches() {
        let evidence = EvidenceContext::new(vec![block(
            "https://ofac.treasury.gov/recent-actions",
            "Recent actions",
            "Treasury designated several shipping firms.",
        )]);
        let screening = extract(&EntityContext::new("Acme Corp"), &evidence);
        assert!(screening.matches.is_empty());
        assert_eq!(screening.overall_risk.value(), Some("Clear"));
        assert!(screening.screening_summary.value().unwrap().contains("Reviewed 1 source"));
    }

    #[test]
    fn test_official_exact_match_is_medium() {
        let evidence = EvidenceContext::new(vec![block(
            "https://ofac.treasury.gov/recent-actions/2024",
            "Treasury sanctions network",
            "OFAC designated Acme Corp and two affiliates.",
        )]);
        let screening = extract(&EntityContext::new("Acme Corp"), &evidence);
        assert_eq!(screening.matches.len(), 1);
        let m = &screening.matches[0];
        assert_eq!(m.list_source.value(), Some("OFAC_SDN"));
        assert_eq!(m.match_type.value(), Some("Exact"));
        assert_eq!(m.confidence_level.value(), Some("Medium"));
        assert_eq!(screening.overall_risk.value(), Some("Medium"));
    }

    #[test]
    fn test_secondary_source_is_low() {
        let evidence = EvidenceContext::new(vec![block(
            "https://news.example.com/acme",
            "Acme linked to Interpol red notice",
            "A former Acme Corp director is subject to an Interpol red notice.",
        )]);
        let screening = extract(&EntityContext::new("Acme Corp"), &evidence);
        assert_eq!(screening.matches[0].list_source.value(), Some("INTERPOL"));
        assert_eq!(screening.matches[0].confidence_level.value(), Some("Low"));
        assert_eq!(screening.overall_risk.value(), Some("Low"));
    }

    #[test]
    fn test_delisting_is_not_a_hit() {
        let evidence = EvidenceContext::new(vec![block(
            "https://ofac.treasury.gov/x",
            "Delisting",
            "Acme Corp was designated in 2019 and removed from the SDN list in 2022.",
        )]);
        assert!(extract(&EntityContext::new("Acme Corp"), &evidence)
            .matches
            .is_empty());
    }
}
