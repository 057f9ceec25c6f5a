//! Prompt templates for structured extraction.

use crate::types::entity::EntityContext;
use crate::types::evidence::EvidenceContext;
use crate::types::field::NOT_SPECIFIED;
use crate::types::records::Record;

/// First-attempt prompt.
///
/// Placeholders: `{entity}`, `{instructions}`, `{evidence}`, `{template}`,
/// `{schema}`, `{sentinel}`.
pub const EXTRACTION_PROMPT: &str = r#"You are a due-diligence analyst extracting verified facts about "{entity}".

{instructions}

Evidence gathered from web search:
---
{evidence}
---

Return ONLY a JSON object with exactly this shape. No prose, no code fences:
{template}

Field reference (JSON Schema):
{schema}

Rules:
- Use only facts supported by the evidence above.
- When a value cannot be found, use "{sentinel}".
- Keep every key, even when its value is "{sentinel}".
- List entries must describe "{entity}", not similarly named organizations."#;

/// Extra instructions for retries after an incomplete attempt.
pub const RETRY_ADDENDUM: &str = r#"

IMPORTANT: a previous attempt left too many fields as "{sentinel}". This time:
- Infer values from indirect evidence (headquarters city from press-release datelines, headcount from phrases like "over 10,000 employees", fiscal year from report titles).
- Where the evidence supports an approximation, give it and append "(estimated)".
- Use "{sentinel}" only when nothing in the evidence bears on the field at all."#;

/// Build the prompt for one attempt.
pub fn format_extraction_prompt<R: Record>(
    entity: &EntityContext,
    evidence: &EvidenceContext,
    strengthened: bool,
) -> String {
    let template = serde_json::to_string_pretty(&R::template()).unwrap_or_default();
    let schema = serde_json::to_string_pretty(&schemars::schema_for!(R)).unwrap_or_default();

    let mut prompt = EXTRACTION_PROMPT
        .replace("{instructions}", R::instructions())
        .replace("{evidence}", evidence.text())
        .replace("{template}", &template)
        .replace("{schema}", &schema);
    if strengthened {
        prompt.push_str(RETRY_ADDENDUM);
        let guidance = R::retry_guidance();
        if !guidance.is_empty() {
            prompt.push_str("\n\nTask hints for estimating missing fields:\n");
            prompt.push_str(guidance);
        }
    }
    prompt
        .replace("{sentinel}", NOT_SPECIFIED)
        .replace("{entity}", &entity.name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::evidence::EvidenceBlock;
    use crate::types::records::{CompanyProfile, ExecutiveRoster, PrivateCompanyProfile};

    fn evidence() -> EvidenceContext {
        EvidenceContext::new(vec![EvidenceBlock {
            label: "Source 1".into(),
            title: "Acme 10-K".into(),
            url: Some("https://sec.gov/acme".into()),
            body: "Acme reported revenue".into(),
            fetched: false,
        }])
    }

    #[test]
    fn test_prompt_embeds_entity_evidence_and_template() {
        let prompt =
            format_extraction_prompt::<CompanyProfile>(&EntityContext::new("Acme"), &evidence(), false);
        assert!(prompt.contains("\"Acme\""));
        assert!(prompt.contains("Acme reported revenue"));
        assert!(prompt.contains("\"registered_legal_name\": \"Not specified\""));
        assert!(prompt.contains("\"cik\""));
        assert!(!prompt.contains("previous attempt"));
        assert!(!prompt.contains("{sentinel}"));
    }

    #[test]
    fn test_retry_prompt_is_strengthened() {
        let prompt =
            format_extraction_prompt::<ExecutiveRoster>(&EntityContext::new("Acme"), &evidence(), true);
        assert!(prompt.contains("previous attempt"));
        assert!(prompt.contains("(estimated)"));
        // list fields show one example element
        assert!(prompt.contains("\"role_category\""));
    }

    #[test]
    fn test_private_company_retry_adds_estimation_hints() {
        let entity = EntityContext::new("Acme");
        let first = format_extraction_prompt::<PrivateCompanyProfile>(&entity, &evidence(), false);
        assert!(!first.contains("estimated from founding"));
        assert!(first.contains("\"founders\""));

        let retry = format_extraction_prompt::<PrivateCompanyProfile>(&entity, &evidence(), true);
        assert!(retry.contains("Task hints for estimating missing fields"));
        assert!(retry.contains("estimated from founding"));

        let executives = format_extraction_prompt::<ExecutiveRoster>(&entity, &evidence(), true);
        assert!(!executives.contains("Task hints"));
    }
}
