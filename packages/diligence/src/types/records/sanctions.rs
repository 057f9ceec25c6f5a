use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::extract::patterns;
use crate::types::completeness::{LeafCounter, Leaves};
use crate::types::entity::EntityContext;
use crate::types::evidence::EvidenceContext;
use crate::types::field::Field;
use crate::types::query::TaskKind;

use super::Record;

/// Result of screening an entity against sanctions and watch lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SanctionsScreening {
    /// Which lists were checked and what was found
    pub screening_summary: Field,
    /// Clear, Low, Medium or High
    pub overall_risk: Field,
    /// Potential list matches; empty when the entity is clear
    pub matches: Vec<SanctionsMatch>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SanctionsMatch {
    /// OFAC_SDN, UN, EU, UK_HMT, FINCEN, INTERPOL or PEP
    pub list_source: Field,
    /// Exact, Partial, Alias or Related Party
    pub match_type: Field,
    /// High, Medium or Low
    pub confidence_level: Field,
    /// Why this result is believed to refer to the entity
    pub match_reason: Field,
    pub source_url: Field,
}

impl Leaves for SanctionsScreening {
    fn count_leaves(&self, counter: &mut LeafCounter) {
        counter.field(&self.screening_summary).field(&self.overall_risk);
        for m in &self.matches {
            counter.fields([
                &m.list_source,
                &m.match_type,
                &m.confidence_level,
                &m.match_reason,
                &m.source_url,
            ]);
        }
    }
}

impl Record for SanctionsScreening {
    const TASK: TaskKind = TaskKind::Sanctions;

    fn instructions() -> &'static str {
        "Decide whether the company appears on OFAC SDN, UN, EU, UK HMT, FinCEN or Interpol \
         lists, or is linked to politically exposed persons. Only report a match when the \
         evidence names this entity (or a documented alias or parent); a similar name alone is \
         a Low confidence partial match. Cite the list page URL for every match."
    }

    fn template() -> Self {
        Self {
            matches: vec![SanctionsMatch::default()],
            ..Self::default()
        }
    }

    fn from_evidence(entity: &EntityContext, evidence: &EvidenceContext) -> Self {
        patterns::sanctions::extract(entity, evidence)
    }
}
