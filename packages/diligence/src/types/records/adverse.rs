use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::extract::patterns;
use crate::types::completeness::{LeafCounter, Leaves};
use crate::types::entity::EntityContext;
use crate::types::evidence::EvidenceContext;
use crate::types::field::Field;
use crate::types::query::TaskKind;

use super::Record;

/// Negative news coverage found for an entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AdverseMediaReport {
    /// Low, Medium, High or Critical
    pub overall_risk_level: Field,
    /// Two or three sentences on the overall picture
    pub summary: Field,
    /// One entry per distinct adverse story; empty when none was found
    pub items: Vec<AdverseMediaItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AdverseMediaItem {
    pub title: Field,
    /// Publisher
    pub source: Field,
    pub url: Field,
    pub published_date: Field,
    /// legal, regulatory, financial, ethics, environmental, labor, cyber, product or governance
    pub category: Field,
    /// Severity from 1 (minor) to 10 (critical)
    pub severity: Field,
    /// What happened and why it matters
    pub description: Field,
}

impl Leaves for AdverseMediaReport {
    fn count_leaves(&self, counter: &mut LeafCounter) {
        counter.field(&self.overall_risk_level).field(&self.summary);
        for item in &self.items {
            counter.fields([
                &item.title,
                &item.source,
                &item.url,
                &item.published_date,
                &item.category,
                &item.severity,
                &item.description,
            ]);
        }
    }
}

impl Record for AdverseMediaReport {
    const TASK: TaskKind = TaskKind::AdverseMedia;

    fn instructions() -> &'static str {
        "Identify genuinely adverse coverage of the company: litigation, regulatory action, \
         investigations, fraud, corruption, insolvency, environmental or labor violations, data \
         breaches, product recalls and governance failures. Ignore positive news, stock tips and \
         stories about other companies with similar names. Merge duplicate stories."
    }

    fn template() -> Self {
        Self {
            items: vec![AdverseMediaItem::default()],
            ..Self::default()
        }
    }

    fn from_evidence(entity: &EntityContext, evidence: &EvidenceContext) -> Self {
        patterns::adverse::extract(entity, evidence)
    }
}
