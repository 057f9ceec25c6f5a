use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::extract::patterns;
use crate::types::completeness::{LeafCounter, Leaves};
use crate::types::entity::EntityContext;
use crate::types::evidence::EvidenceContext;
use crate::types::field::Field;
use crate::types::query::TaskKind;

use super::Record;

/// Rosters shorter than this count the missing slots as unfilled.
pub const MIN_EXECUTIVES: usize = 3;

/// Leaf fields per executive.
const EXECUTIVE_LEAVES: u32 = 7;

/// Current senior leadership of a company.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ExecutiveRoster {
    pub company_name: Field,
    /// Current C-suite and senior officers, most senior first
    pub executives: Vec<Executive>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Executive {
    /// Full name
    pub name: Field,
    /// Exact title as published
    pub title: Field,
    /// One of CEO, CFO, COO, CTO, President, Chairman, Other C-Suite, Senior Leadership
    pub role_category: Field,
    /// Responsibilities in the current role
    pub description: Field,
    /// Start year or time in role
    pub tenure: Field,
    /// Prior roles and career summary
    pub background: Field,
    /// Degrees and institutions
    pub education: Field,
}

impl Executive {
    fn leaves(&self) -> [&Field; EXECUTIVE_LEAVES as usize] {
        [
            &self.name,
            &self.title,
            &self.role_category,
            &self.description,
            &self.tenure,
            &self.background,
            &self.education,
        ]
    }
}

impl Leaves for ExecutiveRoster {
    fn count_leaves(&self, counter: &mut LeafCounter) {
        counter.field(&self.company_name);
        for executive in &self.executives {
            counter.fields(executive.leaves());
        }
        let short = MIN_EXECUTIVES.saturating_sub(self.executives.len()) as u32;
        counter.missing(short * EXECUTIVE_LEAVES);
    }
}

impl Record for ExecutiveRoster {
    const TASK: TaskKind = TaskKind::Executives;

    fn instructions() -> &'static str {
        "List the company's CURRENT executive officers (CEO, CFO, COO, CTO, President, Chairman \
         and other C-suite), most senior first. Ignore former executives, board-only directors \
         and people from other companies. One entry per person."
    }

    fn template() -> Self {
        Self {
            executives: vec![Executive::default()],
            ..Self::default()
        }
    }

    fn from_evidence(entity: &EntityContext, evidence: &EvidenceContext) -> Self {
        patterns::executives::extract(entity, evidence)
    }
}
