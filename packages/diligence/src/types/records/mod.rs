//! Typed extraction records, one per task.
//!
//! Every record derives `Default` (all fields unfilled), deserializes with
//! `#[serde(default)]` so partial model output still yields a complete
//! record, and exposes its leaves for completeness scoring.

mod adverse;
mod company;
mod executives;
mod private;
mod sanctions;

pub use adverse::{AdverseMediaItem, AdverseMediaReport};
pub use company::{CompanyProfile, Identifiers, Subsidiary};
pub use executives::{Executive, ExecutiveRoster, MIN_EXECUTIVES};
pub use private::{
    BoardMember, Founder, LeadershipTeam, Officer, PrivateCompanyProfile, PrivateIdentifiers,
};
pub use sanctions::{SanctionsMatch, SanctionsScreening};

use std::fmt::Debug;

use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::completeness::Leaves;
use super::entity::EntityContext;
use super::evidence::EvidenceContext;
use super::query::TaskKind;

/// A typed record a pipeline run produces.
pub trait Record:
    Serialize + DeserializeOwned + JsonSchema + Leaves + Default + Clone + Debug + Send + Sync + 'static
{
    /// The task that produces this record.
    const TASK: TaskKind;

    /// Task-specific guidance appended to the extraction prompt.
    fn instructions() -> &'static str;

    /// Task-specific hints added to strengthened retry prompts.
    fn retry_guidance() -> &'static str {
        ""
    }

    /// Shape shown to the model: every field unfilled, lists holding one
    /// example element.
    fn template() -> Self {
        Self::default()
    }

    /// Deterministic extraction straight from evidence text.
    ///
    /// Backs the pattern strategy; must never fail, only leave fields
    /// unfilled.
    fn from_evidence(entity: &EntityContext, evidence: &EvidenceContext) -> Self;
}
