use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::extract::patterns;
use crate::types::completeness::{LeafCounter, Leaves};
use crate::types::entity::EntityContext;
use crate::types::evidence::EvidenceContext;
use crate::types::field::Field;
use crate::types::query::TaskKind;

use super::Record;

/// Corporate profile assembled from regulatory filings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct CompanyProfile {
    /// Full legal name as registered with the regulator
    pub registered_legal_name: Field,
    /// State or country of incorporation
    pub country_of_incorporation: Field,
    /// Date of incorporation, YYYY-MM-DD when known
    pub incorporation_date: Field,
    /// Registered or principal executive office address
    pub registered_business_address: Field,
    /// What the company does, its segments and markets
    pub business_description: Field,
    /// Total employee headcount
    pub number_of_employees: Field,
    /// Most recent annual revenue with currency and fiscal year
    pub annual_revenue: Field,
    /// Most recent annual net sales with currency and fiscal year
    pub annual_sales: Field,
    /// Official website
    pub website_url: Field,
    pub identifiers: Identifiers,
    /// Significant subsidiaries; an empty list is a valid answer
    pub subsidiaries: Vec<Subsidiary>,
}

/// Registry identifiers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Identifiers {
    /// SEC Central Index Key, 10 digits
    pub cik: Field,
    /// Dun & Bradstreet number
    pub duns: Field,
    /// Legal Entity Identifier, 20 characters
    pub lei: Field,
    /// CUSIP security identifier
    pub cusip: Field,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Subsidiary {
    pub name: Field,
    pub location: Field,
    pub description: Field,
}

/// Descriptions this short say nothing a filing index line would not.
const MIN_DESCRIPTION_CHARS: usize = 100;

/// Boilerplate a model emits in place of a description.
const GENERIC_DESCRIPTIONS: &[&str] = &["business information available"];

impl CompanyProfile {
    /// Whether the business description says what the company does.
    pub fn has_substantive_description(&self) -> bool {
        self.business_description.value().is_some_and(|text| {
            let lower = text.to_lowercase();
            text.chars().count() > MIN_DESCRIPTION_CHARS
                && !GENERIC_DESCRIPTIONS.iter().any(|g| lower.contains(g))
        })
    }
}

impl Leaves for CompanyProfile {
    // Website and subsidiaries are informational and do not count.
    fn count_leaves(&self, counter: &mut LeafCounter) {
        counter.fields([
            &self.registered_legal_name,
            &self.country_of_incorporation,
            &self.incorporation_date,
            &self.registered_business_address,
        ]);
        counter.leaf(self.has_substantive_description());
        counter.fields([
            &self.number_of_employees,
            &self.annual_revenue,
            &self.annual_sales,
        ]);
        counter.fields([
            &self.identifiers.cik,
            &self.identifiers.duns,
            &self.identifiers.lei,
            &self.identifiers.cusip,
        ]);
    }
}

impl Record for CompanyProfile {
    const TASK: TaskKind = TaskKind::CompanyFilings;

    fn instructions() -> &'static str {
        "Extract the corporate profile from the regulatory filings and search evidence. \
         Prefer the most recent annual report (10-K) over quarterly and current reports. \
         Report revenue and sales with currency, scale and fiscal year (e.g. \"$4.2 billion (FY2024)\"). \
         Identifiers must be copied exactly as they appear; never invent a CIK, DUNS, LEI or CUSIP."
    }

    fn template() -> Self {
        Self {
            subsidiaries: vec![Subsidiary::default()],
            ..Self::default()
        }
    }

    fn from_evidence(entity: &EntityContext, evidence: &EvidenceContext) -> Self {
        patterns::company::extract(entity, evidence)
    }
}
