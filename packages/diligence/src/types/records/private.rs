use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::extract::patterns;
use crate::types::completeness::{LeafCounter, Leaves};
use crate::types::entity::EntityContext;
use crate::types::evidence::EvidenceContext;
use crate::types::field::Field;
use crate::types::query::TaskKind;

use super::Record;

/// Profile of a company that files no periodic reports, assembled from
/// registries, reference sites, press and funding databases.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PrivateCompanyProfile {
    /// Full legal name as registered
    pub registered_legal_name: Field,
    /// Country (and state) of incorporation
    pub country_of_incorporation: Field,
    /// Date of incorporation, or founding year marked "(estimated)"
    pub incorporation_date: Field,
    /// Registered address, or headquarters address when none is published
    pub registered_business_address: Field,
    /// Activities, industries and core products or services
    pub business_description: Field,
    /// Latest headcount with date and source
    pub number_of_employees: Field,
    /// Latest annual revenue with year and source
    pub annual_revenue: Field,
    /// Latest annual sales with year, when reported apart from revenue
    pub annual_sales: Field,
    pub website_url: Field,
    pub identifiers: PrivateIdentifiers,
    /// Funding rounds with date, amount and lead investor
    pub funding_rounds: Field,
    /// Major investors or owners
    pub key_investors: Field,
    /// Latest valuation with date and source
    pub valuation: Field,
    pub leadership_team: LeadershipTeam,
}

/// Registry identifiers, including state-level ones.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct PrivateIdentifiers {
    /// State or federal registration number
    pub registration_number: Field,
    /// Secretary of State entity id
    pub state_id: Field,
    pub cik: Field,
    pub duns: Field,
    pub lei: Field,
    pub cusip: Field,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct LeadershipTeam {
    pub ceo: Officer,
    pub cfo: Officer,
    pub cto: Officer,
    pub coo: Officer,
    pub president: Officer,
    pub founders: Vec<Founder>,
    pub board_members: Vec<BoardMember>,
}

/// Holder of one named office.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Officer {
    pub name: Field,
    /// Exact title as published
    pub title: Field,
    /// Prior roles and education
    pub background: Field,
    /// When appointed or years in role
    pub tenure: Field,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Founder {
    pub name: Field,
    pub current_role: Field,
    pub background: Field,
    pub founding_date: Field,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct BoardMember {
    pub name: Field,
    /// Board position
    pub title: Field,
    pub background: Field,
}

impl Officer {
    fn leaves(&self) -> [&Field; 4] {
        [&self.name, &self.title, &self.background, &self.tenure]
    }
}

impl LeadershipTeam {
    /// The named offices in seniority order.
    pub fn officers(&self) -> [&Officer; 5] {
        [&self.ceo, &self.cfo, &self.cto, &self.coo, &self.president]
    }
}

impl Leaves for PrivateCompanyProfile {
    // Founders and board members count only for the entries present.
    fn count_leaves(&self, counter: &mut LeafCounter) {
        counter.fields([
            &self.registered_legal_name,
            &self.country_of_incorporation,
            &self.incorporation_date,
            &self.registered_business_address,
            &self.business_description,
            &self.number_of_employees,
            &self.annual_revenue,
            &self.annual_sales,
            &self.website_url,
            &self.funding_rounds,
            &self.key_investors,
            &self.valuation,
        ]);
        let ids = &self.identifiers;
        counter.fields([
            &ids.registration_number,
            &ids.state_id,
            &ids.cik,
            &ids.duns,
            &ids.lei,
            &ids.cusip,
        ]);

        let team = &self.leadership_team;
        for officer in team.officers() {
            counter.fields(officer.leaves());
        }
        for founder in &team.founders {
            counter.fields([
                &founder.name,
                &founder.current_role,
                &founder.background,
                &founder.founding_date,
            ]);
        }
        for member in &team.board_members {
            counter.fields([&member.name, &member.title, &member.background]);
        }
    }
}

impl Record for PrivateCompanyProfile {
    const TASK: TaskKind = TaskKind::PrivateCompany;

    fn instructions() -> &'static str {
        "This company files no annual or quarterly reports. Combine every source in the evidence: \
         SEC filings of any kind (Form D, Schedule 13, proxy, insider Forms 3/4/5), the official website \
         for leadership, Wikipedia for founding and headquarters, Yahoo Finance and Bloomberg for \
         financials, state registries for incorporation, funding databases for rounds, investors and \
         valuation. Prefer the most recent figures and give their year and source \
         (e.g. \"$50 million revenue 2024 per company press release\")."
    }

    fn retry_guidance() -> &'static str {
        "- incorporation_date: a founding year (\"founded 2010\") gives \"2010 (estimated from founding)\".\n\
         - number_of_employees: phrases like \"team of 200\" or \"hundreds of staff\" support an estimate.\n\
         - annual_sales: when only revenue is reported, give the revenue figure marked \"(estimated equal to revenue)\".\n\
         - registered_business_address: use the headquarters address when no registered address appears.\n\
         - country_of_incorporation: infer from the headquarters country when not stated.\n\
         - funding_rounds, key_investors, valuation: combine every funding mention into one summary each.\n\
         - Officers: search every snippet for each title; founders and board members from history and about pages."
    }

    fn template() -> Self {
        Self {
            leadership_team: LeadershipTeam {
                founders: vec![Founder::default()],
                board_members: vec![BoardMember::default()],
                ..LeadershipTeam::default()
            },
            ..Self::default()
        }
    }

    fn from_evidence(entity: &EntityContext, evidence: &EvidenceContext) -> Self {
        patterns::private::extract(entity, evidence)
    }
}
