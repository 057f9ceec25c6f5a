//! Completeness scoring.

use crate::types::completeness::{CompletenessScore, LeafCounter, Leaves};

/// Scores a record's leaf coverage.
///
/// A leaf is filled when it holds a value other than the sentinel; nested
/// collections contribute one unit per sub-field of every element.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompletenessEvaluator;

impl CompletenessEvaluator {
    pub fn new() -> Self {
        Self
    }

    pub fn evaluate<R: Leaves>(&self, record: &R) -> CompletenessScore {
        let mut counter = LeafCounter::new();
        record.count_leaves(&mut counter);
        counter.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::field::Field;
    use crate::types::records::{
        AdverseMediaItem, AdverseMediaReport, CompanyProfile, Executive, ExecutiveRoster,
        Identifiers, PrivateCompanyProfile, SanctionsScreening,
    };
    use proptest::prelude::*;

    const LONG_DESCRIPTION: &str = "designs, manufactures and services industrial widgets \
                                    for aerospace, energy and transportation customers in over forty countries";

    fn filled_profile(value: &str) -> CompanyProfile {
        let f = || Field::new(value);
        CompanyProfile {
            registered_legal_name: f(),
            country_of_incorporation: f(),
            incorporation_date: f(),
            registered_business_address: f(),
            business_description: Field::new(format!("{} {}", value, LONG_DESCRIPTION)),
            number_of_employees: f(),
            annual_revenue: f(),
            annual_sales: f(),
            website_url: f(),
            identifiers: Identifiers {
                cik: f(),
                duns: f(),
                lei: f(),
                cusip: f(),
            },
            subsidiaries: vec![],
        }
    }

    fn filled_executive(value: &str) -> Executive {
        let f = || Field::new(value);
        Executive {
            name: f(),
            title: f(),
            role_category: f(),
            description: f(),
            tenure: f(),
            background: f(),
            education: f(),
        }
    }

    #[test]
    fn test_all_sentinel_records_score_zero() {
        let evaluator = CompletenessEvaluator::new();
        assert_eq!(evaluator.evaluate(&CompanyProfile::default()).percent, 0.0);
        assert_eq!(evaluator.evaluate(&ExecutiveRoster::default()).percent, 0.0);
        assert_eq!(evaluator.evaluate(&AdverseMediaReport::default()).percent, 0.0);
        assert_eq!(evaluator.evaluate(&SanctionsScreening::default()).percent, 0.0);
        assert_eq!(evaluator.evaluate(&PrivateCompanyProfile::default()).percent, 0.0);
    }

    #[test]
    fn test_company_profile_counts_identifier_leaves() {
        let mut profile = CompanyProfile::default();
        profile.registered_legal_name = Field::new("Acme Corp");
        profile.identifiers.cik = Field::new("0000012345");

        let score = CompletenessEvaluator::new().evaluate(&profile);
        assert_eq!((score.filled, score.total), (2, 12));
        assert_eq!(score.percent, 16.67);
    }

    #[test]
    fn test_short_or_generic_description_is_unfilled() {
        let evaluator = CompletenessEvaluator::new();
        let mut profile = CompanyProfile::default();

        profile.business_description = Field::new("Widgets");
        assert_eq!(evaluator.evaluate(&profile).filled, 0);

        profile.business_description = Field::new(format!(
            "Business information available in SEC filings; the company {}",
            LONG_DESCRIPTION
        ));
        assert_eq!(evaluator.evaluate(&profile).filled, 0);

        profile.business_description = Field::new(format!("Acme Corp {}", LONG_DESCRIPTION));
        assert_eq!(evaluator.evaluate(&profile).filled, 1);
    }

    #[test]
    fn test_website_and_subsidiaries_do_not_count() {
        let mut profile = CompanyProfile::default();
        profile.website_url = Field::new("https://acme.com");
        assert_eq!(CompletenessEvaluator::new().evaluate(&profile).filled, 0);
    }

    #[test]
    fn test_short_roster_counts_missing_slots() {
        let roster = ExecutiveRoster {
            company_name: Field::new("Acme"),
            executives: vec![filled_executive("x")],
        };
        let score = CompletenessEvaluator::new().evaluate(&roster);
        // company name + 3 slots of 7 leaves
        assert_eq!(score.total, 22);
        assert_eq!(score.filled, 8);
    }

    #[test]
    fn test_nested_items_count_per_leaf() {
        let report = AdverseMediaReport {
            overall_risk_level: Field::new("Low"),
            summary: Field::new("One lawsuit"),
            items: vec![AdverseMediaItem {
                title: Field::new("Acme sued"),
                ..Default::default()
            }],
        };
        let score = CompletenessEvaluator::new().evaluate(&report);
        assert_eq!((score.filled, score.total), (3, 9));
    }

    proptest! {
        #[test]
        fn prop_fully_filled_records_score_hundred(value in "[A-Za-z0-9]{1,12}( [A-Za-z0-9]{1,12}){0,3}") {
            prop_assume!(Field::new(value.as_str()).is_filled());
            let evaluator = CompletenessEvaluator::new();
            prop_assert_eq!(evaluator.evaluate(&filled_profile(&value)).percent, 100.0);

            let roster = ExecutiveRoster {
                company_name: Field::new(value.as_str()),
                executives: vec![filled_executive(&value); 3],
            };
            prop_assert_eq!(evaluator.evaluate(&roster).percent, 100.0);
        }
    }
}
