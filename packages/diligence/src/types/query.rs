//! Task kinds and planned search queries.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The due-diligence task a pipeline run performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Regulatory filings and corporate profile
    CompanyFilings,
    /// Executive roster
    Executives,
    /// Negative news coverage
    AdverseMedia,
    /// Sanctions and watch-list screening
    Sanctions,
    /// Profile of a company without periodic filings, from alternative sources
    PrivateCompany,
}

impl TaskKind {
    /// Every task, in display order.
    pub const ALL: [TaskKind; 5] = [
        TaskKind::CompanyFilings,
        TaskKind::Executives,
        TaskKind::AdverseMedia,
        TaskKind::Sanctions,
        TaskKind::PrivateCompany,
    ];

    /// Stable identifier used in storage keys and CLI arguments.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::CompanyFilings => "company_filings",
            TaskKind::Executives => "executives",
            TaskKind::AdverseMedia => "adverse_media",
            TaskKind::Sanctions => "sanctions",
            TaskKind::PrivateCompany => "private_company",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        TaskKind::ALL
            .into_iter()
            .find(|task| task.as_str() == normalized)
            .ok_or_else(|| {
                format!(
                    "unknown task '{}', expected one of: {}",
                    s,
                    TaskKind::ALL.map(|t| t.as_str()).join(", ")
                )
            })
    }
}

/// One planned search query.
///
/// Immutable once produced by the planner; `category` groups queries of the
/// same intent (e.g. `"leadership_page"`), `source_hint` names the list or
/// site the query targets when there is one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub text: String,
    pub category: String,
    pub source_hint: Option<String>,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            category: category.into(),
            source_hint: None,
        }
    }

    /// Attach the source this query targets.
    pub fn with_source_hint(mut self, hint: impl Into<String>) -> Self {
        self.source_hint = Some(hint.into());
        self
    }
}
