//! Configuration for a pipeline run.
//!
//! One immutable [`PipelineConfig`] is handed to the pipeline at
//! construction; each component reads only its own section.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::pipeline::scorer::ScoringProfile;
use crate::types::query::TaskKind;

/// Which result vertical to search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchKind {
    #[default]
    Web,
    News,
}

/// Per-call options forwarded to the search collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    /// Results requested per query.
    pub num_results: usize,

    /// Two-letter country code (Serper `gl`).
    pub country: String,

    /// Two-letter interface language (Serper `hl`).
    pub language: String,

    /// Provider time filter such as `qdr:y` (past year).
    pub time_range: Option<String>,

    pub kind: SearchKind,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            num_results: 10,
            country: "us".to_string(),
            language: "en".to_string(),
            time_range: None,
            kind: SearchKind::Web,
        }
    }
}

/// Fan-out settings for the search aggregator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Maximum queries in flight at once.
    ///
    /// Default: 6.
    pub concurrency: usize,

    /// Deadline for each search call, in seconds. A call that overruns is
    /// treated as failed.
    ///
    /// Default: 10.
    pub per_query_timeout_secs: u64,

    pub search: SearchOptions,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            concurrency: 6,
            per_query_timeout_secs: 10,
            search: SearchOptions::default(),
        }
    }
}

impl AggregatorConfig {
    pub fn per_query_timeout(&self) -> Duration {
        Duration::from_secs(self.per_query_timeout_secs)
    }
}

/// Size bounds for the evidence context.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Candidates considered for evidence, best first.
    pub top_k: usize,

    /// Leading candidates whose full page is fetched (when a fetcher is
    /// configured). Zero disables fetching.
    pub fetch_head: usize,

    /// Character cap for each block body.
    pub per_item_chars: usize,

    /// Character cap for the whole context.
    pub total_chars: usize,

    /// Deadline for each page fetch, in seconds.
    pub fetch_timeout_secs: u64,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            top_k: 10,
            fetch_head: 3,
            per_item_chars: 5000,
            total_chars: 20_000,
            fetch_timeout_secs: 10,
        }
    }
}

impl ContextConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

/// Settings for calls to the extraction collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Output token budget for the first attempt.
    pub max_output_tokens: u32,

    /// Sampling temperature for the first attempt.
    pub temperature: f32,

    /// Output token budget for strengthened retries.
    pub retry_max_output_tokens: u32,

    /// Sampling temperature for strengthened retries.
    pub retry_temperature: f32,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_output_tokens: 4000,
            temperature: 0.1,
            retry_max_output_tokens: 6000,
            retry_temperature: 0.5,
        }
    }
}

/// Retry budget and completeness target.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempts after the first; a run makes at most `max_retries + 1`.
    pub max_retries: u32,

    /// Completeness percent at which a record is accepted.
    pub target_percent: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            target_percent: 95.0,
        }
    }
}

/// Everything a pipeline run is configured with.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub aggregator: AggregatorConfig,
    pub scoring: ScoringProfile,
    pub context: ContextConfig,
    pub extraction: ExtractionConfig,
    pub retry: RetryConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::for_task(TaskKind::CompanyFilings)
    }
}

impl PipelineConfig {
    /// Defaults tuned for one task.
    pub fn for_task(task: TaskKind) -> Self {
        let mut aggregator = AggregatorConfig::default();
        let mut context = ContextConfig::default();
        let mut extraction = ExtractionConfig::default();

        match task {
            TaskKind::CompanyFilings => {
                aggregator.search.num_results = 20;
                aggregator.search.time_range = Some("qdr:y".to_string());
                aggregator.concurrency = 5;
                context.fetch_head = 0;
                context.per_item_chars = 600;
                context.total_chars = 8000;
            }
            TaskKind::Executives => {
                aggregator.concurrency = 6;
                context.top_k = 10;
                context.fetch_head = 3;
            }
            TaskKind::AdverseMedia => {
                aggregator.concurrency = 5;
                aggregator.search.num_results = 20;
                aggregator.search.kind = SearchKind::News;
                context.top_k = 25;
                context.fetch_head = 0;
                context.per_item_chars = 500;
                context.total_chars = 12_000;
            }
            TaskKind::Sanctions => {
                aggregator.concurrency = 7;
                context.top_k = 15;
                context.fetch_head = 0;
                context.per_item_chars = 500;
                context.total_chars = 8000;
            }
            TaskKind::PrivateCompany => {
                aggregator.search.time_range = Some("qdr:y2".to_string());
                context.top_k = 30;
                context.fetch_head = 2;
                context.per_item_chars = 800;
                extraction.max_output_tokens = 6000;
            }
        }

        Self {
            aggregator,
            scoring: ScoringProfile::for_task(task),
            context,
            extraction,
            retry: RetryConfig::default(),
        }
    }

    /// Set the retry budget.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.retry.max_retries = max_retries;
        self
    }

    /// Set the completeness target.
    pub fn with_target_percent(mut self, target: f64) -> Self {
        self.retry.target_percent = target;
        self
    }

    /// Set the search concurrency limit.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.aggregator.concurrency = concurrency;
        self
    }

    /// Set the per-query search deadline.
    pub fn with_per_query_timeout(mut self, timeout: Duration) -> Self {
        self.aggregator.per_query_timeout_secs = timeout.as_secs().max(1);
        self
    }

    /// Replace the scoring profile.
    pub fn with_scoring(mut self, scoring: ScoringProfile) -> Self {
        self.scoring = scoring;
        self
    }

    /// Replace the context bounds.
    pub fn with_context(mut self, context: ContextConfig) -> Self {
        self.context = context;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_observed_constants() {
        let config = PipelineConfig::default();
        assert_eq!(config.retry.max_retries, 2);
        assert_eq!(config.retry.target_percent, 95.0);
        assert_eq!(config.scoring.min_score, 15);
        assert_eq!(config.extraction.max_output_tokens, 4000);
    }

    #[test]
    fn test_task_concurrency() {
        assert_eq!(
            PipelineConfig::for_task(TaskKind::Sanctions)
                .aggregator
                .concurrency,
            7
        );
        assert_eq!(
            PipelineConfig::for_task(TaskKind::AdverseMedia)
                .aggregator
                .search
                .kind,
            SearchKind::News
        );
    }

    #[test]
    fn test_private_company_searches_two_years_with_larger_budget() {
        let config = PipelineConfig::for_task(TaskKind::PrivateCompany);
        assert_eq!(config.aggregator.search.time_range.as_deref(), Some("qdr:y2"));
        assert_eq!(config.extraction.max_output_tokens, 6000);
        assert_eq!(config.context.total_chars, 20_000);
    }

    #[test]
    fn test_partial_json_config_keeps_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"retry": {"max_retries": 4}}"#).unwrap();
        assert_eq!(config.retry.max_retries, 4);
        assert_eq!(config.retry.target_percent, 95.0);
        assert_eq!(config.aggregator.per_query_timeout_secs, 10);
    }
}
