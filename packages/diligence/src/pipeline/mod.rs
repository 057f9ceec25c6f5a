//! The evidence pipeline.
//!
//! One run moves through:
//! - Planning (task query catalogue for the entity)
//! - Aggregation (bounded concurrent search fan-out)
//! - Scoring (dedup by URL, weighted signals, threshold, rank)
//! - Context assembly (bounded evidence text, optional page fetch)
//! - Extraction (model first, deterministic patterns as fallback)
//! - Completeness scoring and retry control
//! - Persistence, plus a downstream merge into the blob store

pub mod aggregator;
pub mod completeness;
pub mod context;
pub mod fanout;
pub mod merge;
pub mod planner;
pub mod retry;
pub mod runner;
pub mod scorer;

pub use aggregator::{QueryFailure, SearchAggregator, SearchBatch};
pub use completeness::CompletenessEvaluator;
pub use context::EvidenceContextBuilder;
pub use fanout::{fan_out, FanOutLimits, TaskFailure};
pub use merge::{merge_entities, DataCompleteness, MergeOutput, MergeSummary, MergedDocument, MergedEntity};
pub use planner::QueryPlanner;
pub use retry::{
    pick_better, AttemptOutcome, AttemptRunner, RetryAttempt, RetryController, RetryState,
    RunOutcome, RunReport,
};
pub use runner::{Collaborators, Pipeline, PipelineRun};
pub use scorer::{dedup_hits, normalize_url, CandidateScorer, Condition, Scope, ScoringProfile, SignalRule};
