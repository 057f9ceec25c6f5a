//! End-to-end run for one entity.
//!
//! Each attempt plans queries, gathers hits, ranks candidates, assembles
//! evidence, extracts a record and scores it. The [`RetryController`] decides
//! whether to go again. The chosen record is persisted as a new version;
//! a run that found no evidence persists nothing.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, instrument, warn};

use crate::error::{PipelineError, Result};
use crate::extract::{ExtractionRequest, StructuredExtractor};
use crate::pipeline::aggregator::{QueryFailure, SearchAggregator};
use crate::pipeline::completeness::CompletenessEvaluator;
use crate::pipeline::context::EvidenceContextBuilder;
use crate::pipeline::planner::QueryPlanner;
use crate::pipeline::retry::{
    AttemptOutcome, AttemptRunner, RetryAttempt, RetryController, RunOutcome, RunReport,
};
use crate::pipeline::scorer::CandidateScorer;
use crate::traits::fetcher::PageFetcher;
use crate::traits::llm::LanguageModel;
use crate::traits::searcher::WebSearcher;
use crate::traits::store::{RecordStore, StoredRecord};
use crate::types::config::PipelineConfig;
use crate::types::entity::EntityContext;
use crate::types::records::Record;

/// External services a pipeline talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub searcher: Arc<dyn WebSearcher>,
    /// Without a model every attempt uses pattern extraction.
    pub model: Option<Arc<dyn LanguageModel>>,
    /// Without a fetcher evidence is built from snippets only.
    pub fetcher: Option<Arc<dyn PageFetcher>>,
    pub records: Arc<dyn RecordStore>,
}

impl Collaborators {
    pub fn new(searcher: Arc<dyn WebSearcher>, records: Arc<dyn RecordStore>) -> Self {
        Self {
            searcher,
            model: None,
            fetcher: None,
            records,
        }
    }

    pub fn with_model(mut self, model: Arc<dyn LanguageModel>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn PageFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }
}

/// Result of [`Pipeline::run`].
#[derive(Debug, Clone)]
pub struct PipelineRun<R> {
    pub report: RunReport<R>,
    /// The version written, when the run produced a record.
    pub stored: Option<StoredRecord>,
    /// Search calls that failed across every attempt.
    pub query_failures: Vec<QueryFailure>,
}

impl<R> PipelineRun<R> {
    pub fn record(&self) -> Option<&R> {
        self.report.best().map(|a| &a.record)
    }

    pub fn is_no_evidence(&self) -> bool {
        matches!(self.report.outcome, RunOutcome::NoEvidence)
    }
}

/// Search, score, extract and persist one typed record per entity.
pub struct Pipeline<R: Record> {
    planner: QueryPlanner,
    aggregator: SearchAggregator,
    scorer: CandidateScorer,
    context: EvidenceContextBuilder,
    extractor: StructuredExtractor<R>,
    evaluator: CompletenessEvaluator,
    retry: RetryController,
    records: Arc<dyn RecordStore>,
}

impl<R: Record> Pipeline<R> {
    /// Build a pipeline, rejecting configuration that could never run.
    pub fn new(collaborators: Collaborators, config: PipelineConfig) -> Result<Self> {
        validate(&config)?;

        let Collaborators {
            searcher,
            model,
            fetcher,
            records,
        } = collaborators;

        let mut context = EvidenceContextBuilder::new(config.context.clone());
        if let Some(fetcher) = fetcher {
            context = context.with_fetcher(fetcher);
        }

        Ok(Self {
            planner: QueryPlanner::new(R::TASK),
            aggregator: SearchAggregator::new(searcher, config.aggregator.clone()),
            scorer: CandidateScorer::new(config.scoring.clone()),
            context,
            extractor: StructuredExtractor::new(model, config.extraction.clone()),
            evaluator: CompletenessEvaluator::new(),
            retry: RetryController::new(config.retry),
            records,
        })
    }

    /// Pipeline with the record's task defaults.
    pub fn for_record(collaborators: Collaborators) -> Result<Self> {
        Self::new(collaborators, PipelineConfig::for_task(R::TASK))
    }

    /// Run every attempt for `entity` and persist the chosen record.
    ///
    /// Only a failed write is an error; search, fetch and extraction
    /// failures degrade the result instead.
    #[instrument(skip(self, entity), fields(task = %R::TASK, entity = %entity.name))]
    pub async fn run(&self, entity: &EntityContext) -> Result<PipelineRun<R>> {
        let mut attempts = EntityRun {
            pipeline: self,
            entity,
            query_failures: Vec::new(),
        };
        let report = self.retry.drive(&mut attempts).await;
        let query_failures = attempts.query_failures;

        let stored = match report.best() {
            Some(best) => Some(self.persist(entity, &report, best).await?),
            None => {
                info!("No evidence found, nothing persisted");
                None
            }
        };

        Ok(PipelineRun {
            report,
            stored,
            query_failures,
        })
    }

    async fn persist(
        &self,
        entity: &EntityContext,
        report: &RunReport<R>,
        best: &RetryAttempt<R>,
    ) -> Result<StoredRecord> {
        let stored = StoredRecord {
            entity_id: entity.id(),
            entity_name: entity.name.clone(),
            task: R::TASK,
            extracted_at: Utc::now(),
            completeness: best.completeness,
            satisfied: report.is_satisfied(),
            method: best.method,
            attempts: report.attempts,
            sources: best.sources.clone(),
            record: serde_json::to_value(&best.record)
                .map_err(|e| PipelineError::Persistence(e.into()))?,
        };

        if let Err(e) = self.records.upsert(&stored).await {
            warn!(entity_id = %stored.entity_id, error = %e, "Failed to persist record");
            return Err(e.into());
        }

        info!(
            entity_id = %stored.entity_id,
            completeness = stored.completeness.percent,
            satisfied = stored.satisfied,
            attempts = stored.attempts,
            "Record persisted"
        );
        Ok(stored)
    }
}

fn validate(config: &PipelineConfig) -> Result<()> {
    let reject = |reason: &str| {
        Err(PipelineError::Config {
            reason: reason.to_string(),
        })
    };

    if config.aggregator.concurrency == 0 {
        return reject("search concurrency must be at least 1");
    }
    if config.context.top_k == 0 {
        return reject("context top_k must be at least 1");
    }
    if config.context.total_chars == 0 || config.context.per_item_chars == 0 {
        return reject("context character caps must be positive");
    }
    if !(0.0..=100.0).contains(&config.retry.target_percent) {
        return reject("completeness target must be between 0 and 100");
    }
    Ok(())
}

/// Attempt state for one entity.
struct EntityRun<'a, R: Record> {
    pipeline: &'a Pipeline<R>,
    entity: &'a EntityContext,
    query_failures: Vec<QueryFailure>,
}

#[async_trait]
impl<R: Record> AttemptRunner<R> for EntityRun<'_, R> {
    async fn attempt(&mut self, attempt_number: u32, strengthened: bool) -> AttemptOutcome<R> {
        let pipeline = self.pipeline;

        let queries = pipeline.planner.plan(self.entity);
        let batch = pipeline.aggregator.gather(&queries).await;
        self.query_failures.extend(batch.failures.iter().cloned());

        let candidates = pipeline.scorer.rank(batch.hits, self.entity);
        info!(
            attempt = attempt_number,
            queries = batch.queries_run,
            failed = batch.failures.len(),
            candidates = candidates.len(),
            "Search round complete"
        );
        if candidates.is_empty() {
            return AttemptOutcome::NoEvidence;
        }

        let evidence = pipeline
            .context
            .build(&candidates, batch.knowledge_graph.as_ref())
            .await;

        let extracted = pipeline
            .extractor
            .extract(&ExtractionRequest {
                entity: self.entity,
                evidence: &evidence,
                strengthened,
            })
            .await;
        let completeness = pipeline.evaluator.evaluate(&extracted.record);

        AttemptOutcome::Extracted(RetryAttempt {
            attempt_number,
            record: extracted.record,
            completeness,
            method: extracted.method,
            sources: evidence.sources(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::MemoryStore;
    use crate::testing::{FailingStore, MockLanguageModel, MockWebSearcher};
    use crate::types::query::TaskKind;
    use crate::types::records::ExecutiveRoster;

    fn collaborators(searcher: MockWebSearcher, store: Arc<dyn RecordStore>) -> Collaborators {
        Collaborators::new(Arc::new(searcher), store)
    }

    #[test]
    fn test_rejects_zero_concurrency() {
        let collab = collaborators(MockWebSearcher::new(), Arc::new(MemoryStore::new()));
        let config = PipelineConfig::for_task(TaskKind::Executives).with_concurrency(0);

        let err = Pipeline::<ExecutiveRoster>::new(collab, config).err().unwrap();
        assert!(matches!(err, PipelineError::Config { .. }));
    }

    #[test]
    fn test_rejects_target_above_hundred() {
        let collab = collaborators(MockWebSearcher::new(), Arc::new(MemoryStore::new()));
        let config = PipelineConfig::for_task(TaskKind::Executives).with_target_percent(120.0);

        assert!(Pipeline::<ExecutiveRoster>::new(collab, config).is_err());
    }

    #[tokio::test]
    async fn test_no_evidence_skips_store() {
        let collab = collaborators(MockWebSearcher::new(), Arc::new(FailingStore))
            .with_model(Arc::new(MockLanguageModel::new()));
        let pipeline = Pipeline::<ExecutiveRoster>::for_record(collab).unwrap();

        let run = pipeline.run(&EntityContext::new("Acme Corp")).await.unwrap();

        assert!(run.is_no_evidence());
        assert!(run.stored.is_none());
        assert_eq!(run.report.attempts, 1);
    }
}
