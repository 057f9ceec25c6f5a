//! Evidence-Gathering Extraction Pipeline
//!
//! Builds one typed due-diligence record per entity from public web
//! evidence, and says how complete that record is.
//!
//! # Design Philosophy
//!
//! - Every answer comes with a completeness score, never a silent empty
//! - Search, fetch and model failures degrade the result; only a failed
//!   write is an error
//! - The model is optional: deterministic pattern rules always produce a
//!   record
//! - Collaborators sit behind traits and are injected
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use diligence::{Collaborators, EntityContext, ExecutiveRoster, MemoryStore, Pipeline};
//! use diligence::search::SerperSearcher;
//!
//! let collaborators = Collaborators::new(
//!     Arc::new(SerperSearcher::new(api_key)),
//!     Arc::new(MemoryStore::new()),
//! );
//! let pipeline = Pipeline::<ExecutiveRoster>::for_record(collaborators)?;
//!
//! let run = pipeline.run(&EntityContext::new("Acme Corp").with_domain("acme.com")).await?;
//! if let Some(best) = run.report.best() {
//!     println!("{}% complete", best.completeness.percent);
//! }
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Collaborator seams (WebSearcher, LanguageModel, PageFetcher, stores)
//! - [`types`] - Queries, hits, candidates, evidence, records and configuration
//! - [`pipeline`] - Planning, search fan-out, scoring, context, retry and merge
//! - [`extract`] - Model-backed and pattern-backed extraction strategies
//! - [`search`] - Search backends (Serper, Tavily, rate limiting)
//! - [`llm`] - Language-model backends
//! - [`fetch`] - Page fetchers with SSRF protection
//! - [`stores`] - Storage implementations (MemoryStore, FsStore)
//! - [`security`] - Credential handling and URL validation
//! - [`testing`] - Mock implementations for testing

pub mod error;
pub mod extract;
pub mod fetch;
pub mod llm;
pub mod pipeline;
pub mod search;
pub mod security;
pub mod stores;
pub mod testing;
pub mod text;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{
    ExtractionError, FetchError, LlmError, PipelineError, Result, SearchError, SecurityError,
    StoreError,
};
pub use extract::{ExtractionMethod, ExtractionStrategy, StructuredExtractor};
pub use pipeline::{
    merge_entities, Collaborators, Pipeline, PipelineRun, RetryAttempt, RunOutcome, RunReport,
};
pub use stores::{FsStore, MemoryStore};
pub use traits::{
    fetcher::PageFetcher,
    llm::LanguageModel,
    searcher::WebSearcher,
    store::{BlobStore, RecordStore, StoredRecord},
};
pub use types::{
    completeness::CompletenessScore,
    config::PipelineConfig,
    entity::{normalize_entity_id, EntityContext},
    field::Field,
    query::TaskKind,
    records::{
        AdverseMediaReport, CompanyProfile, ExecutiveRoster, PrivateCompanyProfile, Record,
        SanctionsScreening,
    },
};
