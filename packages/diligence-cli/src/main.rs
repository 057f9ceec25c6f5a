//! Diligence CLI
//!
//! Runs one extraction task for one entity against the configured search
//! and model providers, or merges stored records into a published document.

mod settings;

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use diligence::fetch::{HttpPageFetcher, ValidatedFetcher};
use diligence::llm::OpenAiModel;
use diligence::search::{SerperSearcher, TavilySearcher, WebSearcherExt};
use diligence::{
    normalize_entity_id, AdverseMediaReport, Collaborators, CompanyProfile, EntityContext,
    ExecutiveRoster, FsStore, LanguageModel, Pipeline, PipelineConfig, PrivateCompanyProfile,
    Record, RunOutcome, SanctionsScreening, TaskKind, WebSearcher,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::settings::{SearchBackend, Settings};

#[derive(Parser)]
#[command(name = "diligence", about = "Evidence-gathering due diligence extraction")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one task for one entity and store the result
    Run(RunArgs),
    /// Merge stored company and executive records into one document
    Merge(MergeArgs),
}

#[derive(Args)]
struct RunArgs {
    /// company_filings, executives, adverse_media, sanctions or private_company
    #[arg(long)]
    task: TaskKind,

    /// Entity name as it appears in filings and news
    #[arg(long)]
    entity: String,

    #[arg(long)]
    ticker: Option<String>,

    /// Official web domain, e.g. acme.com
    #[arg(long)]
    domain: Option<String>,

    #[arg(long)]
    location: Option<String>,

    /// Reference date for year-relative queries (YYYY-MM-DD)
    #[arg(long)]
    as_of: Option<NaiveDate>,

    /// Override the retry budget
    #[arg(long)]
    max_retries: Option<u32>,

    /// Override the completeness target percent
    #[arg(long)]
    target: Option<f64>,

    /// Skip full-page fetches and use search snippets only
    #[arg(long)]
    no_fetch: bool,
}

#[derive(Args)]
struct MergeArgs {
    /// Entity names or ids to merge (repeatable)
    #[arg(long = "entity", required = true)]
    entities: Vec<String>,

    /// Blob key prefix for the published documents
    #[arg(long, default_value = "merged")]
    prefix: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,diligence=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    let cli = Cli::parse();
    let settings = Settings::from_env().context("Failed to load settings")?;

    match cli.command {
        Command::Run(args) => run(&settings, args).await,
        Command::Merge(args) => merge(&settings, args).await,
    }
}

fn build_searcher(settings: &Settings) -> Result<Arc<dyn WebSearcher>> {
    let backend = settings
        .search
        .clone()
        .context("SERPER_API_KEY or TAVILY_API_KEY must be set")?;

    Ok(match backend {
        SearchBackend::Serper(key) => {
            Arc::new(SerperSearcher::new(key).rate_limited(settings.search_rps))
        }
        SearchBackend::Tavily(key) => {
            Arc::new(TavilySearcher::new(key).rate_limited(settings.search_rps))
        }
    })
}

fn build_model(settings: &Settings) -> Option<Arc<dyn LanguageModel>> {
    let Some(key) = settings.openai_api_key.clone() else {
        tracing::warn!("OPENAI_API_KEY not set, using pattern extraction only");
        return None;
    };

    let mut model = OpenAiModel::new(key);
    if let Some(name) = &settings.openai_model {
        model = model.with_model(name.clone());
    }
    if let Some(url) = &settings.openai_base_url {
        model = model.with_base_url(url.clone());
    }
    Some(Arc::new(model))
}

async fn run(settings: &Settings, args: RunArgs) -> Result<()> {
    let mut collaborators = Collaborators::new(
        build_searcher(settings)?,
        Arc::new(FsStore::new(&settings.data_dir)),
    );
    if let Some(model) = build_model(settings) {
        collaborators = collaborators.with_model(model);
    }
    if !args.no_fetch {
        collaborators =
            collaborators.with_fetcher(Arc::new(ValidatedFetcher::new(HttpPageFetcher::new())));
    }

    let mut config = PipelineConfig::for_task(args.task);
    if let Some(max_retries) = args.max_retries {
        config = config.with_max_retries(max_retries);
    }
    if let Some(target) = args.target {
        config = config.with_target_percent(target);
    }

    let mut entity = EntityContext::new(&args.entity);
    if let Some(ticker) = args.ticker {
        entity = entity.with_ticker(ticker);
    }
    if let Some(domain) = args.domain {
        entity = entity.with_domain(domain);
    }
    if let Some(location) = args.location {
        entity = entity.with_location(location);
    }
    if let Some(date) = args.as_of {
        entity = entity.as_of(date);
    }

    tracing::info!(task = %args.task, entity = %entity.name, "Starting run");
    match args.task {
        TaskKind::CompanyFilings => run_task::<CompanyProfile>(collaborators, config, &entity).await,
        TaskKind::Executives => run_task::<ExecutiveRoster>(collaborators, config, &entity).await,
        TaskKind::AdverseMedia => {
            run_task::<AdverseMediaReport>(collaborators, config, &entity).await
        }
        TaskKind::Sanctions => {
            run_task::<SanctionsScreening>(collaborators, config, &entity).await
        }
        TaskKind::PrivateCompany => {
            run_task::<PrivateCompanyProfile>(collaborators, config, &entity).await
        }
    }
}

async fn run_task<R: Record>(
    collaborators: Collaborators,
    config: PipelineConfig,
    entity: &EntityContext,
) -> Result<()> {
    let pipeline = Pipeline::<R>::new(collaborators, config)?;
    let run = pipeline.run(entity).await.context("Run failed")?;

    for failure in &run.query_failures {
        tracing::warn!(query = %failure.query, reason = %failure.reason, "Query skipped");
    }

    match (&run.report.outcome, &run.stored) {
        (RunOutcome::NoEvidence, _) | (_, None) => {
            println!("No evidence found for {}", entity.name);
        }
        (outcome, Some(stored)) => {
            let status = match outcome {
                RunOutcome::Satisfied(_) => "complete",
                _ => "below target",
            };
            eprintln!(
                "{}: {:.1}% ({}) after {} attempt(s), method {:?}",
                entity.name,
                stored.completeness.percent,
                status,
                stored.attempts,
                stored.method
            );
            println!("{}", serde_json::to_string_pretty(stored)?);
        }
    }
    Ok(())
}

async fn merge(settings: &Settings, args: MergeArgs) -> Result<()> {
    let store = FsStore::new(&settings.data_dir);
    let ids: Vec<String> = args
        .entities
        .iter()
        .map(|e| normalize_entity_id(e))
        .collect();

    let output = diligence::merge_entities(&store, &store, &ids, &args.prefix, Utc::now())
        .await
        .context("Merge failed")?;

    println!("{}", output.document_key);
    eprintln!("summary: {}", output.summary_key);
    Ok(())
}
