//! End-to-end pipeline runs against scripted collaborators.

use std::sync::Arc;

use chrono::NaiveDate;
use diligence::pipeline::{CandidateScorer, QueryPlanner, ScoringProfile};
use diligence::testing::{FailingStore, MockLanguageModel, MockWebSearcher};
use diligence::types::config::ContextConfig;
use diligence::types::hit::Hit;
use diligence::{
    Collaborators, EntityContext, ExecutiveRoster, ExtractionMethod, MemoryStore, Pipeline,
    PipelineConfig, PipelineError, PrivateCompanyProfile, RecordStore, RunOutcome,
    SanctionsScreening, TaskKind,
};

fn acme() -> EntityContext {
    EntityContext::new("Acme Corp").as_of(NaiveDate::from_ymd_opt(2025, 6, 30).unwrap())
}

fn hit(url: &str, title: &str, snippet: &str) -> Hit {
    Hit::new(url).with_title(title).with_snippet(snippet)
}

/// Ten hits over the first three executive queries: two duplicate URLs
/// and one page that never mentions the company.
fn scripted_hits(entity: &EntityContext) -> (Vec<(String, Vec<Hit>)>, usize) {
    let queries = QueryPlanner::new(TaskKind::Executives).plan(entity);
    let script = vec![
        (
            queries[0].text.clone(),
            vec![
                hit(
                    "https://news.example.com/acme-ceo",
                    "Acme Corp names Jane Roe chief executive",
                    "Jane Roe, Chief Executive Officer of Acme Corp.",
                ),
                hit(
                    "https://acme.example.com/leadership",
                    "Leadership | Acme Corp",
                    "Acme Corp leadership team: CEO, CFO and COO.",
                ),
                hit(
                    "https://profiles.example.com/acme",
                    "Acme Corp company profile",
                    "Acme Corp executives and president.",
                ),
                hit(
                    "https://wire.example.com/acme-cfo",
                    "Acme Corp appoints CFO",
                    "John Doe joins Acme Corp as Chief Financial Officer.",
                ),
            ],
        ),
        (
            queries[1].text.clone(),
            vec![
                hit(
                    "https://acme.example.com/leadership/",
                    "Leadership",
                    "Acme Corp leadership team.",
                ),
                hit(
                    "https://biz.example.com/acme-coo",
                    "Acme Corp COO interview",
                    "Maria Lopez, Chief Operating Officer at Acme Corp.",
                ),
                hit(
                    "https://recipes.example.org/post",
                    "Weeknight dinners",
                    "Quick pasta recipes for busy families.",
                ),
            ],
        ),
        (
            queries[2].text.clone(),
            vec![
                hit(
                    "http://www.news.example.com/acme-ceo#top",
                    "Acme Corp names Jane Roe chief executive",
                    "Same story, different link.",
                ),
                hit(
                    "https://board.example.com/acme",
                    "Acme Corp board and officers",
                    "Acme Corp chairman and president.",
                ),
                hit(
                    "https://tech.example.com/acme-cto",
                    "Acme Corp CTO on cloud",
                    "Acme Corp chief technology officer Sam Lee.",
                ),
            ],
        ),
    ];
    (script, queries.len())
}

fn scripted_searcher(entity: &EntityContext) -> (MockWebSearcher, usize) {
    let (script, planned) = scripted_hits(entity);
    let searcher = script
        .into_iter()
        .fold(MockWebSearcher::new(), |searcher, (query, hits)| {
            searcher.with_hits(query, hits)
        });
    (searcher, planned)
}

fn executives_config() -> PipelineConfig {
    PipelineConfig::for_task(TaskKind::Executives).with_context(ContextConfig {
        top_k: 5,
        fetch_head: 0,
        ..ContextConfig::default()
    })
}

#[tokio::test]
async fn test_below_target_run_keeps_best_attempt() {
    let entity = acme();
    let (searcher, planned) = scripted_searcher(&entity);
    let searcher = Arc::new(searcher);
    let model = Arc::new(MockLanguageModel::new().with_responses([
        // 3 of 22 leaves
        r#"{"company_name": "Acme Corp", "executives": [{"name": "Jane Roe", "title": "CEO"}]}"#,
        // 10 of 22
        r#"{"company_name": "Acme Corp", "executives": [
            {"name": "Jane Roe", "title": "Chief Executive Officer", "role_category": "CEO"},
            {"name": "John Doe", "title": "Chief Financial Officer", "role_category": "CFO"},
            {"name": "Maria Lopez", "title": "Chief Operating Officer", "role_category": "COO"}
        ]}"#,
        // 5 of 22
        r#"{"company_name": "Acme Corp", "executives": [
            {"name": "Jane Roe", "title": "CEO"},
            {"name": "John Doe", "title": "CFO"}
        ]}"#,
    ]));
    let store = Arc::new(MemoryStore::new());

    let collaborators = Collaborators::new(searcher.clone(), store.clone()).with_model(model.clone());
    let pipeline = Pipeline::<ExecutiveRoster>::new(collaborators, executives_config()).unwrap();

    let run = pipeline.run(&entity).await.unwrap();

    assert_eq!(run.report.attempts, 3);
    assert_eq!(run.report.best_history, vec![13.64, 45.45, 45.45]);
    let best = match &run.report.outcome {
        RunOutcome::BelowThreshold(best) => best,
        other => panic!("unexpected outcome: {:?}", other),
    };
    assert_eq!(best.attempt_number, 1);
    assert_eq!(best.completeness.filled, 10);
    assert_eq!(best.completeness.total, 22);
    assert_eq!(best.method, ExtractionMethod::Llm);
    assert_eq!(best.record.executives.len(), 3);

    // 10 hits, 2 duplicate URLs, 1 below threshold: 7 candidates, 5 used.
    let (script, _) = scripted_hits(&entity);
    let raw: Vec<Hit> = script.into_iter().flat_map(|(_, hits)| hits).collect();
    assert_eq!(raw.len(), 10);
    let ranked = CandidateScorer::new(ScoringProfile::for_task(TaskKind::Executives))
        .rank(raw, &entity);
    assert_eq!(ranked.len(), 7);
    assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));
    assert_eq!(best.sources.len(), 5);
    assert!(!best.sources.iter().any(|s| s.contains("recipes")));

    // Every attempt re-runs the full plan.
    assert_eq!(searcher.calls().len(), planned * 3);

    let requests = model.requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[0].temperature, 0.1);
    assert_eq!(requests[1].temperature, 0.5);

    let stored = run.stored.as_ref().unwrap();
    assert_eq!(stored.entity_id, "acme_corp");
    assert!(!stored.satisfied);
    assert_eq!(stored.attempts, 3);
    assert_eq!(stored.completeness.filled, 10);
    assert_eq!(store.record_count(), 1);
}

#[tokio::test]
async fn test_run_stops_once_target_is_met() {
    let entity = acme();
    let (searcher, _) = scripted_searcher(&entity);
    let full = r#"{"company_name": "Acme Corp", "executives": [
        {"name": "Jane Roe", "title": "Chief Executive Officer", "role_category": "CEO",
         "description": "Leads the company", "tenure": "Since 2019",
         "background": "Former COO", "education": "MBA"},
        {"name": "John Doe", "title": "Chief Financial Officer", "role_category": "CFO",
         "description": "Finance", "tenure": "Since 2021",
         "background": "Audit partner", "education": "CPA"},
        {"name": "Maria Lopez", "title": "Chief Operating Officer", "role_category": "COO",
         "description": "Operations", "tenure": "Since 2020",
         "background": "Plant manager", "education": "BS Engineering"}
    ]}"#;
    let model = Arc::new(MockLanguageModel::new().with_responses([
        r#"{"company_name": "Acme Corp"}"#,
        full,
    ]));
    let store = Arc::new(MemoryStore::new());

    let collaborators = Collaborators::new(Arc::new(searcher), store.clone()).with_model(model.clone());
    let pipeline = Pipeline::<ExecutiveRoster>::new(collaborators, executives_config()).unwrap();

    let run = pipeline.run(&entity).await.unwrap();

    assert!(run.report.is_satisfied());
    assert_eq!(run.report.attempts, 2);
    assert_eq!(model.requests().len(), 2);

    let latest = store
        .query_latest("acme_corp", TaskKind::Executives)
        .await
        .unwrap()
        .unwrap();
    assert!(latest.satisfied);
    assert_eq!(latest.completeness.percent, 100.0);
}

#[tokio::test]
async fn test_failed_write_surfaces_as_persistence_error() {
    let entity = acme();
    let (searcher, _) = scripted_searcher(&entity);
    let collaborators = Collaborators::new(Arc::new(searcher), Arc::new(FailingStore))
        .with_model(Arc::new(MockLanguageModel::new()));
    let pipeline = Pipeline::<ExecutiveRoster>::new(
        collaborators,
        executives_config().with_max_retries(0),
    )
    .unwrap();

    let err = pipeline.run(&entity).await.unwrap_err();
    assert!(matches!(err, PipelineError::Persistence(_)));
}

#[tokio::test]
async fn test_earlier_versions_survive_new_runs() {
    let entity = acme();
    let store = Arc::new(MemoryStore::new());

    for _ in 0..2 {
        let (searcher, _) = scripted_searcher(&entity);
        let collaborators = Collaborators::new(Arc::new(searcher), store.clone());
        let pipeline = Pipeline::<ExecutiveRoster>::new(
            collaborators,
            executives_config().with_max_retries(0),
        )
        .unwrap();
        pipeline.run(&entity).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }

    let versions = store
        .versions("acme_corp", TaskKind::Executives)
        .await
        .unwrap();
    assert_eq!(versions.len(), 2);
    assert!(versions[0].extracted_at < versions[1].extracted_at);
}

#[tokio::test]
async fn test_no_evidence_when_every_query_fails() {
    let entity = acme();
    let mut searcher = MockWebSearcher::new();
    for query in QueryPlanner::new(TaskKind::Sanctions).plan(&entity) {
        searcher = searcher.failing(query.text);
    }
    let store = Arc::new(MemoryStore::new());
    let collaborators = Collaborators::new(Arc::new(searcher), store.clone());
    let pipeline = Pipeline::<SanctionsScreening>::for_record(collaborators).unwrap();

    let run = pipeline.run(&entity).await.unwrap();

    assert!(run.is_no_evidence());
    assert!(run.stored.is_none());
    assert_eq!(run.query_failures.len(), 7);
    assert_eq!(store.record_count(), 0);
}

#[tokio::test]
async fn test_pattern_fallback_without_model() {
    let entity = acme();
    let queries = QueryPlanner::new(TaskKind::Sanctions).plan(&entity);
    let searcher = MockWebSearcher::new()
        .with_hits(
            queries[0].text.clone(),
            vec![hit(
                "https://sanctionssearch.ofac.treas.gov/Details?id=1",
                "Sanctions List Search",
                "Acme Corp: no match found on the SDN list.",
            )],
        )
        .failing(queries[1].text.clone());
    let store = Arc::new(MemoryStore::new());
    let collaborators = Collaborators::new(Arc::new(searcher), store.clone());
    let pipeline = Pipeline::<SanctionsScreening>::for_record(collaborators).unwrap();

    let run = pipeline.run(&entity).await.unwrap();

    assert_eq!(run.query_failures.len(), 1);
    let best = run.report.best().unwrap();
    assert_eq!(best.method, ExtractionMethod::PatternFallback);
    assert!(best.record.matches.is_empty());
    assert_eq!(best.record.overall_risk.value(), Some("Clear"));
    assert!(run.report.is_satisfied());
    assert_eq!(store.record_count(), 1);
}

#[tokio::test]
async fn test_private_company_profile_from_alternative_sources() {
    let entity = EntityContext::new("Acme Robotics")
        .as_of(NaiveDate::from_ymd_opt(2025, 6, 30).unwrap());
    let queries = QueryPlanner::new(TaskKind::PrivateCompany).plan(&entity);
    let encyclopedia = queries.iter().find(|q| q.category == "encyclopedia").unwrap();
    let funding = queries.iter().find(|q| q.category == "funding_database").unwrap();

    let searcher = MockWebSearcher::new()
        .with_hits(
            encyclopedia.text.clone(),
            vec![hit(
                "https://en.wikipedia.org/wiki/Acme_Robotics",
                "Acme Robotics - Wikipedia",
                "Acme Robotics was founded in 2012 by Jane Roe and John Doe.",
            )],
        )
        .with_hits(
            funding.text.clone(),
            vec![hit(
                "https://news.example.com/acme-series-c",
                "Acme Robotics raises Series C",
                "Acme Robotics raised $120 million in a Series C round led by Northwind Ventures.",
            )],
        );
    let store = Arc::new(MemoryStore::new());
    let collaborators = Collaborators::new(Arc::new(searcher), store.clone());
    let pipeline = Pipeline::<PrivateCompanyProfile>::new(
        collaborators,
        PipelineConfig::for_task(TaskKind::PrivateCompany).with_max_retries(0),
    )
    .unwrap();

    let run = pipeline.run(&entity).await.unwrap();

    let best = run.report.best().unwrap();
    assert_eq!(best.method, ExtractionMethod::PatternFallback);
    assert_eq!(best.record.funding_rounds.value(), Some("Series C $120 million"));
    assert_eq!(best.record.key_investors.value(), Some("Northwind Ventures"));
    assert_eq!(best.record.leadership_team.founders.len(), 2);
    assert_eq!(best.sources.len(), 2);
    assert!(!run.report.is_satisfied());

    let stored = store
        .query_latest("acme_robotics", TaskKind::PrivateCompany)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.attempts, 1);
}
