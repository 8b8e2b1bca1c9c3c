//! End-to-end pipeline tests over the offline service stack: heuristic and
//! generative strategize modes, the completeness gate, backend fallback, and
//! the profile-not-found precondition.

use async_trait::async_trait;
use insura::clients::{BackendError, GenerationBackend, OFFLINE_PLACEHOLDER, OfflineBackend};
use insura::config::RetrievalConfig;
use insura::embeddings::HashEmbedder;
use insura::error::InsuraError;
use insura::index::KnowledgeIndex;
use insura::models::{Goal, Severity};
use insura::pipeline::{Artifact, Pipeline, StrategizeMode};
use insura::store::{MemoryProfileStore, ProfileStore, demo_profile};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

struct CannedBackend {
    reply: Result<String, fn() -> BackendError>,
}

impl CannedBackend {
    fn text(reply: impl Into<String>) -> Self {
        Self {
            reply: Ok(reply.into()),
        }
    }

    fn failing(err: fn() -> BackendError) -> Self {
        Self { reply: Err(err) }
    }
}

#[async_trait]
impl GenerationBackend for CannedBackend {
    async fn complete(&self, _system: &str, _user: &str) -> Result<String, BackendError> {
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(make) => Err(make()),
        }
    }

    fn name(&self) -> &'static str {
        "canned"
    }
}

async fn offline_pipeline(backend: Arc<dyn GenerationBackend>) -> (Pipeline, TempDir) {
    let tmp = TempDir::new().unwrap();
    let retrieval = RetrievalConfig {
        knowledge_dir: tmp.path().join("knowledge").to_string_lossy().into_owned(),
        index_path: tmp.path().join("kb_index.json").to_string_lossy().into_owned(),
        top_k: 4,
        context_docs_max: 3,
    };
    let index = Arc::new(
        KnowledgeIndex::open(
            &retrieval.knowledge_dir,
            &retrieval.index_path,
            Arc::new(HashEmbedder::new(Some(64))),
        )
        .await
        .unwrap(),
    );
    (Pipeline::new(index, backend, retrieval), tmp)
}

fn backend_draft_json() -> String {
    json!({
        "items": [{
            "coverage_type": "medical",
            "recommended_sum_assured": 2_000_000.0,
            "term_years": 1,
            "payment_mode": "annual",
            "beneficiary": "spouse or parents per statutory share",
            "rationale": "reimbursement medical cover"
        }],
        "purchase_plan": [{"phase": "now", "actions": ["buy medical cover"]}],
        "policy_combo_explanation": "medical first",
        "renewal_and_claims": {},
        "risk_warnings": []
    })
    .to_string()
}

#[tokio::test]
async fn heuristic_run_produces_a_complete_recommendation() {
    let (pipeline, _tmp) = offline_pipeline(Arc::new(OfflineBackend)).await;
    let profile = demo_profile();

    let outcome = pipeline.run(&profile).await.unwrap();
    let rec = outcome.artifact.as_recommendation().expect("structured artifact");

    // demo goals: income_protection, medical_expense, critical_illness, education_fund
    assert_eq!(rec.items.len(), 4);
    assert_eq!(rec.purchase_plan.len(), 4);
    assert!(!rec.policy_combo_explanation.is_empty());
    assert!(rec.renewal_and_claims.get("renewal").is_some_and(|t| !t.is_empty()));
    assert!(rec.renewal_and_claims.get("claims").is_some_and(|t| !t.is_empty()));

    // every requested goal is covered, so no gap warnings survive
    assert!(!rec.risk_warnings.iter().any(|w| w.segment == "coverage gap"));

    // no duplicate (segment, advice) pairs
    let mut keys: Vec<(String, String)> = rec
        .risk_warnings
        .iter()
        .map(|w| (w.segment.clone(), w.advice.clone()))
        .collect();
    keys.sort();
    keys.dedup();
    assert_eq!(keys.len(), rec.risk_warnings.len());

    // state filled strictly in stage order, generative slot untouched
    assert!(outcome.state.plan.is_some());
    assert!(outcome.state.hints.is_some());
    assert!(outcome.state.context_docs.is_some());
    assert!(outcome.state.strategy_draft.is_some());
    assert!(outcome.state.risk_draft.is_some());
    assert!(outcome.state.draft_json.is_none());
}

#[tokio::test]
async fn heuristic_run_is_deterministic_across_invocations() {
    let (pipeline, _tmp) = offline_pipeline(Arc::new(OfflineBackend)).await;
    let profile = demo_profile();

    let a = pipeline.run(&profile).await.unwrap();
    let b = pipeline.run(&profile).await.unwrap();
    assert_eq!(
        serde_json::to_string(&a.artifact).unwrap(),
        serde_json::to_string(&b.artifact).unwrap()
    );
}

#[tokio::test]
async fn goalless_profile_fails_the_completeness_gate() {
    let (pipeline, _tmp) = offline_pipeline(Arc::new(OfflineBackend)).await;
    let mut profile = demo_profile();
    profile.goals.clear();

    let err = pipeline.run(&profile).await.unwrap_err();
    assert!(matches!(err, InsuraError::Completeness { .. }));
}

#[tokio::test]
async fn generative_run_parses_backend_draft_and_assesses_risk() {
    let backend = Arc::new(CannedBackend::text(format!(
        "```json\n{}\n```",
        backend_draft_json()
    )));
    let (pipeline, _tmp) = offline_pipeline(backend).await;
    let pipeline = pipeline.with_mode(StrategizeMode::Generative);

    let mut profile = demo_profile();
    profile.goals = vec![Goal::MedicalExpense, Goal::IncomeProtection];

    let outcome = pipeline.run(&profile).await.unwrap();
    let rec = outcome.artifact.as_recommendation().expect("structured artifact");

    // the draft only covered medical, so the gap check must flag term life
    assert!(
        rec.risk_warnings
            .iter()
            .any(|w| w.segment == "coverage gap" && w.level == Severity::High)
    );
    // review filled the empty renewal_and_claims map
    assert!(rec.renewal_and_claims.get("renewal").is_some_and(|t| !t.is_empty()));
    assert!(outcome.state.draft_json.is_some());
}

#[tokio::test]
async fn malformed_backend_output_surfaces_raw_text() {
    let backend = Arc::new(CannedBackend::text("strategy: just buy everything"));
    let (pipeline, _tmp) = offline_pipeline(backend).await;
    let pipeline = pipeline.with_mode(StrategizeMode::Generative);

    let outcome = pipeline.run(&demo_profile()).await.unwrap();
    match &outcome.artifact {
        Artifact::Raw { raw } => assert_eq!(raw, "strategy: just buy everything"),
        other => panic!("expected raw fallback, got {other:?}"),
    }
    assert_eq!(
        outcome.state.draft_json.as_deref(),
        Some("strategy: just buy everything")
    );

    // the fallback serializes under the explicit "raw" key
    let rendered = serde_json::to_value(&outcome.artifact).unwrap();
    assert_eq!(rendered["raw"], "strategy: just buy everything");
}

#[tokio::test]
async fn unavailable_backend_degrades_to_placeholder_not_error() {
    let backend = Arc::new(CannedBackend::failing(|| {
        BackendError::Http("503 service unavailable".to_string())
    }));
    let (pipeline, _tmp) = offline_pipeline(backend).await;
    let pipeline = pipeline.with_mode(StrategizeMode::Generative);

    let outcome = pipeline.run(&demo_profile()).await.unwrap();
    match &outcome.artifact {
        Artifact::Raw { raw } => assert_eq!(raw, OFFLINE_PLACEHOLDER),
        other => panic!("expected placeholder fallback, got {other:?}"),
    }
}

#[tokio::test]
async fn unknown_profile_is_not_found_before_any_stage() {
    let store = MemoryProfileStore::new();
    let err = store.fetch("missing-user").await.unwrap_err();
    match err {
        InsuraError::NotFound { user_id } => assert_eq!(user_id, "missing-user"),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[test]
fn run_blocking_matches_async_run() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let (pipeline, _tmp) = rt.block_on(offline_pipeline(Arc::new(OfflineBackend)));
    let profile = demo_profile();

    let async_outcome = rt.block_on(pipeline.run(&profile)).unwrap();
    drop(rt);

    let blocking_outcome = pipeline.run_blocking(&profile).unwrap();
    assert_eq!(
        serde_json::to_string(&async_outcome.artifact).unwrap(),
        serde_json::to_string(&blocking_outcome.artifact).unwrap()
    );
}
