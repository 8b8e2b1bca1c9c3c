//! Pipeline orchestrator: Plan -> Retrieve -> Strategize -> RiskAssess ->
//! Review -> Done, strictly in that order, no branching, no retries. Each
//! invocation gets its own state record; stage outputs are written to it
//! exactly once, in stage order, and never removed.

use crate::clients::{GenerationBackend, OFFLINE_PLACEHOLDER};
use crate::config::RetrievalConfig;
use crate::error::{InsuraError, Result};
use crate::index::KnowledgeIndex;
use crate::models::{Profile, RiskWarning, StrategyRecommendation};
use crate::prompts;
use crate::{review, risk, strategy};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// How the Strategize stage produces its draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrategizeMode {
    /// Deterministic rule engine; never calls the backend.
    #[default]
    Heuristic,
    /// Ask the generation backend for a recommendation-shaped JSON reply.
    /// Best-effort: a malformed reply becomes the raw fallback artifact.
    Generative,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanStep {
    pub id: String,
    pub desc: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub steps: Vec<PlanStep>,
}

/// State carrier threaded through the stages. Write-once-per-field: each
/// stage fills its own slot and never touches earlier ones.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineState {
    pub run_id: Uuid,
    pub plan: Option<Plan>,
    pub hints: Option<Vec<String>>,
    pub context_docs: Option<Vec<String>>,
    /// Raw backend reply (generative mode only), kept for debuggability.
    pub draft_json: Option<String>,
    pub strategy_draft: Option<StrategyRecommendation>,
    pub risk_draft: Option<Vec<RiskWarning>>,
}

impl PipelineState {
    fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            plan: None,
            hints: None,
            context_docs: None,
            draft_json: None,
            strategy_draft: None,
            risk_draft: None,
        }
    }
}

/// The pipeline's terminal artifact. Serializes either as the
/// recommendation object itself or as `{"raw": ...}` when backend output
/// could not be parsed into the expected shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Artifact {
    Recommendation(StrategyRecommendation),
    Raw { raw: String },
}

impl Artifact {
    pub fn as_recommendation(&self) -> Option<&StrategyRecommendation> {
        match self {
            Artifact::Recommendation(rec) => Some(rec),
            Artifact::Raw { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    pub artifact: Artifact,
    pub state: PipelineState,
}

/// Drives the stages over shared service handles. One instance serves any
/// number of invocations; every `run` call gets a fresh state.
pub struct Pipeline {
    index: Arc<KnowledgeIndex>,
    backend: Arc<dyn GenerationBackend>,
    retrieval: RetrievalConfig,
    mode: StrategizeMode,
}

impl Pipeline {
    pub fn new(
        index: Arc<KnowledgeIndex>,
        backend: Arc<dyn GenerationBackend>,
        retrieval: RetrievalConfig,
    ) -> Self {
        Self {
            index,
            backend,
            retrieval,
            mode: StrategizeMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: StrategizeMode) -> Self {
        self.mode = mode;
        self
    }

    /// Run the full pipeline. Blocking calls (index search, backend
    /// completion) are awaited, so a cooperative scheduler is never stalled;
    /// stages still execute strictly one after another. Cancellation is
    /// dropping the returned future: state updates land only after a stage
    /// completes, so a cancelled stage leaves nothing half-written.
    pub async fn run(&self, profile: &Profile) -> Result<PipelineOutcome> {
        profile.validate()?;

        let mut state = PipelineState::new();
        info!(run_id = %state.run_id, mode = ?self.mode, "pipeline start");

        // Plan
        let (plan, hints) = plan_stage(profile);
        state.plan = Some(plan);
        state.hints = Some(hints.clone());

        // Retrieve
        let context_docs = self.index.search(&hints, self.retrieval.top_k).await?;
        debug!(run_id = %state.run_id, docs = context_docs.len(), "retrieve complete");
        state.context_docs = Some(context_docs.clone());

        // Strategize
        let mut rec = match self.mode {
            StrategizeMode::Heuristic => {
                let mut rec = strategy::synthesize(profile, &context_docs);
                strategy::refine_purchase_plan(&mut rec);
                rec
            }
            StrategizeMode::Generative => {
                let text = self.complete_draft(profile, &context_docs).await;
                state.draft_json = Some(text.clone());
                match parse_recommendation(&text) {
                    Ok(rec) => rec,
                    Err(InsuraError::MalformedOutput { message, raw }) => {
                        warn!(run_id = %state.run_id, %message, "backend draft unparseable, surfacing raw text");
                        return Ok(PipelineOutcome {
                            artifact: Artifact::Raw { raw },
                            state,
                        });
                    }
                    Err(other) => return Err(other),
                }
            }
        };
        state.strategy_draft = Some(rec.clone());

        // RiskAssess
        risk::assess(profile, &mut rec);
        state.risk_draft = Some(rec.risk_warnings.clone());

        // Review: the terminal checkpoint; a completeness violation fails
        // the whole invocation with no partial output.
        review::review(&mut rec)?;

        info!(run_id = %state.run_id, items = rec.items.len(), warnings = rec.risk_warnings.len(), "pipeline done");
        Ok(PipelineOutcome {
            artifact: Artifact::Recommendation(rec),
            state,
        })
    }

    /// Blocking twin of [`run`]: drives the same future to completion on the
    /// calling thread. Must not be called from inside an async context.
    pub fn run_blocking(&self, profile: &Profile) -> Result<PipelineOutcome> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| InsuraError::Internal {
                message: format!("failed to build runtime: {}", e),
            })?;
        rt.block_on(self.run(profile))
    }

    /// Ask the backend for a draft. A transport failure is recovered locally
    /// with the fixed placeholder text, never surfaced as a hard failure.
    async fn complete_draft(&self, profile: &Profile, context_docs: &[String]) -> String {
        let truncated = &context_docs[..context_docs.len().min(self.retrieval.context_docs_max)];
        let user_instructions = compose_strategy_request(profile, truncated);
        match self
            .backend
            .complete(prompts::STRATEGY_SYSTEM, &user_instructions)
            .await
        {
            Ok(text) => text,
            Err(err) => {
                warn!("backend unavailable ({}), falling back to placeholder", err);
                OFFLINE_PLACEHOLDER.to_string()
            }
        }
    }
}

/// Plan stage: fixed step outline plus the retrieval hints, which are the
/// profile's explicit knowledge hints unioned with its goal identifiers.
/// Duplicates collapse; first-seen order is kept.
fn plan_stage(profile: &Profile) -> (Plan, Vec<String>) {
    let mut hints: Vec<String> = Vec::new();
    let mut seen = std::collections::HashSet::new();
    let explicit = profile.knowledge_hints.iter().flatten().cloned();
    let goals = profile.goals.iter().map(|g| g.as_str().to_string());
    for hint in explicit.chain(goals) {
        if seen.insert(hint.clone()) {
            hints.push(hint);
        }
    }

    let plan = Plan {
        steps: vec![
            PlanStep {
                id: "retrieve".to_string(),
                desc: "search the knowledge index for relevant context".to_string(),
            },
            PlanStep {
                id: "strategize".to_string(),
                desc: "produce the structured strategy draft".to_string(),
            },
            PlanStep {
                id: "risk".to_string(),
                desc: "merge derived risk warnings".to_string(),
            },
            PlanStep {
                id: "review".to_string(),
                desc: "check completeness and fill reminders".to_string(),
            },
        ],
    };
    (plan, hints)
}

fn compose_strategy_request(profile: &Profile, context_docs: &[String]) -> String {
    // Profile serialization cannot fail; all fields are plain data.
    let insured = serde_json::to_string(&profile.insured).unwrap_or_default();
    let finance = serde_json::to_string(&profile.finance).unwrap_or_default();
    let goals = serde_json::to_string(&profile.goals).unwrap_or_default();
    let policies = serde_json::to_string(&profile.existing_policies).unwrap_or_default();
    format!(
        "Insured: {insured}\nFinances: {finance}\nGoals: {goals}\nExisting policies: {policies}\n\
         Retrieved context (excerpt):\n{}\nReply with a single JSON object strictly matching the schema.",
        context_docs.join("\n")
    )
}

/// Strict parse of backend text into the recommendation shape. Markdown code
/// fences are stripped first; anything else that fails `serde_json` is a
/// MalformedOutput carrying the raw text.
pub fn parse_recommendation(text: &str) -> Result<StrategyRecommendation> {
    let stripped = strip_code_fences(text);
    serde_json::from_str(stripped).map_err(|e| InsuraError::MalformedOutput {
        message: e.to_string(),
        raw: text.to_string(),
    })
}

fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening fence
    let body = match rest.split_once('\n') {
        Some((_, body)) => body,
        None => rest,
    };
    body.strip_suffix("```").unwrap_or(body).trim()
}
