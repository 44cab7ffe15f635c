//! Composition root: search stage followed by plan synthesis.
//!
//! Per request: `searching -> search_ok | search_failed -> synthesizing ->
//! done | synthesis_failed`. A search failure never aborts the request.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::plan::{PlanResponse, PlanSynthesizer, SynthesisError};
use crate::provider::{
    GeminiClient, GeminiSearchAgent, InMemorySessionStore, ProviderError, ReasoningProvider,
    SearchAgent, SessionStore,
};
use crate::search::researcher::RESEARCHER_INSTRUCTION;
use crate::search::{
    ContentResearcher, QueryPlanner, SearchOrchestrator, SearchResult, SessionManager,
};
use crate::text::preview;

/// Request-level failure of [`Pipeline::create_teaching_plan`].
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Missing or rejected credentials.
    #[error("configuration error: {0}")]
    Configuration(#[source] SynthesisError),

    #[error(transparent)]
    Synthesis(SynthesisError),

    #[error("request cancelled")]
    Cancelled,
}

impl PipelineError {
    /// Stable error kind exposed to API clients.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::Synthesis(_) => "synthesis",
            Self::Cancelled => "cancelled",
        }
    }
}

impl From<SynthesisError> for PipelineError {
    fn from(e: SynthesisError) -> Self {
        if e.is_cancelled() {
            Self::Cancelled
        } else if e.is_configuration() {
            Self::Configuration(e)
        } else {
            Self::Synthesis(e)
        }
    }
}

pub struct Pipeline {
    search: SearchOrchestrator,
    synthesizer: PlanSynthesizer,
}

impl Pipeline {
    /// Assemble a pipeline from injected providers.
    pub fn new(
        planner: Arc<dyn ReasoningProvider>,
        researcher: Arc<dyn SearchAgent>,
        synthesizer: Arc<dyn ReasoningProvider>,
        sessions: Arc<dyn SessionStore>,
        synthesis_attempts: u32,
    ) -> Self {
        Self {
            search: SearchOrchestrator::new(
                SessionManager::new(sessions),
                QueryPlanner::new(planner),
                ContentResearcher::new(researcher),
            ),
            synthesizer: PlanSynthesizer::new(synthesizer, synthesis_attempts),
        }
    }

    /// Wire Gemini-backed providers and an in-memory session store.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, ProviderError> {
        if !config.gemini.has_api_key() {
            warn!("no Gemini API key configured; requests will fail until one is set");
        }
        let planner = GeminiClient::new(&config.gemini, &config.models.planner)?;
        let researcher = GeminiSearchAgent::new(
            &config.gemini,
            &config.models.researcher,
            RESEARCHER_INSTRUCTION,
        )?;
        let synthesizer = GeminiClient::new(&config.gemini, &config.models.synthesizer)?;
        info!(
            planner = %config.models.planner,
            researcher = %config.models.researcher,
            synthesizer = %config.models.synthesizer,
            synthesis_attempts = config.effective_synthesis_attempts(),
            "pipeline configured"
        );

        Ok(Self::new(
            Arc::new(planner),
            Arc::new(researcher),
            Arc::new(synthesizer),
            Arc::new(InMemorySessionStore::new()),
            config.effective_synthesis_attempts(),
        ))
    }

    /// Search, then synthesize a validated plan with provenance metadata.
    pub async fn create_teaching_plan(
        &self,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<PlanResponse, PipelineError> {
        let span = info_span!("teaching_plan", request_id = %Uuid::new_v4());
        async {
            info!(prompt = %preview(prompt, 100), state = "searching", "creating teaching plan");
            let search = self.search.run(prompt, cancel).await;
            if cancel.is_cancelled() {
                warn!("request cancelled during search");
                return Err(PipelineError::Cancelled);
            }
            let state = if search.is_success() {
                "search_ok"
            } else {
                "search_failed"
            };
            info!(state, queries = search.queries().len(), "search stage finished");

            info!(state = "synthesizing", "synthesizing plan");
            match self.synthesizer.synthesize(prompt, &search, cancel).await {
                Ok(response) => {
                    info!(state = "done", "teaching plan created");
                    Ok(response)
                }
                Err(e) => {
                    error!(state = "synthesis_failed", error = %e, "plan synthesis failed");
                    Err(e.into())
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Run only the search stage.
    pub async fn search_only(&self, prompt: &str, cancel: &CancellationToken) -> SearchResult {
        self.search.run(prompt, cancel).await
    }
}
