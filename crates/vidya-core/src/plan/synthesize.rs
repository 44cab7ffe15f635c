//! Plan synthesis: enriched prompt in, validated plan plus provenance out.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::provider::{GenerateRequest, ProviderError, ReasoningProvider, cancellable};
use crate::search::{SearchResult, SearchStatus};
use crate::text::preview;

use super::document::{PlanDocument, PlanValidationError, response_schema};
use super::prompt::build_enriched_prompt;

/// Upper bound on generation attempts per plan.
pub const MAX_SYNTHESIS_ATTEMPTS: u32 = 3;

/// Where the plan's context came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanMetadata {
    pub search_status: SearchStatus,
    /// Every planned query on success, empty on failure.
    pub queries_used: Vec<String>,
    pub enhanced_with_search: bool,
}

impl PlanMetadata {
    pub fn from_search(search: &SearchResult) -> Self {
        Self {
            search_status: search.status(),
            queries_used: search.queries().to_vec(),
            enhanced_with_search: search.is_success(),
        }
    }
}

/// The plan document with its metadata alongside the document fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanResponse {
    #[serde(flatten)]
    pub document: PlanDocument,
    pub metadata: PlanMetadata,
}

#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    #[error("plan generation failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("plan generation returned malformed JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("generated plan is invalid: {0}")]
    Invalid(#[from] PlanValidationError),
}

impl SynthesisError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Provider(e) if e.is_configuration())
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Provider(ProviderError::Cancelled))
    }

    fn is_retryable(&self) -> bool {
        !(self.is_configuration() || self.is_cancelled())
    }
}

/// Runs the schema-constrained generation call.
pub struct PlanSynthesizer {
    provider: Arc<dyn ReasoningProvider>,
    attempts: u32,
}

impl PlanSynthesizer {
    /// `attempts` is clamped to `1..=MAX_SYNTHESIS_ATTEMPTS`.
    pub fn new(provider: Arc<dyn ReasoningProvider>, attempts: u32) -> Self {
        Self {
            provider,
            attempts: attempts.clamp(1, MAX_SYNTHESIS_ATTEMPTS),
        }
    }

    pub async fn synthesize(
        &self,
        prompt: &str,
        search: &SearchResult,
        cancel: &CancellationToken,
    ) -> Result<PlanResponse, SynthesisError> {
        let enriched = build_enriched_prompt(prompt, search);
        info!(
            prompt_chars = enriched.chars().count(),
            search_status = %search.status(),
            "generating plan"
        );
        let request = GenerateRequest::json(enriched, response_schema());

        let mut attempt = 1;
        let document = loop {
            match self.generate_once(&request, cancel).await {
                Ok(document) => break document,
                Err(e) if e.is_retryable() && attempt < self.attempts => {
                    warn!(attempt, max = self.attempts, error = %e, "plan generation failed; retrying");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        };

        info!(weeks = document.schedule.len(), "plan generated");
        Ok(PlanResponse {
            document,
            metadata: PlanMetadata::from_search(search),
        })
    }

    async fn generate_once(
        &self,
        request: &GenerateRequest,
        cancel: &CancellationToken,
    ) -> Result<PlanDocument, SynthesisError> {
        let reply = cancellable(cancel, self.provider.generate(request)).await?;
        debug!(
            provider = self.provider.name(),
            reply_preview = %preview(&reply, 200),
            "synthesis reply"
        );
        let document: PlanDocument =
            serde_json::from_str(reply.trim()).map_err(SynthesisError::InvalidJson)?;
        document.validate()?;
        Ok(document)
    }
}
