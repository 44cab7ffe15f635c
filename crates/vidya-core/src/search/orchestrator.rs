//! Search stage driver: session, planning, then sequential research.
//!
//! [`SearchOrchestrator::run`] never fails. Any error in the stage is
//! converted into [`SearchResult::Failure`] so synthesis can proceed on the
//! bare prompt.

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::provider::ProviderError;
use crate::text::preview;

use super::planner::QueryPlanner;
use super::researcher::ContentResearcher;
use super::session::SessionManager;
use super::types::SearchResult;

/// Upper bound on queries researched per request.
pub const MAX_QUERIES: usize = 3;

/// Errors inside the search stage. Only ever surfaced through logs and
/// the failure message of [`SearchResult`].
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("could not create search session: {0}")]
    Session(#[source] ProviderError),

    #[error("query planning failed: {0}")]
    Planning(#[source] ProviderError),

    #[error("research for query {query:?} failed: {source}")]
    Research {
        query: String,
        #[source]
        source: ProviderError,
    },
}

pub struct SearchOrchestrator {
    sessions: SessionManager,
    planner: QueryPlanner,
    researcher: ContentResearcher,
}

impl SearchOrchestrator {
    pub fn new(
        sessions: SessionManager,
        planner: QueryPlanner,
        researcher: ContentResearcher,
    ) -> Self {
        Self {
            sessions,
            planner,
            researcher,
        }
    }

    /// Run the whole search stage for `prompt`.
    pub async fn run(&self, prompt: &str, cancel: &CancellationToken) -> SearchResult {
        info!(prompt = %preview(prompt, 100), "starting agentic search");
        match self.try_run(prompt, cancel).await {
            Ok(result) => {
                info!(queries = result.queries().len(), "agentic search completed");
                result
            }
            Err(e) => {
                error!(error = %e, "agentic search failed");
                SearchResult::failure(e.to_string())
            }
        }
    }

    async fn try_run(
        &self,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<SearchResult, SearchError> {
        let session = self.sessions.session().await.map_err(SearchError::Session)?;

        let plan = self
            .planner
            .plan(prompt, cancel)
            .await
            .map_err(SearchError::Planning)?;

        if plan.queries.len() > MAX_QUERIES {
            warn!(
                planned = plan.queries.len(),
                kept = MAX_QUERIES,
                "planner returned more queries than allowed; extra queries are not researched"
            );
        }

        let selected = &plan.queries[..plan.queries.len().min(MAX_QUERIES)];
        let mut findings = Vec::with_capacity(selected.len());
        for (i, query) in selected.iter().enumerate() {
            info!(index = i + 1, total = selected.len(), query = %query, "researching query");
            let finding = self
                .researcher
                .research(session, query, cancel)
                .await
                .map_err(|source| SearchError::Research {
                    query: query.clone(),
                    source,
                })?;
            findings.push(finding);
        }

        Ok(SearchResult::Success {
            extracted_context: plan.extracted_context,
            queries: plan.queries,
            findings,
        })
    }
}
