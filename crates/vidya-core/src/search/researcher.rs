//! Content research: one search-augmented agent run per query.
//!
//! The agent streams incremental events. Intermediate text may be partial,
//! so the summary is chosen by [`reduce_events`]: the text of the last
//! final-flagged event, else the text of the last event that carried any.

use std::sync::Arc;

use futures::{Stream, TryStreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::provider::{AgentEvent, ProviderError, SearchAgent, Session, cancellable};

use super::types::ResearchFinding;

/// System instruction for the search agent.
pub const RESEARCHER_INSTRUCTION: &str = "You are an educational content researcher. \
Use the Google search tool to find educational content relevant to the given search query.

Focus on finding:
- Official CBSE syllabus documents
- Curriculum guidelines and frameworks
- Assessment patterns and evaluation criteria
- Learning outcomes and objectives
- Topic breakdowns and unit structures

After searching, summarize the key findings useful for building a detailed lesson plan, including:
- Curriculum structure
- Key topics and subtopics
- Assessment methods
- Learning outcomes
- Time allocation guidelines";

/// Runs one search per query and reduces the event stream to a summary.
pub struct ContentResearcher {
    agent: Arc<dyn SearchAgent>,
}

impl ContentResearcher {
    pub fn new(agent: Arc<dyn SearchAgent>) -> Self {
        Self { agent }
    }

    /// Research a single query within `session`.
    ///
    /// An error from the agent, at start or mid-stream, aborts the call.
    pub async fn research(
        &self,
        session: &Session,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<ResearchFinding, ProviderError> {
        let events = self.agent.run(session, &build_search_message(query));
        let summary = cancellable(cancel, reduce_events(events)).await?;

        info!(
            agent = self.agent.name(),
            query,
            summary_chars = summary.chars().count(),
            "research completed"
        );
        Ok(ResearchFinding {
            query: query.to_string(),
            summary,
        })
    }
}

/// The user message sent to the agent for one query.
pub fn build_search_message(query: &str) -> String {
    format!(
        "Search for educational content using this query: \"{query}\"\n\n\
         Focus on finding official CBSE documents, curriculum guidelines, and educational resources.\n\
         Summarize the key findings that would help in creating a comprehensive lesson plan."
    )
}

// ---------------------------------------------------------------------------
// Event reduction
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Reduction {
    last_final: Option<String>,
    last_seen: Option<String>,
}

impl Reduction {
    fn push(mut self, event: AgentEvent) -> Self {
        let Some(text) = event.text else {
            return self;
        };
        if event.is_final {
            self.last_final = Some(text.clone());
        }
        self.last_seen = Some(text);
        self
    }

    fn finish(self) -> String {
        self.last_final.or(self.last_seen).unwrap_or_default()
    }
}

/// Fold an agent event stream into a single summary.
///
/// Selection rule: the text of the last event flagged final wins; if no
/// event is final, the text of the last event observed. Events without text
/// are ignored. An empty stream yields an empty summary. The first stream
/// error is returned as-is.
pub async fn reduce_events<S>(events: S) -> Result<String, ProviderError>
where
    S: Stream<Item = Result<AgentEvent, ProviderError>>,
{
    let reduction = events
        .try_fold(Reduction::default(), |acc, event| async move {
            debug!(
                is_final = event.is_final,
                has_text = event.text.is_some(),
                "agent event"
            );
            Ok(acc.push(event))
        })
        .await?;
    Ok(reduction.finish())
}
