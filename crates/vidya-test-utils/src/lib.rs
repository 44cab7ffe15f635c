//! Shared test utilities for vidya integration tests.
//!
//! Scripted stand-ins for the provider traits, so pipeline tests can drive
//! every branch (planner fallback, research failure, synthesis failure)
//! without network access.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream;
use serde_json::{Value, json};

use vidya_core::provider::{
    AgentEvent, EventStream, GenerateRequest, ProviderError, ReasoningProvider, SearchAgent,
    Session, SessionStore,
};

/// Reasoning provider that replies from a queue and records every request.
///
/// Once the queue is exhausted it returns [`ProviderError::EmptyResponse`].
pub struct ScriptedReasoner {
    replies: Mutex<VecDeque<Result<String, ProviderError>>>,
    requests: Mutex<Vec<GenerateRequest>>,
}

impl ScriptedReasoner {
    pub fn new(replies: Vec<Result<String, ProviderError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// A reasoner with a single successful reply.
    pub fn replying(reply: impl Into<String>) -> Arc<Self> {
        Self::new(vec![Ok(reply.into())])
    }

    /// A reasoner whose first call fails with `error`.
    pub fn failing(error: ProviderError) -> Arc<Self> {
        Self::new(vec![Err(error)])
    }

    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl ReasoningProvider for ScriptedReasoner {
    fn name(&self) -> &str {
        "scripted-reasoner"
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<String, ProviderError> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(ProviderError::EmptyResponse {
                    provider: "scripted-reasoner".to_string(),
                })
            })
    }
}

/// Reasoning provider that never replies; only cancellation ends a call.
pub struct PendingReasoner;

#[async_trait]
impl ReasoningProvider for PendingReasoner {
    fn name(&self) -> &str {
        "pending-reasoner"
    }

    async fn generate(&self, _request: &GenerateRequest) -> Result<String, ProviderError> {
        std::future::pending().await
    }
}

/// Search agent that plays one event script per run and records messages.
///
/// Runs beyond the scripted ones produce an empty stream.
pub struct ScriptedSearchAgent {
    scripts: Mutex<VecDeque<Vec<Result<AgentEvent, ProviderError>>>>,
    messages: Mutex<Vec<String>>,
}

impl ScriptedSearchAgent {
    pub fn new(scripts: Vec<Vec<Result<AgentEvent, ProviderError>>>) -> Arc<Self> {
        Arc::new(Self {
            scripts: Mutex::new(scripts.into()),
            messages: Mutex::new(Vec::new()),
        })
    }

    /// One run per summary, each a partial event followed by the final one.
    pub fn with_summaries(summaries: &[&str]) -> Arc<Self> {
        Self::new(
            summaries
                .iter()
                .map(|s| {
                    vec![
                        Ok(AgentEvent::partial("searching...")),
                        Ok(AgentEvent::empty()),
                        Ok(AgentEvent::final_response(*s)),
                    ]
                })
                .collect(),
        )
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }

    pub fn run_count(&self) -> usize {
        self.messages.lock().unwrap().len()
    }
}

impl SearchAgent for ScriptedSearchAgent {
    fn name(&self) -> &str {
        "scripted-search"
    }

    fn run(&self, _session: &Session, message: &str) -> EventStream {
        self.messages.lock().unwrap().push(message.to_string());
        let script = self.scripts.lock().unwrap().pop_front().unwrap_or_default();
        Box::pin(stream::iter(script))
    }
}

/// Session store that always fails.
pub struct FailingSessionStore;

#[async_trait]
impl SessionStore for FailingSessionStore {
    async fn create_session(
        &self,
        _app_name: &str,
        _user_id: &str,
        _session_id: &str,
    ) -> Result<Session, ProviderError> {
        Err(ProviderError::Session("session backend unavailable".to_string()))
    }
}

/// A session handle for direct component tests.
pub fn test_session() -> Session {
    Session {
        id: "test_session".to_string(),
        app_name: "vidya_test".to_string(),
        user_id: "tester".to_string(),
    }
}

/// Planner reply with the given queries and a Class X Science context.
pub fn planner_reply(queries: &[&str]) -> String {
    json!({
        "extracted_info": {
            "subject": "Science",
            "class": "X",
            "board": "CBSE",
            "year": "2024-25"
        },
        "search_queries": queries
    })
    .to_string()
}

/// A minimal plan document that passes validation.
pub fn sample_plan() -> Value {
    json!({
        "course_info": {
            "title": "Science",
            "class": "X",
            "subject": "Science (086)",
            "academic_year": "2024-25",
            "total_weeks": 36,
            "periods_per_week": 6,
            "practical_hours": 30,
            "theory_hours": 150
        },
        "schedule": [
            {
                "week": 1,
                "unit": "Unit I: Chemical Substances",
                "title": "Chemical Reactions and Equations",
                "topics": [
                    {
                        "topic": "Balancing chemical equations",
                        "subtopics": ["Law of conservation of mass"],
                        "cbse_reference": "Chapter 1",
                        "periods": 4,
                        "type": "theory"
                    },
                    {
                        "topic": "Types of reactions",
                        "cbse_reference": "Chapter 1",
                        "periods": 2,
                        "type": "practical",
                        "equipment": ["Test tubes", "Burner"]
                    }
                ],
                "learning_outcomes": ["Write and balance chemical equations"],
                "cbse_assessment": {
                    "type": "Formative Assessment",
                    "marks": 10,
                    "technique": "Worksheet"
                }
            }
        ],
        "term_plan": {
            "term1": { "weeks": "1-18", "units": ["Unit I"], "assessment": "Mid-term exam" },
            "term2": { "weeks": "19-36", "units": ["Unit II"], "assessment": "Board exam" }
        }
    })
}

/// [`sample_plan`] serialized, as a model would return it.
pub fn sample_plan_json() -> String {
    sample_plan().to_string()
}
