//! Query planning: turn a teacher prompt into targeted search queries.
//!
//! The planner model is asked for a JSON object with `extracted_info` and
//! `search_queries`. A reply that does not decode falls back to three
//! templated CBSE queries built from the prompt itself.

use std::sync::Arc;

use serde::{Deserialize, Deserializer};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::provider::{GenerateRequest, ProviderError, ReasoningProvider, cancellable};
use crate::text::{collapse_whitespace, preview, truncate_chars};

use super::types::ExtractedContext;

/// System instruction for the planner model.
pub const PLANNER_INSTRUCTION: &str = r#"You are an educational search query specialist. Given a teacher's request for a lesson plan, extract:
1. Subject (Physics, Chemistry, Mathematics, ...)
2. Class level (IX, X, XI, XII, ...)
3. Board (CBSE, ICSE, state boards)
4. Academic year, if mentioned

Then write 2-3 specific web search queries that would surface:
- Official CBSE syllabus documents
- Curriculum guidelines
- Assessment patterns
- Learning outcomes

Respond with a single JSON object and nothing else:
{
    "extracted_info": {
        "subject": "extracted subject",
        "class": "extracted class",
        "board": "extracted board",
        "year": "extracted year or current"
    },
    "search_queries": ["query 1", "query 2", "query 3"]
}"#;

/// Prompt characters kept when interpolating into fallback queries.
pub const FALLBACK_PROMPT_MAX_CHARS: usize = 200;

/// Result of planning: context plus the ordered query list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPlan {
    pub extracted_context: ExtractedContext,
    pub queries: Vec<String>,
    /// True when the reply did not decode and templated queries were used.
    pub used_fallback: bool,
}

/// Plans search queries with one reasoning call.
pub struct QueryPlanner {
    provider: Arc<dyn ReasoningProvider>,
}

impl QueryPlanner {
    pub fn new(provider: Arc<dyn ReasoningProvider>) -> Self {
        Self { provider }
    }

    /// Ask the planner model for context and queries.
    ///
    /// Provider failures propagate. A reply that is not valid JSON does not:
    /// it yields [`fallback_queries`] and an empty context.
    pub async fn plan(
        &self,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<QueryPlan, ProviderError> {
        let request =
            GenerateRequest::text(build_analysis_prompt(prompt)).with_system(PLANNER_INSTRUCTION);

        let reply = cancellable(cancel, self.provider.generate(&request)).await?;
        info!(
            provider = self.provider.name(),
            reply_preview = %preview(&reply, 200),
            "query planner replied"
        );

        let plan = parse_planner_reply(&reply, prompt);
        info!(
            queries = ?plan.queries,
            context = ?plan.extracted_context,
            fallback = plan.used_fallback,
            "search queries planned"
        );
        Ok(plan)
    }
}

fn build_analysis_prompt(prompt: &str) -> String {
    format!(
        "Analyze this teacher's prompt and generate targeted search queries:\n\n\
         Teacher's Prompt: \"{prompt}\"\n\n\
         Extract the educational context and generate specific search queries \
         for finding relevant CBSE curriculum content."
    )
}

// ---------------------------------------------------------------------------
// Reply parsing
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct PlannerReply {
    #[serde(default, deserialize_with = "lenient_context")]
    extracted_info: ExtractedContext,
    #[serde(default, deserialize_with = "lenient_queries")]
    search_queries: Vec<String>,
}

fn lenient_context<'de, D>(deserializer: D) -> Result<ExtractedContext, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Object(_) => serde_json::from_value(value).unwrap_or_default(),
        _ => ExtractedContext::default(),
    })
}

fn lenient_queries<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                serde_json::Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

/// Strip one surrounding Markdown code fence (```json ... ```), if present.
fn strip_code_fence(reply: &str) -> &str {
    let trimmed = reply.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening line.
    match body.find('\n') {
        Some(pos) => body[pos + 1..].trim(),
        None => body.trim(),
    }
}

/// Decode a reply that must be a JSON object.
///
/// Derived struct deserializers also accept sequences, so the top-level
/// shape is checked on a `Value` first.
fn decode_reply(text: &str) -> Result<PlannerReply, serde_json::Error> {
    match serde_json::from_str::<serde_json::Value>(text)? {
        value @ serde_json::Value::Object(_) => serde_json::from_value(value),
        _ => Err(serde::de::Error::custom("planner reply is not a JSON object")),
    }
}

/// Decode the planner reply, falling back to templated queries on failure.
///
/// An empty `search_queries` list in a valid reply is returned as-is; only
/// a decode failure triggers the fallback.
pub fn parse_planner_reply(reply: &str, prompt: &str) -> QueryPlan {
    match decode_reply(strip_code_fence(reply)) {
        Ok(parsed) => QueryPlan {
            extracted_context: parsed.extracted_info,
            queries: parsed.search_queries,
            used_fallback: false,
        },
        Err(e) => {
            warn!(error = %e, "planner reply is not valid JSON; using fallback queries");
            QueryPlan {
                extracted_context: ExtractedContext::default(),
                queries: fallback_queries(prompt),
                used_fallback: true,
            }
        }
    }
}

/// The three templated queries used when the planner reply cannot be decoded.
///
/// The prompt is whitespace-collapsed and bounded to
/// [`FALLBACK_PROMPT_MAX_CHARS`] before interpolation.
pub fn fallback_queries(prompt: &str) -> Vec<String> {
    let collapsed = collapse_whitespace(prompt);
    let subject = truncate_chars(&collapsed, FALLBACK_PROMPT_MAX_CHARS).trim_end();
    vec![
        format!("CBSE syllabus {subject}"),
        format!("CBSE curriculum guidelines {subject}"),
        format!("CBSE assessment pattern {subject}"),
    ]
}
