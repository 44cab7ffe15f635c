//! Data carried through the search stage.

use serde::{Deserialize, Deserializer, Serialize};

/// Educational context pulled out of the teacher's prompt.
///
/// Best-effort: values are whatever the planner model returned, coerced to
/// strings. Missing fields are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedContext {
    #[serde(default, deserialize_with = "lenient_string")]
    pub subject: String,
    #[serde(rename = "class", default, deserialize_with = "lenient_string")]
    pub class_level: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub board: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub year: String,
}

impl ExtractedContext {
    pub fn is_empty(&self) -> bool {
        self.subject.is_empty()
            && self.class_level.is_empty()
            && self.board.is_empty()
            && self.year.is_empty()
    }
}

/// Accept any JSON value for a string field. Numbers and booleans are
/// rendered; null, arrays and objects become empty.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Null | serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
            String::new()
        }
    })
}

/// The summary produced for one search query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchFinding {
    pub query: String,
    pub summary: String,
}

/// Status tag of a [`SearchResult`], as exposed in plan metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    Success,
    Error,
}

impl std::fmt::Display for SearchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => f.write_str("success"),
            Self::Error => f.write_str("error"),
        }
    }
}

/// Outcome of the search stage. Exactly one variant, tagged by `status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SearchResult {
    Success {
        extracted_context: ExtractedContext,
        queries: Vec<String>,
        findings: Vec<ResearchFinding>,
    },
    #[serde(rename = "error")]
    Failure {
        error_message: String,
        fallback_note: String,
    },
}

impl SearchResult {
    /// Note attached to every failure.
    pub const FALLBACK_NOTE: &str =
        "Search functionality unavailable, using direct prompt processing";

    pub fn failure(error_message: impl Into<String>) -> Self {
        Self::Failure {
            error_message: error_message.into(),
            fallback_note: Self::FALLBACK_NOTE.to_string(),
        }
    }

    pub fn status(&self) -> SearchStatus {
        match self {
            Self::Success { .. } => SearchStatus::Success,
            Self::Failure { .. } => SearchStatus::Error,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Planned queries on success, nothing on failure.
    pub fn queries(&self) -> &[String] {
        match self {
            Self::Success { queries, .. } => queries,
            Self::Failure { .. } => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn context_accepts_non_string_values() {
        let ctx: ExtractedContext = serde_json::from_value(json!({
            "subject": "Physics",
            "class": 12,
            "board": null,
            "year": "2024-25",
            "stream": "science"
        }))
        .unwrap();
        assert_eq!(ctx.subject, "Physics");
        assert_eq!(ctx.class_level, "12");
        assert_eq!(ctx.board, "");
        assert_eq!(ctx.year, "2024-25");
    }

    #[test]
    fn context_drops_non_scalar_values() {
        let ctx: ExtractedContext = serde_json::from_str(
            r#"{"subject": ["Physics", "Chem"], "board": {"n": "CBSE"}, "class": "XI"}"#,
        )
        .unwrap();
        assert_eq!(ctx.subject, "");
        assert_eq!(ctx.board, "");
        assert_eq!(ctx.class_level, "XI");
    }

    #[test]
    fn context_missing_fields_default_empty() {
        let ctx: ExtractedContext = serde_json::from_value(json!({})).unwrap();
        assert!(ctx.is_empty());
    }

    #[test]
    fn context_serializes_class_key() {
        let ctx = ExtractedContext {
            class_level: "X".to_string(),
            ..Default::default()
        };
        let value = serde_json::to_value(&ctx).unwrap();
        assert_eq!(value["class"], "X");
    }

    #[test]
    fn search_result_is_tagged_by_status() {
        let ok = SearchResult::Success {
            extracted_context: ExtractedContext::default(),
            queries: vec!["q".to_string()],
            findings: vec![],
        };
        assert_eq!(serde_json::to_value(&ok).unwrap()["status"], "success");

        let failed = SearchResult::failure("boom");
        let value = serde_json::to_value(&failed).unwrap();
        assert_eq!(value["status"], "error");
        assert_eq!(value["error_message"], "boom");
        assert_eq!(value["fallback_note"], SearchResult::FALLBACK_NOTE);
        assert!(value.get("queries").is_none());
    }

    #[test]
    fn failure_exposes_no_queries() {
        let failed = SearchResult::failure("boom");
        assert!(!failed.is_success());
        assert!(failed.queries().is_empty());
        assert_eq!(failed.status(), SearchStatus::Error);
        assert_eq!(failed.status().to_string(), "error");
    }
}
