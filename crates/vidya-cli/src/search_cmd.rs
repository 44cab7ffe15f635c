use anyhow::Context;
use tokio_util::sync::CancellationToken;

use vidya_core::Pipeline;
use vidya_core::search::SearchResult;

/// Run only the search stage and print the result as pretty JSON.
pub async fn run_search(
    pipeline: &Pipeline,
    prompt: &str,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    let result = pipeline.search_only(prompt, cancel).await;
    println!("{}", render(&result)?);
    Ok(())
}

fn render(result: &SearchResult) -> anyhow::Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize search result")
}

#[cfg(test)]
mod tests {
    use super::*;
    use vidya_core::search::{ExtractedContext, ResearchFinding};

    #[test]
    fn renders_success_with_findings() {
        let result = SearchResult::Success {
            extracted_context: ExtractedContext {
                subject: "Physics".to_string(),
                ..Default::default()
            },
            queries: vec!["q1".to_string()],
            findings: vec![ResearchFinding {
                query: "q1".to_string(),
                summary: "Unit I: Physical World".to_string(),
            }],
        };
        let value: serde_json::Value = serde_json::from_str(&render(&result).unwrap()).unwrap();
        assert_eq!(value["status"], "success");
        assert_eq!(value["extracted_context"]["subject"], "Physics");
        assert_eq!(value["findings"][0]["summary"], "Unit I: Physical World");
    }

    #[test]
    fn renders_failure_with_note() {
        let value: serde_json::Value =
            serde_json::from_str(&render(&SearchResult::failure("no key")).unwrap()).unwrap();
        assert_eq!(value["status"], "error");
        assert_eq!(value["error_message"], "no key");
        assert_eq!(value["fallback_note"], SearchResult::FALLBACK_NOTE);
    }
}
