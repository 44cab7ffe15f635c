use std::io::Write;

use anyhow::Context;
use tokio_util::sync::CancellationToken;

use vidya_core::Pipeline;

/// Generate one plan and write it as pretty JSON to `output` or stdout.
pub async fn run_generate(
    pipeline: &Pipeline,
    prompt: &str,
    output: Option<&str>,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    let response = pipeline
        .create_teaching_plan(prompt, cancel)
        .await
        .context("failed to create teaching plan")?;
    let json = serde_json::to_string_pretty(&response).context("failed to serialize plan")?;

    let mut writer: Box<dyn Write> = if let Some(path) = output {
        Box::new(
            std::fs::File::create(path)
                .with_context(|| format!("cannot create output file: {path}"))?,
        )
    } else {
        Box::new(std::io::stdout().lock())
    };
    writeln!(writer, "{json}")?;

    if let Some(path) = output {
        println!(
            "Wrote {}-week plan to {path} (search: {})",
            response.document.schedule.len(),
            response.metadata.search_status
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use vidya_core::provider::InMemorySessionStore;
    use vidya_test_utils::{ScriptedReasoner, ScriptedSearchAgent, planner_reply, sample_plan_json};

    use super::*;

    fn pipeline(synthesis_reply: &str) -> Pipeline {
        Pipeline::new(
            ScriptedReasoner::replying(planner_reply(&["q1"])),
            ScriptedSearchAgent::with_summaries(&["s1"]),
            ScriptedReasoner::replying(synthesis_reply),
            Arc::new(InMemorySessionStore::new()),
            1,
        )
    }

    #[tokio::test]
    async fn writes_plan_to_output_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("plan.json");
        let path_str = path.to_str().unwrap();

        run_generate(
            &pipeline(&sample_plan_json()),
            "Class X Science",
            Some(path_str),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["metadata"]["queries_used"], serde_json::json!(["q1"]));
        assert!(written["schedule"].is_array());
    }

    #[tokio::test]
    async fn synthesis_failure_writes_nothing() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("plan.json");

        let result = run_generate(
            &pipeline("no json here"),
            "Class X Science",
            path.to_str(),
            &CancellationToken::new(),
        )
        .await;

        assert!(result.is_err());
        assert!(!path.exists());
    }
}
