//! Enriched prompt assembly for the synthesis call.

use std::fmt::Write as _;

use crate::search::SearchResult;
use crate::text::truncate_with_ellipsis;

/// Findings included in the prompt, in research order.
pub const MAX_FINDINGS_IN_PROMPT: usize = 2;

/// Summary characters kept per finding.
pub const SUMMARY_CHAR_LIMIT: usize = 500;

const DIRECT_ANALYSIS: &str = "Using direct prompt analysis";

const SEARCH_UNAVAILABLE_NOTE: &str =
    "Note: Enhanced search unavailable. Creating plan based on standard CBSE guidelines.";

const REQUIREMENTS: &str = "Requirements:
- Plan term 1 and term 2 in detail with weekly topics, learning outcomes, and assessments
- Follow the CBSE syllabus and include practical and theory hours as specified in the course information
- Each term lasts 18 weeks
- Incorporate the research findings above to ensure curriculum alignment
- Include specific CBSE references and learning outcomes";

/// Build the prompt sent to the schema-constrained generation call.
///
/// Sections, in order: the original request, the extracted context (or a
/// direct-analysis marker when search failed), up to
/// [`MAX_FINDINGS_IN_PROMPT`] findings or the search-unavailable note, and
/// the fixed requirements block.
pub fn build_enriched_prompt(prompt: &str, search: &SearchResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Original Teacher Request: {prompt}");
    out.push('\n');
    out.push_str(
        "Based on the following research findings, create a comprehensive CBSE-aligned teaching plan:\n\n",
    );

    out.push_str("Educational Context Analysis:\n");
    match search {
        SearchResult::Success {
            extracted_context, ..
        } => {
            let rendered = serde_json::to_string_pretty(extracted_context)
                .unwrap_or_else(|_| "{}".to_string());
            out.push_str(&rendered);
        }
        SearchResult::Failure { .. } => out.push_str(DIRECT_ANALYSIS),
    }
    out.push_str("\n\nResearch Findings:\n");

    match search {
        SearchResult::Success { findings, .. } => {
            for (i, finding) in findings.iter().take(MAX_FINDINGS_IN_PROMPT).enumerate() {
                let _ = write!(
                    out,
                    "\nResearch {}: {}\nFindings: {}\n",
                    i + 1,
                    finding.query,
                    truncate_with_ellipsis(&finding.summary, SUMMARY_CHAR_LIMIT)
                );
            }
        }
        SearchResult::Failure { .. } => {
            out.push('\n');
            out.push_str(SEARCH_UNAVAILABLE_NOTE);
            out.push('\n');
        }
    }

    out.push('\n');
    out.push_str(REQUIREMENTS);
    out.push('\n');
    out
}
