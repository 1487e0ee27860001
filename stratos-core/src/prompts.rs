//! Prompt templates for the pipeline stages.

use crate::state::Document;

const PLANNER_TEMPLATE: &str = r#"You are a research planner. Given a user topic, produce a concise
ordered plan ({min_steps}-{max_steps} steps) where each step specifies:
  - a short step_id (no spaces)
  - description
  - tool to use (choose from: {tools})
  - the exact query string to run
  - include_images: true/false

Output MUST be a JSON array of objects with the keys:
step_id, description, tool, query, include_images

TOPIC:
{topic}"#;

const ANALYST_TEMPLATE: &str = r#"You are a world-class business analyst. Your job is to analyze the
provided research documents and synthesize them into a draft report.

Focus on identifying key market trends, potential opportunities, and
significant risks. Use clear, professional language. Cite documents by
their number, e.g. [2].

RESEARCH DOCUMENTS:
{documents}

---
Output MUST be a single JSON object with the keys:
title, executive_summary, market_trends, opportunities, risks,
comparison_table, recommendations.

market_trends, opportunities, and risks are arrays of objects with the
keys "text" and "citations" (an array of document numbers).
comparison_table is a Markdown table string or "".
recommendations is an array of strings."#;

const CRITIC_TEMPLATE: &str = r#"You are a meticulous and demanding editor. Your job is to review
the following draft report.

Your ONLY goal is to check for quality and depth.
- If the report is high-quality, detailed, and insightful,
  respond ONLY with the word "{approval_token}".
- If the report is shallow, vague, or misses key details,
  respond with a concise, 1-2 sentence critique of *what is missing*.
  (e.g., "The risk section is too generic. It needs to
   identify specific market competitors.")

DRAFT REPORT:
{draft_report}"#;

const STRATEGIST_TEMPLATE: &str = r#"You are a C-level strategist. Your job is to take a
final, approved draft report and format it perfectly into
the required JSON output.

You must extract the key points for each section and present them
as lists of strings.

Output MUST be a single JSON object with the keys:
title, executive_summary, market_trends, potential_opportunities,
risk_feasibility_section, recommendations.

executive_summary and title are strings; all other values are
arrays of strings.

APPROVED DRAFT REPORT:
{approved_draft}"#;

pub fn planner_prompt(topic: &str, tools: &[String], min_steps: u32, max_steps: u32) -> String {
    PLANNER_TEMPLATE
        .replace("{min_steps}", &min_steps.to_string())
        .replace("{max_steps}", &max_steps.to_string())
        .replace("{tools}", &tools.join(", "))
        .replace("{topic}", topic)
}

pub fn analyst_prompt(documents: &[Document]) -> String {
    ANALYST_TEMPLATE.replace("{documents}", &format_documents(documents))
}

pub fn critic_prompt(draft_report: &str, approval_token: &str) -> String {
    CRITIC_TEMPLATE
        .replace("{approval_token}", approval_token)
        .replace("{draft_report}", draft_report)
}

pub fn strategist_prompt(approved_draft: &str) -> String {
    STRATEGIST_TEMPLATE.replace("{approved_draft}", approved_draft)
}

/// Render documents as a numbered digest the analyst can cite from.
fn format_documents(documents: &[Document]) -> String {
    documents
        .iter()
        .enumerate()
        .map(|(idx, doc)| {
            format!(
                "[{}] {} ({})\nSource: {}\n{}",
                idx + 1,
                doc.title,
                doc.url,
                doc.source,
                doc.summary
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(title: &str, summary: &str) -> Document {
        Document::new(
            title.to_string(),
            format!("https://example.com/{title}"),
            summary.to_string(),
            "web_search".to_string(),
            0.5,
            Vec::new(),
        )
    }

    #[test]
    fn test_planner_prompt_fills_placeholders() {
        let tools = vec!["web_search".to_string(), "arxiv_search".to_string()];
        let prompt = planner_prompt("quantum sensing", &tools, 3, 6);
        assert!(prompt.contains("3-6 steps"));
        assert!(prompt.contains("web_search, arxiv_search"));
        assert!(prompt.contains("quantum sensing"));
        assert!(!prompt.contains("{topic}"));
    }

    #[test]
    fn test_analyst_digest_is_numbered() {
        let docs = vec![doc("First", "Summary one"), doc("Second", "Summary two")];
        let prompt = analyst_prompt(&docs);
        assert!(prompt.contains("[1] First"));
        assert!(prompt.contains("[2] Second"));
        assert!(prompt.contains("Summary two"));
    }

    #[test]
    fn test_critic_prompt_names_token() {
        let prompt = critic_prompt("Draft body", "APPROVED");
        assert!(prompt.contains("\"APPROVED\""));
        assert!(prompt.contains("Draft body"));
    }
}
