//! Research stage: execute the plan through the governor and pool the
//! normalized, deduplicated results.

use crate::dedup::dedup_documents;
use crate::governor::{ToolGovernor, ToolOutcome};
use crate::normalize::normalize;
use crate::state::{PipelineState, StageUpdate};
use crate::tool::ToolInput;
use tracing::{debug, warn};

/// The agent identity all research steps execute under.
pub const RESEARCH_AGENT: &str = "ResearchAgent";

/// Run the Research stage.
///
/// Each plan step is dispatched through the governor. A step that is
/// denied, unknown, or fails is logged and skipped; the remaining steps
/// still run, so one bad step never aborts the pass. Documents from the
/// previous pass are replaced, not appended, and the iteration count is
/// bumped by exactly one.
pub async fn run(governor: &ToolGovernor, state: &PipelineState) -> StageUpdate {
    let mut pooled = Vec::new();

    for step in &state.plan {
        let outcome = governor
            .execute(
                RESEARCH_AGENT,
                &step.tool,
                ToolInput::Query(step.query.clone()),
            )
            .await;

        let output = match outcome {
            Ok(ToolOutcome::Output(output)) => output,
            Ok(ToolOutcome::Failed { tool, message }) => {
                warn!(step = %step.step_id, tool = %tool, %message, "Tool failed, skipping step");
                continue;
            }
            Err(error) => {
                warn!(step = %step.step_id, tool = %step.tool, %error, "Step rejected, skipping");
                continue;
            }
        };

        let mut documents = normalize(&step.tool, output);
        if !step.include_images {
            for doc in &mut documents {
                doc.images.clear();
            }
        }
        debug!(step = %step.step_id, count = documents.len(), "Step produced documents");
        pooled.extend(documents);
    }

    let documents = dedup_documents(pooled);
    debug!(count = documents.len(), "Research pass complete");

    StageUpdate {
        documents: Some(documents),
        iteration_count: Some(state.iteration_count + 1),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ToolError;
    use crate::policy::AccessPolicy;
    use crate::state::PlanStep;
    use crate::tool::{RawOutput, RawRecord, Tool, ToolRegistry};
    use async_trait::async_trait;
    use std::sync::Arc;
    use serde_json::json;

    struct FixedTool {
        name: &'static str,
        records: Vec<RawRecord>,
    }

    #[async_trait]
    impl Tool for FixedTool {
        fn name(&self) -> &str {
            self.name
        }
        fn description(&self) -> &str {
            "returns canned records"
        }
        async fn invoke(&self, _input: ToolInput) -> Result<RawOutput, ToolError> {
            Ok(RawOutput::Records(self.records.clone()))
        }
    }

    struct FailingTool;

    #[async_trait]
    impl Tool for FailingTool {
        fn name(&self) -> &str {
            "news_search"
        }
        fn description(&self) -> &str {
            "always fails"
        }
        async fn invoke(&self, _input: ToolInput) -> Result<RawOutput, ToolError> {
            Err(ToolError::ExecutionFailed {
                name: "news_search".into(),
                message: "connection reset".into(),
            })
        }
    }

    fn record(title: &str, url: &str, content: &str) -> RawRecord {
        let value = json!({"title": title, "url": url, "content": content, "score": 0.8});
        value.as_object().unwrap().clone()
    }

    fn policy() -> AccessPolicy {
        let mut policy = AccessPolicy::default();
        policy.grant(RESEARCH_AGENT, &["web_search", "news_search", "arxiv_search"]);
        policy
    }

    fn step(id: &str, tool: &str) -> PlanStep {
        PlanStep {
            step_id: id.to_string(),
            description: String::new(),
            tool: tool.to_string(),
            query: "q".to_string(),
            include_images: false,
        }
    }

    #[tokio::test]
    async fn test_pool_is_deduplicated_across_steps() {
        let mut registry = ToolRegistry::new();
        registry
            .register(Arc::new(FixedTool {
                name: "web_search",
                records: vec![
                    record("A", "https://a.example", "Summary A"),
                    record("B", "https://b.example", "Summary B"),
                ],
            }))
            .unwrap();
        registry
            .register(Arc::new(FixedTool {
                name: "news_search",
                records: vec![record("A again", "https://a.example", "Summary A")],
            }))
            .unwrap();
        let governor = ToolGovernor::new(registry, policy());

        let mut state = PipelineState::new("t");
        state.plan = vec![step("s1", "web_search"), step("s2", "news_search")];

        let update = run(&governor, &state).await;
        let documents = update.documents.unwrap();
        assert_eq!(documents.len(), 2);
        assert_eq!(update.iteration_count, Some(1));
    }

    #[tokio::test]
    async fn test_failed_step_is_skipped_not_fatal() {
        let mut registry = ToolRegistry::new();
        registry
            .register(Arc::new(FixedTool {
                name: "web_search",
                records: vec![record("A", "https://a.example", "Summary A")],
            }))
            .unwrap();
        registry.register(Arc::new(FailingTool)).unwrap();
        let governor = ToolGovernor::new(registry, policy());

        let mut state = PipelineState::new("t");
        state.plan = vec![step("s1", "web_search"), step("s2", "news_search")];

        let update = run(&governor, &state).await;
        assert_eq!(update.documents.unwrap().len(), 1);
        assert_eq!(update.iteration_count, Some(1));
    }

    #[tokio::test]
    async fn test_denied_step_is_skipped() {
        let mut registry = ToolRegistry::new();
        registry
            .register(Arc::new(FixedTool {
                name: "web_search",
                records: vec![record("A", "https://a.example", "Summary A")],
            }))
            .unwrap();
        let mut policy = AccessPolicy::default();
        policy.grant(RESEARCH_AGENT, &["web_search"]);
        let governor = ToolGovernor::new(registry, policy);

        let mut state = PipelineState::new("t");
        // Second step names a tool this agent is not granted.
        state.plan = vec![step("s1", "web_search"), step("s2", "read_webpage")];

        let update = run(&governor, &state).await;
        assert_eq!(update.documents.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_images_dropped_unless_requested() {
        let value = json!({
            "title": "A",
            "url": "https://a.example",
            "content": "Summary A",
            "images": ["https://a.example/1.png"],
        });
        let mut registry = ToolRegistry::new();
        registry
            .register(Arc::new(FixedTool {
                name: "web_search",
                records: vec![value.as_object().unwrap().clone()],
            }))
            .unwrap();
        let governor = ToolGovernor::new(registry, policy());

        let mut state = PipelineState::new("t");
        state.plan = vec![step("s1", "web_search")];

        let update = run(&governor, &state).await;
        assert!(update.documents.unwrap()[0].images.is_empty());

        let mut with_images = step("s1", "web_search");
        with_images.include_images = true;
        state.plan = vec![with_images];
        let update = run(&governor, &state).await;
        assert_eq!(update.documents.unwrap()[0].images.len(), 1);
    }
}
