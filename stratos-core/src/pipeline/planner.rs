//! Plan stage: turn a topic into an ordered list of tool invocations.

use crate::config::PipelineConfig;
use crate::prompts;
use crate::provider::{extract_json_block, Generator};
use crate::state::{PipelineState, PlanStep, StageUpdate};
use serde_json::Value;
use tracing::warn;

/// Run the Plan stage.
///
/// A supplied plan bypasses generation entirely. Otherwise the generator is
/// asked for a JSON plan; any failure to obtain or parse one falls back to
/// [`default_plan`], so this stage cannot fail the run.
pub async fn run(
    generator: &dyn Generator,
    config: &PipelineConfig,
    tool_names: &[String],
    state: &PipelineState,
    supplied: Option<Vec<PlanStep>>,
) -> StageUpdate {
    let plan = match supplied {
        Some(steps) if !steps.is_empty() => clamp(normalize_steps(steps, &state.topic), config),
        _ => generate_plan(generator, config, tool_names, &state.topic).await,
    };
    StageUpdate {
        plan: Some(plan),
        ..Default::default()
    }
}

async fn generate_plan(
    generator: &dyn Generator,
    config: &PipelineConfig,
    tool_names: &[String],
    topic: &str,
) -> Vec<PlanStep> {
    let prompt = prompts::planner_prompt(
        topic,
        tool_names,
        config.min_plan_steps as u32,
        config.max_plan_steps as u32,
    );

    let response = match generator.generate(&prompt).await {
        Ok(text) => text,
        Err(error) => {
            warn!(%error, "Plan generation failed, using default plan");
            return default_plan(topic);
        }
    };

    match parse_plan(&response, topic) {
        Some(steps) if steps.len() >= config.min_plan_steps => clamp(steps, config),
        Some(steps) => {
            warn!(
                steps = steps.len(),
                min = config.min_plan_steps,
                "Generated plan too short, using default plan"
            );
            default_plan(topic)
        }
        None => {
            warn!("Plan response was not a JSON array, using default plan");
            default_plan(topic)
        }
    }
}

/// Parse a generated plan, tolerating missing fields.
///
/// Steps without a `step_id` get a positional one; a missing query falls
/// back to the topic itself. Steps without a tool are dropped.
fn parse_plan(response: &str, topic: &str) -> Option<Vec<PlanStep>> {
    let value: Value = serde_json::from_str(extract_json_block(response)).ok()?;
    let entries = value.as_array()?;

    let steps = entries
        .iter()
        .enumerate()
        .filter_map(|(idx, entry)| {
            let tool = entry["tool"].as_str()?.trim();
            if tool.is_empty() {
                return None;
            }
            let step_id = entry["step_id"]
                .as_str()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .unwrap_or_else(|| format!("step_{}", idx + 1));
            Some(PlanStep {
                step_id,
                description: entry["description"].as_str().unwrap_or("").to_string(),
                tool: tool.to_string(),
                query: entry["query"]
                    .as_str()
                    .filter(|q| !q.trim().is_empty())
                    .unwrap_or(topic)
                    .to_string(),
                include_images: entry["include_images"].as_bool().unwrap_or(false),
            })
        })
        .collect();
    Some(steps)
}

/// Backfill identifiers and queries on an externally supplied plan.
fn normalize_steps(steps: Vec<PlanStep>, topic: &str) -> Vec<PlanStep> {
    steps
        .into_iter()
        .enumerate()
        .map(|(idx, mut step)| {
            if step.step_id.trim().is_empty() {
                step.step_id = format!("step_{}", idx + 1);
            }
            if step.query.trim().is_empty() {
                step.query = topic.to_string();
            }
            step
        })
        .collect()
}

fn clamp(mut steps: Vec<PlanStep>, config: &PipelineConfig) -> Vec<PlanStep> {
    steps.truncate(config.max_plan_steps);
    steps
}

/// The deterministic fallback plan: one broad web pass, one news pass, one
/// academic pass.
pub fn default_plan(topic: &str) -> Vec<PlanStep> {
    vec![
        PlanStep {
            step_id: "web_basic".to_string(),
            description: "Search general web articles".to_string(),
            tool: "web_search".to_string(),
            query: topic.to_string(),
            include_images: true,
        },
        PlanStep {
            step_id: "news".to_string(),
            description: "Fetch recent news".to_string(),
            tool: "news_search".to_string(),
            query: topic.to_string(),
            include_images: false,
        },
        PlanStep {
            step_id: "arxiv".to_string(),
            description: "Find academic papers".to_string(),
            tool: "arxiv_search".to_string(),
            query: format!("{topic} review OR survey"),
            include_images: false,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockGenerator;

    fn tool_names() -> Vec<String> {
        vec![
            "web_search".to_string(),
            "news_search".to_string(),
            "arxiv_search".to_string(),
        ]
    }

    #[tokio::test]
    async fn test_valid_plan_is_used() {
        let generator = MockGenerator::new();
        generator.queue_text(
            r#"```json
[
  {"step_id": "a", "description": "web", "tool": "web_search", "query": "q1", "include_images": true},
  {"description": "news", "tool": "news_search", "query": "q2"},
  {"step_id": "c", "description": "papers", "tool": "arxiv_search", "query": "q3"}
]
```"#,
        );
        let state = PipelineState::new("topic");
        let update = run(
            &generator,
            &PipelineConfig::default(),
            &tool_names(),
            &state,
            None,
        )
        .await;

        let plan = update.plan.unwrap();
        assert_eq!(plan.len(), 3);
        assert_eq!(plan[0].step_id, "a");
        // Missing step_id is backfilled positionally.
        assert_eq!(plan[1].step_id, "step_2");
        assert!(plan[0].include_images);
        assert!(!plan[1].include_images);
    }

    #[tokio::test]
    async fn test_unparseable_response_falls_back() {
        let generator = MockGenerator::with_response("I cannot produce JSON today.");
        let state = PipelineState::new("rust adoption");
        let update = run(
            &generator,
            &PipelineConfig::default(),
            &tool_names(),
            &state,
            None,
        )
        .await;

        let plan = update.plan.unwrap();
        assert_eq!(plan.len(), 3);
        assert_eq!(plan[0].tool, "web_search");
        assert_eq!(plan[1].tool, "news_search");
        assert_eq!(plan[2].query, "rust adoption review OR survey");
    }

    #[tokio::test]
    async fn test_provider_failure_falls_back() {
        let generator = MockGenerator::new();
        generator.queue_failure(crate::error::ProviderError::ApiRequest {
            message: "503".into(),
        });
        let state = PipelineState::new("topic");
        let update = run(
            &generator,
            &PipelineConfig::default(),
            &tool_names(),
            &state,
            None,
        )
        .await;
        assert_eq!(update.plan.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_oversized_plan_is_clamped() {
        let steps: Vec<String> = (0..10)
            .map(|i| {
                format!(
                    r#"{{"step_id": "s{i}", "description": "d", "tool": "web_search", "query": "q{i}"}}"#
                )
            })
            .collect();
        let generator = MockGenerator::with_response(&format!("[{}]", steps.join(",")));
        let state = PipelineState::new("topic");
        let update = run(
            &generator,
            &PipelineConfig::default(),
            &tool_names(),
            &state,
            None,
        )
        .await;
        assert_eq!(update.plan.unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_supplied_plan_skips_generation() {
        let generator = MockGenerator::new();
        generator.queue_failure(crate::error::ProviderError::ApiRequest {
            message: "should not be called".into(),
        });
        let supplied = vec![PlanStep {
            step_id: String::new(),
            description: "only step".to_string(),
            tool: "web_search".to_string(),
            query: String::new(),
            include_images: false,
        }];
        let state = PipelineState::new("llm agents");
        let update = run(
            &generator,
            &PipelineConfig::default(),
            &tool_names(),
            &state,
            Some(supplied),
        )
        .await;

        let plan = update.plan.unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].step_id, "step_1");
        assert_eq!(plan[0].query, "llm agents");
    }
}
