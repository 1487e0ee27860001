//! The research pipeline state machine.
//!
//! A run walks a fixed sequence of stages with a single conditional edge:
//! Plan → Research → Analyze → Critique, then either back to Research
//! (revision) or on to Strategize and Terminal. The critique decision is a
//! pure function of the critique text and the iteration count, so the loop
//! is bounded by construction.

mod analyst;
mod critic;
mod planner;
mod researcher;
mod strategist;

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::governor::ToolGovernor;
use crate::provider::Generator;
use crate::state::{PipelineState, PlanStep};
use std::sync::Arc;
use tracing::info;

pub use planner::default_plan;

/// The stages of a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Plan,
    Research,
    Analyze,
    Critique,
    Strategize,
    Terminal,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Plan => "plan",
            Stage::Research => "research",
            Stage::Analyze => "analyze",
            Stage::Critique => "critique",
            Stage::Strategize => "strategize",
            Stage::Terminal => "terminal",
        }
    }
}

/// Whether a critique text counts as approval.
///
/// Case-insensitive containment of the approval token, so "Approved with
/// minor reservations" still approves.
pub fn critique_approves(critique: &str, approval_token: &str) -> bool {
    critique
        .to_lowercase()
        .contains(&approval_token.to_lowercase())
}

/// Compute the successor stage. Pure; the only inputs are the current
/// stage, the state, and the retry configuration.
pub fn next_stage(stage: Stage, state: &PipelineState, config: &PipelineConfig) -> Stage {
    match stage {
        Stage::Plan => Stage::Research,
        Stage::Research => Stage::Analyze,
        Stage::Analyze => Stage::Critique,
        Stage::Critique => {
            let approved = critique_approves(&state.critique, &config.approval_token);
            let budget_spent = state.iteration_count > config.retry_budget;
            if approved || budget_spent {
                Stage::Strategize
            } else {
                Stage::Research
            }
        }
        Stage::Strategize => Stage::Terminal,
        Stage::Terminal => Stage::Terminal,
    }
}

/// Drives a topic through the full stage sequence.
pub struct Pipeline {
    governor: Arc<ToolGovernor>,
    generator: Arc<dyn Generator>,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(
        governor: Arc<ToolGovernor>,
        generator: Arc<dyn Generator>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            governor,
            generator,
            config,
        }
    }

    /// Run the pipeline to completion for a topic.
    ///
    /// `initial_plan` skips the Plan stage's generation call and uses the
    /// given steps directly (still clamped to the configured maximum).
    pub async fn run(
        &self,
        topic: &str,
        initial_plan: Option<Vec<PlanStep>>,
    ) -> Result<PipelineState, PipelineError> {
        let mut state = PipelineState::new(topic);
        let mut stage = Stage::Plan;

        while stage != Stage::Terminal {
            info!(stage = stage.name(), iteration = state.iteration_count, "Entering stage");
            let update = match stage {
                Stage::Plan => {
                    planner::run(
                        self.generator.as_ref(),
                        &self.config,
                        &self.governor.tool_names(),
                        &state,
                        initial_plan.clone(),
                    )
                    .await
                }
                Stage::Research => researcher::run(&self.governor, &state).await,
                Stage::Analyze => analyst::run(self.generator.as_ref(), &state).await,
                Stage::Critique => {
                    critic::run(self.generator.as_ref(), &self.config, &state).await
                }
                Stage::Strategize => strategist::run(self.generator.as_ref(), &state).await,
                Stage::Terminal => unreachable!("loop exits before terminal"),
            };
            update.apply(&mut state);
            stage = next_stage(stage, &state, &self.config);
        }

        if state.final_report.is_empty() {
            return Err(PipelineError::MissingFinalReport);
        }
        Ok(state)
    }
}
