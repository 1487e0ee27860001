//! Critique stage: review the draft and either approve or demand revision.

use crate::config::PipelineConfig;
use crate::prompts;
use crate::provider::Generator;
use crate::state::{PipelineState, StageUpdate};
use tracing::warn;

/// Run the Critique stage.
///
/// The critique is whatever text the generator returns; the routing
/// decision happens later in the transition function. When the provider
/// itself fails, the draft is waved through with the approval token so a
/// flaky provider cannot burn the retry budget on its own errors.
pub async fn run(
    generator: &dyn Generator,
    config: &PipelineConfig,
    state: &PipelineState,
) -> StageUpdate {
    let prompt = prompts::critic_prompt(&state.draft_report, &config.approval_token);

    let critique = match generator.generate(&prompt).await {
        Ok(text) => text,
        Err(error) => {
            warn!(%error, "Critique generation failed, approving draft as-is");
            config.approval_token.clone()
        }
    };

    StageUpdate {
        critique: Some(critique),
        ..Default::default()
    }
}
