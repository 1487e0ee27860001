//! Analyze stage: synthesize pooled documents into a structured draft.

use crate::prompts;
use crate::provider::{extract_json_block, Generator};
use crate::report::DraftReport;
use crate::state::{PipelineState, StageUpdate};
use chrono::Utc;
use tracing::warn;

/// Run the Analyze stage.
///
/// The generator sees a numbered digest of the document pool and returns a
/// draft as JSON. Generation or parse failure degrades to a placeholder
/// draft rather than failing the run; the critic then decides what happens
/// next.
pub async fn run(generator: &dyn Generator, state: &PipelineState) -> StageUpdate {
    let doc_count = state.documents.len();
    let prompt = prompts::analyst_prompt(&state.documents);

    let mut draft = match generator.generate(&prompt).await {
        Ok(response) => match serde_json::from_str::<DraftReport>(extract_json_block(&response)) {
            Ok(draft) => draft,
            Err(error) => {
                warn!(%error, "Draft response was not valid JSON, using placeholder draft");
                DraftReport::empty(doc_count)
            }
        },
        Err(error) => {
            warn!(%error, "Draft generation failed, using placeholder draft");
            DraftReport::empty(doc_count)
        }
    };

    draft.metadata.doc_count = doc_count;
    draft.metadata.generated_at = Some(Utc::now());
    if draft.images.is_empty() {
        draft.images = state
            .documents
            .iter()
            .flat_map(|doc| doc.images.iter().cloned())
            .collect();
    }

    // Serialization of a plain struct cannot fail.
    let serialized = serde_json::to_string(&draft).unwrap_or_default();
    StageUpdate {
        draft_report: Some(serialized),
        ..Default::default()
    }
}
