//! Strategize stage: reshape the approved draft into the final report.

use crate::prompts;
use crate::provider::{extract_json_block, Generator};
use crate::report::{DraftReport, FinalReport};
use crate::state::{PipelineState, StageUpdate};
use tracing::warn;

/// Run the Strategize stage.
///
/// This stage always produces a final report: if the generator cannot be
/// reached or returns junk, the draft is flattened mechanically instead.
pub async fn run(generator: &dyn Generator, state: &PipelineState) -> StageUpdate {
    let prompt = prompts::strategist_prompt(&state.draft_report);

    let mut report = match generator.generate(&prompt).await {
        Ok(response) => match serde_json::from_str::<FinalReport>(extract_json_block(&response)) {
            Ok(report) => report,
            Err(error) => {
                warn!(%error, "Final report response was not valid JSON, flattening draft");
                flatten_draft(state)
            }
        },
        Err(error) => {
            warn!(%error, "Final report generation failed, flattening draft");
            flatten_draft(state)
        }
    };

    if report.sources.is_empty() {
        report.sources = state
            .documents
            .iter()
            .filter(|doc| !doc.url.is_empty())
            .map(|doc| doc.url.clone())
            .collect();
    }
    if report.title.is_empty() {
        report.title = state.topic.clone();
    }

    let serialized = serde_json::to_string(&report).unwrap_or_default();
    StageUpdate {
        final_report: Some(serialized),
        ..Default::default()
    }
}

fn flatten_draft(state: &PipelineState) -> FinalReport {
    let draft: DraftReport = serde_json::from_str(&state.draft_report).unwrap_or_default();
    FinalReport::from_draft(&draft)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::provider::MockGenerator;
    use crate::report::TrendPoint;
    use crate::state::Document;

    #[tokio::test]
    async fn test_valid_final_report_is_stored() {
        let generator = MockGenerator::with_response(
            r#"{
  "title": "Final",
  "executive_summary": "Done.",
  "market_trends": ["Trend A"],
  "potential_opportunities": ["Opp A"],
  "risk_feasibility_section": ["Risk A"],
  "recommendations": ["Rec A"]
}"#,
        );
        let mut state = PipelineState::new("t");
        state.documents = vec![Document::new(
            "a",
            "https://a.example",
            "Summary",
            "web_search",
            0.5,
            Vec::new(),
        )];

        let update = run(&generator, &state).await;
        let report: FinalReport = serde_json::from_str(&update.final_report.unwrap()).unwrap();
        assert_eq!(report.title, "Final");
        assert_eq!(report.market_trends, vec!["Trend A"]);
        // Sources are backfilled from the document pool.
        assert_eq!(report.sources, vec!["https://a.example"]);
    }

    #[tokio::test]
    async fn test_provider_failure_flattens_draft() {
        let generator = MockGenerator::new();
        generator.queue_failure(ProviderError::ApiRequest {
            message: "429".into(),
        });

        let draft = DraftReport {
            title: "Drafted".to_string(),
            executive_summary: "Summary.".to_string(),
            risks: vec![TrendPoint {
                text: "Risk A".to_string(),
                citations: vec![1],
            }],
            ..Default::default()
        };
        let mut state = PipelineState::new("t");
        state.draft_report = serde_json::to_string(&draft).unwrap();

        let update = run(&generator, &state).await;
        let report: FinalReport = serde_json::from_str(&update.final_report.unwrap()).unwrap();
        assert_eq!(report.title, "Drafted");
        assert_eq!(report.risk_feasibility_section, vec!["Risk A"]);
    }

    #[tokio::test]
    async fn test_empty_title_falls_back_to_topic() {
        let generator = MockGenerator::with_response(r#"{"executive_summary": "S"}"#);
        let state = PipelineState::new("quantum sensing");
        let update = run(&generator, &state).await;
        let report: FinalReport = serde_json::from_str(&update.final_report.unwrap()).unwrap();
        assert_eq!(report.title, "quantum sensing");
    }
}
