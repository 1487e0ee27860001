//! Structured draft and final report types.
//!
//! The analyst produces a [`DraftReport`]; the strategist reshapes the
//! approved draft into the flat [`FinalReport`] that callers consume. Both
//! travel through [`PipelineState`](crate::state::PipelineState) as JSON
//! strings so stage updates stay plain string overwrites.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One analytical finding with its supporting document numbers.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TrendPoint {
    pub text: String,
    /// 1-based indices into the research digest the analyst saw.
    #[serde(default)]
    pub citations: Vec<usize>,
}

/// Bookkeeping attached to a draft at generation time.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReportMetadata {
    pub doc_count: usize,
    pub generated_at: Option<DateTime<Utc>>,
}

/// The analyst's structured draft, subject to critique.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DraftReport {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub executive_summary: String,
    #[serde(default)]
    pub market_trends: Vec<TrendPoint>,
    #[serde(default)]
    pub opportunities: Vec<TrendPoint>,
    #[serde(default)]
    pub risks: Vec<TrendPoint>,
    /// Markdown table comparing key findings; empty when not applicable.
    #[serde(default)]
    pub comparison_table: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub metadata: ReportMetadata,
}

impl DraftReport {
    /// A placeholder draft used when analysis cannot produce one.
    ///
    /// Keeps the pipeline moving: the critic will reject it and trigger a
    /// revision pass while the retry budget lasts.
    pub fn empty(doc_count: usize) -> Self {
        Self {
            title: "Draft report unavailable".to_string(),
            executive_summary: format!(
                "Analysis did not produce a structured draft from {doc_count} documents."
            ),
            metadata: ReportMetadata {
                doc_count,
                generated_at: Some(Utc::now()),
            },
            ..Default::default()
        }
    }
}

/// The flat, consumer-facing report produced by the strategist.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FinalReport {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub executive_summary: String,
    #[serde(default)]
    pub market_trends: Vec<String>,
    #[serde(default)]
    pub potential_opportunities: Vec<String>,
    #[serde(default)]
    pub risk_feasibility_section: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    /// URLs of the documents that fed the report.
    #[serde(default)]
    pub sources: Vec<String>,
}

impl FinalReport {
    /// Flatten a draft into the final shape without a generation pass.
    ///
    /// Used when the strategist cannot obtain or parse a model response.
    pub fn from_draft(draft: &DraftReport) -> Self {
        Self {
            title: draft.title.clone(),
            executive_summary: draft.executive_summary.clone(),
            market_trends: flatten(&draft.market_trends),
            potential_opportunities: flatten(&draft.opportunities),
            risk_feasibility_section: flatten(&draft.risks),
            recommendations: draft.recommendations.clone(),
            sources: Vec::new(),
        }
    }
}

fn flatten(points: &[TrendPoint]) -> Vec<String> {
    points.iter().map(|p| p.text.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_draft_roundtrip() {
        let draft = DraftReport {
            title: "EV Batteries".to_string(),
            executive_summary: "Solid-state is close.".to_string(),
            market_trends: vec![TrendPoint {
                text: "Energy density rising".to_string(),
                citations: vec![1, 3],
            }],
            ..Default::default()
        };
        let json = serde_json::to_string(&draft).unwrap();
        let back: DraftReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, draft);
    }

    #[test]
    fn test_draft_parses_with_missing_fields() {
        let draft: DraftReport =
            serde_json::from_str(r#"{"title": "Partial", "market_trends": []}"#).unwrap();
        assert_eq!(draft.title, "Partial");
        assert!(draft.executive_summary.is_empty());
        assert!(draft.risks.is_empty());
    }

    #[test]
    fn test_empty_draft_records_doc_count() {
        let draft = DraftReport::empty(7);
        assert_eq!(draft.metadata.doc_count, 7);
        assert!(draft.executive_summary.contains('7'));
        assert!(draft.metadata.generated_at.is_some());
    }

    #[test]
    fn test_final_from_draft_flattens_points() {
        let draft = DraftReport {
            title: "T".to_string(),
            executive_summary: "S".to_string(),
            market_trends: vec![
                TrendPoint {
                    text: "Trend A".to_string(),
                    citations: vec![1],
                },
                TrendPoint {
                    text: "Trend B".to_string(),
                    citations: vec![],
                },
            ],
            risks: vec![TrendPoint {
                text: "Risk A".to_string(),
                citations: vec![2],
            }],
            recommendations: vec!["Do X".to_string()],
            ..Default::default()
        };
        let final_report = FinalReport::from_draft(&draft);
        assert_eq!(final_report.market_trends, vec!["Trend A", "Trend B"]);
        assert_eq!(final_report.risk_feasibility_section, vec!["Risk A"]);
        assert_eq!(final_report.recommendations, vec!["Do X"]);
        assert!(final_report.potential_opportunities.is_empty());
    }
}
