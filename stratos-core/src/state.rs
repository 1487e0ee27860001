//! Shared orchestration state threaded through every pipeline stage.
//!
//! Each stage receives the complete current state and returns a
//! `StageUpdate` holding only the fields it changed; the driver merges
//! updates by field-level overwrite.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum characters kept in a document title.
pub const TITLE_MAX_CHARS: usize = 300;
/// Maximum characters kept in a document summary.
pub const SUMMARY_MAX_CHARS: usize = 3000;

/// One unit of research work produced by the planner.
///
/// Immutable after planning; consumed by the researcher.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanStep {
    /// Short identifier, unique within a plan. Backfilled positionally
    /// when absent.
    #[serde(default)]
    pub step_id: String,
    /// Human-readable description of the step.
    #[serde(default)]
    pub description: String,
    /// Name of the tool to invoke.
    pub tool: String,
    /// The exact query string to run. Defaults to the topic when absent.
    #[serde(default)]
    pub query: String,
    /// Whether image references should be collected for this step.
    #[serde(default)]
    pub include_images: bool,
}

/// A normalized, deduplicated research finding with provenance metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier, freshly generated at normalization time.
    pub id: Uuid,
    /// Source title, truncated to [`TITLE_MAX_CHARS`].
    pub title: String,
    /// Source URL; may be empty when the tool provides none.
    pub url: String,
    /// Content summary, truncated to [`SUMMARY_MAX_CHARS`].
    pub summary: String,
    /// Tool or publisher name this document came from.
    pub source: String,
    /// Relevance score as reported by the tool; 0.0 when absent.
    pub score: f64,
    /// Image URLs associated with the hit, in tool order.
    pub images: Vec<String>,
}

impl Document {
    /// Create a document, applying the title and summary truncation limits.
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        summary: impl Into<String>,
        source: impl Into<String>,
        score: f64,
        images: Vec<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: truncate_chars(&title.into(), TITLE_MAX_CHARS),
            url: url.into(),
            summary: truncate_chars(&summary.into(), SUMMARY_MAX_CHARS),
            source: source.into(),
            score,
            images,
        }
    }
}

/// Truncate a string to at most `max` characters, respecting char boundaries.
pub(crate) fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}

/// The shared memory threaded through all pipeline stages for one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineState {
    /// The initial user topic.
    pub topic: String,
    /// Number of completed Research passes. Monotonically non-decreasing;
    /// the sole basis for critique-loop termination.
    pub iteration_count: u32,
    /// The ordered research plan.
    pub plan: Vec<PlanStep>,
    /// Normalized, deduplicated documents from the latest Research pass.
    pub documents: Vec<Document>,
    /// Serialized structured draft from the analyst.
    pub draft_report: String,
    /// Free-text critique from the critic.
    pub critique: String,
    /// Serialized final report from the strategist.
    pub final_report: String,
}

impl PipelineState {
    /// Create the initial state for a topic.
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            ..Default::default()
        }
    }
}

/// A partial state update returned by one stage.
///
/// `None` fields are left untouched; `Some` fields overwrite the previous
/// value wholesale. There is no partial merge within a field.
#[derive(Debug, Clone, Default)]
pub struct StageUpdate {
    pub plan: Option<Vec<PlanStep>>,
    pub documents: Option<Vec<Document>>,
    pub iteration_count: Option<u32>,
    pub draft_report: Option<String>,
    pub critique: Option<String>,
    pub final_report: Option<String>,
}

impl StageUpdate {
    /// Apply this update to the state, overwriting only the set fields.
    pub fn apply(self, state: &mut PipelineState) {
        if let Some(plan) = self.plan {
            state.plan = plan;
        }
        if let Some(documents) = self.documents {
            state.documents = documents;
        }
        if let Some(iteration_count) = self.iteration_count {
            state.iteration_count = iteration_count;
        }
        if let Some(draft_report) = self.draft_report {
            state.draft_report = draft_report;
        }
        if let Some(critique) = self.critique {
            state.critique = critique;
        }
        if let Some(final_report) = self.final_report {
            state.final_report = final_report;
        }
    }
}
