//! # Stratos Core
//!
//! Core library for the Stratos research pipeline.
//! Provides the staged orchestration state machine, the tool governor
//! (capability-checked tool gateway), result normalization and
//! deduplication, the generation provider interface, and configuration.

pub mod config;
pub mod dedup;
pub mod error;
pub mod governor;
pub mod normalize;
pub mod pipeline;
pub mod policy;
pub mod prompts;
pub mod provider;
pub mod report;
pub mod state;
pub mod tool;

// Re-export commonly used types at the crate root.
pub use config::{load_config, PipelineConfig, ProviderConfig, StratosConfig, ToolsConfig};
pub use dedup::dedup_documents;
pub use error::{
    ConfigError, GovernorError, PipelineError, ProviderError, Result, StratosError, ToolError,
};
pub use governor::{ToolGovernor, ToolOutcome};
pub use normalize::normalize;
pub use pipeline::{critique_approves, default_plan, next_stage, Pipeline, Stage};
pub use policy::{load_policy, AccessPolicy, AgentPolicy};
pub use provider::{extract_json_block, GeminiGenerator, Generator, MockGenerator};
pub use report::{DraftReport, FinalReport, ReportMetadata, TrendPoint};
pub use state::{Document, PipelineState, PlanStep, StageUpdate};
pub use tool::{RawOutput, RawRecord, RawValue, Tool, ToolInput, ToolRegistry};
