//! Error types for the Stratos pipeline core.
//!
//! Uses `thiserror` for public API error types with structured variants
//! covering the governor, tool execution, generation provider, configuration,
//! and pipeline domains.

use std::path::PathBuf;

/// Top-level error type for the Stratos core library.
#[derive(Debug, thiserror::Error)]
pub enum StratosError {
    #[error("Governor error: {0}")]
    Governor(#[from] GovernorError),

    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors raised by the tool governor before a tool runs.
///
/// These are access-control and resolution failures; failures *inside* a tool
/// are contained by the governor and never surface as errors.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GovernorError {
    #[error("Agent '{agent}' has no access policy entry")]
    UnknownAgent { agent: String },

    #[error("Agent '{agent}' is not allowed to use tool '{tool}'")]
    PermissionDenied { agent: String, tool: String },

    #[error("Tool '{tool}' is not registered")]
    UnknownTool { tool: String },
}

/// Errors from tool registration and execution.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Tool already registered: {name}")]
    AlreadyRegistered { name: String },

    #[error("Invalid input for tool '{name}': {reason}")]
    InvalidInput { name: String, reason: String },

    #[error("Tool '{name}' execution failed: {message}")]
    ExecutionFailed { name: String, message: String },

    #[error("Tool '{name}' timed out after {timeout_secs}s")]
    Timeout { name: String, timeout_secs: u64 },
}

/// Errors from the generation provider.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("API request failed: {message}")]
    ApiRequest { message: String },

    #[error("API response parse error: {message}")]
    ResponseParse { message: String },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Provider connection failed: {message}")]
    Connection { message: String },
}

/// Errors from configuration and policy loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration: {message}")]
    Parse { message: String },
}

/// Errors from the orchestration driver.
///
/// The pipeline recovers locally from tool and generation failures, so the
/// only hard failure it can surface is reaching Terminal without a usable
/// final report.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Pipeline reached terminal state without a final report")]
    MissingFinalReport,

    #[error("Pipeline configuration invalid: {message}")]
    InvalidConfig { message: String },
}

/// A type alias for results using the top-level `StratosError`.
pub type Result<T> = std::result::Result<T, StratosError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_governor_error_display() {
        let err = GovernorError::PermissionDenied {
            agent: "AnalystAgent".into(),
            tool: "web_search".into(),
        };
        assert_eq!(
            err.to_string(),
            "Agent 'AnalystAgent' is not allowed to use tool 'web_search'"
        );

        let err = GovernorError::UnknownAgent {
            agent: "GhostAgent".into(),
        };
        assert_eq!(err.to_string(), "Agent 'GhostAgent' has no access policy entry");
    }

    #[test]
    fn test_tool_error_display() {
        let err = ToolError::Timeout {
            name: "arxiv_search".into(),
            timeout_secs: 15,
        };
        assert_eq!(err.to_string(), "Tool 'arxiv_search' timed out after 15s");
    }

    #[test]
    fn test_provider_error_display() {
        let err = ProviderError::ResponseParse {
            message: "missing candidates".into(),
        };
        assert_eq!(
            err.to_string(),
            "API response parse error: missing candidates"
        );
    }

    #[test]
    fn test_top_level_conversions() {
        let err: StratosError = GovernorError::UnknownTool {
            tool: "pdf_rag_query".into(),
        }
        .into();
        assert!(matches!(err, StratosError::Governor(_)));

        let err: StratosError = PipelineError::MissingFinalReport.into();
        assert_eq!(
            err.to_string(),
            "Pipeline error: Pipeline reached terminal state without a final report"
        );
    }
}
