//! Tool governor — the capability-checked gateway mediating all tool access.
//!
//! Every agent must go through [`ToolGovernor::execute`] to invoke a tool.
//! The governor enforces the access policy per call, resolves the tool in
//! the registry, dispatches, and contains tool-level failures as data so one
//! bad source can never abort a research pass.

use crate::error::GovernorError;
use crate::policy::AccessPolicy;
use crate::tool::{RawOutput, ToolInput, ToolRegistry};
use tracing::{debug, warn};

/// The outcome of a granted tool invocation.
///
/// A tool that runs and fails is reported here, not as an error: the caller
/// skips that one source and continues with the rest of its plan.
#[derive(Debug)]
pub enum ToolOutcome {
    /// The tool ran and produced output (possibly empty).
    Output(RawOutput),
    /// The tool ran and failed; the failure is data, never a panic or error.
    Failed { tool: String, message: String },
}

/// The gateway every agent must use to invoke a tool.
///
/// Stateless across calls; the registry and policy it holds are immutable
/// for the process lifetime.
pub struct ToolGovernor {
    registry: ToolRegistry,
    policy: AccessPolicy,
}

impl ToolGovernor {
    pub fn new(registry: ToolRegistry, policy: AccessPolicy) -> Self {
        Self { registry, policy }
    }

    /// Names of all registered tools.
    pub fn tool_names(&self) -> Vec<String> {
        self.registry.names()
    }

    /// Execute a tool on behalf of an agent.
    ///
    /// Checks run in order and are re-evaluated on every call:
    /// 1. the agent must have a policy entry (`UnknownAgent`);
    /// 2. the tool must be in its allowed set (`PermissionDenied`);
    /// 3. the tool must be registered (`UnknownTool`).
    ///
    /// `UnknownTool` is deliberately distinct from `PermissionDenied` so
    /// callers can tell "not configured" from "not permitted".
    pub async fn execute(
        &self,
        agent: &str,
        tool: &str,
        input: ToolInput,
    ) -> Result<ToolOutcome, GovernorError> {
        debug!(agent, tool, "Tool request");

        if !self.policy.knows_agent(agent) {
            warn!(agent, tool, "Denied: agent has no policy entry");
            return Err(GovernorError::UnknownAgent {
                agent: agent.to_string(),
            });
        }

        if !self.policy.is_allowed(agent, tool) {
            warn!(agent, tool, "Denied: tool not in agent's allowed set");
            return Err(GovernorError::PermissionDenied {
                agent: agent.to_string(),
                tool: tool.to_string(),
            });
        }

        if self.registry.get(tool).is_none() {
            warn!(agent, tool, "Denied: tool not registered");
            return Err(GovernorError::UnknownTool {
                tool: tool.to_string(),
            });
        }

        debug!(agent, tool, "Granted");
        match self.registry.dispatch(tool, input).await {
            Ok(output) => Ok(ToolOutcome::Output(output)),
            Err(err) => {
                warn!(agent, tool, error = %err, "Tool failed during execution");
                Ok(ToolOutcome::Failed {
                    tool: tool.to_string(),
                    message: err.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ToolError;
    use crate::tool::Tool;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct OkTool;

    #[async_trait]
    impl Tool for OkTool {
        fn name(&self) -> &str {
            "web_search"
        }

        fn description(&self) -> &str {
            "Always succeeds"
        }

        async fn invoke(&self, _input: ToolInput) -> Result<RawOutput, ToolError> {
            Ok(RawOutput::Scalar("result".to_string()))
        }
    }

    struct FailingTool;

    #[async_trait]
    impl Tool for FailingTool {
        fn name(&self) -> &str {
            "news_search"
        }

        fn description(&self) -> &str {
            "Always fails"
        }

        async fn invoke(&self, _input: ToolInput) -> Result<RawOutput, ToolError> {
            Err(ToolError::ExecutionFailed {
                name: "news_search".to_string(),
                message: "upstream 500".to_string(),
            })
        }
    }

    fn make_governor() -> ToolGovernor {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(OkTool)).unwrap();
        registry.register(Arc::new(FailingTool)).unwrap();
        ToolGovernor::new(registry, AccessPolicy::default_policy())
    }

    #[tokio::test]
    async fn test_unknown_agent() {
        let governor = make_governor();
        let result = governor
            .execute("GhostAgent", "web_search", ToolInput::query("q"))
            .await;
        assert_eq!(
            result.unwrap_err(),
            GovernorError::UnknownAgent {
                agent: "GhostAgent".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_unknown_agent_regardless_of_tool() {
        let governor = make_governor();
        for tool in ["web_search", "no_such_tool", ""] {
            let result = governor
                .execute("GhostAgent", tool, ToolInput::query("q"))
                .await;
            assert!(matches!(
                result.unwrap_err(),
                GovernorError::UnknownAgent { .. }
            ));
        }
    }

    #[tokio::test]
    async fn test_permission_denied_even_for_registered_tool() {
        let governor = make_governor();
        // DeepDiveAgent exists but may only use read_webpage.
        let result = governor
            .execute("DeepDiveAgent", "web_search", ToolInput::query("q"))
            .await;
        assert_eq!(
            result.unwrap_err(),
            GovernorError::PermissionDenied {
                agent: "DeepDiveAgent".to_string(),
                tool: "web_search".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_unknown_tool_distinct_from_denied() {
        let governor = make_governor();
        // ResearchAgent is allowed arxiv_search by policy, but the registry
        // in this test never registered it.
        let result = governor
            .execute("ResearchAgent", "arxiv_search", ToolInput::query("q"))
            .await;
        assert_eq!(
            result.unwrap_err(),
            GovernorError::UnknownTool {
                tool: "arxiv_search".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_granted_execution() {
        let governor = make_governor();
        let outcome = governor
            .execute("ResearchAgent", "web_search", ToolInput::query("q"))
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            ToolOutcome::Output(RawOutput::Scalar(ref s)) if s == "result"
        ));
    }

    #[tokio::test]
    async fn test_tool_failure_contained_as_data() {
        let governor = make_governor();
        let outcome = governor
            .execute("ResearchAgent", "news_search", ToolInput::query("q"))
            .await
            .unwrap();
        match outcome {
            ToolOutcome::Failed { tool, message } => {
                assert_eq!(tool, "news_search");
                assert!(message.contains("upstream 500"));
            }
            other => panic!("expected contained failure, got {other:?}"),
        }
    }
}
