//! Tool contract and registry.
//!
//! Every external tool implements [`Tool`] and is registered at startup in a
//! [`ToolRegistry`]. Raw tool outputs are wildly inconsistent across tools,
//! so the contract returns a tagged [`RawOutput`] variant that the result
//! normalizer matches exhaustively.

use crate::error::ToolError;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// A raw record returned by a tool: an arbitrary keyed mapping.
pub type RawRecord = serde_json::Map<String, Value>;

/// One element of a mixed-shape tool result list.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Scalar(String),
    Record(RawRecord),
}

/// The unnormalized output of one tool invocation.
///
/// Tools return whatever shape their upstream API produces; the normalizer
/// is the single place these shapes are reconciled.
#[derive(Debug, Clone, PartialEq)]
pub enum RawOutput {
    /// No results at all.
    Empty,
    /// A single bare string (e.g. a fetched page body).
    Scalar(String),
    /// A homogeneous list of keyed records.
    Records(Vec<RawRecord>),
    /// A list mixing records and bare scalars.
    Mixed(Vec<RawValue>),
}

impl RawOutput {
    /// Classify an arbitrary JSON value into the tagged output shape.
    ///
    /// Useful for tools that pass through a parsed API response. Null and
    /// empty arrays become `Empty`; arrays of objects become `Records`;
    /// anything else falls into `Mixed` with scalars stringified.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => RawOutput::Empty,
            Value::String(s) => RawOutput::Scalar(s),
            Value::Array(items) if items.is_empty() => RawOutput::Empty,
            Value::Array(items) => {
                if items.iter().all(|v| v.is_object()) {
                    let records = items
                        .into_iter()
                        .filter_map(|v| match v {
                            Value::Object(map) => Some(map),
                            _ => None,
                        })
                        .collect();
                    RawOutput::Records(records)
                } else {
                    let values = items
                        .into_iter()
                        .map(|v| match v {
                            Value::Object(map) => RawValue::Record(map),
                            Value::String(s) => RawValue::Scalar(s),
                            other => RawValue::Scalar(other.to_string()),
                        })
                        .collect();
                    RawOutput::Mixed(values)
                }
            }
            Value::Object(map) => RawOutput::Records(vec![map]),
            other => RawOutput::Scalar(other.to_string()),
        }
    }

    /// Whether this output carries no results.
    pub fn is_empty(&self) -> bool {
        match self {
            RawOutput::Empty => true,
            RawOutput::Scalar(s) => s.trim().is_empty(),
            RawOutput::Records(r) => r.is_empty(),
            RawOutput::Mixed(v) => v.is_empty(),
        }
    }
}

/// Input for one tool invocation.
///
/// Each tool has one fixed calling convention: simple tools take a single
/// query string, keyed tools take named parameters. The shape is determined
/// by the tool being called, not by the caller's choice.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolInput {
    /// A single positional query string.
    Query(String),
    /// Named parameters for keyed tools.
    Params(HashMap<String, String>),
}

impl ToolInput {
    /// Convenience constructor for a query input.
    pub fn query(q: impl Into<String>) -> Self {
        ToolInput::Query(q.into())
    }

    /// Extract the query string, or fail for keyed input.
    pub fn as_query(&self, tool: &str) -> Result<&str, ToolError> {
        match self {
            ToolInput::Query(q) => Ok(q),
            ToolInput::Params(_) => Err(ToolError::InvalidInput {
                name: tool.to_string(),
                reason: "expected a single query string, got named parameters".to_string(),
            }),
        }
    }

    /// Extract a required named parameter, or fail.
    pub fn param(&self, tool: &str, key: &str) -> Result<&str, ToolError> {
        match self {
            ToolInput::Params(map) => {
                map.get(key)
                    .map(String::as_str)
                    .ok_or_else(|| ToolError::InvalidInput {
                        name: tool.to_string(),
                        reason: format!("missing required parameter '{key}'"),
                    })
            }
            ToolInput::Query(_) => Err(ToolError::InvalidInput {
                name: tool.to_string(),
                reason: format!("expected named parameters including '{key}', got a bare query"),
            }),
        }
    }
}

/// Trait that all tools must implement.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool.
    fn name(&self) -> &str;

    /// Human-readable description of what this tool does.
    fn description(&self) -> &str;

    /// Maximum execution time before the registry cancels the call.
    fn timeout(&self) -> Duration {
        Duration::from_secs(15)
    }

    /// Execute the tool with the given input.
    async fn invoke(&self, input: ToolInput) -> Result<RawOutput, ToolError>;
}

/// The tool registry holds all registered tools and handles dispatch.
///
/// Assembled once at startup and immutable for the process lifetime.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Returns an error if the name is already taken.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<(), ToolError> {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return Err(ToolError::AlreadyRegistered { name });
        }
        debug!(tool = %name, "Registering tool");
        self.tools.insert(name, tool);
        Ok(())
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// List all registered tool names.
    pub fn names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Execute a registered tool, applying its timeout.
    ///
    /// Callers must resolve the tool first; dispatch on a missing name is a
    /// caller bug surfaced as `ExecutionFailed`.
    pub async fn dispatch(
        &self,
        name: &str,
        input: ToolInput,
    ) -> Result<RawOutput, ToolError> {
        let tool = self.tools.get(name).ok_or_else(|| ToolError::ExecutionFailed {
            name: name.to_string(),
            message: "tool disappeared from registry during dispatch".to_string(),
        })?;

        let timeout = tool.timeout();
        info!(tool = %name, timeout_secs = timeout.as_secs(), "Dispatching tool");

        match tokio::time::timeout(timeout, tool.invoke(input)).await {
            Ok(result) => result,
            Err(_) => Err(ToolError::Timeout {
                name: name.to_string(),
                timeout_secs: timeout.as_secs(),
            }),
        }
    }
}
