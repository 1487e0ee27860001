//! Access policy — the static agent-to-allowed-tools mapping.
//!
//! Loaded once from declarative TOML before the first pipeline run and
//! immutable for the process lifetime. Reload requires a restart.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::info;

/// Allowed tools for one agent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentPolicy {
    #[serde(default)]
    pub allowed_tools: BTreeSet<String>,
}

/// The full agent-to-allowed-tools mapping.
///
/// The file format is:
/// ```toml
/// [agents.ResearchAgent]
/// allowed_tools = ["web_search", "news_search", "arxiv_search"]
///
/// [agents.DeepDiveAgent]
/// allowed_tools = ["read_webpage"]
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccessPolicy {
    #[serde(default)]
    agents: BTreeMap<String, AgentPolicy>,
}

impl AccessPolicy {
    /// Whether the agent has any policy entry at all.
    pub fn knows_agent(&self, agent: &str) -> bool {
        self.agents.contains_key(agent)
    }

    /// Whether the agent may invoke the named tool.
    ///
    /// Returns `false` for unknown agents; callers that need to distinguish
    /// the two cases check [`knows_agent`](Self::knows_agent) first.
    pub fn is_allowed(&self, agent: &str, tool: &str) -> bool {
        self.agents
            .get(agent)
            .map(|p| p.allowed_tools.contains(tool))
            .unwrap_or(false)
    }

    /// Names of all configured agents.
    pub fn agent_names(&self) -> Vec<&str> {
        self.agents.keys().map(String::as_str).collect()
    }

    /// Add an agent entry. Used by the default policy and by tests.
    pub fn grant(&mut self, agent: impl Into<String>, tools: &[&str]) {
        self.agents.insert(
            agent.into(),
            AgentPolicy {
                allowed_tools: tools.iter().map(|t| t.to_string()).collect(),
            },
        );
    }

    /// The built-in policy used when no policy file is configured.
    ///
    /// The researcher gets the three search tools; the deep-dive agent gets
    /// the webpage reader. No agent gets everything.
    pub fn default_policy() -> Self {
        let mut policy = Self::default();
        policy.grant(
            "ResearchAgent",
            &["web_search", "news_search", "arxiv_search"],
        );
        policy.grant("DeepDiveAgent", &["read_webpage"]);
        policy
    }
}

/// Load an access policy from a TOML file.
pub fn load_policy(path: &Path) -> Result<AccessPolicy, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path)?;
    let policy: AccessPolicy = toml::from_str(&content).map_err(|e| ConfigError::Parse {
        message: e.to_string(),
    })?;
    info!(
        agents = policy.agents.len(),
        path = %path.display(),
        "Loaded access policy"
    );
    Ok(policy)
}
