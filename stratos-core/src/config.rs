//! Configuration system for Stratos.
//!
//! Uses `figment` for layered configuration: defaults -> config file ->
//! environment -> explicit overrides. Configuration is loaded from
//! `~/.config/stratos/config.toml` and/or `.stratos/config.toml` in the
//! workspace directory.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration for the Stratos pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StratosConfig {
    pub pipeline: PipelineConfig,
    pub provider: ProviderConfig,
    pub tools: ToolsConfig,
    /// Optional path to the access policy TOML. Falls back to the built-in
    /// default policy when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_path: Option<PathBuf>,
}

/// Configuration for the orchestration state machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Maximum number of Research passes triggered by critique rejection
    /// before forced finalization. Total Research passes are capped at
    /// `retry_budget + 1`.
    pub retry_budget: u32,
    /// Literal token whose presence in a critique signals approval.
    /// Matched case-insensitively.
    pub approval_token: String,
    /// Minimum number of plan steps; shorter generated plans are replaced by
    /// the default plan.
    pub min_plan_steps: usize,
    /// Maximum number of plan steps; longer generated plans are clamped.
    pub max_plan_steps: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            retry_budget: 1,
            approval_token: "APPROVED".to_string(),
            min_plan_steps: 3,
            max_plan_steps: 6,
        }
    }
}

/// Configuration for the generation provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Model identifier passed to the provider.
    pub model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Override for the provider base URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-pro".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            base_url: None,
            timeout_secs: 120,
        }
    }
}

/// Configuration shared by the bundled tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Maximum results requested from each search tool.
    pub max_results: usize,
    /// Per-request HTTP timeout in seconds.
    pub timeout_secs: u64,
    /// User-Agent header for outbound requests.
    pub user_agent: String,
    /// Maximum characters returned by the webpage reader.
    pub webpage_max_chars: usize,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            max_results: 5,
            timeout_secs: 15,
            user_agent: "Stratos/0.1".to_string(),
            webpage_max_chars: 4000,
        }
    }
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Explicit overrides (passed as argument)
/// 2. Environment variables (prefixed with `STRATOS_`)
/// 3. Workspace-local config (`.stratos/config.toml`)
/// 4. User config (`~/.config/stratos/config.toml`)
/// 5. Built-in defaults
pub fn load_config(
    workspace: Option<&Path>,
    overrides: Option<&StratosConfig>,
) -> Result<StratosConfig, Box<figment::Error>> {
    let mut figment = Figment::from(Serialized::defaults(StratosConfig::default()));

    // User-level config
    if let Some(config_dir) = directories::ProjectDirs::from("dev", "stratos", "stratos") {
        let user_config = config_dir.config_dir().join("config.toml");
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    // Workspace-level config
    if let Some(ws) = workspace {
        let ws_config = ws.join(".stratos").join("config.toml");
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    // Environment variables (STRATOS_PIPELINE__RETRY_BUDGET, etc.)
    figment = figment.merge(Env::prefixed("STRATOS_").split("__"));

    // Explicit overrides
    if let Some(overrides) = overrides {
        figment = figment.merge(Serialized::defaults(overrides));
    }

    figment.extract().map_err(Box::new)
}
