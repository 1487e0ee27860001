//! # Stratos Tools
//!
//! Research tools for the Stratos pipeline. Each tool implements the
//! `Tool` trait from `stratos-core` and returns raw, tool-shaped output;
//! the pipeline's normalizer flattens it into documents downstream.
//!
//! - `web_search`: DuckDuckGo instant answers (no API key required).
//! - `news_search`: Google News RSS headlines.
//! - `arxiv_search`: ArXiv Atom API papers.
//! - `read_webpage`: fetch a URL and extract readable text.

pub mod arxiv;
pub mod news;
pub mod search;
pub mod webpage;

pub use arxiv::ArxivSearchTool;
pub use news::NewsSearchTool;
pub use search::WebSearchTool;
pub use webpage::ReadWebpageTool;

use std::sync::Arc;
use std::time::Duration;
use stratos_core::config::ToolsConfig;
use stratos_core::error::ToolError;
use stratos_core::tool::ToolRegistry;

/// Build the shared HTTP client all tools use.
fn http_client(config: &ToolsConfig) -> Result<reqwest::Client, ToolError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .user_agent(config.user_agent.clone())
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| ToolError::ExecutionFailed {
            name: "http_client".to_string(),
            message: format!("Failed to build HTTP client: {e}"),
        })
}

/// Build a registry with the full default tool set.
pub fn default_registry(config: &ToolsConfig) -> Result<ToolRegistry, ToolError> {
    let client = http_client(config)?;
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(WebSearchTool::new(client.clone(), config)))?;
    registry.register(Arc::new(NewsSearchTool::new(client.clone(), config)))?;
    registry.register(Arc::new(ArxivSearchTool::new(client.clone(), config)))?;
    registry.register(Arc::new(ReadWebpageTool::new(client, config)))?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_contains_all_tools() {
        let registry = default_registry(&ToolsConfig::default()).unwrap();
        let mut names = registry.names();
        names.sort();
        assert_eq!(
            names,
            vec!["arxiv_search", "news_search", "read_webpage", "web_search"]
        );
    }
}
