//! Web search via the DuckDuckGo instant answers API.
//!
//! No API key required. Instant answers are shallower than a full search
//! index but cover definitional and topical queries well.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use stratos_core::config::ToolsConfig;
use stratos_core::error::ToolError;
use stratos_core::tool::{RawOutput, RawRecord, Tool, ToolInput};
use tracing::debug;

const API_BASE: &str = "https://api.duckduckgo.com/";

pub struct WebSearchTool {
    client: reqwest::Client,
    max_results: usize,
    timeout_secs: u64,
}

impl WebSearchTool {
    pub fn new(client: reqwest::Client, config: &ToolsConfig) -> Self {
        Self {
            client,
            max_results: config.max_results,
            timeout_secs: config.timeout_secs,
        }
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web for information. Returns titles, snippets, and URLs \
         from instant answer results."
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    async fn invoke(&self, input: ToolInput) -> Result<RawOutput, ToolError> {
        let query = input.as_query("web_search")?;
        let url = format!(
            "{}?q={}&format=json&no_html=1&skip_disambig=1",
            API_BASE,
            urlencoding::encode(query)
        );
        debug!(%query, "Web search request");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                name: "web_search".to_string(),
                message: format!("Search request failed: {e}"),
            })?;

        let body: Value = response
            .json()
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                name: "web_search".to_string(),
                message: format!("Failed to parse search response: {e}"),
            })?;

        let records = parse_search_response(&body, self.max_results);
        if records.is_empty() {
            Ok(RawOutput::Empty)
        } else {
            Ok(RawOutput::Records(records))
        }
    }
}

/// Flatten an instant answers body into search records.
///
/// The abstract (main answer) comes first at full score; related topics
/// follow at a reduced score. Entries without text are skipped.
fn parse_search_response(body: &Value, max_results: usize) -> Vec<RawRecord> {
    let mut records = Vec::new();

    if let Some(abstract_text) = body["AbstractText"].as_str() {
        if !abstract_text.is_empty() {
            let title = body["Heading"]
                .as_str()
                .filter(|h| !h.is_empty())
                .or_else(|| body["AbstractSource"].as_str())
                .unwrap_or("");
            records.push(record(
                title,
                body["AbstractURL"].as_str().unwrap_or(""),
                abstract_text,
                1.0,
                body["Image"].as_str(),
            ));
        }
    }

    for topic in related_topics(body) {
        if records.len() >= max_results {
            break;
        }
        if let Some(text) = topic["Text"].as_str() {
            if text.is_empty() {
                continue;
            }
            records.push(record(
                "",
                topic["FirstURL"].as_str().unwrap_or(""),
                text,
                0.5,
                None,
            ));
        }
    }

    records.truncate(max_results);
    records
}

/// Related topics may nest one level under category headers.
fn related_topics(body: &Value) -> Vec<&Value> {
    let Some(topics) = body["RelatedTopics"].as_array() else {
        return Vec::new();
    };
    let mut flat = Vec::new();
    for topic in topics {
        if let Some(nested) = topic["Topics"].as_array() {
            flat.extend(nested.iter());
        } else {
            flat.push(topic);
        }
    }
    flat
}

fn record(title: &str, url: &str, content: &str, score: f64, image: Option<&str>) -> RawRecord {
    let mut value = json!({
        "title": title,
        "url": url,
        "content": content,
        "score": score,
    });
    if let Some(image) = image.filter(|i| !i.is_empty()) {
        value["images"] = json!([image]);
    }
    value.as_object().cloned().unwrap_or_default()
}
