//! Academic paper search via the ArXiv Atom API.
//!
//! The Atom feed is regular enough to parse with string scanning; entries
//! that fail to parse are skipped rather than failing the whole response.

use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use stratos_core::config::ToolsConfig;
use stratos_core::error::ToolError;
use stratos_core::tool::{RawOutput, RawRecord, Tool, ToolInput};
use tracing::debug;

const API_BASE: &str = "https://export.arxiv.org/api/query";

pub struct ArxivSearchTool {
    client: reqwest::Client,
    max_results: usize,
    timeout_secs: u64,
}

impl ArxivSearchTool {
    pub fn new(client: reqwest::Client, config: &ToolsConfig) -> Self {
        Self {
            client,
            max_results: config.max_results,
            timeout_secs: config.timeout_secs,
        }
    }
}

#[async_trait]
impl Tool for ArxivSearchTool {
    fn name(&self) -> &str {
        "arxiv_search"
    }

    fn description(&self) -> &str {
        "Search ArXiv for academic papers. Returns titles, abstract URLs, \
         abstracts, and author lists, sorted by relevance."
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    async fn invoke(&self, input: ToolInput) -> Result<RawOutput, ToolError> {
        let query = input.as_query("arxiv_search")?;
        let url = format!(
            "{}?search_query={}&start=0&max_results={}&sortBy=relevance&sortOrder=descending",
            API_BASE,
            urlencoding::encode(&format!("all:{query}")),
            self.max_results,
        );
        debug!(%query, "ArXiv search request");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                name: "arxiv_search".to_string(),
                message: format!("ArXiv API request failed: {e}"),
            })?;

        let body = response
            .text()
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                name: "arxiv_search".to_string(),
                message: format!("Failed to read ArXiv response: {e}"),
            })?;

        let records = parse_atom_feed(&body, self.max_results);
        if records.is_empty() {
            Ok(RawOutput::Empty)
        } else {
            Ok(RawOutput::Records(records))
        }
    }
}

/// Parse an Atom feed into paper records.
pub fn parse_atom_feed(xml: &str, max_results: usize) -> Vec<RawRecord> {
    extract_entries(xml)
        .into_iter()
        .filter_map(|entry| parse_entry(&entry))
        .take(max_results)
        .collect()
}

/// Extract all `<entry>...</entry>` blocks from the feed.
fn extract_entries(xml: &str) -> Vec<String> {
    let mut entries = Vec::new();
    let mut search_from = 0;
    loop {
        let start = match xml[search_from..].find("<entry>") {
            Some(pos) => search_from + pos,
            None => break,
        };
        let end = match xml[start..].find("</entry>") {
            Some(pos) => start + pos + "</entry>".len(),
            None => break,
        };
        entries.push(xml[start..end].to_string());
        search_from = end;
    }
    entries
}

/// Parse one entry block. Entries missing a title or abstract are dropped.
fn parse_entry(entry: &str) -> Option<RawRecord> {
    let title = normalize_whitespace(&extract_tag_text(entry, "title")?);
    let summary = normalize_whitespace(&extract_tag_text(entry, "summary")?);
    if title.is_empty() || summary.is_empty() {
        return None;
    }
    let url = extract_tag_text(entry, "id").unwrap_or_default();
    let published = extract_tag_text(entry, "published").unwrap_or_default();

    let mut authors = Vec::new();
    let mut search_from = 0;
    while let Some(pos) = entry[search_from..].find("<author>") {
        let start = search_from + pos;
        let Some(end_pos) = entry[start..].find("</author>") else {
            break;
        };
        let end = start + end_pos + "</author>".len();
        if let Some(name) = extract_tag_text(&entry[start..end], "name") {
            authors.push(name);
        }
        search_from = end;
    }

    let value = json!({
        "title": title,
        "url": url,
        "content": summary,
        "source": "arxiv",
        "published": published,
        "authors": authors,
    });
    value.as_object().cloned()
}

/// Extract the text content of the first `<tag ...>text</tag>`.
fn extract_tag_text(xml: &str, tag: &str) -> Option<String> {
    let open = format!("<{tag}");
    let close = format!("</{tag}>");
    let start_pos = xml.find(&open)?;
    let content_start = xml[start_pos..].find('>')? + start_pos + 1;
    let content_end = xml[content_start..].find(&close)? + content_start;
    Some(xml[content_start..content_end].trim().to_string())
}

/// Collapse runs of whitespace into single spaces. Atom titles and
/// abstracts arrive hard-wrapped.
fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
