//! News search via the Google News RSS feed.
//!
//! The feed is plain RSS 2.0; items are pulled out with string scanning
//! rather than a full XML parser. Feeds in the wild are regular enough
//! that this holds up, and a malformed item is simply skipped.

use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use stratos_core::config::ToolsConfig;
use stratos_core::error::ToolError;
use stratos_core::tool::{RawOutput, RawRecord, Tool, ToolInput};
use tracing::debug;

const FEED_BASE: &str = "https://news.google.com/rss/search";

pub struct NewsSearchTool {
    client: reqwest::Client,
    max_results: usize,
    timeout_secs: u64,
}

impl NewsSearchTool {
    pub fn new(client: reqwest::Client, config: &ToolsConfig) -> Self {
        Self {
            client,
            max_results: config.max_results,
            timeout_secs: config.timeout_secs,
        }
    }
}

#[async_trait]
impl Tool for NewsSearchTool {
    fn name(&self) -> &str {
        "news_search"
    }

    fn description(&self) -> &str {
        "Search recent news headlines. Returns titles, links, publishers, and \
         publication dates from news feed results."
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    async fn invoke(&self, input: ToolInput) -> Result<RawOutput, ToolError> {
        let query = input.as_query("news_search")?;
        let url = format!(
            "{}?q={}&hl=en-US&gl=US&ceid=US:en",
            FEED_BASE,
            urlencoding::encode(query)
        );
        debug!(%query, "News search request");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                name: "news_search".to_string(),
                message: format!("Feed request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ToolError::ExecutionFailed {
                name: "news_search".to_string(),
                message: format!("Feed returned HTTP {status}"),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                name: "news_search".to_string(),
                message: format!("Failed to read feed body: {e}"),
            })?;

        let records = parse_rss_items(&body, self.max_results);
        if records.is_empty() {
            Ok(RawOutput::Empty)
        } else {
            Ok(RawOutput::Records(records))
        }
    }
}

/// Extract up to `max_results` RSS `<item>` blocks as records.
///
/// Items without a title are skipped. The description doubles as the
/// snippet; Google News descriptions carry HTML anchors, which are
/// stripped.
fn parse_rss_items(xml: &str, max_results: usize) -> Vec<RawRecord> {
    extract_blocks(xml, "<item>", "</item>")
        .into_iter()
        .filter_map(|item| {
            let title = extract_tag_text(&item, "title")?;
            if title.is_empty() {
                return None;
            }
            let link = extract_tag_text(&item, "link").unwrap_or_default();
            let snippet = extract_tag_text(&item, "description")
                .map(|d| strip_markup(&d))
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| title.clone());
            let source = extract_tag_text(&item, "source")
                .unwrap_or_else(|| "news_search".to_string());
            let published = extract_tag_text(&item, "pubDate").unwrap_or_default();

            let value = json!({
                "title": title,
                "link": link,
                "snippet": snippet,
                "source": source,
                "published": published,
            });
            value.as_object().cloned()
        })
        .take(max_results)
        .collect()
}

/// Collect all non-overlapping blocks delimited by `open` .. `close`.
fn extract_blocks(xml: &str, open: &str, close: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut search_from = 0;
    while let Some(pos) = xml[search_from..].find(open) {
        let start = search_from + pos;
        let Some(end_pos) = xml[start..].find(close) else {
            break;
        };
        let end = start + end_pos + close.len();
        blocks.push(xml[start..end].to_string());
        search_from = end;
    }
    blocks
}

/// Extract the text content of the first `<tag ...>text</tag>`.
fn extract_tag_text(xml: &str, tag: &str) -> Option<String> {
    let open = format!("<{tag}");
    let close = format!("</{tag}>");
    let start_pos = xml.find(&open)?;
    let content_start = xml[start_pos..].find('>')? + start_pos + 1;
    let content_end = xml[content_start..].find(&close)? + content_start;
    Some(decode_entities(xml[content_start..content_end].trim()))
}

/// Strip CDATA wrappers and decode the handful of entities RSS feeds use.
fn decode_entities(text: &str) -> String {
    let text = text
        .trim_start_matches("<![CDATA[")
        .trim_end_matches("]]>")
        .trim();
    text.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
}

/// Remove HTML tags from a description snippet.
fn strip_markup(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;
    for ch in text.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out.trim().to_string()
}
