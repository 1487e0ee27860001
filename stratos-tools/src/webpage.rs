//! Fetch a URL and extract readable text.
//!
//! Strips HTML down to visible text without browser automation. The
//! output is a single scalar: one page, one snippet, normalized downstream
//! into one document.

use async_trait::async_trait;
use std::time::Duration;
use stratos_core::config::ToolsConfig;
use stratos_core::error::ToolError;
use stratos_core::tool::{RawOutput, Tool, ToolInput};
use tracing::debug;

pub struct ReadWebpageTool {
    client: reqwest::Client,
    max_chars: usize,
    timeout_secs: u64,
}

impl ReadWebpageTool {
    pub fn new(client: reqwest::Client, config: &ToolsConfig) -> Self {
        Self {
            client,
            max_chars: config.webpage_max_chars,
            timeout_secs: config.timeout_secs,
        }
    }
}

#[async_trait]
impl Tool for ReadWebpageTool {
    fn name(&self) -> &str {
        "read_webpage"
    }

    fn description(&self) -> &str {
        "Fetch a web page URL and extract its text content, stripped of HTML. \
         Takes a named 'url' parameter."
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    async fn invoke(&self, input: ToolInput) -> Result<RawOutput, ToolError> {
        let url = input.param("read_webpage", "url")?;
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ToolError::InvalidInput {
                name: "read_webpage".to_string(),
                reason: "URL must start with http:// or https://".to_string(),
            });
        }
        debug!(%url, "Webpage fetch request");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                name: "read_webpage".to_string(),
                message: format!("Fetch failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ToolError::ExecutionFailed {
                name: "read_webpage".to_string(),
                message: format!("HTTP {status} for URL: {url}"),
            });
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        let body = response
            .text()
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                name: "read_webpage".to_string(),
                message: format!("Failed to read response body: {e}"),
            })?;

        let text = if content_type.contains("text/html") || content_type.contains("xhtml") {
            extract_text_from_html(&body)
        } else {
            body
        };

        let text = truncate_chars(&text, self.max_chars);
        if text.trim().is_empty() {
            Ok(RawOutput::Empty)
        } else {
            Ok(RawOutput::Scalar(text))
        }
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// Simple HTML-to-text extraction.
///
/// Strips tags, drops script and style bodies, inserts newlines for block
/// elements, and decodes common entities.
fn extract_text_from_html(html: &str) -> String {
    let mut text = String::new();
    let mut in_tag = false;
    let mut in_script = false;
    let mut in_style = false;
    let mut tag_name = String::new();
    let mut building_tag = false;

    for ch in html.chars() {
        if ch == '<' {
            in_tag = true;
            building_tag = true;
            tag_name.clear();
            continue;
        }
        if ch == '>' {
            in_tag = false;
            building_tag = false;

            let tag_lower = tag_name.to_lowercase();
            if tag_lower == "script" {
                in_script = true;
            } else if tag_lower == "/script" {
                in_script = false;
            } else if tag_lower == "style" {
                in_style = true;
            } else if tag_lower == "/style" {
                in_style = false;
            }

            if is_block_tag(&tag_lower) {
                text.push('\n');
            }
            continue;
        }
        if in_tag {
            if building_tag && (ch.is_alphanumeric() || ch == '/') {
                tag_name.push(ch);
            } else {
                building_tag = false;
            }
            continue;
        }
        if in_script || in_style {
            continue;
        }
        text.push(ch);
    }

    let text = text
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ");

    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_block_tag(tag: &str) -> bool {
    tag.starts_with('p')
        || tag.starts_with("/p")
        || tag.starts_with("br")
        || tag.starts_with("div")
        || tag.starts_with("/div")
        || tag.starts_with('h')
        || tag.starts_with("/h")
        || tag.starts_with("li")
        || tag.starts_with("tr")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_html_extraction() {
        let html = r#"<html><head><style>body { color: red; }</style>
<script>console.log("ignored");</script></head>
<body><h1>Heading</h1><p>First &amp; second.</p><div>Block</div></body></html>"#;
        let text = extract_text_from_html(html);
        assert!(text.contains("Heading"));
        assert!(text.contains("First & second."));
        assert!(text.contains("Block"));
        assert!(!text.contains("console.log"));
        assert!(!text.contains("color: red"));
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let text = "héllo wörld".repeat(100);
        let truncated = truncate_chars(&text, 10);
        assert_eq!(truncated.chars().count(), 10);
    }

    #[tokio::test]
    async fn test_query_input_is_rejected() {
        let tool = ReadWebpageTool::new(
            reqwest::Client::new(),
            &stratos_core::config::ToolsConfig::default(),
        );
        let err = tool
            .invoke(ToolInput::Query("https://example.com".to_string()))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput { .. }));
    }

    #[tokio::test]
    async fn test_non_http_url_is_rejected() {
        let tool = ReadWebpageTool::new(
            reqwest::Client::new(),
            &stratos_core::config::ToolsConfig::default(),
        );
        let mut params = HashMap::new();
        params.insert("url".to_string(), "ftp://example.com/file".to_string());
        let err = tool.invoke(ToolInput::Params(params)).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidInput { .. }));
    }
}
