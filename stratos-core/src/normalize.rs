//! Result normalizer — converts raw tool output into `Document` records.
//!
//! Tools return a single string, a list of keyed records, or a mixed list;
//! this module is the single place those shapes are reconciled into the
//! uniform document schema. Field mapping is tolerant: every fallback here
//! exists because some real tool omits or renames the field.

use crate::state::Document;
use crate::tool::{RawOutput, RawRecord, RawValue};
use serde_json::Value;
use tracing::debug;

/// Normalize one tool's raw output into zero or more documents.
///
/// Elements whose trimmed summary ends up empty are dropped: they carry no
/// analyzable signal and would pollute citation counts.
pub fn normalize(tool: &str, output: RawOutput) -> Vec<Document> {
    let documents = match output {
        RawOutput::Empty => Vec::new(),
        RawOutput::Scalar(text) => normalize_values(tool, vec![RawValue::Scalar(text)]),
        RawOutput::Records(records) => normalize_values(
            tool,
            records.into_iter().map(RawValue::Record).collect(),
        ),
        RawOutput::Mixed(values) => normalize_values(tool, values),
    };
    debug!(tool, count = documents.len(), "Normalized tool output");
    documents
}

fn normalize_values(tool: &str, values: Vec<RawValue>) -> Vec<Document> {
    values
        .into_iter()
        .filter_map(|value| match value {
            RawValue::Record(record) => record_to_document(tool, &record),
            RawValue::Scalar(text) => scalar_to_document(tool, &text),
        })
        .collect()
}

/// Map one keyed record to a document, applying field fallbacks.
fn record_to_document(tool: &str, record: &RawRecord) -> Option<Document> {
    let summary = string_field(record, "content")
        .or_else(|| string_field(record, "snippet"))
        .unwrap_or_default();
    if summary.trim().is_empty() {
        return None;
    }

    let title = string_field(record, "title")
        .or_else(|| string_field(record, "heading"))
        .unwrap_or_else(|| snippet_title(tool));
    let url = string_field(record, "url")
        .or_else(|| string_field(record, "link"))
        .unwrap_or_default();
    let source = string_field(record, "source").unwrap_or_else(|| tool.to_string());
    let score = coerce_score(record.get("score"));
    let images = image_list(record.get("images"));

    Some(Document::new(title, url, summary, source, score, images))
}

/// Wrap a bare scalar element as a document.
fn scalar_to_document(tool: &str, text: &str) -> Option<Document> {
    if text.trim().is_empty() {
        return None;
    }
    Some(Document::new(
        snippet_title(tool),
        "",
        text,
        tool,
        0.0,
        Vec::new(),
    ))
}

fn snippet_title(tool: &str) -> String {
    format!("snippet from {tool}")
}

fn string_field(record: &RawRecord, key: &str) -> Option<String> {
    match record.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

/// Coerce a score value to f64. Missing or unparseable scores normalize to
/// 0.0 rather than propagating a type fault.
fn coerce_score(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Collect the string entries of an `images` array, preserving order.
fn image_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}
