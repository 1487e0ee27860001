//! Content deduplication across one research pass.
//!
//! Documents pooled from multiple tool calls overlap; this removes the
//! duplicates while preserving execution order.

use crate::state::Document;
use std::collections::HashSet;

/// Characters of the summary considered in the dedup key.
const SUMMARY_KEY_CHARS: usize = 200;

/// Remove content-duplicate documents, first occurrence wins.
///
/// Dedup key = `(url, first 200 characters of summary)`. Two documents with
/// different URLs but identical content both survive: a deliberate false
/// negative, not a bug to fix here. `score` plays no part in the tie-break.
pub fn dedup_documents(documents: Vec<Document>) -> Vec<Document> {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    documents
        .into_iter()
        .filter(|doc| {
            let key = (
                doc.url.clone(),
                doc.summary.chars().take(SUMMARY_KEY_CHARS).collect(),
            );
            seen.insert(key)
        })
        .collect()
}
