//! Full-document text search.
//!
//! ASCII case-insensitive substring search over per-page extracted text.
//! Each hit carries its byte offset within the page's text and a short
//! context window clamped to character boundaries.

use crate::document::Document;
use crate::error::Result;

/// Bytes of context kept on each side of a match.
const CONTEXT_RADIUS: usize = 40;

/// One search match.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    /// Zero-based page index
    pub page: usize,
    /// Byte offset of the match within the page's extracted text
    pub offset: usize,
    /// Surrounding text window
    pub context: String,
}

/// Search every page for `query`, ASCII case-insensitively.
pub fn search(doc: &mut Document, query: &str) -> Result<Vec<SearchHit>> {
    if query.is_empty() {
        return Ok(Vec::new());
    }
    let needle = query.to_ascii_lowercase();
    let mut hits = Vec::new();

    for page in 0..doc.page_count() {
        let text = match doc.extract_page(page) {
            Ok(text) => text,
            Err(e) => {
                log::warn!("search skipping page {}: {}", page, e);
                continue;
            },
        };
        let haystack = text.to_ascii_lowercase();

        let mut from = 0;
        while let Some(pos) = haystack[from..].find(&needle) {
            let offset = from + pos;
            hits.push(SearchHit {
                page,
                offset,
                context: context_window(&text, offset, needle.len()),
            });
            from = offset + needle.len().max(1);
        }
    }

    Ok(hits)
}

/// A window of roughly `CONTEXT_RADIUS` bytes around the match, snapped to
/// char boundaries.
fn context_window(text: &str, offset: usize, match_len: usize) -> String {
    let mut start = offset.saturating_sub(CONTEXT_RADIUS);
    while start > 0 && !text.is_char_boundary(start) {
        start -= 1;
    }
    let mut end = (offset + match_len + CONTEXT_RADIUS).min(text.len());
    while end < text.len() && !text.is_char_boundary(end) {
        end += 1;
    }
    text[start..end].replace(['\n', '\x0c'], " ")
}
