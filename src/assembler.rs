//! Reading-order assembly.
//!
//! Accuracy mode prefers the structure tree: the page is interpreted in
//! structured mode and the per-MCID buckets are concatenated in tree order.
//! Partially-tagged pages are detected by comparing the structured length
//! against the stream-order length; below the coverage ratio the stream
//! result wins. Untagged pages use stream order directly, and a geometric
//! sort of positioned spans is the last resort when stream order produces
//! nothing.

use crate::content::{BoundsSink, Interpreter, StreamTextSink, StructuredSink, TextSpan};
use crate::document::{Document, ExtractMode};
use crate::error::{Error, Result};
use crate::object::Dict;

/// Vertical binning tolerance for the geometric fallback, in points.
const GEOMETRIC_Y_TOLERANCE: f64 = 3.0;

/// Page separator for whole-document extraction.
const PAGE_SEPARATOR: char = '\x0c';

/// Extract one page in the document's configured mode.
pub fn extract_page_text(doc: &mut Document, page_index: usize) -> Result<String> {
    let mode = doc.options().mode;
    extract_page_with_mode(doc, page_index, mode)
}

/// Extract one page in an explicit mode, ignoring the document's
/// configured default. The C boundary uses this to offer stream-order and
/// reading-order page extraction side by side on the same handle.
pub fn extract_page_with_mode(
    doc: &mut Document,
    page_index: usize,
    mode: ExtractMode,
) -> Result<String> {
    if page_index >= doc.page_count() {
        return Err(Error::PageNotFound(page_index));
    }
    match mode {
        ExtractMode::Fast => stream_order_text(doc, page_index),
        ExtractMode::Accuracy => accuracy_text(doc, page_index),
    }
}

/// Whole-document extraction: pages joined by form feeds, no trailing
/// newline.
pub fn extract_document_text(doc: &mut Document, mode: ExtractMode) -> Result<String> {
    let mut out = String::new();
    for page_index in 0..doc.page_count() {
        if page_index > 0 {
            out.push(PAGE_SEPARATOR);
        }
        match extract_page_with_mode(doc, page_index, mode) {
            Ok(text) => out.push_str(&text),
            Err(e) => {
                // a broken page yields its separator but no text
                log::warn!("page {} extraction failed: {}", page_index, e);
            },
        }
    }
    while out.ends_with('\n') {
        out.pop();
    }
    Ok(out)
}

/// Positioned spans for one page (bounds mode).
pub fn extract_page_bounds(doc: &mut Document, page_index: usize) -> Result<Vec<TextSpan>> {
    if page_index >= doc.page_count() {
        return Err(Error::PageNotFound(page_index));
    }
    let content = doc.page_content(page_index)?;
    let resources = page_resources(doc, page_index);
    let mut sink = BoundsSink::new();
    Interpreter::new(page_index).run(doc, &content, &resources, &mut sink)?;
    Ok(sink.finish())
}

fn page_resources(doc: &Document, page_index: usize) -> Dict {
    doc.page(page_index)
        .and_then(|p| p.resources.clone())
        .unwrap_or_default()
}

fn stream_order_text(doc: &mut Document, page_index: usize) -> Result<String> {
    let content = doc.page_content(page_index)?;
    let resources = page_resources(doc, page_index);
    let mut sink = StreamTextSink::new();
    Interpreter::new(page_index).run(doc, &content, &resources, &mut sink)?;
    let mut text = sink.finish();
    while text.ends_with('\n') {
        text.pop();
    }
    Ok(text)
}

fn accuracy_text(doc: &mut Document, page_index: usize) -> Result<String> {
    let stream = stream_order_text(doc, page_index);

    let mcid_order = doc.mcid_order(page_index)?;
    if let Some(order) = mcid_order.filter(|o| !o.is_empty()) {
        let structured = structured_text(doc, page_index, &order)?;
        let ratio = doc.options().structured_coverage_ratio;

        return match stream {
            Ok(stream_text) => {
                if structured.len() as f64 >= ratio * stream_text.len() as f64 {
                    Ok(structured)
                } else {
                    // partially-tagged page: the tree covers too little
                    log::debug!(
                        "structured text covers {}/{} bytes, using stream order",
                        structured.len(),
                        stream_text.len()
                    );
                    Ok(stream_text)
                }
            },
            Err(_) => Ok(structured),
        };
    }

    match stream {
        Ok(text) if !text.is_empty() => Ok(text),
        Ok(text) => {
            // nothing from stream order: try the geometric assembly
            match geometric_text(doc, page_index)? {
                Some(geo) => Ok(geo),
                None => Ok(text),
            }
        },
        Err(e) => match geometric_text(doc, page_index) {
            Ok(Some(geo)) => Ok(geo),
            _ => Err(e),
        },
    }
}

/// Run the interpreter in structured mode and stitch buckets in MCID order.
fn structured_text(doc: &mut Document, page_index: usize, order: &[i32]) -> Result<String> {
    let content = doc.page_content(page_index)?;
    let resources = page_resources(doc, page_index);
    let mut sink = StructuredSink::new();
    Interpreter::new(page_index).run(doc, &content, &resources, &mut sink)?;
    let buffers = sink.finish();

    let mut out = String::new();
    for mcid in order {
        if let Some(chunk) = buffers.get(mcid) {
            let chunk = chunk.trim_end_matches('\n');
            if chunk.is_empty() {
                continue;
            }
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(chunk);
        }
    }
    Ok(out)
}

/// Sort spans into lines by y (top to bottom), then x, and join.
fn geometric_text(doc: &mut Document, page_index: usize) -> Result<Option<String>> {
    let spans = extract_page_bounds(doc, page_index)?;
    if spans.is_empty() {
        return Ok(None);
    }

    let mut keyed: Vec<(i64, f64, String)> = spans
        .into_iter()
        .map(|s| {
            let y_bin = (s.bbox[1] / GEOMETRIC_Y_TOLERANCE).round() as i64;
            (-y_bin, s.bbox[0], s.text)
        })
        .collect();
    keyed.sort_by(|a, b| {
        a.0.cmp(&b.0)
            .then(a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
    });

    let mut out = String::new();
    let mut current_bin = None;
    for (bin, _, text) in keyed {
        match current_bin {
            None => {},
            Some(prev) if prev != bin => out.push('\n'),
            Some(_) => out.push(' '),
        }
        current_bin = Some(bin);
        out.push_str(&text);
    }
    Ok(Some(out))
}
