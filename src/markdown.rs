//! Markdown rendering of extracted text.
//!
//! Headings are detected from positioned spans by comparing each line's
//! font size against the page's body size; everything else flows as
//! paragraphs. This is a text-path rendering, not a layout reconstruction.

use crate::assembler::extract_page_bounds;
use crate::content::TextSpan;
use crate::document::Document;
use crate::error::Result;

/// Lines whose font size is at least this multiple of the body size become
/// `#` headings; the next two thresholds give `##` and `###`.
const H1_RATIO: f64 = 1.7;
const H2_RATIO: f64 = 1.4;
const H3_RATIO: f64 = 1.15;

/// Render one page as Markdown.
pub fn page_markdown(doc: &mut Document, page_index: usize) -> Result<String> {
    let spans = extract_page_bounds(doc, page_index)?;
    if spans.is_empty() {
        // image-only or empty pages render to nothing
        return Ok(String::new());
    }

    let lines = group_lines(spans);
    let body_size = body_font_size(&lines);

    let mut out = String::new();
    let mut prev_bottom: Option<f64> = None;

    for line in &lines {
        let paragraph_break = match prev_bottom {
            Some(bottom) => (bottom - line.y) > line.font_size * 1.8,
            None => false,
        };

        if !out.is_empty() {
            out.push('\n');
            if paragraph_break {
                out.push('\n');
            }
        }

        let ratio = line.font_size / body_size.max(1.0);
        if ratio >= H1_RATIO {
            out.push_str("# ");
        } else if ratio >= H2_RATIO {
            out.push_str("## ");
        } else if ratio >= H3_RATIO {
            out.push_str("### ");
        }
        out.push_str(line.text.trim());
        prev_bottom = Some(line.y);
    }

    Ok(out)
}

/// Render the whole document as Markdown, pages separated by blank lines.
pub fn document_markdown(doc: &mut Document) -> Result<String> {
    let mut out = String::new();
    for page_index in 0..doc.page_count() {
        match page_markdown(doc, page_index) {
            Ok(md) if !md.is_empty() => {
                if !out.is_empty() {
                    out.push_str("\n\n");
                }
                out.push_str(&md);
            },
            Ok(_) => {},
            Err(e) => log::warn!("markdown for page {} failed: {}", page_index, e),
        }
    }
    Ok(out)
}

struct Line {
    y: f64,
    font_size: f64,
    text: String,
}

/// Bin spans into lines by baseline, left to right within a line.
fn group_lines(mut spans: Vec<TextSpan>) -> Vec<Line> {
    spans.sort_by(|a, b| {
        b.bbox[1]
            .partial_cmp(&a.bbox[1])
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.bbox[0].partial_cmp(&b.bbox[0]).unwrap_or(std::cmp::Ordering::Equal))
    });

    let mut lines: Vec<Line> = Vec::new();
    for span in spans {
        let y = span.bbox[1];
        match lines.last_mut() {
            Some(line) if (line.y - y).abs() <= line.font_size * 0.4 => {
                if !line.text.ends_with(' ') {
                    line.text.push(' ');
                }
                line.text.push_str(&span.text);
                line.font_size = line.font_size.max(span.font_size);
            },
            _ => lines.push(Line {
                y,
                font_size: span.font_size,
                text: span.text,
            }),
        }
    }
    lines
}

/// Most common line font size, rounded to half points.
fn body_font_size(lines: &[Line]) -> f64 {
    use std::collections::HashMap;
    let mut counts: HashMap<i64, usize> = HashMap::new();
    for line in lines {
        *counts.entry((line.font_size * 2.0).round() as i64).or_default() += 1;
    }
    counts
        .into_iter()
        .max_by_key(|(_, count)| *count)
        .map(|(size, _)| size as f64 / 2.0)
        .unwrap_or(12.0)
}
