//! Page labels.
//!
//! `/PageLabels` is a number tree whose ranges assign numbering styles
//! (decimal, roman, alphabetic) and optional prefixes to runs of pages.

use crate::document::Document;
use crate::error::Result;
use crate::object::{Dict, Object};

/// Compute the label for one page, if the document defines page labels.
pub fn page_label(doc: &mut Document, page_index: usize) -> Result<Option<String>> {
    if page_index >= doc.page_count() {
        return Err(crate::error::Error::PageNotFound(page_index));
    }

    let catalog = doc.catalog()?;
    let Some(labels_entry) = catalog.as_dict().and_then(|d| d.get("PageLabels")).cloned() else {
        return Ok(None);
    };

    let mut ranges: Vec<(i64, Dict)> = Vec::new();
    collect_number_tree(doc, &labels_entry, &mut ranges, 0)?;
    ranges.sort_by_key(|(start, _)| *start);

    // the governing range is the one with the greatest start <= page
    let governing = ranges
        .iter()
        .rev()
        .find(|(start, _)| *start <= page_index as i64);
    let Some((start, dict)) = governing else {
        return Ok(None);
    };

    let style = dict.get("S").and_then(|o| o.as_name()).unwrap_or("");
    let prefix = dict
        .get("P")
        .and_then(|o| o.as_string_bytes())
        .map(crate::strings::decode_text_string)
        .unwrap_or_default();
    let first = dict.get("St").and_then(|o| o.as_integer()).unwrap_or(1);
    let number = first + (page_index as i64 - start);

    let formatted = match style {
        "D" => number.to_string(),
        "R" => to_roman(number),
        "r" => to_roman(number).to_lowercase(),
        "A" => to_alpha(number),
        "a" => to_alpha(number).to_lowercase(),
        _ => String::new(),
    };

    Ok(Some(format!("{}{}", prefix, formatted)))
}

/// Flatten a number tree's `/Nums` pairs, recursing into `/Kids`.
fn collect_number_tree(
    doc: &mut Document,
    node: &Object,
    out: &mut Vec<(i64, Dict)>,
    depth: u32,
) -> Result<()> {
    if depth > 32 {
        log::warn!("number tree deeper than 32, truncating");
        return Ok(());
    }

    let resolved = doc.resolve(node)?;
    let Some(dict) = resolved.as_dict().cloned() else {
        return Ok(());
    };

    if let Some(nums) = dict.get("Nums") {
        let nums = doc.resolve(nums)?;
        if let Some(items) = nums.as_array() {
            for pair in items.to_vec().chunks(2) {
                let Some(index) = pair.first().and_then(|o| o.as_integer()) else {
                    continue;
                };
                let Some(value) = pair.get(1) else {
                    continue;
                };
                if let Some(d) = doc.resolve(value)?.as_dict() {
                    out.push((index, d.clone()));
                }
            }
        }
    }

    if let Some(kids) = dict.get("Kids").cloned() {
        let kids = doc.resolve(&kids)?;
        if let Some(items) = kids.as_array() {
            for kid in items.to_vec() {
                collect_number_tree(doc, &kid, out, depth + 1)?;
            }
        }
    }

    Ok(())
}

/// Uppercase roman numerals. Values below 1 degrade to decimal.
fn to_roman(mut n: i64) -> String {
    if n < 1 {
        return n.to_string();
    }
    const TABLE: [(i64, &str); 13] = [
        (1000, "M"),
        (900, "CM"),
        (500, "D"),
        (400, "CD"),
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];
    let mut out = String::new();
    for (value, digits) in TABLE {
        while n >= value {
            out.push_str(digits);
            n -= value;
        }
    }
    out
}

/// A, B, ..., Z, AA, BB, ... per the page-label convention.
fn to_alpha(n: i64) -> String {
    if n < 1 {
        return n.to_string();
    }
    let letter = (b'A' + ((n - 1) % 26) as u8) as char;
    let repeats = ((n - 1) / 26 + 1) as usize;
    letter.to_string().repeat(repeats)
}
