//! Document outline (bookmarks).
//!
//! Walks the `/Outlines` tree along `First`/`Next` chains into a flattened
//! list of titled items with resolved page indices. Malformed trees (cycles,
//! dangling references) terminate the affected chain instead of failing the
//! whole outline.

use crate::document::Document;
use crate::error::Result;
use crate::object::{Object, ObjectRef};
use std::collections::{HashMap, HashSet};

/// Outline depth cap.
const MAX_OUTLINE_DEPTH: u32 = 64;

/// One flattened bookmark.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlineItem {
    /// Decoded title
    pub title: String,
    /// Zero-based target page, when the destination resolves
    pub page: Option<usize>,
    /// Nesting level, 0 for top-level items
    pub level: u32,
}

/// Flatten the document outline. Returns an empty vector for documents
/// without bookmarks.
pub fn outline(doc: &mut Document) -> Result<Vec<OutlineItem>> {
    let catalog = doc.catalog()?;
    let Some(outlines_entry) = catalog.as_dict().and_then(|d| d.get("Outlines")).cloned() else {
        return Ok(Vec::new());
    };

    let outlines = doc.resolve(&outlines_entry)?;
    let Some(first) = outlines.as_dict().and_then(|d| d.get("First")).cloned() else {
        return Ok(Vec::new());
    };

    let page_index = page_ref_index(doc);
    let mut items = Vec::new();
    let mut visited = HashSet::new();
    walk_chain(doc, &first, 0, &page_index, &mut items, &mut visited)?;
    Ok(items)
}

/// Map page object numbers to page indices for destination resolution.
fn page_ref_index(doc: &Document) -> HashMap<ObjectRef, usize> {
    doc.pages()
        .iter()
        .enumerate()
        .map(|(i, p)| (p.obj_ref, i))
        .collect()
}

fn walk_chain(
    doc: &mut Document,
    first: &Object,
    level: u32,
    page_index: &HashMap<ObjectRef, usize>,
    items: &mut Vec<OutlineItem>,
    visited: &mut HashSet<ObjectRef>,
) -> Result<()> {
    if level > MAX_OUTLINE_DEPTH {
        log::warn!("outline deeper than {}, truncating", MAX_OUTLINE_DEPTH);
        return Ok(());
    }

    let mut current = Some(first.clone());
    while let Some(node) = current {
        if let Some(r) = node.as_reference() {
            if !visited.insert(r) {
                log::warn!("outline cycle at {}", r);
                break;
            }
        }

        let resolved = doc.resolve(&node)?;
        let Some(dict) = resolved.as_dict().cloned() else {
            break;
        };

        let title = dict
            .get("Title")
            .and_then(|o| o.as_string_bytes())
            .map(crate::strings::decode_text_string)
            .unwrap_or_default();

        let page = destination_page(doc, &dict, page_index)?;
        items.push(OutlineItem { title, page, level });

        if let Some(child) = dict.get("First").cloned() {
            walk_chain(doc, &child, level + 1, page_index, items, visited)?;
        }

        current = dict.get("Next").cloned();
    }

    Ok(())
}

/// Resolve an item's `/Dest` or GoTo `/A` action to a page index.
fn destination_page(
    doc: &mut Document,
    dict: &crate::object::Dict,
    page_index: &HashMap<ObjectRef, usize>,
) -> Result<Option<usize>> {
    let dest = if let Some(d) = dict.get("Dest") {
        Some(d.clone())
    } else if let Some(action) = dict.get("A") {
        let action = doc.resolve(action)?;
        match action.as_dict() {
            Some(a) if a.get("S").and_then(|o| o.as_name()) == Some("GoTo") => {
                a.get("D").cloned()
            },
            _ => None,
        }
    } else {
        None
    };

    match dest {
        Some(d) => resolve_destination(doc, &d, page_index),
        None => Ok(None),
    }
}

/// Turn a destination (array or name) into a page index.
pub(crate) fn resolve_destination(
    doc: &mut Document,
    dest: &Object,
    page_index: &HashMap<ObjectRef, usize>,
) -> Result<Option<usize>> {
    let dest = doc.resolve(dest)?;
    match &dest {
        Object::Array(items) => Ok(items
            .first()
            .and_then(|o| o.as_reference())
            .and_then(|r| page_index.get(&r).copied())),
        Object::Name(name) => lookup_named_destination(doc, name, page_index),
        Object::String(bytes) | Object::HexString(bytes) => {
            let name = String::from_utf8_lossy(bytes).into_owned();
            lookup_named_destination(doc, &name, page_index)
        },
        _ => Ok(None),
    }
}

/// PDF 1.1-style `/Dests` dictionary lookup. Name-tree destinations
/// (`/Names /Dests`) are not chased.
fn lookup_named_destination(
    doc: &mut Document,
    name: &str,
    page_index: &HashMap<ObjectRef, usize>,
) -> Result<Option<usize>> {
    let catalog = doc.catalog()?;
    let Some(dests_entry) = catalog.as_dict().and_then(|d| d.get("Dests")).cloned() else {
        log::debug!("named destination {:?} without /Dests dictionary", name);
        return Ok(None);
    };
    let dests = doc.resolve(&dests_entry)?;
    let Some(entry) = dests.as_dict().and_then(|d| d.get(name)).cloned() else {
        return Ok(None);
    };
    let entry = doc.resolve(&entry)?;
    // the entry is a dest array or a dict carrying /D
    let dest = match entry.as_dict().and_then(|d| d.get("D")) {
        Some(d) => d.clone(),
        None => entry,
    };
    match dest.as_array() {
        Some(items) => Ok(items
            .first()
            .and_then(|o| o.as_reference())
            .and_then(|r| page_index.get(&r).copied())),
        None => Ok(None),
    }
}

/// Shared helper for annotation links.
pub(crate) fn page_ref_map(doc: &Document) -> HashMap<ObjectRef, usize> {
    page_ref_index(doc)
}
