//! Page-tree flattening and attribute inheritance.
//!
//! Walks the catalog's `/Pages` tree in order, collecting leaves into the
//! document's page vector. `/Resources`, `/MediaBox`, `/CropBox`, and
//! `/Rotate` inherit per-key from the nearest ancestor that defines them.
//! `/Type` is advisory: a node with `/Kids` is treated as an interior node,
//! a node carrying `/Contents` or `/MediaBox` without kids as a leaf.

use crate::document::Document;
use crate::error::{ErrorKind, Result};
use crate::object::{Dict, Object, ObjectRef};
use std::collections::HashSet;

/// Page-tree recursion cap.
const MAX_TREE_DEPTH: u32 = 64;

/// US Letter, the fallback when no `/MediaBox` is inherited.
const DEFAULT_MEDIA_BOX: [f64; 4] = [0.0, 0.0, 612.0, 792.0];

/// A flattened page leaf with inheritance applied.
#[derive(Debug, Clone)]
pub struct Page {
    /// The page object's reference (identity for structure-tree matching)
    pub obj_ref: ObjectRef,
    /// Effective `/MediaBox`
    pub media_box: [f64; 4],
    /// Effective `/CropBox`, if any ancestor defined one
    pub crop_box: Option<[f64; 4]>,
    /// Effective `/Rotate`, normalized to 0/90/180/270
    pub rotation: i32,
    /// Inheritance-resolved `/Resources`
    pub resources: Option<Dict>,
    /// The raw `/Contents` entry (reference, array, or inline stream)
    pub contents: Option<Object>,
    /// The leaf's own dictionary
    pub dict: Dict,
}

impl Page {
    /// Page width in user-space units.
    pub fn width(&self) -> f64 {
        (self.media_box[2] - self.media_box[0]).abs()
    }

    /// Page height in user-space units.
    pub fn height(&self) -> f64 {
        (self.media_box[3] - self.media_box[1]).abs()
    }
}

/// Attributes inherited down the tree, each key independently.
#[derive(Debug, Clone, Default)]
struct Inherited {
    resources: Option<Dict>,
    media_box: Option<[f64; 4]>,
    crop_box: Option<[f64; 4]>,
    rotate: Option<i32>,
}

/// Flatten the catalog's page tree into an ordered page vector.
pub fn flatten_page_tree(doc: &mut Document) -> Result<Vec<Page>> {
    let catalog = doc.catalog()?;
    let Some(pages_entry) = catalog.as_dict().and_then(|d| d.get("Pages")).cloned() else {
        doc.sink_report(ErrorKind::SyntaxError, 0, "catalog has no /Pages")?;
        return Ok(Vec::new());
    };

    let mut pages = Vec::new();
    let mut visited = HashSet::new();
    walk(doc, &pages_entry, &Inherited::default(), &mut pages, &mut visited, 0)?;
    Ok(pages)
}

fn walk(
    doc: &mut Document,
    node: &Object,
    inherited: &Inherited,
    pages: &mut Vec<Page>,
    visited: &mut HashSet<ObjectRef>,
    depth: u32,
) -> Result<()> {
    if depth > MAX_TREE_DEPTH {
        doc.sink_report(ErrorKind::SyntaxError, 0, "page tree deeper than 64 levels")?;
        return Ok(());
    }

    let node_ref = node.as_reference();
    if let Some(r) = node_ref {
        if !visited.insert(r) {
            doc.sink_report(ErrorKind::SyntaxError, 0, format!("page tree cycle at {}", r))?;
            return Ok(());
        }
    }

    let resolved = doc.resolve(node)?;
    let Some(dict) = resolved.as_dict().cloned() else {
        doc.sink_report(ErrorKind::SyntaxError, 0, "page tree node is not a dictionary")?;
        return Ok(());
    };

    // fold this node's own attributes into the inherited set
    let mut inherited = inherited.clone();
    if let Some(res) = dict.get("Resources") {
        if let Some(d) = doc.resolve(res)?.as_dict() {
            inherited.resources = Some(d.clone());
        }
    }
    if let Some(rect) = read_rect(doc, dict.get("MediaBox"))? {
        inherited.media_box = Some(rect);
    }
    if let Some(rect) = read_rect(doc, dict.get("CropBox"))? {
        inherited.crop_box = Some(rect);
    }
    if let Some(rot) = dict.get("Rotate").and_then(|o| o.as_integer()) {
        inherited.rotate = Some(rot as i32);
    }

    let kids = dict.get("Kids").cloned();
    let type_name = dict.get("Type").and_then(|o| o.as_name()).unwrap_or("");

    let is_interior = type_name == "Pages" || (type_name.is_empty() && kids.is_some());
    if is_interior {
        if let Some(kids) = kids {
            let kids = doc.resolve(&kids)?;
            if let Some(items) = kids.as_array() {
                for kid in items.to_vec() {
                    walk(doc, &kid, &inherited, pages, visited, depth + 1)?;
                }
            }
        }
        return Ok(());
    }

    // leaf: /Type /Page, or typeless with page-ish keys and no kids
    let is_leaf = type_name == "Page"
        || (kids.is_none() && (dict.contains_key("Contents") || dict.contains_key("MediaBox")));
    if !is_leaf {
        log::debug!("skipping page tree node of type /{}", type_name);
        return Ok(());
    }

    let obj_ref = node_ref.unwrap_or_else(|| ObjectRef::new(0, 0));
    let rotation = inherited.rotate.unwrap_or(0).rem_euclid(360) / 90 * 90;

    pages.push(Page {
        obj_ref,
        media_box: inherited.media_box.unwrap_or(DEFAULT_MEDIA_BOX),
        crop_box: inherited.crop_box,
        rotation,
        resources: inherited.resources.clone(),
        contents: dict.get("Contents").cloned(),
        dict,
    });
    Ok(())
}

/// Read a rectangle entry, resolving the array and its elements.
fn read_rect(doc: &mut Document, obj: Option<&Object>) -> Result<Option<[f64; 4]>> {
    let Some(obj) = obj else {
        return Ok(None);
    };
    let resolved = doc.resolve(obj)?;
    let Some(items) = resolved.as_array() else {
        return Ok(None);
    };
    if items.len() != 4 {
        return Ok(None);
    }
    let mut rect = [0.0; 4];
    for (i, item) in items.iter().enumerate() {
        let value = doc.resolve(item)?;
        match value.as_number() {
            Some(v) => rect[i] = v,
            None => return Ok(None),
        }
    }
    Ok(Some(rect))
}
