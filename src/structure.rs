//! Tagged-PDF structure tree.
//!
//! Walks `/StructTreeRoot` into an immutable tree of structure elements and
//! derives, per page, the ordered MCID sequence that defines logical
//! reading order (pre-order, skipping `/Artifact` subtrees). Nodes are
//! boxed so inter-node pointers stay stable while the tree is built.

use crate::document::Document;
use crate::error::Result;
use crate::object::{Object, ObjectRef};
use std::collections::HashSet;

/// Structure tree recursion cap.
const MAX_STRUCT_DEPTH: u32 = 256;

/// A marked-content reference inside the structure tree.
#[derive(Debug, Clone, PartialEq)]
pub struct McidRef {
    /// The MCID within the page's content stream
    pub mcid: i32,
    /// Page object the marked content lives on (own or inherited `/Pg`)
    pub page: Option<ObjectRef>,
    /// Content stream object for `/Stm`-qualified references
    pub stream: Option<u32>,
}

/// Child of a structure element.
#[derive(Debug, Clone)]
pub enum StructChild {
    /// Nested structure element
    Element(Box<StructElem>),
    /// Leaf marked-content reference
    Mcid(McidRef),
}

/// One structure element.
#[derive(Debug, Clone)]
pub struct StructElem {
    /// Structure kind from `/S` (Document, Sect, P, H1, Artifact, ...)
    pub kind: String,
    /// `/T` title, raw bytes
    pub title: Option<Vec<u8>>,
    /// `/Alt` replacement text, raw bytes
    pub alt: Option<Vec<u8>>,
    /// Effective page (own `/Pg` or inherited from the parent)
    pub page: Option<ObjectRef>,
    /// Children in document order
    pub children: Vec<StructChild>,
}

/// The parsed structure tree.
#[derive(Debug, Clone, Default)]
pub struct StructureTree {
    /// Root elements under `/StructTreeRoot`
    pub roots: Vec<Box<StructElem>>,
}

impl StructureTree {
    /// Ordered MCIDs for one page, pre-order, skipping `/Artifact` nodes.
    pub fn page_mcid_order(&self, page: ObjectRef) -> Vec<i32> {
        let mut order = Vec::new();
        for root in &self.roots {
            collect_mcids(root, page, &mut order);
        }
        order
    }

    /// Whether the tree carries no elements at all.
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

fn collect_mcids(elem: &StructElem, page: ObjectRef, order: &mut Vec<i32>) {
    if elem.kind == "Artifact" {
        return;
    }
    for child in &elem.children {
        match child {
            StructChild::Element(e) => collect_mcids(e, page, order),
            StructChild::Mcid(m) => {
                if m.page == Some(page) {
                    order.push(m.mcid);
                }
            },
        }
    }
}

/// Parse the document's structure tree, if it is tagged.
pub fn parse_structure_tree(doc: &mut Document) -> Result<Option<StructureTree>> {
    let catalog = doc.catalog()?;
    let Some(root_entry) = catalog.as_dict().and_then(|d| d.get("StructTreeRoot")).cloned() else {
        return Ok(None);
    };

    let root_obj = doc.resolve(&root_entry)?;
    let Some(root_dict) = root_obj.as_dict().cloned() else {
        log::warn!("/StructTreeRoot is not a dictionary");
        return Ok(None);
    };

    let mut tree = StructureTree::default();
    let mut visited = HashSet::new();
    if let Some(r) = root_entry.as_reference() {
        visited.insert(r);
    }

    if let Some(k) = root_dict.get("K") {
        let kids = doc.resolve(k)?;
        match kids {
            Object::Array(items) => {
                for item in items {
                    if let Some(elem) = parse_elem(doc, &item, None, &mut visited, 0)? {
                        tree.roots.push(Box::new(elem));
                    }
                }
            },
            other => {
                if let Some(elem) = parse_elem(doc, &other, None, &mut visited, 0)? {
                    tree.roots.push(Box::new(elem));
                }
            },
        }
    }

    Ok(Some(tree))
}

/// Parse one `/K` item into a structure element.
///
/// `inherited_pg` is the nearest ancestor's `/Pg`; children lacking their
/// own page reference adopt it.
fn parse_elem(
    doc: &mut Document,
    obj: &Object,
    inherited_pg: Option<ObjectRef>,
    visited: &mut HashSet<ObjectRef>,
    depth: u32,
) -> Result<Option<StructElem>> {
    if depth > MAX_STRUCT_DEPTH {
        log::warn!("structure tree deeper than {}, truncating", MAX_STRUCT_DEPTH);
        return Ok(None);
    }

    if let Some(r) = obj.as_reference() {
        if !visited.insert(r) {
            log::warn!("cycle in structure tree at {}", r);
            return Ok(None);
        }
    }

    let resolved = doc.resolve(obj)?;
    let Some(dict) = resolved.as_dict().cloned() else {
        return Ok(None);
    };

    let Some(kind) = dict.get("S").and_then(|o| o.as_name()).map(str::to_string) else {
        return Ok(None);
    };

    let page = dict
        .get("Pg")
        .and_then(|o| o.as_reference())
        .or(inherited_pg);
    let title = dict
        .get("T")
        .and_then(|o| o.as_string_bytes())
        .map(<[u8]>::to_vec);
    let alt = dict
        .get("Alt")
        .and_then(|o| o.as_string_bytes())
        .map(<[u8]>::to_vec);

    let mut elem = StructElem {
        kind,
        title,
        alt,
        page,
        children: Vec::new(),
    };

    if let Some(k) = dict.get("K") {
        let kids = doc.resolve(k)?;
        parse_kids(doc, &kids, &mut elem, visited, depth)?;
    }

    Ok(Some(elem))
}

/// Parse a `/K` value: a single MCID integer, an MCR dictionary, a child
/// element (direct or by reference), or an array of any of those.
fn parse_kids(
    doc: &mut Document,
    kids: &Object,
    parent: &mut StructElem,
    visited: &mut HashSet<ObjectRef>,
    depth: u32,
) -> Result<()> {
    match kids {
        Object::Integer(mcid) => {
            parent.children.push(StructChild::Mcid(McidRef {
                mcid: *mcid as i32,
                page: parent.page,
                stream: None,
            }));
        },
        Object::Array(items) => {
            for item in items {
                parse_kid_item(doc, item, parent, visited, depth)?;
            }
        },
        other => parse_kid_item(doc, other, parent, visited, depth)?,
    }
    Ok(())
}

fn parse_kid_item(
    doc: &mut Document,
    item: &Object,
    parent: &mut StructElem,
    visited: &mut HashSet<ObjectRef>,
    depth: u32,
) -> Result<()> {
    // direct MCID entry inside an array
    if let Object::Integer(mcid) = item {
        parent.children.push(StructChild::Mcid(McidRef {
            mcid: *mcid as i32,
            page: parent.page,
            stream: None,
        }));
        return Ok(());
    }

    let resolved = doc.resolve(item)?;
    let Some(dict) = resolved.as_dict() else {
        return Ok(());
    };

    // marked-content reference dictionary
    if dict.get("Type").and_then(|o| o.as_name()) == Some("MCR") {
        if let Some(mcid) = dict.get("MCID").and_then(|o| o.as_integer()) {
            let page = dict
                .get("Pg")
                .and_then(|o| o.as_reference())
                .or(parent.page);
            let stream = dict
                .get("Stm")
                .and_then(|o| o.as_reference())
                .map(|r| r.num);
            parent.children.push(StructChild::Mcid(McidRef {
                mcid: mcid as i32,
                page,
                stream,
            }));
        }
        return Ok(());
    }

    // object references (OBJR) point at annotations, not text
    if dict.get("Type").and_then(|o| o.as_name()) == Some("OBJR") {
        return Ok(());
    }

    if let Some(child) = parse_elem(doc, item, parent.page, visited, depth + 1)? {
        parent.children.push(StructChild::Element(Box::new(child)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(kind: &str, page: Option<ObjectRef>, mcids: &[i32]) -> StructElem {
        StructElem {
            kind: kind.to_string(),
            title: None,
            alt: None,
            page,
            children: mcids
                .iter()
                .map(|&mcid| {
                    StructChild::Mcid(McidRef {
                        mcid,
                        page,
                        stream: None,
                    })
                })
                .collect(),
        }
    }

    #[test]
    fn test_page_mcid_order_preorder() {
        let page = ObjectRef::new(3, 0);
        let mut doc_elem = leaf("Document", Some(page), &[]);
        doc_elem
            .children
            .push(StructChild::Element(Box::new(leaf("H1", Some(page), &[0]))));
        doc_elem
            .children
            .push(StructChild::Element(Box::new(leaf("P", Some(page), &[1, 2]))));

        let tree = StructureTree {
            roots: vec![Box::new(doc_elem)],
        };
        assert_eq!(tree.page_mcid_order(page), vec![0, 1, 2]);
    }

    #[test]
    fn test_artifact_subtree_skipped() {
        let page = ObjectRef::new(3, 0);
        let mut root = leaf("Document", Some(page), &[]);
        root.children
            .push(StructChild::Element(Box::new(leaf("P", Some(page), &[0]))));
        root.children
            .push(StructChild::Element(Box::new(leaf("Artifact", Some(page), &[1]))));
        root.children
            .push(StructChild::Element(Box::new(leaf("P", Some(page), &[2]))));

        let tree = StructureTree {
            roots: vec![Box::new(root)],
        };
        assert_eq!(tree.page_mcid_order(page), vec![0, 2]);
    }

    #[test]
    fn test_other_pages_filtered() {
        let page_a = ObjectRef::new(3, 0);
        let page_b = ObjectRef::new(4, 0);
        let mut root = leaf("Document", None, &[]);
        root.children
            .push(StructChild::Element(Box::new(leaf("P", Some(page_a), &[0]))));
        root.children
            .push(StructChild::Element(Box::new(leaf("P", Some(page_b), &[0, 1]))));

        let tree = StructureTree {
            roots: vec![Box::new(root)],
        };
        assert_eq!(tree.page_mcid_order(page_a), vec![0]);
        assert_eq!(tree.page_mcid_order(page_b), vec![0, 1]);
    }

    #[test]
    fn test_empty_tree() {
        let tree = StructureTree::default();
        assert!(tree.is_empty());
        assert!(tree.page_mcid_order(ObjectRef::new(1, 0)).is_empty());
    }
}
