//! Link annotations.
//!
//! Collects `/Annots` entries of subtype `/Link` with their rectangles and
//! either a URI action or a resolved internal destination page.

use crate::document::Document;
use crate::error::Result;
use crate::object::Object;

/// One link annotation on a page.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    /// Annotation rectangle `[x0, y0, x1, y1]` in user space
    pub rect: [f64; 4],
    /// URI for external links
    pub uri: Option<String>,
    /// Zero-based page index for internal GoTo links
    pub dest_page: Option<usize>,
}

/// Extract the link annotations of one page.
pub fn page_links(doc: &mut Document, page_index: usize) -> Result<Vec<Link>> {
    let Some(annots_entry) = doc
        .page(page_index)
        .ok_or(crate::error::Error::PageNotFound(page_index))?
        .dict
        .get("Annots")
        .cloned()
    else {
        return Ok(Vec::new());
    };

    let page_map = crate::outline::page_ref_map(doc);
    let annots = doc.resolve(&annots_entry)?;
    let Some(items) = annots.as_array().map(<[Object]>::to_vec) else {
        return Ok(Vec::new());
    };

    let mut links = Vec::new();
    for item in items {
        let annot = doc.resolve(&item)?;
        let Some(dict) = annot.as_dict().cloned() else {
            continue;
        };
        if dict.get("Subtype").and_then(|o| o.as_name()) != Some("Link") {
            continue;
        }

        let Some(rect) = read_rect(doc, dict.get("Rect"))? else {
            continue;
        };

        let mut uri = None;
        let mut dest_page = None;

        if let Some(action) = dict.get("A") {
            let action = doc.resolve(action)?;
            if let Some(a) = action.as_dict() {
                match a.get("S").and_then(|o| o.as_name()) {
                    Some("URI") => {
                        uri = a
                            .get("URI")
                            .and_then(|o| o.as_string_bytes())
                            .map(|b| String::from_utf8_lossy(b).into_owned());
                    },
                    Some("GoTo") => {
                        if let Some(d) = a.get("D").cloned() {
                            dest_page = crate::outline::resolve_destination(doc, &d, &page_map)?;
                        }
                    },
                    _ => {},
                }
            }
        } else if let Some(d) = dict.get("Dest").cloned() {
            dest_page = crate::outline::resolve_destination(doc, &d, &page_map)?;
        }

        links.push(Link {
            rect,
            uri,
            dest_page,
        });
    }

    Ok(links)
}

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
        match item.as_number() {
            Some(v) => rect[i] = v,
            None => return Ok(None),
        }
    }
    // normalize so (x0, y0) is the lower-left corner
    if rect[0] > rect[2] {
        rect.swap(0, 2);
    }
    if rect[1] > rect[3] {
        rect.swap(1, 3);
    }
    Ok(Some(rect))
}
