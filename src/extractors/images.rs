//! Image placement detection.
//!
//! A light pass over the page's operators tracking only `q`/`Q`/`cm`: each
//! `Do` of an Image XObject reports the CTM-transformed unit square as its
//! placement rectangle plus the intrinsic pixel dimensions. Image payloads
//! are never decoded.

use crate::content::{parse_content_stream, Matrix, Operator};
use crate::document::Document;
use crate::error::Result;

/// One placed image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePlacement {
    /// Placement rectangle `[x0, y0, x1, y1]` in user space
    pub rect: [f64; 4],
    /// Intrinsic width in pixels
    pub width: u32,
    /// Intrinsic height in pixels
    pub height: u32,
}

/// Find the images painted on a page.
pub fn page_images(doc: &mut Document, page_index: usize) -> Result<Vec<ImagePlacement>> {
    if page_index >= doc.page_count() {
        return Err(crate::error::Error::PageNotFound(page_index));
    }

    let content = doc.page_content(page_index)?;
    let resources = doc
        .page(page_index)
        .and_then(|p| p.resources.clone())
        .unwrap_or_default();

    let operators = parse_content_stream(&content)?;
    let mut images = Vec::new();
    let mut ctm = Matrix::identity();
    let mut stack: Vec<Matrix> = Vec::new();

    for op in operators {
        match op {
            Operator::SaveState => stack.push(ctm),
            Operator::RestoreState => {
                if let Some(saved) = stack.pop() {
                    ctm = saved;
                }
            },
            Operator::Concat { matrix } => {
                ctm = Matrix::new(matrix).concat(&ctm);
            },
            Operator::PaintXObject { name } => {
                let Some(xobjects) = resources.get("XObject").cloned() else {
                    continue;
                };
                let xobjects = doc.resolve(&xobjects)?;
                let Some(entry) = xobjects.as_dict().and_then(|d| d.get(&name)).cloned() else {
                    continue;
                };
                let xobject = doc.resolve(&entry)?;
                let Some(dict) = xobject.as_dict() else {
                    continue;
                };
                if dict.get("Subtype").and_then(|o| o.as_name()) != Some("Image") {
                    continue;
                }

                let width = dict.get("Width").and_then(|o| o.as_integer()).unwrap_or(0) as u32;
                let height = dict.get("Height").and_then(|o| o.as_integer()).unwrap_or(0) as u32;
                images.push(ImagePlacement {
                    rect: unit_square_bbox(&ctm),
                    width,
                    height,
                });
            },
            _ => {},
        }
    }

    Ok(images)
}

/// Bounding box of the CTM-transformed unit square.
fn unit_square_bbox(ctm: &Matrix) -> [f64; 4] {
    let corners = [
        ctm.apply(0.0, 0.0),
        ctm.apply(1.0, 0.0),
        ctm.apply(0.0, 1.0),
        ctm.apply(1.0, 1.0),
    ];
    let mut bbox = [f64::MAX, f64::MAX, f64::MIN, f64::MIN];
    for (x, y) in corners {
        bbox[0] = bbox[0].min(x);
        bbox[1] = bbox[1].min(y);
        bbox[2] = bbox[2].max(x);
        bbox[3] = bbox[3].max(y);
    }
    bbox
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_square_bbox_scaling() {
        // typical image placement: 100x50 at (10, 20)
        let ctm = Matrix::new([100.0, 0.0, 0.0, 50.0, 10.0, 20.0]);
        assert_eq!(unit_square_bbox(&ctm), [10.0, 20.0, 110.0, 70.0]);
    }

    #[test]
    fn test_unit_square_bbox_flipped() {
        // negative vertical scale still yields a normalized box
        let ctm = Matrix::new([100.0, 0.0, 0.0, -50.0, 0.0, 50.0]);
        assert_eq!(unit_square_bbox(&ctm), [0.0, 0.0, 100.0, 50.0]);
    }
}
