//! Bounds-mode extraction: span geometry and ordering.

mod common;

use common::simple_pdf;
use rapidpdf::Document;

#[test]
fn single_span_geometry() {
    let pdf = simple_pdf(&["BT /F1 12 Tf 100 700 Td (Test) Tj ET"]);
    let mut doc = Document::open_memory(&pdf).unwrap();
    let spans = doc.extract_bounds(0).unwrap();

    assert_eq!(spans.len(), 1);
    let span = &spans[0];
    assert_eq!(span.text, "Test");
    assert_eq!(span.font_size, 12.0);
    assert_eq!(span.bbox[0], 100.0);
    assert_eq!(span.bbox[1], 700.0);
    assert!(span.bbox[2] > span.bbox[0]);
    // box height equals the font size
    assert_eq!(span.bbox[3] - span.bbox[1], 12.0);
}

#[test]
fn separate_lines_make_separate_spans() {
    let pdf = simple_pdf(&[
        "BT /F1 12 Tf 100 700 Td (LineOne) Tj 0 -30 Td (LineTwo) Tj ET",
    ]);
    let mut doc = Document::open_memory(&pdf).unwrap();
    let spans = doc.extract_bounds(0).unwrap();

    assert_eq!(spans.len(), 2);
    assert_eq!(spans[0].text, "LineOne");
    assert_eq!(spans[1].text, "LineTwo");
    assert!(spans[0].bbox[1] > spans[1].bbox[1]);
}

#[test]
fn same_line_spans_have_nondecreasing_x() {
    // three runs left to right on one baseline, painted in order
    let pdf = simple_pdf(&[
        "BT /F1 12 Tf 72 700 Td (alpha) Tj ET \
         BT /F1 12 Tf 200 700 Td (beta) Tj ET \
         BT /F1 12 Tf 330 700 Td (gamma) Tj ET",
    ]);
    let mut doc = Document::open_memory(&pdf).unwrap();
    let spans = doc.extract_bounds(0).unwrap();

    assert_eq!(spans.len(), 3);
    let same_line = |a: &rapidpdf::TextSpan, b: &rapidpdf::TextSpan| {
        let mid_a = (a.bbox[1] + a.bbox[3]) / 2.0;
        let mid_b = (b.bbox[1] + b.bbox[3]) / 2.0;
        (mid_a - mid_b).abs() < a.font_size.min(b.font_size) / 2.0
    };
    for pair in spans.windows(2) {
        if same_line(&pair[0], &pair[1]) {
            assert!(
                pair[1].bbox[0] >= pair[0].bbox[0],
                "x must not decrease within a line"
            );
        }
    }
}

#[test]
fn large_tj_gap_flushes_span() {
    // -200 creates a word gap but keeps the span; -400 splits it
    let pdf = simple_pdf(&["BT /F1 12 Tf 100 700 Td [(Left) -400 (Right)] TJ ET"]);
    let mut doc = Document::open_memory(&pdf).unwrap();
    let spans = doc.extract_bounds(0).unwrap();

    assert_eq!(spans.len(), 2);
    assert_eq!(spans[0].text, "Left");
    assert_eq!(spans[1].text, "Right");
}

#[test]
fn empty_page_has_no_spans() {
    let pdf = simple_pdf(&[""]);
    let mut doc = Document::open_memory(&pdf).unwrap();
    assert!(doc.extract_bounds(0).unwrap().is_empty());
}

#[test]
fn bounds_out_of_range_fails() {
    let pdf = simple_pdf(&["BT (x) Tj ET"]);
    let mut doc = Document::open_memory(&pdf).unwrap();
    assert!(doc.extract_bounds(3).is_err());
}
