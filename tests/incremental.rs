//! Incremental updates: the newest xref section must win.

mod common;

use common::{append_update, simple_pdf, stream_body, PdfFile};
use rapidpdf::Document;

#[test]
fn incremental_update_overrides_object() {
    // object 4 is page 0's content stream in the simple layout
    let base = simple_pdf(&["BT /F1 12 Tf 100 700 Td (Original Text) Tj ET"]);
    let replacement = stream_body("BT /F1 12 Tf 100 700 Td (Updated Text) Tj ET");
    let updated = append_update(base, &[(4, &replacement)], 6);

    let mut doc = Document::open_memory(&updated).unwrap();
    let text = doc.extract_page(0).unwrap();
    assert!(text.contains("Updated"), "got {:?}", text);
    assert!(!text.contains("Original"), "got {:?}", text);
}

#[test]
fn base_document_still_reads_without_update() {
    let base = simple_pdf(&["BT /F1 12 Tf 100 700 Td (Original Text) Tj ET"]);
    let mut doc = Document::open_memory(&base).unwrap();
    assert!(doc.extract_page(0).unwrap().contains("Original"));
}

#[test]
fn update_can_add_new_pages() {
    // the update rewrites the page tree to add a second page
    let base = simple_pdf(&["BT /F1 12 Tf 100 700 Td (First) Tj ET"]);
    let new_pages = b"<< /Type /Pages /Kids [ 3 0 R 6 0 R ] /Count 2 >>".to_vec();
    let new_page =
        b"<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
          /Resources << /Font << /F1 5 0 R >> >> /Contents 7 0 R >>"
            .to_vec();
    let new_content = stream_body("BT /F1 12 Tf 100 700 Td (Second) Tj ET");

    let updated = append_update(
        base,
        &[(2, &new_pages), (6, &new_page), (7, &new_content)],
        8,
    );

    let mut doc = Document::open_memory(&updated).unwrap();
    assert_eq!(doc.page_count(), 2);
    assert!(doc.extract_page(0).unwrap().contains("First"));
    assert!(doc.extract_page(1).unwrap().contains("Second"));
}

#[test]
fn chained_updates_newest_wins() {
    let base = simple_pdf(&["BT /F1 12 Tf 100 700 Td (v1) Tj ET"]);
    let v2 = stream_body("BT /F1 12 Tf 100 700 Td (v2) Tj ET");
    let v3 = stream_body("BT /F1 12 Tf 100 700 Td (v3) Tj ET");
    let updated = append_update(base, &[(4, &v2)], 6);
    let updated = append_update(updated, &[(4, &v3)], 6);

    let mut doc = Document::open_memory(&updated).unwrap();
    assert_eq!(doc.extract_page(0).unwrap(), "v3");
}

#[test]
fn self_referential_prev_chain_terminates() {
    // a trailer whose /Prev points at its own section must not loop
    let mut file = PdfFile::new();
    file.add(1, "<< /Type /Catalog /Pages 2 0 R >>");
    file.add(2, "<< /Type /Pages /Kids [ 3 0 R ] /Count 1 >>");
    file.add(
        3,
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R >>",
    );
    file.add(4, stream_body("BT (loop) Tj ET"));
    let mut pdf = file.build();

    // graft a /Prev pointing back at the same xref offset
    let marker = b"trailer\n<< ";
    let pos = pdf
        .windows(marker.len())
        .rposition(|w| w == marker)
        .unwrap();
    let startxref = {
        let tail = String::from_utf8_lossy(&pdf[pos..]);
        let after = tail.split("startxref").nth(1).unwrap();
        after.trim().split_whitespace().next().unwrap().parse::<usize>().unwrap()
    };
    let inject = format!("trailer\n<< /Prev {} ", startxref);
    pdf.splice(pos..pos + marker.len(), inject.into_bytes());

    let mut doc = Document::open_memory(&pdf).unwrap();
    assert_eq!(doc.extract_page(0).unwrap(), "loop");
}
