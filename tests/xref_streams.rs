//! Cross-reference streams and compressed object streams.

mod common;

use common::{objstm_body, stream_body, xref_stream_pdf};
use rapidpdf::Document;

#[test]
fn xref_stream_document_extracts() {
    let objects = vec![
        (1, b"<< /Type /Catalog /Pages 2 0 R >>".to_vec()),
        (2, b"<< /Type /Pages /Kids [ 3 0 R ] /Count 1 >>".to_vec()),
        (
            3,
            b"<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R >>".to_vec(),
        ),
        (4, stream_body("BT /F1 12 Tf 100 700 Td (ViaXRefStream) Tj ET")),
    ];
    let pdf = xref_stream_pdf(&objects, &[]);

    let mut doc = Document::open_memory(&pdf).unwrap();
    assert_eq!(doc.page_count(), 1);
    assert_eq!(doc.extract_page(0).unwrap(), "ViaXRefStream");
}

#[test]
fn compressed_objects_resolve_through_objstm() {
    // catalog, pages node, and page dict live inside an object stream;
    // only the content stream and the container sit at file level
    let container = objstm_body(&[
        (1, "<< /Type /Catalog /Pages 2 0 R >>"),
        (2, "<< /Type /Pages /Kids [ 3 0 R ] /Count 1 >>"),
        (
            3,
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R >>",
        ),
    ]);
    let objects = vec![
        (4, stream_body("BT /F1 12 Tf 100 700 Td (Compressed) Tj ET")),
        (5, container),
    ];
    let compressed = vec![(1, 5, 0), (2, 5, 1), (3, 5, 2)];
    let pdf = xref_stream_pdf(&objects, &compressed);

    let mut doc = Document::open_memory(&pdf).unwrap();
    assert_eq!(doc.page_count(), 1);
    assert_eq!(doc.extract_page(0).unwrap(), "Compressed");
}

#[test]
fn indirect_stream_length_is_resolved() {
    // /Length given as a reference to an integer object
    let content = "BT /F1 12 Tf 100 700 Td (IndirectLen) Tj ET";
    let objects = vec![
        (1, b"<< /Type /Catalog /Pages 2 0 R >>".to_vec()),
        (2, b"<< /Type /Pages /Kids [ 3 0 R ] /Count 1 >>".to_vec()),
        (
            3,
            b"<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R >>".to_vec(),
        ),
        (
            4,
            format!("<< /Length 5 0 R >>\nstream\n{}\nendstream", content).into_bytes(),
        ),
        (5, content.len().to_string().into_bytes()),
    ];
    let pdf = xref_stream_pdf(&objects, &[]);

    let mut doc = Document::open_memory(&pdf).unwrap();
    assert_eq!(doc.extract_page(0).unwrap(), "IndirectLen");
}
