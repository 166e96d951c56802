//! The C ABI boundary: handle lifecycle, buffers, record arrays, and the
//! documented failure values on null handles.

mod common;

use common::simple_pdf;
use rapidpdf::ffi::*;
use std::ptr;

#[test]
fn open_memory_extract_and_free() {
    let pdf = simple_pdf(&["BT /F1 12 Tf 100 700 Td (Boundary) Tj ET"]);

    unsafe {
        let doc = rapidpdf_open_memory(pdf.as_ptr(), pdf.len());
        assert!(!doc.is_null());
        assert_eq!(rapidpdf_page_count(doc), 1);
        assert!(!rapidpdf_is_encrypted(doc));

        let mut len = 0usize;
        let ptr = rapidpdf_extract_page(doc, 0, &mut len);
        assert!(!ptr.is_null());
        let text = std::slice::from_raw_parts(ptr, len);
        assert_eq!(text, b"Boundary");
        rapidpdf_free_buffer(ptr, len);

        rapidpdf_close(doc);
    }
}

#[test]
fn open_memory_unsafe_borrows_caller_bytes() {
    let pdf = simple_pdf(&["BT /F1 12 Tf 100 700 Td (Lent) Tj ET"]);

    unsafe {
        let doc = rapidpdf_open_memory_unsafe(pdf.as_ptr(), pdf.len());
        assert!(!doc.is_null());

        let mut len = 0usize;
        let ptr = rapidpdf_extract_all(doc, &mut len);
        assert_eq!(std::slice::from_raw_parts(ptr, len), b"Lent");
        rapidpdf_free_buffer(ptr, len);
        rapidpdf_close(doc);
    }
    // the lent buffer is untouched after close
    assert!(pdf.starts_with(b"%PDF-1.4"));
}

#[test]
fn null_handles_produce_documented_failures() {
    unsafe {
        assert_eq!(rapidpdf_page_count(ptr::null_mut()), -1);
        assert!(!rapidpdf_is_encrypted(ptr::null_mut()));

        let mut len = 7usize;
        let text = rapidpdf_extract_page(ptr::null_mut(), 0, &mut len);
        assert!(text.is_null());
        assert_eq!(len, 0);

        assert_eq!(
            rapidpdf_get_page_info(ptr::null_mut(), 0, ptr::null_mut(), ptr::null_mut(), ptr::null_mut()),
            -1
        );

        // freeing null is a no-op
        rapidpdf_free_buffer(ptr::null_mut(), 0);
        rapidpdf_close(ptr::null_mut());
    }
}

#[test]
fn page_and_reading_order_entry_points_diverge() {
    // tagged document whose logical order disagrees with paint order:
    // the plain entry point must return literal stream order, the
    // reading-order one the structure-tree order
    let pdf = common::tagged_pdf(&[1, 0]);
    unsafe {
        let doc = rapidpdf_open_memory(pdf.as_ptr(), pdf.len());
        assert!(!doc.is_null());

        let mut stream_len = 0usize;
        let stream_ptr = rapidpdf_extract_page(doc, 0, &mut stream_len);
        assert!(!stream_ptr.is_null());
        let stream_text =
            String::from_utf8(std::slice::from_raw_parts(stream_ptr, stream_len).to_vec()).unwrap();

        let mut reading_len = 0usize;
        let reading_ptr = rapidpdf_extract_page_reading_order(doc, 0, &mut reading_len);
        assert!(!reading_ptr.is_null());
        let reading_text =
            String::from_utf8(std::slice::from_raw_parts(reading_ptr, reading_len).to_vec())
                .unwrap();

        assert!(
            stream_text.find("SecondPart").unwrap() < stream_text.find("FirstPart").unwrap(),
            "plain extraction must keep paint order: {:?}",
            stream_text
        );
        assert_eq!(reading_text, "FirstPart SecondPart");
        assert_ne!(stream_text, reading_text);

        rapidpdf_free_buffer(stream_ptr, stream_len);
        rapidpdf_free_buffer(reading_ptr, reading_len);
        rapidpdf_close(doc);
    }
}

#[test]
fn out_of_range_page_returns_null() {
    let pdf = simple_pdf(&["BT (x) Tj ET"]);
    unsafe {
        let doc = rapidpdf_open_memory(pdf.as_ptr(), pdf.len());
        let mut len = 0usize;
        assert!(rapidpdf_extract_page(doc, 99, &mut len).is_null());
        assert!(rapidpdf_extract_page(doc, -1, &mut len).is_null());
        rapidpdf_close(doc);
    }
}

#[test]
fn invalid_bytes_open_as_null() {
    unsafe {
        let junk = b"not a pdf";
        assert!(rapidpdf_open_memory(junk.as_ptr(), junk.len()).is_null());
        assert!(rapidpdf_open_memory(ptr::null(), 0).is_null());
    }
}

#[test]
fn page_info_fills_out_parameters() {
    let pdf = simple_pdf(&["BT (x) Tj ET"]);
    unsafe {
        let doc = rapidpdf_open_memory(pdf.as_ptr(), pdf.len());
        let mut width = 0.0f64;
        let mut height = 0.0f64;
        let mut rotation = -1i32;
        assert_eq!(rapidpdf_get_page_info(doc, 0, &mut width, &mut height, &mut rotation), 0);
        assert_eq!(width, 612.0);
        assert_eq!(height, 792.0);
        assert_eq!(rotation, 0);

        assert_eq!(
            rapidpdf_get_page_info(doc, 9, &mut width, &mut height, &mut rotation),
            -1
        );
        rapidpdf_close(doc);
    }
}

#[test]
fn bounds_records_round_trip() {
    let pdf = simple_pdf(&["BT /F1 12 Tf 100 700 Td (SpanText) Tj ET"]);
    unsafe {
        let doc = rapidpdf_open_memory(pdf.as_ptr(), pdf.len());
        let mut count = 0usize;
        let spans = rapidpdf_extract_bounds(doc, 0, &mut count);
        assert!(!spans.is_null());
        assert_eq!(count, 1);

        let span = &*spans;
        assert_eq!(span.x0, 100.0);
        assert_eq!(span.y0, 700.0);
        assert_eq!(span.font_size, 12.0);
        let text = std::slice::from_raw_parts(span.text as *const u8, span.text_len);
        assert_eq!(text, b"SpanText");

        rapidpdf_free_bounds(spans, count);
        rapidpdf_close(doc);
    }
}

#[test]
fn metadata_fields_are_individually_owned() {
    let mut file = common::PdfFile::new();
    file.add(1, "<< /Type /Catalog /Pages 2 0 R >>");
    file.add(2, "<< /Type /Pages /Kids [ 3 0 R ] /Count 1 >>");
    file.add(
        3,
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R >>",
    );
    file.add(4, common::stream_body("BT (x) Tj ET"));
    file.add(5, "<< /Title (My Doc) /Producer (rapidpdf) >>");
    file.trailer_extra(" /Info 5 0 R");
    let pdf = file.build();

    unsafe {
        let doc = rapidpdf_open_memory(pdf.as_ptr(), pdf.len());
        let mut meta = std::mem::zeroed::<CMetadata>();
        assert_eq!(rapidpdf_get_metadata(doc, &mut meta), 0);

        let title = std::slice::from_raw_parts(meta.title as *const u8, meta.title_len);
        assert_eq!(title, b"My Doc");
        assert!(meta.subject.is_null());
        assert_eq!(meta.subject_len, 0);

        rapidpdf_free_buffer(meta.title as *mut u8, meta.title_len);
        rapidpdf_free_buffer(meta.producer as *mut u8, meta.producer_len);
        rapidpdf_close(doc);
    }
}

#[test]
fn search_records_round_trip() {
    let pdf = simple_pdf(&["BT /F1 12 Tf 100 700 Td (find the needle here) Tj ET"]);
    unsafe {
        let doc = rapidpdf_open_memory(pdf.as_ptr(), pdf.len());
        let query = b"NEEDLE";
        let mut results = ptr::null_mut();
        let mut count = 0usize;
        assert_eq!(
            rapidpdf_search(doc, query.as_ptr() as *const _, query.len(), &mut results, &mut count),
            0
        );
        assert_eq!(count, 1);
        let hit = &*results;
        assert_eq!(hit.page, 0);
        assert_eq!(hit.offset, 9);
        rapidpdf_free_search_results(results, count);
        rapidpdf_close(doc);
    }
}

#[test]
fn empty_record_arrays_are_freeable() {
    let pdf = simple_pdf(&["BT (x) Tj ET"]);
    unsafe {
        let doc = rapidpdf_open_memory(pdf.as_ptr(), pdf.len());

        let mut items = ptr::null_mut();
        let mut count = 0usize;
        assert_eq!(rapidpdf_get_outline(doc, &mut items, &mut count), 0);
        assert_eq!(count, 0);
        rapidpdf_free_outline(items, count);

        let mut links = ptr::null_mut();
        assert_eq!(rapidpdf_get_page_links(doc, 0, &mut links, &mut count), 0);
        assert_eq!(count, 0);
        rapidpdf_free_links(links, count);

        let mut fields = ptr::null_mut();
        assert_eq!(rapidpdf_get_form_fields(doc, &mut fields, &mut count), 0);
        assert_eq!(count, 0);
        rapidpdf_free_form_fields(fields, count);

        rapidpdf_close(doc);
    }
}
