//! C ABI boundary.
//!
//! Exposes the document as an opaque handle plus plain-old-data record
//! arrays. Every returned buffer is allocated here and released only by the
//! paired `rapidpdf_free_*` entry point, which also frees per-record owned
//! strings. Panics never cross the boundary; they turn into the documented
//! failure value (null pointer, -1, or false).

use crate::document::{Document, ExtractMode};
use std::ffi::CStr;
use std::os::raw::{c_char, c_double, c_int};
use std::panic::{catch_unwind, AssertUnwindSafe};

/// A text span with bounds, as seen by the host.
#[repr(C)]
pub struct CTextSpan {
    /// Left edge
    pub x0: c_double,
    /// Bottom edge
    pub y0: c_double,
    /// Right edge
    pub x1: c_double,
    /// Top edge
    pub y1: c_double,
    /// Owned UTF-8 text (freed by `rapidpdf_free_bounds`)
    pub text: *mut c_char,
    /// Text length in bytes
    pub text_len: usize,
    /// Font size in points
    pub font_size: c_double,
}

/// Document information fields; each pointer is individually owned and
/// freed with `rapidpdf_free_buffer`.
#[repr(C)]
pub struct CMetadata {
    /// `/Title`
    pub title: *mut c_char,
    /// byte length of `title`
    pub title_len: usize,
    /// `/Author`
    pub author: *mut c_char,
    /// byte length of `author`
    pub author_len: usize,
    /// `/Subject`
    pub subject: *mut c_char,
    /// byte length of `subject`
    pub subject_len: usize,
    /// `/Keywords`
    pub keywords: *mut c_char,
    /// byte length of `keywords`
    pub keywords_len: usize,
    /// `/Creator`
    pub creator: *mut c_char,
    /// byte length of `creator`
    pub creator_len: usize,
    /// `/Producer`
    pub producer: *mut c_char,
    /// byte length of `producer`
    pub producer_len: usize,
    /// `/CreationDate`
    pub creation_date: *mut c_char,
    /// byte length of `creation_date`
    pub creation_date_len: usize,
    /// `/ModDate`
    pub mod_date: *mut c_char,
    /// byte length of `mod_date`
    pub mod_date_len: usize,
}

/// One outline entry.
#[repr(C)]
pub struct COutlineItem {
    /// Owned UTF-8 title
    pub title: *mut c_char,
    /// byte length of `title`
    pub title_len: usize,
    /// Zero-based page index, -1 when unresolved
    pub page: c_int,
    /// Nesting level, 0 at the top
    pub level: c_int,
}

/// One search hit.
#[repr(C)]
pub struct CSearchResult {
    /// Zero-based page index
    pub page: c_int,
    /// Byte offset within the page's text
    pub offset: usize,
    /// Owned UTF-8 context window
    pub context: *mut c_char,
    /// byte length of `context`
    pub context_len: usize,
}

/// One link annotation.
#[repr(C)]
pub struct CLink {
    /// Left edge
    pub x0: c_double,
    /// Bottom edge
    pub y0: c_double,
    /// Right edge
    pub x1: c_double,
    /// Top edge
    pub y1: c_double,
    /// Owned URI, null for internal links
    pub uri: *mut c_char,
    /// byte length of `uri`
    pub uri_len: usize,
    /// Destination page, -1 for external links
    pub dest_page: c_int,
}

/// One placed image.
#[repr(C)]
pub struct CImageInfo {
    /// Left edge
    pub x0: c_double,
    /// Bottom edge
    pub y0: c_double,
    /// Right edge
    pub x1: c_double,
    /// Top edge
    pub y1: c_double,
    /// Intrinsic width in pixels
    pub width: u32,
    /// Intrinsic height in pixels
    pub height: u32,
}

/// One form field.
#[repr(C)]
pub struct CFormField {
    /// Owned fully qualified name
    pub name: *mut c_char,
    /// byte length of `name`
    pub name_len: usize,
    /// Owned value, null when unset
    pub value: *mut c_char,
    /// byte length of `value`
    pub value_len: usize,
    /// 0 unknown, 1 text, 2 button, 3 choice, 4 signature
    pub field_type: c_int,
    /// Whether the rectangle fields are meaningful
    pub has_rect: bool,
    /// Left edge
    pub x0: c_double,
    /// Bottom edge
    pub y0: c_double,
    /// Right edge
    pub x1: c_double,
    /// Top edge
    pub y1: c_double,
}

// ---- allocation helpers ----------------------------------------------------

/// Leak a byte buffer to the host; freed by [`rapidpdf_free_buffer`].
fn leak_bytes(data: Vec<u8>, out_len: *mut usize) -> *mut u8 {
    let boxed = data.into_boxed_slice();
    let len = boxed.len();
    let ptr = Box::into_raw(boxed) as *mut u8;
    if !out_len.is_null() {
        unsafe { *out_len = len };
    }
    ptr
}

fn leak_string(s: String) -> (*mut c_char, usize) {
    let len = s.len();
    let ptr = leak_bytes(s.into_bytes(), std::ptr::null_mut());
    (ptr as *mut c_char, len)
}

unsafe fn free_leaked(ptr: *mut u8, len: usize) {
    if ptr.is_null() {
        return;
    }
    drop(Box::from_raw(std::ptr::slice_from_raw_parts_mut(ptr, len)));
}

fn leak_records<T>(records: Vec<T>, out_count: *mut usize) -> *mut T {
    let boxed = records.into_boxed_slice();
    let count = boxed.len();
    let ptr = Box::into_raw(boxed) as *mut T;
    if !out_count.is_null() {
        unsafe { *out_count = count };
    }
    ptr
}

unsafe fn take_records<T>(ptr: *mut T, count: usize) -> Vec<T> {
    if ptr.is_null() {
        return Vec::new();
    }
    Box::from_raw(std::ptr::slice_from_raw_parts_mut(ptr, count)).into_vec()
}

unsafe fn doc_mut<'a>(doc: *mut Document) -> Option<&'a mut Document> {
    doc.as_mut()
}

fn text_result(result: crate::error::Result<String>, out_len: *mut usize) -> *mut u8 {
    match result {
        Ok(text) => leak_bytes(text.into_bytes(), out_len),
        Err(e) => {
            log::debug!("extraction failed at boundary: {}", e);
            if !out_len.is_null() {
                unsafe { *out_len = 0 };
            }
            std::ptr::null_mut()
        },
    }
}

// ---- lifecycle -------------------------------------------------------------

/// Open a document from a filesystem path (NUL-terminated UTF-8).
///
/// # Safety
///
/// `path` must be a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn rapidpdf_open(path: *const c_char) -> *mut Document {
    catch_unwind(AssertUnwindSafe(|| {
        if path.is_null() {
            return std::ptr::null_mut();
        }
        let Ok(path) = CStr::from_ptr(path).to_str() else {
            return std::ptr::null_mut();
        };
        match Document::open(path) {
            Ok(doc) => Box::into_raw(Box::new(doc)),
            Err(e) => {
                log::debug!("open failed: {}", e);
                std::ptr::null_mut()
            },
        }
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// Open a document from bytes, copying them.
///
/// # Safety
///
/// `data` must point to `len` readable bytes.
#[no_mangle]
pub unsafe extern "C" fn rapidpdf_open_memory(data: *const u8, len: usize) -> *mut Document {
    catch_unwind(AssertUnwindSafe(|| {
        if data.is_null() {
            return std::ptr::null_mut();
        }
        let bytes = std::slice::from_raw_parts(data, len);
        match Document::open_memory(bytes) {
            Ok(doc) => Box::into_raw(Box::new(doc)),
            Err(_) => std::ptr::null_mut(),
        }
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// Open a document over caller-lent memory without copying.
///
/// # Safety
///
/// `data` must point to `len` bytes that stay valid and unmodified until
/// `rapidpdf_close`.
#[no_mangle]
pub unsafe extern "C" fn rapidpdf_open_memory_unsafe(data: *const u8, len: usize) -> *mut Document {
    catch_unwind(AssertUnwindSafe(|| {
        if data.is_null() {
            return std::ptr::null_mut();
        }
        match Document::open_memory_unsafe(data, len) {
            Ok(doc) => Box::into_raw(Box::new(doc)),
            Err(_) => std::ptr::null_mut(),
        }
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// Close a document and release everything it owns.
///
/// # Safety
///
/// `doc` must be a handle returned by an open function, closed at most once.
#[no_mangle]
pub unsafe extern "C" fn rapidpdf_close(doc: *mut Document) {
    if !doc.is_null() {
        let _ = catch_unwind(AssertUnwindSafe(|| drop(Box::from_raw(doc))));
    }
}

// ---- document queries ------------------------------------------------------

/// Number of pages, or -1 on a null handle.
///
/// # Safety
///
/// `doc` must be a valid handle or null.
#[no_mangle]
pub unsafe extern "C" fn rapidpdf_page_count(doc: *mut Document) -> c_int {
    catch_unwind(AssertUnwindSafe(|| match doc_mut(doc) {
        Some(doc) => doc.page_count() as c_int,
        None => -1,
    }))
    .unwrap_or(-1)
}

/// Whether the document is encrypted; false on a null handle.
///
/// # Safety
///
/// `doc` must be a valid handle or null.
#[no_mangle]
pub unsafe extern "C" fn rapidpdf_is_encrypted(doc: *mut Document) -> bool {
    catch_unwind(AssertUnwindSafe(|| {
        doc_mut(doc).map(|d| d.is_encrypted()).unwrap_or(false)
    }))
    .unwrap_or(false)
}

/// Page geometry. Returns 0, or -1 when the page is out of range.
///
/// # Safety
///
/// `doc` must be a valid handle or null; out pointers must be writable or null.
#[no_mangle]
pub unsafe extern "C" fn rapidpdf_get_page_info(
    doc: *mut Document,
    page: c_int,
    width: *mut c_double,
    height: *mut c_double,
    rotation: *mut c_int,
) -> c_int {
    catch_unwind(AssertUnwindSafe(|| {
        let Some(doc) = doc_mut(doc) else {
            return -1;
        };
        if page < 0 {
            return -1;
        }
        let Some(info) = doc.page_info(page as usize) else {
            return -1;
        };
        if !width.is_null() {
            *width = info.width;
        }
        if !height.is_null() {
            *height = info.height;
        }
        if !rotation.is_null() {
            *rotation = info.rotation;
        }
        0
    }))
    .unwrap_or(-1)
}

// ---- text extraction -------------------------------------------------------

/// Extract one page's text in literal content-stream order as owned UTF-8.
/// Null on failure. Reading-order extraction is the separate
/// [`rapidpdf_extract_page_reading_order`] entry point.
///
/// # Safety
///
/// `doc` must be a valid handle or null; `out_len` writable or null.
#[no_mangle]
pub unsafe extern "C" fn rapidpdf_extract_page(
    doc: *mut Document,
    page: c_int,
    out_len: *mut usize,
) -> *mut u8 {
    extract_page_in_mode(doc, page, out_len, ExtractMode::Fast)
}

/// Extract one page's text in reading order: structure-tree order when the
/// page is tagged with enough coverage, stream order otherwise.
///
/// # Safety
///
/// Same contract as [`rapidpdf_extract_page`].
#[no_mangle]
pub unsafe extern "C" fn rapidpdf_extract_page_reading_order(
    doc: *mut Document,
    page: c_int,
    out_len: *mut usize,
) -> *mut u8 {
    extract_page_in_mode(doc, page, out_len, ExtractMode::Accuracy)
}

unsafe fn extract_page_in_mode(
    doc: *mut Document,
    page: c_int,
    out_len: *mut usize,
    mode: ExtractMode,
) -> *mut u8 {
    catch_unwind(AssertUnwindSafe(|| {
        let Some(doc) = doc_mut(doc) else {
            if !out_len.is_null() {
                *out_len = 0;
            }
            return std::ptr::null_mut();
        };
        if page < 0 {
            if !out_len.is_null() {
                *out_len = 0;
            }
            return std::ptr::null_mut();
        }
        text_result(doc.extract_page_with_mode(page as usize, mode), out_len)
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// Extract the whole document in accuracy mode.
///
/// # Safety
///
/// `doc` must be a valid handle or null; `out_len` writable or null.
#[no_mangle]
pub unsafe extern "C" fn rapidpdf_extract_all(doc: *mut Document, out_len: *mut usize) -> *mut u8 {
    catch_unwind(AssertUnwindSafe(|| match doc_mut(doc) {
        Some(doc) => text_result(doc.extract_all(), out_len),
        None => {
            if !out_len.is_null() {
                *out_len = 0;
            }
            std::ptr::null_mut()
        },
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// Extract the whole document in stream order.
///
/// # Safety
///
/// `doc` must be a valid handle or null; `out_len` writable or null.
#[no_mangle]
pub unsafe extern "C" fn rapidpdf_extract_all_fast(
    doc: *mut Document,
    out_len: *mut usize,
) -> *mut u8 {
    catch_unwind(AssertUnwindSafe(|| match doc_mut(doc) {
        Some(doc) => text_result(doc.extract_all_fast(), out_len),
        None => {
            if !out_len.is_null() {
                *out_len = 0;
            }
            std::ptr::null_mut()
        },
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// Accuracy-mode extraction of the whole document.
///
/// # Safety
///
/// Same contract as [`rapidpdf_extract_all`].
#[no_mangle]
pub unsafe extern "C" fn rapidpdf_extract_all_reading_order(
    doc: *mut Document,
    out_len: *mut usize,
) -> *mut u8 {
    rapidpdf_extract_all(doc, out_len)
}

/// Markdown rendering of one page.
///
/// # Safety
///
/// Same contract as [`rapidpdf_extract_page`].
#[no_mangle]
pub unsafe extern "C" fn rapidpdf_extract_page_markdown(
    doc: *mut Document,
    page: c_int,
    out_len: *mut usize,
) -> *mut u8 {
    catch_unwind(AssertUnwindSafe(|| {
        let Some(doc) = doc_mut(doc) else {
            if !out_len.is_null() {
                *out_len = 0;
            }
            return std::ptr::null_mut();
        };
        if page < 0 {
            if !out_len.is_null() {
                *out_len = 0;
            }
            return std::ptr::null_mut();
        }
        text_result(doc.extract_markdown(page as usize), out_len)
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// Markdown rendering of the whole document.
///
/// # Safety
///
/// Same contract as [`rapidpdf_extract_all`].
#[no_mangle]
pub unsafe extern "C" fn rapidpdf_extract_all_markdown(
    doc: *mut Document,
    out_len: *mut usize,
) -> *mut u8 {
    catch_unwind(AssertUnwindSafe(|| match doc_mut(doc) {
        Some(doc) => text_result(crate::markdown::document_markdown(doc), out_len),
        None => {
            if !out_len.is_null() {
                *out_len = 0;
            }
            std::ptr::null_mut()
        },
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// Release a buffer returned by any text-returning entry point.
///
/// # Safety
///
/// `ptr`/`len` must come from this library, freed at most once.
#[no_mangle]
pub unsafe extern "C" fn rapidpdf_free_buffer(ptr: *mut u8, len: usize) {
    let _ = catch_unwind(AssertUnwindSafe(|| free_leaked(ptr, len)));
}

// ---- bounds ----------------------------------------------------------------

/// Positioned text spans of one page. Null on failure.
///
/// # Safety
///
/// `doc` must be a valid handle or null; `out_count` writable or null.
#[no_mangle]
pub unsafe extern "C" fn rapidpdf_extract_bounds(
    doc: *mut Document,
    page: c_int,
    out_count: *mut usize,
) -> *mut CTextSpan {
    catch_unwind(AssertUnwindSafe(|| {
        if !out_count.is_null() {
            *out_count = 0;
        }
        let Some(doc) = doc_mut(doc) else {
            return std::ptr::null_mut();
        };
        if page < 0 {
            return std::ptr::null_mut();
        }
        let spans = match doc.extract_bounds(page as usize) {
            Ok(spans) => spans,
            Err(_) => return std::ptr::null_mut(),
        };

        let records: Vec<CTextSpan> = spans
            .into_iter()
            .map(|span| {
                let (text, text_len) = leak_string(span.text);
                CTextSpan {
                    x0: span.bbox[0],
                    y0: span.bbox[1],
                    x1: span.bbox[2],
                    y1: span.bbox[3],
                    text,
                    text_len,
                    font_size: span.font_size,
                }
            })
            .collect();
        leak_records(records, out_count)
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// Release a span array including its owned strings.
///
/// # Safety
///
/// `ptr`/`count` must come from [`rapidpdf_extract_bounds`], freed once.
#[no_mangle]
pub unsafe extern "C" fn rapidpdf_free_bounds(ptr: *mut CTextSpan, count: usize) {
    let _ = catch_unwind(AssertUnwindSafe(|| {
        for span in take_records(ptr, count) {
            free_leaked(span.text as *mut u8, span.text_len);
        }
    }));
}

// ---- metadata --------------------------------------------------------------

/// Fill `out` with the Info dictionary fields. Returns 0, or -1 on a null
/// handle. Each non-null field is freed with [`rapidpdf_free_buffer`].
///
/// # Safety
///
/// `doc` must be a valid handle or null; `out` must be writable.
#[no_mangle]
pub unsafe extern "C" fn rapidpdf_get_metadata(doc: *mut Document, out: *mut CMetadata) -> c_int {
    catch_unwind(AssertUnwindSafe(|| {
        let (Some(doc), false) = (doc_mut(doc), out.is_null()) else {
            return -1;
        };
        let metadata = match doc.metadata() {
            Ok(m) => m,
            Err(_) => return -1,
        };

        let field = |value: Option<String>| match value {
            Some(s) => leak_string(s),
            None => (std::ptr::null_mut(), 0),
        };

        let (title, title_len) = field(metadata.title);
        let (author, author_len) = field(metadata.author);
        let (subject, subject_len) = field(metadata.subject);
        let (keywords, keywords_len) = field(metadata.keywords);
        let (creator, creator_len) = field(metadata.creator);
        let (producer, producer_len) = field(metadata.producer);
        let (creation_date, creation_date_len) = field(metadata.creation_date);
        let (mod_date, mod_date_len) = field(metadata.mod_date);

        *out = CMetadata {
            title,
            title_len,
            author,
            author_len,
            subject,
            subject_len,
            keywords,
            keywords_len,
            creator,
            creator_len,
            producer,
            producer_len,
            creation_date,
            creation_date_len,
            mod_date,
            mod_date_len,
        };
        0
    }))
    .unwrap_or(-1)
}

// ---- outline ---------------------------------------------------------------

/// Flattened outline. Returns 0 with a possibly-empty array, -1 on failure.
///
/// # Safety
///
/// `doc` must be a valid handle or null; out pointers writable.
#[no_mangle]
pub unsafe extern "C" fn rapidpdf_get_outline(
    doc: *mut Document,
    out: *mut *mut COutlineItem,
    count: *mut usize,
) -> c_int {
    catch_unwind(AssertUnwindSafe(|| {
        if out.is_null() || count.is_null() {
            return -1;
        }
        *out = std::ptr::null_mut();
        *count = 0;
        let Some(doc) = doc_mut(doc) else {
            return -1;
        };
        let items = match crate::outline::outline(doc) {
            Ok(items) => items,
            Err(_) => return -1,
        };

        let records: Vec<COutlineItem> = items
            .into_iter()
            .map(|item| {
                let (title, title_len) = leak_string(item.title);
                COutlineItem {
                    title,
                    title_len,
                    page: item.page.map(|p| p as c_int).unwrap_or(-1),
                    level: item.level as c_int,
                }
            })
            .collect();
        *out = leak_records(records, count);
        0
    }))
    .unwrap_or(-1)
}

/// Release an outline array including its owned strings.
///
/// # Safety
///
/// `ptr`/`count` must come from [`rapidpdf_get_outline`], freed once.
#[no_mangle]
pub unsafe extern "C" fn rapidpdf_free_outline(ptr: *mut COutlineItem, count: usize) {
    let _ = catch_unwind(AssertUnwindSafe(|| {
        for item in take_records(ptr, count) {
            free_leaked(item.title as *mut u8, item.title_len);
        }
    }));
}

// ---- search ----------------------------------------------------------------

/// ASCII case-insensitive search. Returns 0 with results, -1 on failure.
///
/// # Safety
///
/// `doc` must be a valid handle or null; `query` must point to `query_len`
/// readable bytes; out pointers writable.
#[no_mangle]
pub unsafe extern "C" fn rapidpdf_search(
    doc: *mut Document,
    query: *const c_char,
    query_len: usize,
    out: *mut *mut CSearchResult,
    count: *mut usize,
) -> c_int {
    catch_unwind(AssertUnwindSafe(|| {
        if out.is_null() || count.is_null() || query.is_null() {
            return -1;
        }
        *out = std::ptr::null_mut();
        *count = 0;
        let Some(doc) = doc_mut(doc) else {
            return -1;
        };
        let query_bytes = std::slice::from_raw_parts(query as *const u8, query_len);
        let Ok(query) = std::str::from_utf8(query_bytes) else {
            return -1;
        };

        let hits = match crate::extractors::search(doc, query) {
            Ok(hits) => hits,
            Err(_) => return -1,
        };

        let records: Vec<CSearchResult> = hits
            .into_iter()
            .map(|hit| {
                let (context, context_len) = leak_string(hit.context);
                CSearchResult {
                    page: hit.page as c_int,
                    offset: hit.offset,
                    context,
                    context_len,
                }
            })
            .collect();
        *out = leak_records(records, count);
        0
    }))
    .unwrap_or(-1)
}

/// Release a search result array including its owned strings.
///
/// # Safety
///
/// `ptr`/`count` must come from [`rapidpdf_search`], freed once.
#[no_mangle]
pub unsafe extern "C" fn rapidpdf_free_search_results(ptr: *mut CSearchResult, count: usize) {
    let _ = catch_unwind(AssertUnwindSafe(|| {
        for hit in take_records(ptr, count) {
            free_leaked(hit.context as *mut u8, hit.context_len);
        }
    }));
}

// ---- page labels -----------------------------------------------------------

/// The page's label, or null when the document defines none.
///
/// # Safety
///
/// Same contract as [`rapidpdf_extract_page`].
#[no_mangle]
pub unsafe extern "C" fn rapidpdf_get_page_label(
    doc: *mut Document,
    page: c_int,
    out_len: *mut usize,
) -> *mut u8 {
    catch_unwind(AssertUnwindSafe(|| {
        if !out_len.is_null() {
            *out_len = 0;
        }
        let Some(doc) = doc_mut(doc) else {
            return std::ptr::null_mut();
        };
        if page < 0 {
            return std::ptr::null_mut();
        }
        match crate::extractors::page_label(doc, page as usize) {
            Ok(Some(label)) => leak_bytes(label.into_bytes(), out_len),
            _ => std::ptr::null_mut(),
        }
    }))
    .unwrap_or(std::ptr::null_mut())
}

// ---- links -----------------------------------------------------------------

/// Link annotations of one page. Returns 0 with results, -1 on failure.
///
/// # Safety
///
/// `doc` must be a valid handle or null; out pointers writable.
#[no_mangle]
pub unsafe extern "C" fn rapidpdf_get_page_links(
    doc: *mut Document,
    page: c_int,
    out: *mut *mut CLink,
    count: *mut usize,
) -> c_int {
    catch_unwind(AssertUnwindSafe(|| {
        if out.is_null() || count.is_null() {
            return -1;
        }
        *out = std::ptr::null_mut();
        *count = 0;
        let Some(doc) = doc_mut(doc) else {
            return -1;
        };
        if page < 0 {
            return -1;
        }
        let links = match crate::extractors::page_links(doc, page as usize) {
            Ok(links) => links,
            Err(_) => return -1,
        };

        let records: Vec<CLink> = links
            .into_iter()
            .map(|link| {
                let (uri, uri_len) = match link.uri {
                    Some(u) => leak_string(u),
                    None => (std::ptr::null_mut(), 0),
                };
                CLink {
                    x0: link.rect[0],
                    y0: link.rect[1],
                    x1: link.rect[2],
                    y1: link.rect[3],
                    uri,
                    uri_len,
                    dest_page: link.dest_page.map(|p| p as c_int).unwrap_or(-1),
                }
            })
            .collect();
        *out = leak_records(records, count);
        0
    }))
    .unwrap_or(-1)
}

/// Release a link array including its owned strings.
///
/// # Safety
///
/// `ptr`/`count` must come from [`rapidpdf_get_page_links`], freed once.
#[no_mangle]
pub unsafe extern "C" fn rapidpdf_free_links(ptr: *mut CLink, count: usize) {
    let _ = catch_unwind(AssertUnwindSafe(|| {
        for link in take_records(ptr, count) {
            free_leaked(link.uri as *mut u8, link.uri_len);
        }
    }));
}

// ---- images ----------------------------------------------------------------

/// Image placements of one page. Returns 0 with results, -1 on failure.
///
/// # Safety
///
/// `doc` must be a valid handle or null; out pointers writable.
#[no_mangle]
pub unsafe extern "C" fn rapidpdf_get_page_images(
    doc: *mut Document,
    page: c_int,
    out: *mut *mut CImageInfo,
    count: *mut usize,
) -> c_int {
    catch_unwind(AssertUnwindSafe(|| {
        if out.is_null() || count.is_null() {
            return -1;
        }
        *out = std::ptr::null_mut();
        *count = 0;
        let Some(doc) = doc_mut(doc) else {
            return -1;
        };
        if page < 0 {
            return -1;
        }
        let images = match crate::extractors::page_images(doc, page as usize) {
            Ok(images) => images,
            Err(_) => return -1,
        };

        let records: Vec<CImageInfo> = images
            .into_iter()
            .map(|image| CImageInfo {
                x0: image.rect[0],
                y0: image.rect[1],
                x1: image.rect[2],
                y1: image.rect[3],
                width: image.width,
                height: image.height,
            })
            .collect();
        *out = leak_records(records, count);
        0
    }))
    .unwrap_or(-1)
}

/// Release an image array.
///
/// # Safety
///
/// `ptr`/`count` must come from [`rapidpdf_get_page_images`], freed once.
#[no_mangle]
pub unsafe extern "C" fn rapidpdf_free_images(ptr: *mut CImageInfo, count: usize) {
    let _ = catch_unwind(AssertUnwindSafe(|| {
        drop(take_records(ptr, count));
    }));
}

// ---- form fields -----------------------------------------------------------

/// All terminal form fields. Returns 0 with results, -1 on failure.
///
/// # Safety
///
/// `doc` must be a valid handle or null; out pointers writable.
#[no_mangle]
pub unsafe extern "C" fn rapidpdf_get_form_fields(
    doc: *mut Document,
    out: *mut *mut CFormField,
    count: *mut usize,
) -> c_int {
    catch_unwind(AssertUnwindSafe(|| {
        if out.is_null() || count.is_null() {
            return -1;
        }
        *out = std::ptr::null_mut();
        *count = 0;
        let Some(doc) = doc_mut(doc) else {
            return -1;
        };
        let fields = match crate::extractors::form_fields(doc) {
            Ok(fields) => fields,
            Err(_) => return -1,
        };

        let records: Vec<CFormField> = fields
            .into_iter()
            .map(|field| {
                let (name, name_len) = leak_string(field.name);
                let (value, value_len) = match field.value {
                    Some(v) => leak_string(v),
                    None => (std::ptr::null_mut(), 0),
                };
                let rect = field.rect.unwrap_or([0.0; 4]);
                CFormField {
                    name,
                    name_len,
                    value,
                    value_len,
                    field_type: field.field_type.code(),
                    has_rect: field.rect.is_some(),
                    x0: rect[0],
                    y0: rect[1],
                    x1: rect[2],
                    y1: rect[3],
                }
            })
            .collect();
        *out = leak_records(records, count);
        0
    }))
    .unwrap_or(-1)
}

/// Release a form field array including its owned strings.
///
/// # Safety
///
/// `ptr`/`count` must come from [`rapidpdf_get_form_fields`], freed once.
#[no_mangle]
pub unsafe extern "C" fn rapidpdf_free_form_fields(ptr: *mut CFormField, count: usize) {
    let _ = catch_unwind(AssertUnwindSafe(|| {
        for field in take_records(ptr, count) {
            free_leaked(field.name as *mut u8, field.name_len);
            free_leaked(field.value as *mut u8, field.value_len);
        }
    }));
}
