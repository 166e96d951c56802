#![allow(clippy::type_complexity)]
#![allow(clippy::too_many_arguments)]

//! # rapidpdf
//!
//! Fast text extraction from PDF 1.x documents.
//!
//! The read path goes from a byte-addressable file image to logically
//! ordered UTF-8 text without materializing per-character intermediates:
//! cross-reference resolution (classic tables and xref streams, incremental
//! updates), a recursive-descent object parser, lazy object loading with
//! caching, the stream filter pipeline, a page-tree flattener with
//! attribute inheritance, per-font code-to-Unicode decoding (base
//! encodings, `/Differences`, ToUnicode CMaps, Identity CID), and a
//! content-stream interpreter whose three output modes share one operator
//! state machine.
//!
//! Reading order prefers the Tagged-PDF structure tree when its coverage of
//! the page is good enough, falls back to content-stream order, and sorts
//! positioned spans geometrically as a last resort.
//!
//! ## Quick start
//!
//! ```no_run
//! use rapidpdf::Document;
//!
//! # fn main() -> rapidpdf::Result<()> {
//! let mut doc = Document::open("report.pdf")?;
//! println!("{} pages", doc.page_count());
//! let text = doc.extract_page(0)?;
//! println!("{}", text);
//! # Ok(())
//! # }
//! ```
//!
//! Each `Document` is single-threaded with respect to its caches; open one
//! per thread for parallel extraction. A C ABI mirroring this API is
//! exported from [`ffi`] for foreign hosts.

#![warn(missing_docs)]

pub mod error;

// Core read path
pub mod assembler;
pub mod content;
pub mod decoders;
pub mod document;
pub mod lexer;
pub mod object;
pub mod objstm;
pub mod pages;
pub mod parser;
pub mod source;
pub mod strings;
pub mod xref;

// Fonts and logical structure
pub mod fonts;
pub mod structure;

// Auxiliary surfaces
pub mod extractors;
pub mod markdown;
pub mod outline;

// C ABI boundary
pub mod ffi;

pub use content::TextSpan;
pub use document::{Document, ExtractMode, ExtractOptions, Metadata, PageInfo};
pub use error::{Error, ErrorKind, ErrorPolicy, ErrorRecord, Result};
pub use extractors::{FieldType, FormField, ImagePlacement, Link, SearchHit};
pub use object::{Dict, Object, ObjectRef};
pub use outline::OutlineItem;
pub use pages::Page;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(VERSION.starts_with("0."));
    }
}
