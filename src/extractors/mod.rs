//! Auxiliary extraction surfaces built on the core primitives.
//!
//! None of these touch the hot text path; they reuse object resolution,
//! the content tokenizer, and the per-page text cacheable through the
//! assembler.

pub mod forms;
pub mod images;
pub mod links;
pub mod page_labels;
pub mod search;

pub use forms::{form_fields, FieldType, FormField};
pub use images::{page_images, ImagePlacement};
pub use links::{page_links, Link};
pub use page_labels::page_label;
pub use search::{search, SearchHit};
