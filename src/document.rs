//! The document: byte window, xref view, caches, and the extraction API.
//!
//! A `Document` is single-threaded with respect to its caches; use one
//! `Document` per thread for parallel work. All operations are synchronous
//! and perform no I/O after open.

use crate::content::TextSpan;
use crate::error::{Error, ErrorKind, ErrorPolicy, ErrorRecord, ErrorSink, Result};
use crate::fonts::FontEncoding;
use crate::lexer::{token, Token};
use crate::object::{Dict, Object, ObjectRef};
use crate::pages::Page;
use crate::parser::parse_object_with;
use crate::source::ByteSource;
use crate::structure::StructureTree;
use crate::xref::{XRefEntryKind, XRefTable};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// Reference-chasing cap for `resolve`.
const MAX_RESOLVE_DEPTH: u32 = 32;

/// How the assembler orders text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtractMode {
    /// Structure-tree reading order with stream-order fallback.
    #[default]
    Accuracy,
    /// Stream order for every page.
    Fast,
}

/// Extraction knobs.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Reading-order mode.
    pub mode: ExtractMode,
    /// Minimum `len(structured) / len(stream)` for the structured result to
    /// be accepted (partially-tagged documents fail this check).
    pub structured_coverage_ratio: f64,
    /// Error-sink policy.
    pub error_policy: ErrorPolicy,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            mode: ExtractMode::Accuracy,
            structured_coverage_ratio: 0.6,
            error_policy: ErrorPolicy::Default,
        }
    }
}

/// Geometry of one page as reported to callers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageInfo {
    /// Width in points
    pub width: f64,
    /// Height in points
    pub height: f64,
    /// Rotation, one of 0/90/180/270
    pub rotation: i32,
}

/// Document information dictionary fields, text-decoded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    /// `/Title`
    pub title: Option<String>,
    /// `/Author`
    pub author: Option<String>,
    /// `/Subject`
    pub subject: Option<String>,
    /// `/Keywords`
    pub keywords: Option<String>,
    /// `/Creator`
    pub creator: Option<String>,
    /// `/Producer`
    pub producer: Option<String>,
    /// `/CreationDate`
    pub creation_date: Option<String>,
    /// `/ModDate`
    pub mod_date: Option<String>,
}

/// An open PDF document.
pub struct Document {
    source: ByteSource,
    version: (u8, u8),
    xref: XRefTable,
    pages: Vec<Page>,
    object_cache: HashMap<u32, Object>,
    objstm_cache: HashMap<u32, Arc<HashMap<u32, Object>>>,
    font_by_obj: HashMap<u32, Arc<FontEncoding>>,
    font_by_page_name: HashMap<(usize, String), Arc<FontEncoding>>,
    structure: Option<Option<StructureTree>>,
    mcid_order_cache: HashMap<usize, Arc<Vec<i32>>>,
    sink: ErrorSink,
    options: ExtractOptions,
}

impl Document {
    /// Open a file by memory-mapping it.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_options(path, ExtractOptions::default())
    }

    /// Open a file with explicit options.
    pub fn open_with_options(path: impl AsRef<Path>, options: ExtractOptions) -> Result<Self> {
        Self::from_source(ByteSource::map_file(path)?, options)
    }

    /// Open from bytes, copying them into the document.
    pub fn open_memory(data: &[u8]) -> Result<Self> {
        Self::from_source(ByteSource::copied(data), ExtractOptions::default())
    }

    /// Open from bytes with explicit options.
    pub fn open_memory_with_options(data: &[u8], options: ExtractOptions) -> Result<Self> {
        Self::from_source(ByteSource::copied(data), options)
    }

    /// Open over caller-lent memory without copying.
    ///
    /// # Safety
    ///
    /// The memory must stay valid and unmodified until the document is
    /// dropped.
    pub unsafe fn open_memory_unsafe(ptr: *const u8, len: usize) -> Result<Self> {
        Self::from_source(ByteSource::borrowed(ptr, len), ExtractOptions::default())
    }

    fn from_source(source: ByteSource, options: ExtractOptions) -> Result<Self> {
        let mut sink = ErrorSink::new(options.error_policy);

        let version = match parse_header(source.bytes()) {
            Some(v) => v,
            None => {
                sink.report(ErrorKind::InvalidHeader, 0, "missing %PDF- header")?;
                (1, 4)
            },
        };

        let xref = crate::xref::parse_xref_chain(source.bytes())?;
        if xref.is_encrypted() {
            sink.report(ErrorKind::Encrypted, 0, "document trailer carries /Encrypt")?;
        }

        let mut doc = Self {
            source,
            version,
            xref,
            pages: Vec::new(),
            object_cache: HashMap::new(),
            objstm_cache: HashMap::new(),
            font_by_obj: HashMap::new(),
            font_by_page_name: HashMap::new(),
            structure: None,
            mcid_order_cache: HashMap::new(),
            sink,
            options,
        };

        doc.pages = crate::pages::flatten_page_tree(&mut doc)?;
        Ok(doc)
    }

    /// Header version `(major, minor)`.
    pub fn version(&self) -> (u8, u8) {
        self.version
    }

    /// Whether any trailer in the update chain carries `/Encrypt`.
    pub fn is_encrypted(&self) -> bool {
        self.xref.is_encrypted()
    }

    /// Number of pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// A flattened page leaf.
    pub fn page(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }

    /// All flattened pages.
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// The active extraction options.
    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Errors recorded so far.
    pub fn errors(&self) -> &[ErrorRecord] {
        self.sink.records()
    }

    /// The newest trailer dictionary.
    pub fn trailer(&self) -> Option<&Dict> {
        self.xref.trailer()
    }

    pub(crate) fn sink_report(
        &mut self,
        kind: ErrorKind,
        offset: usize,
        message: impl Into<String>,
    ) -> Result<()> {
        self.sink.report(kind, offset, message)
    }

    /// Width, height, and rotation for a page.
    pub fn page_info(&self, index: usize) -> Option<PageInfo> {
        self.pages.get(index).map(|p| PageInfo {
            width: p.width(),
            height: p.height(),
            rotation: p.rotation,
        })
    }

    /// Resolve `(num, gen)` to its object, consulting the cache first.
    pub fn load_object(&mut self, r: ObjectRef) -> Result<Object> {
        if r.num == 0 {
            return Ok(Object::Null);
        }
        if let Some(obj) = self.object_cache.get(&r.num) {
            return Ok(obj.clone());
        }

        let Some(entry) = self.xref.get(r.num).copied() else {
            self.sink
                .report(ErrorKind::MissingObject, 0, format!("{} not in xref", r))?;
            return Ok(Object::Null);
        };

        let obj = match entry.kind {
            XRefEntryKind::Free => {
                self.sink
                    .report(ErrorKind::MissingObject, 0, format!("{} is on the free list", r))?;
                Object::Null
            },
            XRefEntryKind::InUse => self.parse_object_at(entry.offset as usize, r)?,
            XRefEntryKind::Compressed => {
                let container = entry.offset as u32;
                match self.object_stream(container) {
                    Ok(objects) => match objects.get(&r.num) {
                        Some(obj) => obj.clone(),
                        None => {
                            self.sink.report(
                                ErrorKind::MissingObject,
                                0,
                                format!("{} absent from object stream {}", r, container),
                            )?;
                            Object::Null
                        },
                    },
                    Err(e) => {
                        self.sink.report(
                            ErrorKind::InvalidStream,
                            0,
                            format!("object stream {} unusable: {}", container, e),
                        )?;
                        Object::Null
                    },
                }
            },
        };

        self.object_cache.insert(r.num, obj.clone());
        Ok(obj)
    }

    /// Follow reference chains until a direct object (depth-capped).
    pub fn resolve(&mut self, obj: &Object) -> Result<Object> {
        let mut current = obj.clone();
        for _ in 0..MAX_RESOLVE_DEPTH {
            match current {
                Object::Reference(r) => current = self.load_object(r)?,
                other => return Ok(other),
            }
        }
        Err(Error::RecursionLimitExceeded(MAX_RESOLVE_DEPTH))
    }

    /// The catalog (`/Root`) dictionary object.
    pub fn catalog(&mut self) -> Result<Object> {
        let root = self
            .xref
            .trailer()
            .and_then(|t| t.get("Root"))
            .cloned()
            .ok_or_else(|| Error::InvalidXref("trailer has no /Root".to_string()))?;
        self.resolve(&root)
    }

    /// Document information dictionary, decoded to UTF-8 fields.
    pub fn metadata(&mut self) -> Result<Metadata> {
        let Some(info_entry) = self.xref.trailer().and_then(|t| t.get("Info")).cloned() else {
            return Ok(Metadata::default());
        };
        let info = self.resolve(&info_entry)?;
        let Some(dict) = info.as_dict() else {
            return Ok(Metadata::default());
        };

        let field = |key: &str| {
            dict.get(key)
                .and_then(|o| o.as_string_bytes())
                .map(crate::strings::decode_text_string)
        };

        Ok(Metadata {
            title: field("Title"),
            author: field("Author"),
            subject: field("Subject"),
            keywords: field("Keywords"),
            creator: field("Creator"),
            producer: field("Producer"),
            creation_date: field("CreationDate"),
            mod_date: field("ModDate"),
        })
    }

    /// Parse `num gen obj ... endobj` at a byte offset.
    fn parse_object_at(&mut self, offset: usize, expected: ObjectRef) -> Result<Object> {
        let data = self.source.bytes();
        if offset >= data.len() {
            self.sink.report(
                ErrorKind::SyntaxError,
                offset,
                format!("offset for {} beyond end of file", expected),
            )?;
            return Ok(Object::Null);
        }

        let input = &data[offset..];
        let header = (|| {
            let (rest, num_tok) = token(input).ok()?;
            let (rest, gen_tok) = token(rest).ok()?;
            let (rest, obj_tok) = token(rest).ok()?;
            match (num_tok, gen_tok, obj_tok) {
                (Token::Integer(num), Token::Integer(gen), Token::ObjStart) => {
                    Some((rest, num as u32, gen as u16))
                },
                _ => None,
            }
        })();

        let Some((rest, num, _gen)) = header else {
            self.sink.report(
                ErrorKind::SyntaxError,
                offset,
                format!("no object header for {} at offset {}", expected, offset),
            )?;
            return Ok(Object::Null);
        };
        if num != expected.num {
            log::warn!("xref points {} at object {}", expected, num);
        }

        let body_base = data.len() - rest.len();
        let xref = &self.xref;
        let resolver = move |r: ObjectRef| resolve_length_direct(data, xref, r);

        match parse_object_with(rest, Some(&resolver)) {
            Ok((_, mut obj)) => {
                if let Object::Stream { raw_offset, .. } = &mut obj {
                    *raw_offset += body_base;
                }
                Ok(obj)
            },
            Err(e) => {
                let message = format!("object {} unparseable: {:?}", expected, e);
                self.sink.report(ErrorKind::SyntaxError, offset, message)?;
                Ok(Object::Null)
            },
        }
    }

    /// Load and cache the contents of an object stream.
    fn object_stream(&mut self, container_num: u32) -> Result<Arc<HashMap<u32, Object>>> {
        if let Some(objects) = self.objstm_cache.get(&container_num) {
            return Ok(Arc::clone(objects));
        }
        let container = self.load_object(ObjectRef::new(container_num, 0))?;
        let objects = Arc::new(crate::objstm::parse_object_stream(&container)?);
        self.objstm_cache.insert(container_num, Arc::clone(&objects));
        Ok(objects)
    }

    /// Concatenated, decoded content-stream bytes of a page.
    pub(crate) fn page_content(&mut self, index: usize) -> Result<Vec<u8>> {
        let contents = match self.pages.get(index) {
            Some(page) => page.contents.clone(),
            None => return Err(Error::PageNotFound(index)),
        };
        let Some(contents) = contents else {
            return Ok(Vec::new());
        };

        let resolved = self.resolve(&contents)?;
        let mut out = Vec::new();
        match resolved {
            Object::Array(items) => {
                for item in items {
                    let stream = self.resolve(&item)?;
                    self.append_stream_bytes(&stream, &mut out)?;
                    // streams in a /Contents array are logically one stream
                    out.push(b'\n');
                }
            },
            stream => self.append_stream_bytes(&stream, &mut out)?,
        }
        Ok(out)
    }

    fn append_stream_bytes(&mut self, stream: &Object, out: &mut Vec<u8>) -> Result<()> {
        match stream.decode_stream_data() {
            Ok(data) => {
                out.extend_from_slice(&data);
                Ok(())
            },
            Err(e) => self.sink.report(
                ErrorKind::InvalidStream,
                0,
                format!("content stream undecodable: {}", e),
            ),
        }
    }

    /// Font encoding for a `Tf` resource name, built on first use.
    ///
    /// The authoritative encoding is cached per font object number;
    /// `(page, name)` aliases point at it. Failures degrade to the identity
    /// encoding so text extraction keeps going.
    pub(crate) fn font_encoding(
        &mut self,
        page_index: usize,
        name: &str,
        resources: &Dict,
    ) -> Arc<FontEncoding> {
        let key = (page_index, name.to_string());
        if let Some(encoding) = self.font_by_page_name.get(&key) {
            return Arc::clone(encoding);
        }

        let encoding = match self.build_font_encoding(name, resources) {
            Ok(encoding) => encoding,
            Err(e) => {
                log::warn!("font /{} on page {} unusable: {}", name, page_index, e);
                let _ = self.sink.report(
                    ErrorKind::EncodingError,
                    0,
                    format!("font /{} unusable: {}", name, e),
                );
                Arc::new(FontEncoding::identity())
            },
        };

        self.font_by_page_name.insert(key, Arc::clone(&encoding));
        encoding
    }

    fn build_font_encoding(&mut self, name: &str, resources: &Dict) -> Result<Arc<FontEncoding>> {
        let fonts = resources
            .get("Font")
            .cloned()
            .ok_or_else(|| Error::Encoding("resources carry no /Font".to_string()))?;
        let fonts = self.resolve(&fonts)?;
        let entry = fonts
            .as_dict()
            .and_then(|d| d.get(name))
            .cloned()
            .ok_or_else(|| Error::Encoding(format!("no font named /{}", name)))?;

        // shared font objects get one authoritative encoding
        let obj_num = entry.as_reference().map(|r| r.num);
        if let Some(num) = obj_num {
            if let Some(encoding) = self.font_by_obj.get(&num) {
                return Ok(Arc::clone(encoding));
            }
        }

        let font_obj = self.resolve(&entry)?;
        let dict = font_obj
            .as_dict()
            .cloned()
            .ok_or_else(|| Error::Encoding(format!("font /{} is not a dictionary", name)))?;

        let encoding = Arc::new(crate::fonts::build_encoding(self, &dict)?);
        if let Some(num) = obj_num {
            self.font_by_obj.insert(num, Arc::clone(&encoding));
        }
        Ok(encoding)
    }

    /// Lazily-parsed structure tree (`None` inner value: untagged).
    pub(crate) fn structure_tree(&mut self) -> Result<Option<&StructureTree>> {
        if self.structure.is_none() {
            let parsed = match crate::structure::parse_structure_tree(self) {
                Ok(tree) => tree,
                Err(e) => {
                    log::warn!("structure tree unusable: {}", e);
                    self.sink.report(
                        ErrorKind::SyntaxError,
                        0,
                        format!("structure tree unusable: {}", e),
                    )?;
                    None
                },
            };
            self.structure = Some(parsed);
        }
        Ok(self.structure.as_ref().and_then(|t| t.as_ref()))
    }

    /// Ordered MCID list for a page, from the structure tree.
    ///
    /// `Ok(None)` means the document has no structure tree at all.
    pub(crate) fn mcid_order(&mut self, page_index: usize) -> Result<Option<Arc<Vec<i32>>>> {
        if let Some(order) = self.mcid_order_cache.get(&page_index) {
            return Ok(Some(Arc::clone(order)));
        }

        let page_ref = match self.pages.get(page_index) {
            Some(page) => page.obj_ref,
            None => return Err(Error::PageNotFound(page_index)),
        };

        let Some(tree) = self.structure_tree()? else {
            return Ok(None);
        };

        let order = Arc::new(tree.page_mcid_order(page_ref));
        self.mcid_order_cache.insert(page_index, Arc::clone(&order));
        Ok(Some(order))
    }

    // ---- extraction facade -------------------------------------------------

    /// Extract one page's text in the configured mode.
    pub fn extract_page(&mut self, page_index: usize) -> Result<String> {
        crate::assembler::extract_page_text(self, page_index)
    }

    /// Extract one page's text in an explicit mode, bypassing the
    /// document's configured default.
    pub fn extract_page_with_mode(
        &mut self,
        page_index: usize,
        mode: ExtractMode,
    ) -> Result<String> {
        crate::assembler::extract_page_with_mode(self, page_index, mode)
    }

    /// Extract the whole document, pages separated by form feeds.
    pub fn extract_all(&mut self) -> Result<String> {
        crate::assembler::extract_document_text(self, ExtractMode::Accuracy)
    }

    /// Extract the whole document in stream order (fast mode).
    pub fn extract_all_fast(&mut self) -> Result<String> {
        crate::assembler::extract_document_text(self, ExtractMode::Fast)
    }

    /// Positioned text spans for one page.
    pub fn extract_bounds(&mut self, page_index: usize) -> Result<Vec<TextSpan>> {
        crate::assembler::extract_page_bounds(self, page_index)
    }

    /// Markdown rendering of one page.
    pub fn extract_markdown(&mut self, page_index: usize) -> Result<String> {
        crate::markdown::page_markdown(self, page_index)
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("version", &self.version)
            .field("pages", &self.pages.len())
            .field("cached_objects", &self.object_cache.len())
            .field("encrypted", &self.is_encrypted())
            .finish()
    }
}

/// Find `%PDF-d.d` within the first KiB.
fn parse_header(data: &[u8]) -> Option<(u8, u8)> {
    let window = &data[..data.len().min(1024)];
    let pos = window.windows(5).position(|w| w == b"%PDF-")?;
    let rest = &window[pos + 5..];
    let major = rest.first().filter(|b| b.is_ascii_digit())?;
    let minor = rest.get(2).filter(|b| b.is_ascii_digit())?;
    if rest.get(1) != Some(&b'.') {
        return None;
    }
    Some((major - b'0', minor - b'0'))
}

/// Resolve an indirect `/Length` without touching document caches.
///
/// Reads `num gen obj <integer>` straight from the byte window.
fn resolve_length_direct(data: &[u8], xref: &XRefTable, r: ObjectRef) -> Option<i64> {
    let entry = xref.get(r.num)?;
    if entry.kind != XRefEntryKind::InUse {
        return None;
    }
    let offset = entry.offset as usize;
    if offset >= data.len() {
        return None;
    }
    let input = &data[offset..];
    let (rest, _num) = token(input).ok()?;
    let (rest, _gen) = token(rest).ok()?;
    let (rest, obj_tok) = token(rest).ok()?;
    if obj_tok != Token::ObjStart {
        return None;
    }
    match token(rest).ok()? {
        (_, Token::Integer(n)) => Some(n),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_header() {
        assert_eq!(parse_header(b"%PDF-1.4\nrest"), Some((1, 4)));
        assert_eq!(parse_header(b"%PDF-1.7"), Some((1, 7)));
        // junk before the header within the first KiB is tolerated
        assert_eq!(parse_header(b"\xEF\xBB\xBF%PDF-2.0\n"), Some((2, 0)));
        assert_eq!(parse_header(b"not a pdf"), None);
        assert_eq!(parse_header(b"%PDF-x.y"), None);
    }

    #[test]
    fn test_extract_options_defaults() {
        let options = ExtractOptions::default();
        assert_eq!(options.mode, ExtractMode::Accuracy);
        assert!((options.structured_coverage_ratio - 0.6).abs() < f64::EPSILON);
        assert_eq!(options.error_policy, ErrorPolicy::Default);
    }
}
