//! Cross-reference resolution.
//!
//! The xref machinery maps object numbers to byte offsets (or to slots in
//! compressed object streams), enabling random access into the file image.
//! Both classic tables (PDF 1.0-1.4) and cross-reference streams (PDF 1.5+)
//! are handled, and incremental-update `/Prev` chains are merged so that
//! newer sections shadow older ones.

use crate::error::{Error, Result};
use crate::lexer::{is_whitespace, token, Token};
use crate::object::{Dict, Object};
use crate::parser::parse_object;
use std::collections::{HashMap, HashSet};

/// How many bytes of file tail are scanned for `startxref`.
const STARTXREF_WINDOW: usize = 1024;

/// Hard cap on the `/Prev` chain length.
const MAX_PREV_DEPTH: usize = 32;

/// Cross-reference entry kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XRefEntryKind {
    /// Free-list entry
    Free,
    /// Object stored directly in the file at a byte offset
    InUse,
    /// Object stored inside a compressed object stream
    Compressed,
}

/// Cross-reference table entry.
///
/// For `Compressed` entries, `offset` is the containing object stream's
/// object number and `generation` is the index within that stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XRefEntry {
    /// Entry kind
    pub kind: XRefEntryKind,
    /// Byte offset (InUse), next-free number (Free), or container (Compressed)
    pub offset: u64,
    /// Generation (InUse/Free) or index within the object stream (Compressed)
    pub generation: u16,
}

impl XRefEntry {
    /// Entry for an object stored at a byte offset.
    pub fn in_use(offset: u64, generation: u16) -> Self {
        Self {
            kind: XRefEntryKind::InUse,
            offset,
            generation,
        }
    }

    /// Entry for an object inside an object stream.
    pub fn compressed(stream_obj_num: u64, index_in_stream: u16) -> Self {
        Self {
            kind: XRefEntryKind::Compressed,
            offset: stream_obj_num,
            generation: index_in_stream,
        }
    }

    /// Free-list entry.
    pub fn free(next_free: u64, generation: u16) -> Self {
        Self {
            kind: XRefEntryKind::Free,
            offset: next_free,
            generation,
        }
    }
}

/// Merged view of all cross-reference sections.
#[derive(Debug, Default)]
pub struct XRefTable {
    entries: HashMap<u32, XRefEntry>,
    trailer: Option<Dict>,
    encrypted: bool,
}

impl XRefTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an entry by object number.
    pub fn get(&self, object_number: u32) -> Option<&XRefEntry> {
        self.entries.get(&object_number)
    }

    /// Insert an entry.
    pub fn add_entry(&mut self, object_number: u32, entry: XRefEntry) {
        self.entries.insert(object_number, entry);
    }

    /// The trailer dictionary of the newest section, if any.
    pub fn trailer(&self) -> Option<&Dict> {
        self.trailer.as_ref()
    }

    /// Whether any trailer in the chain carried `/Encrypt`.
    pub fn is_encrypted(&self) -> bool {
        self.encrypted
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merge an older section into this table.
    ///
    /// Entries already present (from newer sections) shadow the older ones;
    /// the newest trailer wins.
    fn merge_older(&mut self, older: XRefTable) {
        for (obj_num, entry) in older.entries {
            self.entries.entry(obj_num).or_insert(entry);
        }
        if self.trailer.is_none() {
            self.trailer = older.trailer;
        }
        self.encrypted |= older.encrypted;
    }
}

/// Scan the file tail for `startxref` and return the offset that follows it.
pub fn find_startxref(data: &[u8]) -> Result<u64> {
    let tail_start = data.len().saturating_sub(STARTXREF_WINDOW);
    let tail = &data[tail_start..];

    let keyword = b"startxref";
    let pos = tail
        .windows(keyword.len())
        .rposition(|w| w == keyword)
        .ok_or_else(|| Error::InvalidXref("startxref keyword not found".to_string()))?;

    let mut rest = &tail[pos + keyword.len()..];
    while let Some((&b, tail)) = rest.split_first() {
        if is_whitespace(b) {
            rest = tail;
        } else {
            break;
        }
    }

    let digits_end = rest
        .iter()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(rest.len());
    if digits_end == 0 {
        return Err(Error::InvalidXref("no offset after startxref".to_string()));
    }

    std::str::from_utf8(&rest[..digits_end])
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .ok_or_else(|| Error::InvalidXref("unparseable startxref offset".to_string()))
}

/// Parse the complete cross-reference view of a document.
///
/// Starts at the `startxref` offset and follows `/Prev` pointers, merging
/// sections newest-first. A visited-offset set guards against cycles and the
/// chain depth is capped.
pub fn parse_xref_chain(data: &[u8]) -> Result<XRefTable> {
    let start = find_startxref(data)?;

    let mut table = XRefTable::new();
    let mut visited: HashSet<u64> = HashSet::new();
    let mut next = Some(start);
    let mut depth = 0usize;

    while let Some(offset) = next {
        if !visited.insert(offset) {
            log::warn!("circular /Prev chain at offset {}, aborting chain", offset);
            break;
        }
        depth += 1;
        if depth > MAX_PREV_DEPTH {
            log::warn!("/Prev chain exceeds {} sections, aborting chain", MAX_PREV_DEPTH);
            break;
        }

        let section = parse_section(data, offset)?;
        next = section
            .trailer()
            .and_then(|t| t.get("Prev"))
            .and_then(|o| o.as_integer())
            .filter(|v| *v >= 0)
            .map(|v| v as u64);

        table.merge_older(section);
    }

    if table.trailer.is_none() {
        return Err(Error::InvalidXref("no trailer dictionary found".to_string()));
    }

    Ok(table)
}

/// Parse one cross-reference section, classic or stream.
fn parse_section(data: &[u8], offset: u64) -> Result<XRefTable> {
    let offset = offset as usize;
    if offset >= data.len() {
        return Err(Error::InvalidXref(format!(
            "xref offset {} beyond end of file ({} bytes)",
            offset,
            data.len()
        )));
    }

    let region = &data[offset..];
    let (after_ws, _) = crate::lexer::skip_ws(region)
        .map_err(|_| Error::InvalidXref("unreadable xref section".to_string()))?;

    if after_ws.starts_with(b"xref") {
        log::debug!("classic xref table at offset {}", offset);
        parse_classic_table(after_ws)
    } else if after_ws.first().is_some_and(|b| b.is_ascii_digit()) {
        log::debug!("xref stream at offset {}", offset);
        parse_xref_stream(after_ws)
    } else {
        Err(Error::InvalidXref(format!("no xref data at offset {}", offset)))
    }
}

/// Parse a classic cross-reference table.
///
/// ```text
/// xref
/// 0 3
/// 0000000000 65535 f
/// 0000000018 00000 n
/// 0000000154 00000 n
/// trailer
/// << /Size 3 /Root 1 0 R >>
/// ```
///
/// Parsing is lenient about entry padding: each entry is read as two
/// integers and a flag rather than a fixed 20-byte record, and malformed
/// entries become free placeholders so subsequent numbering stays aligned.
fn parse_classic_table(input: &[u8]) -> Result<XRefTable> {
    let mut table = XRefTable::new();
    let mut rest = &input[4..]; // past "xref"

    loop {
        let (after_ws, _) = crate::lexer::skip_ws(rest)
            .map_err(|_| Error::InvalidXref("truncated xref table".to_string()))?;
        rest = after_ws;

        if rest.starts_with(b"trailer") {
            rest = &rest[b"trailer".len()..];
            break;
        }
        if rest.is_empty() {
            log::warn!("xref table ended without trailer keyword");
            return Err(Error::InvalidXref("xref table without trailer".to_string()));
        }

        // subsection header: first count
        let (r, first) = expect_integer(rest)?;
        let (r, count) = expect_integer(r)?;
        rest = r;

        if !(0..=8_000_000).contains(&count) {
            return Err(Error::InvalidXref(format!("implausible subsection count {}", count)));
        }
        let first = first.max(0) as u32;

        for i in 0..count as u32 {
            match parse_classic_entry(rest) {
                Ok((r, entry)) => {
                    table.add_entry(first + i, entry);
                    rest = r;
                },
                Err(_) => {
                    // keep numbering aligned with a free placeholder
                    log::warn!("malformed xref entry for object {}", first + i);
                    table.add_entry(first + i, XRefEntry::free(0, 65535));
                    rest = skip_line(rest);
                },
            }
        }
    }

    // trailer dictionary
    let (_, obj) = parse_object(rest)
        .map_err(|_| Error::InvalidXref("unparseable trailer dictionary".to_string()))?;
    match obj {
        Object::Dictionary(dict) => {
            table.encrypted = dict.contains_key("Encrypt");
            table.trailer = Some(dict);
            Ok(table)
        },
        other => Err(Error::InvalidXref(format!(
            "trailer is {} instead of a dictionary",
            other.type_name()
        ))),
    }
}

/// One classic entry: `offset(10) generation(5) f|n`.
fn parse_classic_entry(input: &[u8]) -> Result<(&[u8], XRefEntry)> {
    let (rest, offset) = expect_integer(input)?;
    let (rest, generation) = expect_integer(rest)?;
    let (rest, _) = crate::lexer::skip_ws(rest)
        .map_err(|_| Error::InvalidXref("truncated xref entry".to_string()))?;

    let flag = *rest
        .first()
        .ok_or_else(|| Error::InvalidXref("truncated xref entry".to_string()))?;
    let rest = &rest[1..];

    let offset = offset.max(0) as u64;
    let generation = generation.clamp(0, u16::MAX as i64) as u16;

    let entry = match flag {
        b'n' | b'N' => XRefEntry::in_use(offset, generation),
        b'f' | b'F' => XRefEntry::free(offset, generation),
        other => {
            log::warn!("invalid xref entry flag {:?}, treating as free", other as char);
            XRefEntry::free(offset, generation)
        },
    };

    Ok((rest, entry))
}

fn expect_integer(input: &[u8]) -> Result<(&[u8], i64)> {
    match token(input) {
        Ok((rest, Token::Integer(n))) => Ok((rest, n)),
        _ => Err(Error::InvalidXref("expected integer".to_string())),
    }
}

fn skip_line(input: &[u8]) -> &[u8] {
    match input.iter().position(|&b| b == b'\n' || b == b'\r') {
        Some(pos) => &input[pos + 1..],
        None => &input[input.len()..],
    }
}

/// Parse a cross-reference stream (`/Type /XRef`).
///
/// The stream dictionary doubles as the trailer. `/W [w1 w2 w3]` gives the
/// big-endian field widths; `/Index [first count ...]` defaults to
/// `[0 /Size]`. Field 1 defaults to "in use" when `w1 == 0`.
fn parse_xref_stream(input: &[u8]) -> Result<XRefTable> {
    // indirect object wrapper: num gen obj
    let (rest, _num) = expect_integer(input)?;
    let (rest, _gen) = expect_integer(rest)?;
    let (rest, tok) = token(rest)
        .map_err(|e| Error::InvalidXref(format!("bad xref stream object header: {}", e)))?;
    if tok != Token::ObjStart {
        return Err(Error::InvalidXref("expected obj keyword before xref stream".to_string()));
    }

    let (_rest, obj) = parse_object(rest)
        .map_err(|e| Error::InvalidXref(format!("unparseable xref stream object: {}", e)))?;

    let (dict, decoded) = match &obj {
        Object::Stream { dict, .. } => {
            if let Some(type_name) = dict.get("Type").and_then(|o| o.as_name()) {
                if type_name != "XRef" {
                    return Err(Error::InvalidXref(format!(
                        "expected /Type /XRef, got /{}",
                        type_name
                    )));
                }
            }
            let decoded = obj
                .decode_stream_data()
                .map_err(|e| Error::InvalidXref(format!("xref stream decode failed: {}", e)))?;
            (dict.clone(), decoded)
        },
        other => {
            return Err(Error::InvalidXref(format!(
                "xref offset points at {} instead of a stream",
                other.type_name()
            )));
        },
    };

    let w = dict
        .get("W")
        .and_then(|o| o.as_array())
        .ok_or_else(|| Error::InvalidXref("missing /W array".to_string()))?;
    if w.len() != 3 {
        return Err(Error::InvalidXref(format!("/W has {} fields, expected 3", w.len())));
    }
    let w1 = w[0].as_integer().unwrap_or(0).max(0) as usize;
    let w2 = w[1].as_integer().unwrap_or(0).max(0) as usize;
    let w3 = w[2].as_integer().unwrap_or(0).max(0) as usize;
    let entry_size = w1 + w2 + w3;
    if entry_size == 0 || entry_size > 24 {
        return Err(Error::InvalidXref(format!("implausible /W widths {}+{}+{}", w1, w2, w3)));
    }

    let size = dict
        .get("Size")
        .and_then(|o| o.as_integer())
        .ok_or_else(|| Error::InvalidXref("missing /Size".to_string()))? as u32;

    let index_ranges: Vec<(u32, u32)> = match dict.get("Index").and_then(|o| o.as_array()) {
        Some(index) => index
            .chunks(2)
            .filter_map(|pair| {
                let first = pair.first()?.as_integer()?;
                let count = pair.get(1)?.as_integer()?;
                Some((first.max(0) as u32, count.max(0) as u32))
            })
            .collect(),
        None => vec![(0, size)],
    };

    let mut table = XRefTable::new();
    let mut pos = 0usize;

    'ranges: for (first, count) in index_ranges {
        for i in 0..count {
            if pos + entry_size > decoded.len() {
                log::warn!("xref stream data truncated at entry {} {}", first, i);
                break 'ranges;
            }
            let entry_data = &decoded[pos..pos + entry_size];
            pos += entry_size;

            let kind = if w1 > 0 { read_be(&entry_data[..w1]) } else { 1 };
            let field2 = read_be(&entry_data[w1..w1 + w2]);
            let field3 = read_be(&entry_data[w1 + w2..]);

            let entry = match kind {
                0 => XRefEntry::free(field2, field3 as u16),
                1 => XRefEntry::in_use(field2, field3 as u16),
                2 => XRefEntry::compressed(field2, field3 as u16),
                other => {
                    log::warn!("unknown xref stream entry type {}, skipping", other);
                    continue;
                },
            };
            table.add_entry(first + i, entry);
        }
    }

    table.encrypted = dict.contains_key("Encrypt");
    table.trailer = Some(dict);
    Ok(table)
}

/// Big-endian integer from up to 8 bytes.
fn read_be(bytes: &[u8]) -> u64 {
    let mut result: u64 = 0;
    for &byte in bytes {
        result = (result << 8) | byte as u64;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_startxref() {
        let pdf = b"%PDF-1.4\ncontent here\nstartxref\n50\n%%EOF";
        assert_eq!(find_startxref(pdf).unwrap(), 50);
    }

    #[test]
    fn test_find_startxref_missing() {
        assert!(find_startxref(b"%PDF-1.4\nno marker here").is_err());
    }

    #[test]
    fn test_find_startxref_cr_line_endings() {
        let pdf = b"content\rstartxref\r173\r%%EOF\r";
        assert_eq!(find_startxref(pdf).unwrap(), 173);
    }

    #[test]
    fn test_find_startxref_takes_last_marker() {
        let pdf = b"startxref\n10\n%%EOF\nstartxref\n99\n%%EOF";
        assert_eq!(find_startxref(pdf).unwrap(), 99);
    }

    #[test]
    fn test_parse_classic_single_subsection() {
        let data = b"xref\n0 3\n0000000000 65535 f \n0000000018 00000 n \n0000000154 00000 n \ntrailer\n<< /Size 3 >>";
        let table = parse_classic_table(data).unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.get(0).unwrap().kind, XRefEntryKind::Free);
        let entry1 = table.get(1).unwrap();
        assert_eq!(entry1.kind, XRefEntryKind::InUse);
        assert_eq!(entry1.offset, 18);
        assert_eq!(table.get(2).unwrap().offset, 154);
        assert_eq!(
            table.trailer().unwrap().get("Size").unwrap().as_integer(),
            Some(3)
        );
    }

    #[test]
    fn test_parse_classic_multiple_subsections() {
        let data = b"xref\n0 2\n0000000000 65535 f \n0000000018 00000 n \n5 2\n0000000200 00000 n \n0000000300 00000 n \ntrailer\n<< /Size 7 >>";
        let table = parse_classic_table(data).unwrap();

        assert_eq!(table.len(), 4);
        assert_eq!(table.get(5).unwrap().offset, 200);
        assert_eq!(table.get(6).unwrap().offset, 300);
        assert!(table.get(2).is_none());
        assert!(table.get(4).is_none());
    }

    #[test]
    fn test_parse_classic_invalid_flag_becomes_free() {
        let data = b"xref\n0 1\n0000000000 65535 x \ntrailer\n<< /Size 1 >>";
        let table = parse_classic_table(data).unwrap();
        assert_eq!(table.get(0).unwrap().kind, XRefEntryKind::Free);
    }

    #[test]
    fn test_parse_classic_excessive_count() {
        let data = b"xref\n0 999999999\ntrailer\n<< >>";
        assert!(parse_classic_table(data).is_err());
    }

    #[test]
    fn test_parse_classic_detects_encrypt() {
        let data =
            b"xref\n0 1\n0000000000 65535 f \ntrailer\n<< /Size 1 /Encrypt 9 0 R >>";
        let table = parse_classic_table(data).unwrap();
        assert!(table.is_encrypted());
    }

    #[test]
    fn test_parse_chain_with_prev() {
        // Older section at offset 0, newer at some offset; newer redefines
        // object 1 and points back via /Prev.
        let mut pdf = Vec::new();
        pdf.extend_from_slice(
            b"xref\n0 2\n0000000000 65535 f \n0000000100 00000 n \ntrailer\n<< /Size 2 >>\n",
        );
        let newer_offset = pdf.len();
        pdf.extend_from_slice(
            b"xref\n1 1\n0000000999 00000 n \ntrailer\n<< /Size 2 /Prev 0 >>\n",
        );
        pdf.extend_from_slice(format!("startxref\n{}\n%%EOF", newer_offset).as_bytes());

        let table = parse_xref_chain(&pdf).unwrap();
        // newer entry shadows the older one
        assert_eq!(table.get(1).unwrap().offset, 999);
        // free-list head only in the older section, still visible
        assert_eq!(table.get(0).unwrap().kind, XRefEntryKind::Free);
    }

    #[test]
    fn test_parse_chain_cycle_aborts() {
        // /Prev pointing at itself must terminate
        let mut pdf = Vec::new();
        pdf.extend_from_slice(
            b"xref\n0 1\n0000000000 65535 f \ntrailer\n<< /Size 1 /Prev 0 >>\n",
        );
        pdf.extend_from_slice(b"startxref\n0\n%%EOF");

        let table = parse_xref_chain(&pdf).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_parse_xref_stream_uncompressed() {
        // Hand-built xref stream: 3 entries, W [1 2 1], no filter.
        // entries: (1, 0, 0) free-ish head; (1, 20, 0); (2, 7, 1)
        let payload: &[u8] = &[
            0, 0, 0, 255, // free: next 0 gen 255
            1, 0, 20, 0, // in use at offset 20
            2, 0, 7, 1, // compressed in stream 7, index 1
        ];
        let mut data = Vec::new();
        data.extend_from_slice(b"5 0 obj\n<< /Type /XRef /Size 3 /W [1 2 1] /Length 12 >>\nstream\n");
        data.extend_from_slice(payload);
        data.extend_from_slice(b"\nendstream\nendobj");

        let table = parse_xref_stream(&data).unwrap();
        assert_eq!(table.get(0).unwrap().kind, XRefEntryKind::Free);

        let entry1 = table.get(1).unwrap();
        assert_eq!(entry1.kind, XRefEntryKind::InUse);
        assert_eq!(entry1.offset, 20);

        let entry2 = table.get(2).unwrap();
        assert_eq!(entry2.kind, XRefEntryKind::Compressed);
        assert_eq!(entry2.offset, 7);
        assert_eq!(entry2.generation, 1);
    }

    #[test]
    fn test_parse_xref_stream_with_index() {
        // /Index [10 2]: entries describe objects 10 and 11
        let payload: &[u8] = &[1, 0, 50, 0, 1, 0, 99, 0];
        let mut data = Vec::new();
        data.extend_from_slice(
            b"5 0 obj\n<< /Type /XRef /Size 12 /Index [10 2] /W [1 2 1] /Length 8 >>\nstream\n",
        );
        data.extend_from_slice(payload);
        data.extend_from_slice(b"\nendstream\nendobj");

        let table = parse_xref_stream(&data).unwrap();
        assert_eq!(table.get(10).unwrap().offset, 50);
        assert_eq!(table.get(11).unwrap().offset, 99);
        assert!(table.get(0).is_none());
    }

    #[test]
    fn test_parse_xref_stream_zero_width_type_defaults_in_use() {
        // W [0 2 1]: type field absent, defaults to in-use
        let payload: &[u8] = &[0, 30, 0];
        let mut data = Vec::new();
        data.extend_from_slice(
            b"5 0 obj\n<< /Type /XRef /Size 1 /W [0 2 1] /Length 3 >>\nstream\n",
        );
        data.extend_from_slice(payload);
        data.extend_from_slice(b"\nendstream\nendobj");

        let table = parse_xref_stream(&data).unwrap();
        assert_eq!(table.get(0).unwrap().kind, XRefEntryKind::InUse);
        assert_eq!(table.get(0).unwrap().offset, 30);
    }

    #[test]
    fn test_read_be() {
        assert_eq!(read_be(&[0x01]), 1);
        assert_eq!(read_be(&[0x01, 0x00]), 256);
        assert_eq!(read_be(&[0xFF, 0xFF]), 65535);
        assert_eq!(read_be(&[]), 0);
    }
}
