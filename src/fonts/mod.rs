//! Per-font code -> Unicode decoding.
//!
//! For each font dictionary a [`FontEncoding`] is built in priority order:
//!
//! 1. `/ToUnicode` CMap (overrides everything),
//! 2. Identity CID mapping for Type0 fonts with `/Encoding /Identity-H|V`,
//! 3. a single-byte base encoding (`WinAnsi`, `MacRoman`, `MacExpert`, or
//!    implicit Standard) patched by `/Differences`.
//!
//! Encodings are shared: the document keeps one authoritative encoding per
//! font object number and aliases it per `(page, resource name)`.

mod base_encodings;
pub mod cmap;
mod glyph_list;

pub use base_encodings::{base_table, BaseEncoding};
pub use glyph_list::glyph_to_unicode;

use crate::document::Document;
use crate::error::Result;
use crate::object::{Dict, Object};
use cmap::ToUnicodeCMap;

/// A font's code -> Unicode view, as needed by the interpreter.
///
/// Exactly one of the two maps is populated: `to_unicode` when the font
/// carries a usable ToUnicode CMap, otherwise `single_byte` for simple
/// fonts. CID fonts without ToUnicode map codes to themselves.
#[derive(Debug, Clone)]
pub struct FontEncoding {
    wmode: u8,
    is_cid: bool,
    single_byte: Option<Box<[Option<char>; 256]>>,
    to_unicode: Option<ToUnicodeCMap>,
}

impl FontEncoding {
    /// Writing mode: 0 horizontal, 1 vertical.
    pub fn wmode(&self) -> u8 {
        self.wmode
    }

    /// Whether codes are two-byte CIDs.
    pub fn is_cid(&self) -> bool {
        self.is_cid
    }

    /// Number of glyphs a string of `len` bytes paints.
    pub fn glyph_count(&self, len: usize) -> usize {
        if self.is_cid {
            len.div_ceil(2)
        } else {
            len
        }
    }

    /// Decode a show-string into `out`.
    ///
    /// Unmappable codes degrade: CID codes fall back to themselves as code
    /// points, single-byte codes to Latin-1. NULs are dropped.
    pub fn decode_into(&self, bytes: &[u8], out: &mut String) {
        if self.is_cid {
            for pair in bytes.chunks(2) {
                let code = if pair.len() == 2 {
                    u16::from_be_bytes([pair[0], pair[1]])
                } else {
                    pair[0] as u16
                };
                match self.to_unicode.as_ref().and_then(|m| m.get(code)) {
                    Some(s) => out.push_str(s),
                    None => {
                        if let Some(ch) = char::from_u32(code as u32).filter(|c| *c != '\0') {
                            out.push(ch);
                        }
                    },
                }
            }
        } else {
            for &b in bytes {
                if let Some(m) = &self.to_unicode {
                    if let Some(s) = m.get(b as u16) {
                        out.push_str(s);
                        continue;
                    }
                }
                if let Some(table) = &self.single_byte {
                    if let Some(ch) = table[b as usize] {
                        out.push(ch);
                        continue;
                    }
                }
                // Latin-1 fallback keeps unmapped printable bytes legible
                if b >= 0x20 {
                    out.push(b as char);
                }
            }
        }
    }

    /// Decode a show-string to a fresh String.
    pub fn decode(&self, bytes: &[u8]) -> String {
        let mut out = String::with_capacity(bytes.len());
        self.decode_into(bytes, &mut out);
        out
    }

    /// Identity fallback used when no font has been selected at all.
    pub fn identity() -> Self {
        let mut table = [None; 256];
        for code in 0x20..=0x7E_u8 {
            table[code as usize] = Some(code as char);
        }
        Self {
            wmode: 0,
            is_cid: false,
            single_byte: Some(Box::new(table)),
            to_unicode: None,
        }
    }
}

/// Build the encoding for one font dictionary.
pub fn build_encoding(doc: &mut Document, font_dict: &Dict) -> Result<FontEncoding> {
    let subtype = font_dict
        .get("Subtype")
        .and_then(|o| o.as_name())
        .unwrap_or("")
        .to_string();
    let is_type0 = subtype == "Type0";

    let encoding_obj = match font_dict.get("Encoding") {
        Some(obj) => Some(doc.resolve(obj)?),
        None => None,
    };

    let mut wmode = 0u8;
    if let Some(enc) = &encoding_obj {
        match enc {
            Object::Name(name) if name.ends_with("-V") => wmode = 1,
            Object::Stream { dict, .. } => {
                if dict.get("WMode").and_then(|o| o.as_integer()) == Some(1) {
                    wmode = 1;
                }
            },
            _ => {},
        }
    }

    // Priority 1: ToUnicode CMap.
    if let Some(tu) = font_dict.get("ToUnicode") {
        let tu = doc.resolve(tu)?;
        if let Object::Stream { .. } = tu {
            match tu.decode_stream_data() {
                Ok(data) => {
                    let parsed = cmap::parse_tounicode(&data);
                    if !parsed.is_empty() {
                        // code width follows the font type; simple fonts
                        // stay single-byte even under a wide codespace
                        return Ok(FontEncoding {
                            wmode,
                            is_cid: is_type0,
                            single_byte: None,
                            to_unicode: Some(parsed),
                        });
                    }
                    log::debug!("empty ToUnicode CMap for /{} font", subtype);
                },
                Err(e) => log::warn!("undecodable ToUnicode stream: {}", e),
            }
        }
    }

    // Priority 2: Identity CID for composite fonts.
    if is_type0 {
        return Ok(FontEncoding {
            wmode,
            is_cid: true,
            single_byte: None,
            to_unicode: None,
        });
    }

    // Priority 3: single-byte base encoding plus /Differences.
    let mut base = BaseEncoding::Standard;
    let mut differences: Option<Vec<Object>> = None;

    match &encoding_obj {
        Some(Object::Name(name)) => {
            if let Some(b) = BaseEncoding::from_name(name) {
                base = b;
            }
        },
        Some(Object::Dictionary(enc_dict)) => {
            if let Some(name) = enc_dict.get("BaseEncoding").and_then(|o| o.as_name()) {
                if let Some(b) = BaseEncoding::from_name(name) {
                    base = b;
                }
            }
            if let Some(diff) = enc_dict.get("Differences") {
                let diff = doc.resolve(diff)?;
                if let Object::Array(items) = diff {
                    differences = Some(items);
                }
            }
        },
        _ => {},
    }

    let mut table = base_table(base);
    if let Some(items) = differences {
        apply_differences(&mut table, &items);
    }

    Ok(FontEncoding {
        wmode,
        is_cid: false,
        single_byte: Some(Box::new(table)),
        to_unicode: None,
    })
}

/// Apply a `/Differences` array: `[code name1 name2 ... code' ...]`.
fn apply_differences(table: &mut [Option<char>; 256], items: &[Object]) {
    let mut code: i64 = -1;
    for item in items {
        match item {
            Object::Integer(n) => code = *n,
            Object::Name(name) => {
                if (0..256).contains(&code) {
                    match glyph_to_unicode(name) {
                        Some(ch) => table[code as usize] = Some(ch),
                        None => log::debug!("unresolvable glyph name /{} at code {}", name, code),
                    }
                    code += 1;
                }
            },
            _ => {},
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn winansi() -> FontEncoding {
        FontEncoding {
            wmode: 0,
            is_cid: false,
            single_byte: Some(Box::new(base_table(BaseEncoding::WinAnsi))),
            to_unicode: None,
        }
    }

    #[test]
    fn test_single_byte_decode() {
        let enc = winansi();
        assert_eq!(enc.decode(b"Hello"), "Hello");
        assert_eq!(enc.decode(&[0x93, b'q', 0x94]), "\u{201C}q\u{201D}");
    }

    #[test]
    fn test_cid_identity_decode() {
        let enc = FontEncoding {
            wmode: 0,
            is_cid: true,
            single_byte: None,
            to_unicode: None,
        };
        // big-endian 2-byte codes map to themselves
        assert_eq!(enc.decode(&[0x00, 0x41, 0x00, 0x42]), "AB");
        assert_eq!(enc.glyph_count(4), 2);
    }

    #[test]
    fn test_cid_with_tounicode() {
        let data = b"2 beginbfchar\n<0001> <0048>\n<0002> <0069>\nendbfchar";
        let enc = FontEncoding {
            wmode: 0,
            is_cid: true,
            single_byte: None,
            to_unicode: Some(cmap::parse_tounicode(data)),
        };
        assert_eq!(enc.decode(&[0x00, 0x01, 0x00, 0x02]), "Hi");
    }

    #[test]
    fn test_single_byte_with_tounicode_override() {
        let data = b"1 begincodespacerange\n<00> <FF>\nendcodespacerange\n1 beginbfchar\n<41> <2603>\nendbfchar";
        let enc = FontEncoding {
            wmode: 0,
            is_cid: false,
            single_byte: None,
            to_unicode: Some(cmap::parse_tounicode(data)),
        };
        // mapped code uses the CMap, unmapped printable falls back to Latin-1
        assert_eq!(enc.decode(b"AB"), "\u{2603}B");
    }

    #[test]
    fn test_differences_remap() {
        let mut table = base_table(BaseEncoding::Standard);
        let items = vec![
            Object::Integer(65),
            Object::Name("bullet".to_string()),
            Object::Name("emdash".to_string()),
            Object::Integer(97),
            Object::Name("Euro".to_string()),
        ];
        apply_differences(&mut table, &items);
        assert_eq!(table[65], Some('\u{2022}'));
        assert_eq!(table[66], Some('\u{2014}'));
        assert_eq!(table[97], Some('\u{20AC}'));
        // untouched codes keep their base mapping
        assert_eq!(table[b'B' as usize], Some('B'));
    }

    #[test]
    fn test_identity_fallback() {
        let enc = FontEncoding::identity();
        assert_eq!(enc.decode(b"Test123"), "Test123");
        assert!(!enc.is_cid());
    }

    #[test]
    fn test_odd_cid_trailing_byte() {
        let enc = FontEncoding {
            wmode: 0,
            is_cid: true,
            single_byte: None,
            to_unicode: None,
        };
        assert_eq!(enc.decode(&[0x00, 0x41, 0x42]), "AB");
    }
}
