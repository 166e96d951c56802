//! ToUnicode CMap parsing.
//!
//! A ToUnicode CMap maps character codes to Unicode. The parser is a small
//! state machine over the CMap's PostScript-flavored token stream and
//! understands the pragmatic subset emitted by real producers:
//!
//! - `begincodespacerange ... endcodespacerange` (learns the code width)
//! - `beginbfchar <src> <dst> ... endbfchar`
//! - `beginbfrange <lo> <hi> <dst-start> ... endbfrange`
//! - `beginbfrange <lo> <hi> [<dst0> <dst1> ...] endbfrange`
//!
//! `usecmap` and `beginnotdefrange` sections are skipped.

use crate::strings::decode_utf16be;
use indexmap::IndexMap;

/// Parsed ToUnicode mapping: code -> UTF-8 string, in CMap order.
#[derive(Debug, Clone, Default)]
pub struct ToUnicodeCMap {
    /// code -> replacement text
    pub map: IndexMap<u16, String>,
    /// Widest source code seen, in bytes (1 or 2)
    pub code_width: usize,
}

impl ToUnicodeCMap {
    /// Look up a code.
    pub fn get(&self, code: u16) -> Option<&str> {
        self.map.get(&code).map(|s| s.as_str())
    }

    /// Whether the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[derive(Debug, PartialEq)]
enum CMapToken {
    Hex(Vec<u8>),
    Number(i64),
    Word(String),
    ArrayStart,
    ArrayEnd,
}

struct CMapScanner<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> CMapScanner<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn next_token(&mut self) -> Option<CMapToken> {
        // skip whitespace and comments
        loop {
            while self.pos < self.data.len() && crate::lexer::is_whitespace(self.data[self.pos]) {
                self.pos += 1;
            }
            if self.pos < self.data.len() && self.data[self.pos] == b'%' {
                while self.pos < self.data.len() && !matches!(self.data[self.pos], b'\r' | b'\n') {
                    self.pos += 1;
                }
                continue;
            }
            break;
        }

        let b = *self.data.get(self.pos)?;
        match b {
            b'<' => {
                self.pos += 1;
                let start = self.pos;
                while self.pos < self.data.len() && self.data[self.pos] != b'>' {
                    self.pos += 1;
                }
                let hex = &self.data[start..self.pos];
                self.pos = (self.pos + 1).min(self.data.len());
                let bytes = crate::parser::decode_hex(hex).unwrap_or_default();
                Some(CMapToken::Hex(bytes))
            },
            b'[' => {
                self.pos += 1;
                Some(CMapToken::ArrayStart)
            },
            b']' => {
                self.pos += 1;
                Some(CMapToken::ArrayEnd)
            },
            b'/' => {
                // name operand (e.g. CMap name); read and report as a word
                self.pos += 1;
                let start = self.pos;
                while self.pos < self.data.len() && crate::lexer::is_regular(self.data[self.pos]) {
                    self.pos += 1;
                }
                let word = String::from_utf8_lossy(&self.data[start..self.pos]).into_owned();
                Some(CMapToken::Word(word))
            },
            b'0'..=b'9' | b'-' | b'+' => {
                let start = self.pos;
                self.pos += 1;
                while self.pos < self.data.len()
                    && (self.data[self.pos].is_ascii_digit() || self.data[self.pos] == b'.')
                {
                    self.pos += 1;
                }
                let text = std::str::from_utf8(&self.data[start..self.pos]).unwrap_or("0");
                let n = text.split('.').next().unwrap_or("0").parse().unwrap_or(0);
                Some(CMapToken::Number(n))
            },
            b'(' => {
                // literal string operand; skip balanced
                self.pos += 1;
                let mut depth = 1;
                while self.pos < self.data.len() && depth > 0 {
                    match self.data[self.pos] {
                        b'\\' => self.pos += 1,
                        b'(' => depth += 1,
                        b')' => depth -= 1,
                        _ => {},
                    }
                    self.pos += 1;
                }
                self.next_token()
            },
            _ if crate::lexer::is_regular(b) => {
                let start = self.pos;
                while self.pos < self.data.len() && crate::lexer::is_regular(self.data[self.pos]) {
                    self.pos += 1;
                }
                let word = String::from_utf8_lossy(&self.data[start..self.pos]).into_owned();
                Some(CMapToken::Word(word))
            },
            _ => {
                // stray delimiter; skip it
                self.pos += 1;
                self.next_token()
            },
        }
    }
}

/// Parse a decoded ToUnicode CMap stream.
pub fn parse_tounicode(data: &[u8]) -> ToUnicodeCMap {
    let mut scanner = CMapScanner::new(data);
    let mut cmap = ToUnicodeCMap {
        map: IndexMap::new(),
        code_width: 1,
    };

    #[derive(PartialEq)]
    enum Section {
        None,
        CodeSpace,
        BfChar,
        BfRange,
    }
    let mut section = Section::None;
    // operand stack for the current entry
    let mut operands: Vec<CMapToken> = Vec::new();

    while let Some(tok) = scanner.next_token() {
        if let CMapToken::Word(w) = &tok {
            match w.as_str() {
                "begincodespacerange" => section = Section::CodeSpace,
                "endcodespacerange" => section = Section::None,
                "beginbfchar" => section = Section::BfChar,
                "endbfchar" => section = Section::None,
                "beginbfrange" => section = Section::BfRange,
                "endbfrange" => section = Section::None,
                "beginnotdefrange" | "usecmap" => {
                    log::debug!("skipping unsupported CMap directive {}", w);
                    section = Section::None;
                },
                "endnotdefrange" => section = Section::None,
                _ => {},
            }
            operands.clear();
            continue;
        }
        operands.push(tok);

        match section {
            Section::CodeSpace => {
                if let Some(CMapToken::Hex(bytes)) = operands.last() {
                    cmap.code_width = cmap.code_width.max(bytes.len().min(2));
                }
                if operands.len() >= 2 {
                    operands.clear();
                }
            },
            Section::BfChar => {
                if operands.len() == 2 {
                    if let (CMapToken::Hex(src), CMapToken::Hex(dst)) = (&operands[0], &operands[1])
                    {
                        if let Some(code) = code_from_bytes(src) {
                            cmap.code_width = cmap.code_width.max(src.len().min(2));
                            cmap.map.insert(code, decode_utf16be(dst));
                        }
                    }
                    operands.clear();
                }
            },
            Section::BfRange => {
                let is_simple = matches!(
                    operands.as_slice(),
                    [CMapToken::Hex(_), CMapToken::Hex(_), CMapToken::Hex(_)]
                );
                let collecting_array =
                    matches!(operands.get(2), Some(CMapToken::ArrayStart));

                if is_simple {
                    if let [CMapToken::Hex(lo), CMapToken::Hex(hi), CMapToken::Hex(dst)] =
                        operands.as_slice()
                    {
                        insert_range(&mut cmap, lo, hi, dst);
                    }
                    operands.clear();
                } else if collecting_array {
                    if matches!(operands.last(), Some(CMapToken::ArrayEnd)) {
                        insert_array_range(&mut cmap, &operands);
                        operands.clear();
                    }
                    // else: keep collecting array elements
                } else if operands.len() > 2 {
                    // malformed entry; drop it
                    operands.clear();
                }
            },
            Section::None => {
                // operands outside sections (CIDSystemInfo etc.) are noise
                if operands.len() > 8 {
                    operands.clear();
                }
            },
        }
    }

    cmap
}

fn code_from_bytes(bytes: &[u8]) -> Option<u16> {
    match bytes.len() {
        0 => None,
        1 => Some(bytes[0] as u16),
        2 => Some(u16::from_be_bytes([bytes[0], bytes[1]])),
        n => {
            // wider codespaces exist but two bytes is the practical limit
            log::debug!("truncating {}-byte CMap code to its low 16 bits", n);
            let tail = &bytes[n - 2..];
            Some(u16::from_be_bytes([tail[0], tail[1]]))
        },
    }
}

/// `<lo> <hi> <dst>`: consecutive codes map to dst with its last UTF-16
/// unit incremented.
fn insert_range(cmap: &mut ToUnicodeCMap, lo: &[u8], hi: &[u8], dst: &[u8]) {
    let (Some(lo), Some(hi)) = (code_from_bytes(lo), code_from_bytes(hi)) else {
        return;
    };
    if hi < lo || (hi - lo) as usize > 65_535 {
        return;
    }

    let mut units: Vec<u16> = dst
        .chunks_exact(2)
        .map(|p| u16::from_be_bytes([p[0], p[1]]))
        .collect();
    if units.is_empty() {
        if let Some(&b) = dst.first() {
            units.push(b as u16);
        } else {
            return;
        }
    }

    for code in lo..=hi {
        let offset = code - lo;
        let mut u = units.clone();
        if let Some(last) = u.last_mut() {
            *last = last.wrapping_add(offset);
        }
        cmap.map.insert(code, String::from_utf16_lossy(&u));
    }
}

/// `<lo> <hi> [<dst0> <dst1> ...]`: one destination per code.
fn insert_array_range(cmap: &mut ToUnicodeCMap, operands: &[CMapToken]) {
    let (CMapToken::Hex(lo), CMapToken::Hex(hi)) = (&operands[0], &operands[1]) else {
        return;
    };
    let (Some(lo), Some(hi)) = (code_from_bytes(lo), code_from_bytes(hi)) else {
        return;
    };
    if hi < lo {
        return;
    }

    let destinations = &operands[3..operands.len() - 1];
    for (i, dst) in destinations.iter().enumerate() {
        let code = lo.saturating_add(i as u16);
        if code > hi {
            break;
        }
        if let CMapToken::Hex(bytes) = dst {
            cmap.map.insert(code, decode_utf16be(bytes));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE_CMAP: &[u8] = b"/CIDInit /ProcSet findresource begin
12 dict begin
begincmap
/CMapName /Adobe-Identity-UCS def
/CMapType 2 def
1 begincodespacerange
<0000> <FFFF>
endcodespacerange
2 beginbfchar
<0041> <0041>
<0042> <0062>
endbfchar
endcmap
CMapName currentdict /CMap defineresource pop
end
end";

    #[test]
    fn test_parse_bfchar() {
        let cmap = parse_tounicode(SIMPLE_CMAP);
        assert_eq!(cmap.get(0x41), Some("A"));
        assert_eq!(cmap.get(0x42), Some("b"));
        assert_eq!(cmap.code_width, 2);
    }

    #[test]
    fn test_parse_bfrange_incrementing() {
        let data = b"1 beginbfrange\n<0000> <0003> <0061>\nendbfrange";
        let cmap = parse_tounicode(data);
        assert_eq!(cmap.get(0), Some("a"));
        assert_eq!(cmap.get(1), Some("b"));
        assert_eq!(cmap.get(2), Some("c"));
        assert_eq!(cmap.get(3), Some("d"));
        assert_eq!(cmap.get(4), None);
    }

    #[test]
    fn test_parse_bfrange_array() {
        let data = b"1 beginbfrange\n<0001> <0003> [<0058> <0059> <005A>]\nendbfrange";
        let cmap = parse_tounicode(data);
        assert_eq!(cmap.get(1), Some("X"));
        assert_eq!(cmap.get(2), Some("Y"));
        assert_eq!(cmap.get(3), Some("Z"));
    }

    #[test]
    fn test_parse_multichar_destination() {
        // one code expanding to a ligature's expansion "ffi"
        let data = b"1 beginbfchar\n<0001> <006600660069>\nendbfchar";
        let cmap = parse_tounicode(data);
        assert_eq!(cmap.get(1), Some("ffi"));
    }

    #[test]
    fn test_parse_surrogate_pair_destination() {
        let data = b"1 beginbfchar\n<0001> <D835DF0C>\nendbfchar";
        let cmap = parse_tounicode(data);
        assert_eq!(cmap.get(1), Some("\u{1D70C}"));
    }

    #[test]
    fn test_single_byte_codespace() {
        let data = b"1 begincodespacerange\n<00> <FF>\nendcodespacerange\n1 beginbfchar\n<41> <0058>\nendbfchar";
        let cmap = parse_tounicode(data);
        assert_eq!(cmap.code_width, 1);
        assert_eq!(cmap.get(0x41), Some("X"));
    }

    #[test]
    fn test_notdefrange_skipped() {
        let data = b"1 beginnotdefrange\n<00> <1F> <007F>\nendnotdefrange\n1 beginbfchar\n<20> <0020>\nendbfchar";
        let cmap = parse_tounicode(data);
        assert_eq!(cmap.map.len(), 1);
        assert_eq!(cmap.get(0x20), Some(" "));
    }

    #[test]
    fn test_empty_input() {
        let cmap = parse_tounicode(b"");
        assert!(cmap.is_empty());
    }

    #[test]
    fn test_garbage_tolerated() {
        let cmap = parse_tounicode(b"\x00\xFF garbage << >> (string) 42");
        assert!(cmap.is_empty());
    }
}
