//! Single-byte base encoding tables.
//!
//! Standard, WinAnsi (cp1252), and MacRoman tables as code -> Unicode
//! arrays. Tables start from printable ASCII identity and apply per-encoding
//! overrides; codes left unset decode to nothing and fall back at a higher
//! layer.

/// Named base encodings a font dictionary can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseEncoding {
    /// Adobe StandardEncoding (the implicit default)
    Standard,
    /// WinAnsiEncoding (cp1252)
    WinAnsi,
    /// MacRomanEncoding
    MacRoman,
    /// MacExpertEncoding (expert glyph set; decoded like Standard)
    MacExpert,
}

impl BaseEncoding {
    /// Map an `/Encoding` name to a base encoding.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "StandardEncoding" => Some(Self::Standard),
            "WinAnsiEncoding" => Some(Self::WinAnsi),
            "MacRomanEncoding" => Some(Self::MacRoman),
            "MacExpertEncoding" => Some(Self::MacExpert),
            _ => None,
        }
    }
}

/// Build the 256-entry table for a base encoding.
pub fn base_table(encoding: BaseEncoding) -> [Option<char>; 256] {
    let mut table = [None; 256];

    // printable ASCII is shared by all of them
    for code in 0x20..=0x7E_u8 {
        table[code as usize] = Some(code as char);
    }

    match encoding {
        BaseEncoding::Standard | BaseEncoding::MacExpert => {
            // Standard maps the ASCII quote positions to typographic quotes
            table[0x27] = Some('\u{2019}');
            table[0x60] = Some('\u{2018}');
            apply(&mut table, STANDARD_HIGH);
            if encoding == BaseEncoding::MacExpert {
                // Expert glyphs are figure variants; decoding them as their
                // Standard counterparts keeps digits and punctuation legible.
                log::debug!("MacExpertEncoding decoded via Standard table");
            }
        },
        BaseEncoding::WinAnsi => {
            for code in 0xA0..=0xFF_u16 {
                table[code as usize] = char::from_u32(code as u32);
            }
            apply(&mut table, WINANSI_HIGH);
        },
        BaseEncoding::MacRoman => {
            apply(&mut table, MACROMAN_HIGH);
        },
    }

    table
}

fn apply(table: &mut [Option<char>; 256], overrides: &[(u8, char)]) {
    for &(code, ch) in overrides {
        table[code as usize] = Some(ch);
    }
}

/// StandardEncoding beyond ASCII (octal positions from the Type 1 spec).
#[rustfmt::skip]
static STANDARD_HIGH: &[(u8, char)] = &[
    (0xA1, '\u{00A1}'), (0xA2, '\u{00A2}'), (0xA3, '\u{00A3}'), (0xA4, '\u{2044}'),
    (0xA5, '\u{00A5}'), (0xA6, '\u{0192}'), (0xA7, '\u{00A7}'), (0xA8, '\u{00A4}'),
    (0xA9, '\''),        (0xAA, '\u{201C}'), (0xAB, '\u{00AB}'), (0xAC, '\u{2039}'),
    (0xAD, '\u{203A}'), (0xAE, '\u{FB01}'), (0xAF, '\u{FB02}'),
    (0xB1, '\u{2013}'), (0xB2, '\u{2020}'), (0xB3, '\u{2021}'), (0xB4, '\u{00B7}'),
    (0xB6, '\u{00B6}'), (0xB7, '\u{2022}'), (0xB8, '\u{201A}'), (0xB9, '\u{201E}'),
    (0xBA, '\u{201D}'), (0xBB, '\u{00BB}'), (0xBC, '\u{2026}'), (0xBD, '\u{2030}'),
    (0xBF, '\u{00BF}'),
    (0xC1, '\u{0060}'), (0xC2, '\u{00B4}'), (0xC3, '\u{02C6}'), (0xC4, '\u{02DC}'),
    (0xC5, '\u{00AF}'), (0xC6, '\u{02D8}'), (0xC7, '\u{02D9}'), (0xC8, '\u{00A8}'),
    (0xCA, '\u{02DA}'), (0xCB, '\u{00B8}'), (0xCD, '\u{02DD}'), (0xCE, '\u{02DB}'),
    (0xCF, '\u{02C7}'), (0xD0, '\u{2014}'),
    (0xE1, '\u{00C6}'), (0xE3, '\u{00AA}'), (0xE8, '\u{0141}'), (0xE9, '\u{00D8}'),
    (0xEA, '\u{0152}'), (0xEB, '\u{00BA}'),
    (0xF1, '\u{00E6}'), (0xF5, '\u{0131}'), (0xF8, '\u{0142}'), (0xF9, '\u{00F8}'),
    (0xFA, '\u{0153}'), (0xFB, '\u{00DF}'),
];

/// WinAnsi (cp1252) overrides inside 0x80..0x9F.
#[rustfmt::skip]
static WINANSI_HIGH: &[(u8, char)] = &[
    (0x80, '\u{20AC}'), (0x82, '\u{201A}'), (0x83, '\u{0192}'), (0x84, '\u{201E}'),
    (0x85, '\u{2026}'), (0x86, '\u{2020}'), (0x87, '\u{2021}'), (0x88, '\u{02C6}'),
    (0x89, '\u{2030}'), (0x8A, '\u{0160}'), (0x8B, '\u{2039}'), (0x8C, '\u{0152}'),
    (0x8E, '\u{017D}'), (0x91, '\u{2018}'), (0x92, '\u{2019}'), (0x93, '\u{201C}'),
    (0x94, '\u{201D}'), (0x95, '\u{2022}'), (0x96, '\u{2013}'), (0x97, '\u{2014}'),
    (0x98, '\u{02DC}'), (0x99, '\u{2122}'), (0x9A, '\u{0161}'), (0x9B, '\u{203A}'),
    (0x9C, '\u{0153}'), (0x9E, '\u{017E}'), (0x9F, '\u{0178}'),
];

/// MacRomanEncoding high range.
#[rustfmt::skip]
static MACROMAN_HIGH: &[(u8, char)] = &[
    (0x80, '\u{00C4}'), (0x81, '\u{00C5}'), (0x82, '\u{00C7}'), (0x83, '\u{00C9}'),
    (0x84, '\u{00D1}'), (0x85, '\u{00D6}'), (0x86, '\u{00DC}'), (0x87, '\u{00E1}'),
    (0x88, '\u{00E0}'), (0x89, '\u{00E2}'), (0x8A, '\u{00E4}'), (0x8B, '\u{00E3}'),
    (0x8C, '\u{00E5}'), (0x8D, '\u{00E7}'), (0x8E, '\u{00E9}'), (0x8F, '\u{00E8}'),
    (0x90, '\u{00EA}'), (0x91, '\u{00EB}'), (0x92, '\u{00ED}'), (0x93, '\u{00EC}'),
    (0x94, '\u{00EE}'), (0x95, '\u{00EF}'), (0x96, '\u{00F1}'), (0x97, '\u{00F3}'),
    (0x98, '\u{00F2}'), (0x99, '\u{00F4}'), (0x9A, '\u{00F6}'), (0x9B, '\u{00F5}'),
    (0x9C, '\u{00FA}'), (0x9D, '\u{00F9}'), (0x9E, '\u{00FB}'), (0x9F, '\u{00FC}'),
    (0xA0, '\u{2020}'), (0xA1, '\u{00B0}'), (0xA2, '\u{00A2}'), (0xA3, '\u{00A3}'),
    (0xA4, '\u{00A7}'), (0xA5, '\u{2022}'), (0xA6, '\u{00B6}'), (0xA7, '\u{00DF}'),
    (0xA8, '\u{00AE}'), (0xA9, '\u{00A9}'), (0xAA, '\u{2122}'), (0xAB, '\u{00B4}'),
    (0xAC, '\u{00A8}'), (0xAE, '\u{00C6}'), (0xAF, '\u{00D8}'),
    (0xB0, '\u{221E}'), (0xB1, '\u{00B1}'), (0xB2, '\u{2264}'), (0xB3, '\u{2265}'),
    (0xB4, '\u{00A5}'), (0xB5, '\u{00B5}'), (0xB6, '\u{2202}'), (0xB7, '\u{2211}'),
    (0xB8, '\u{220F}'), (0xB9, '\u{03C0}'), (0xBA, '\u{222B}'), (0xBB, '\u{00AA}'),
    (0xBC, '\u{00BA}'), (0xBD, '\u{03A9}'), (0xBE, '\u{00E6}'), (0xBF, '\u{00F8}'),
    (0xC0, '\u{00BF}'), (0xC1, '\u{00A1}'), (0xC2, '\u{00AC}'), (0xC3, '\u{221A}'),
    (0xC4, '\u{0192}'), (0xC5, '\u{2248}'), (0xC6, '\u{2206}'), (0xC7, '\u{00AB}'),
    (0xC8, '\u{00BB}'), (0xC9, '\u{2026}'), (0xCA, '\u{00A0}'), (0xCB, '\u{00C0}'),
    (0xCC, '\u{00C3}'), (0xCD, '\u{00D5}'), (0xCE, '\u{0152}'), (0xCF, '\u{0153}'),
    (0xD0, '\u{2013}'), (0xD1, '\u{2014}'), (0xD2, '\u{201C}'), (0xD3, '\u{201D}'),
    (0xD4, '\u{2018}'), (0xD5, '\u{2019}'), (0xD6, '\u{00F7}'), (0xD7, '\u{25CA}'),
    (0xD8, '\u{00FF}'), (0xD9, '\u{0178}'), (0xDA, '\u{2044}'), (0xDB, '\u{20AC}'),
    (0xDC, '\u{2039}'), (0xDD, '\u{203A}'), (0xDE, '\u{FB01}'), (0xDF, '\u{FB02}'),
    (0xE0, '\u{2021}'), (0xE1, '\u{00B7}'), (0xE2, '\u{201A}'), (0xE3, '\u{201E}'),
    (0xE4, '\u{2030}'), (0xE5, '\u{00C2}'), (0xE6, '\u{00CA}'), (0xE7, '\u{00C1}'),
    (0xE8, '\u{00CB}'), (0xE9, '\u{00C8}'), (0xEA, '\u{00CD}'), (0xEB, '\u{00CE}'),
    (0xEC, '\u{00CF}'), (0xED, '\u{00CC}'), (0xEE, '\u{00D3}'), (0xEF, '\u{00D4}'),
    (0xF1, '\u{00D2}'), (0xF2, '\u{00DA}'), (0xF3, '\u{00DB}'), (0xF4, '\u{00D9}'),
    (0xF5, '\u{0131}'), (0xF6, '\u{02C6}'), (0xF7, '\u{02DC}'), (0xF8, '\u{00AF}'),
    (0xF9, '\u{02D8}'), (0xFA, '\u{02D9}'), (0xFB, '\u{02DA}'), (0xFC, '\u{00B8}'),
    (0xFD, '\u{02DD}'), (0xFE, '\u{02DB}'), (0xFF, '\u{02C7}'),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name() {
        assert_eq!(BaseEncoding::from_name("WinAnsiEncoding"), Some(BaseEncoding::WinAnsi));
        assert_eq!(BaseEncoding::from_name("MacRomanEncoding"), Some(BaseEncoding::MacRoman));
        assert_eq!(BaseEncoding::from_name("StandardEncoding"), Some(BaseEncoding::Standard));
        assert_eq!(BaseEncoding::from_name("Bogus"), None);
    }

    #[test]
    fn test_ascii_shared() {
        for enc in [BaseEncoding::Standard, BaseEncoding::WinAnsi, BaseEncoding::MacRoman] {
            let table = base_table(enc);
            assert_eq!(table[b'A' as usize], Some('A'));
            assert_eq!(table[b'5' as usize], Some('5'));
            assert_eq!(table[b' ' as usize], Some(' '));
        }
    }

    #[test]
    fn test_winansi_high_range() {
        let table = base_table(BaseEncoding::WinAnsi);
        assert_eq!(table[0x80], Some('\u{20AC}')); // euro
        assert_eq!(table[0x92], Some('\u{2019}')); // right single quote
        assert_eq!(table[0xE9], Some('é'));
    }

    #[test]
    fn test_macroman_high_range() {
        let table = base_table(BaseEncoding::MacRoman);
        assert_eq!(table[0x8E], Some('é'));
        assert_eq!(table[0xD5], Some('\u{2019}'));
    }

    #[test]
    fn test_standard_quotes() {
        let table = base_table(BaseEncoding::Standard);
        assert_eq!(table[0x27], Some('\u{2019}'));
        assert_eq!(table[0x60], Some('\u{2018}'));
        assert_eq!(table[0xE1], Some('\u{00C6}')); // AE
    }

    #[test]
    fn test_undefined_codes_are_none() {
        let table = base_table(BaseEncoding::Standard);
        assert_eq!(table[0x00], None);
        assert_eq!(table[0x7F], None);
    }
}
