//! PDF text-string decoding.
//!
//! Strings destined for humans (Info metadata, outline titles, page label
//! prefixes) are either UTF-16BE with a leading FEFF byte-order mark or
//! PDFDocEncoding, a Latin-1 superset with printable characters in the
//! 0x80-0x9F range.

/// PDFDocEncoding values for 0x80..0x9F.
///
/// Positions that are undefined map to U+FFFD.
const PDFDOC_HIGH: [char; 32] = [
    '\u{2022}', // 80 bullet
    '\u{2020}', // 81 dagger
    '\u{2021}', // 82 double dagger
    '\u{2026}', // 83 ellipsis
    '\u{2014}', // 84 em dash
    '\u{2013}', // 85 en dash
    '\u{0192}', // 86 florin
    '\u{2044}', // 87 fraction slash
    '\u{2039}', // 88 single left guillemet
    '\u{203A}', // 89 single right guillemet
    '\u{2212}', // 8A minus
    '\u{2030}', // 8B per mille
    '\u{201E}', // 8C low double quote
    '\u{201C}', // 8D left double quote
    '\u{201D}', // 8E right double quote
    '\u{2018}', // 8F left single quote
    '\u{2019}', // 90 right single quote
    '\u{201A}', // 91 low single quote
    '\u{2122}', // 92 trademark
    '\u{FB01}', // 93 fi ligature
    '\u{FB02}', // 94 fl ligature
    '\u{0141}', // 95 L with stroke
    '\u{0152}', // 96 OE
    '\u{0160}', // 97 S caron
    '\u{0178}', // 98 Y diaeresis
    '\u{017D}', // 99 Z caron
    '\u{0131}', // 9A dotless i
    '\u{0142}', // 9B l with stroke
    '\u{0153}', // 9C oe
    '\u{0161}', // 9D s caron
    '\u{017E}', // 9E z caron
    '\u{FFFD}', // 9F undefined
];

/// Decode a PDF text string to UTF-8.
///
/// UTF-16BE is selected by the FEFF byte-order mark; everything else is
/// treated as PDFDocEncoding. Unpaired surrogates become U+FFFD.
pub fn decode_text_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        decode_utf16be(&bytes[2..])
    } else {
        decode_pdfdoc(bytes)
    }
}

/// Decode UTF-16BE bytes (without BOM) to a String.
pub fn decode_utf16be(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}

fn decode_pdfdoc(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for &b in bytes {
        match b {
            b'\t' | b'\n' | b'\r' => out.push(b as char),
            0x00..=0x1F => {}, // other control bytes dropped
            0x20..=0x7F => out.push(b as char),
            0x80..=0x9F => out.push(PDFDOC_HIGH[(b - 0x80) as usize]),
            _ => out.push(b as char), // Latin-1 range
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf16be_with_bom() {
        // <FEFF00430061006600E9> decodes to "Café"
        let bytes = [0xFE, 0xFF, 0x00, 0x43, 0x00, 0x61, 0x00, 0x66, 0x00, 0xE9];
        let decoded = decode_text_string(&bytes);
        assert_eq!(decoded, "Café");
        assert_eq!(decoded.as_bytes(), b"Caf\xC3\xA9");
    }

    #[test]
    fn test_utf16be_surrogate_pair() {
        // U+1F600 as D83D DE00
        let bytes = [0xFE, 0xFF, 0xD8, 0x3D, 0xDE, 0x00];
        assert_eq!(decode_text_string(&bytes), "\u{1F600}");
    }

    #[test]
    fn test_utf16be_odd_trailing_byte_dropped() {
        let bytes = [0xFE, 0xFF, 0x00, 0x41, 0x00];
        assert_eq!(decode_text_string(&bytes), "A");
    }

    #[test]
    fn test_pdfdoc_ascii() {
        assert_eq!(decode_text_string(b"Hello World"), "Hello World");
    }

    #[test]
    fn test_pdfdoc_latin1_range() {
        assert_eq!(decode_text_string(&[0xE9]), "é");
    }

    #[test]
    fn test_pdfdoc_high_range() {
        // 0x84 is an em dash in PDFDocEncoding
        assert_eq!(decode_text_string(&[0x84]), "\u{2014}");
        // 0x92 is the trademark sign
        assert_eq!(decode_text_string(&[0x92]), "\u{2122}");
    }

    #[test]
    fn test_pdfdoc_control_bytes_dropped() {
        assert_eq!(decode_text_string(b"A\x01B\tC"), "AB\tC");
    }

    #[test]
    fn test_empty() {
        assert_eq!(decode_text_string(b""), "");
    }
}
