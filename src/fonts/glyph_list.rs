//! Adobe Glyph List lookup.
//!
//! `/Differences` arrays re-map character codes to glyph names; resolving a
//! name to Unicode goes through this table. The list here covers the names
//! produced by the standard Latin text encodings plus the common symbols;
//! `uniXXXX` and `uXXXX[XX]` forms are resolved computationally.

use std::collections::HashMap;

lazy_static::lazy_static! {
    static ref GLYPH_NAMES: HashMap<&'static str, char> = {
        let mut m = HashMap::new();
        for &(name, ch) in GLYPH_TABLE {
            m.insert(name, ch);
        }
        m
    };
}

/// Resolve an Adobe glyph name to a Unicode scalar.
pub fn glyph_to_unicode(name: &str) -> Option<char> {
    if let Some(&ch) = GLYPH_NAMES.get(name) {
        return Some(ch);
    }

    // uniXXXX (exactly four hex digits)
    if let Some(hex) = name.strip_prefix("uni") {
        if hex.len() == 4 {
            if let Ok(cp) = u32::from_str_radix(hex, 16) {
                return char::from_u32(cp);
            }
        }
    }

    // uXXXX to uXXXXXX
    if let Some(hex) = name.strip_prefix('u') {
        if (4..=6).contains(&hex.len()) && hex.chars().all(|c| c.is_ascii_hexdigit()) {
            if let Ok(cp) = u32::from_str_radix(hex, 16) {
                return char::from_u32(cp);
            }
        }
    }

    // gNN / cidNN glyph names carry no Unicode meaning
    None
}

#[rustfmt::skip]
static GLYPH_TABLE: &[(&str, char)] = &[
    ("A", 'A'), ("B", 'B'), ("C", 'C'), ("D", 'D'), ("E", 'E'), ("F", 'F'),
    ("G", 'G'), ("H", 'H'), ("I", 'I'), ("J", 'J'), ("K", 'K'), ("L", 'L'),
    ("M", 'M'), ("N", 'N'), ("O", 'O'), ("P", 'P'), ("Q", 'Q'), ("R", 'R'),
    ("S", 'S'), ("T", 'T'), ("U", 'U'), ("V", 'V'), ("W", 'W'), ("X", 'X'),
    ("Y", 'Y'), ("Z", 'Z'),
    ("a", 'a'), ("b", 'b'), ("c", 'c'), ("d", 'd'), ("e", 'e'), ("f", 'f'),
    ("g", 'g'), ("h", 'h'), ("i", 'i'), ("j", 'j'), ("k", 'k'), ("l", 'l'),
    ("m", 'm'), ("n", 'n'), ("o", 'o'), ("p", 'p'), ("q", 'q'), ("r", 'r'),
    ("s", 's'), ("t", 't'), ("u", 'u'), ("v", 'v'), ("w", 'w'), ("x", 'x'),
    ("y", 'y'), ("z", 'z'),
    ("zero", '0'), ("one", '1'), ("two", '2'), ("three", '3'), ("four", '4'),
    ("five", '5'), ("six", '6'), ("seven", '7'), ("eight", '8'), ("nine", '9'),
    ("space", ' '), ("exclam", '!'), ("quotedbl", '"'), ("numbersign", '#'),
    ("dollar", '$'), ("percent", '%'), ("ampersand", '&'), ("quotesingle", '\''),
    ("parenleft", '('), ("parenright", ')'), ("asterisk", '*'), ("plus", '+'),
    ("comma", ','), ("hyphen", '-'), ("period", '.'), ("slash", '/'),
    ("colon", ':'), ("semicolon", ';'), ("less", '<'), ("equal", '='),
    ("greater", '>'), ("question", '?'), ("at", '@'), ("bracketleft", '['),
    ("backslash", '\\'), ("bracketright", ']'), ("asciicircum", '^'),
    ("underscore", '_'), ("grave", '`'), ("braceleft", '{'), ("bar", '|'),
    ("braceright", '}'), ("asciitilde", '~'),
    ("exclamdown", '\u{00A1}'), ("cent", '\u{00A2}'), ("sterling", '\u{00A3}'),
    ("currency", '\u{00A4}'), ("yen", '\u{00A5}'), ("brokenbar", '\u{00A6}'),
    ("section", '\u{00A7}'), ("dieresis", '\u{00A8}'), ("copyright", '\u{00A9}'),
    ("ordfeminine", '\u{00AA}'), ("guillemotleft", '\u{00AB}'),
    ("logicalnot", '\u{00AC}'), ("registered", '\u{00AE}'), ("macron", '\u{00AF}'),
    ("degree", '\u{00B0}'), ("plusminus", '\u{00B1}'), ("twosuperior", '\u{00B2}'),
    ("threesuperior", '\u{00B3}'), ("acute", '\u{00B4}'), ("mu", '\u{00B5}'),
    ("paragraph", '\u{00B6}'), ("periodcentered", '\u{00B7}'),
    ("cedilla", '\u{00B8}'), ("onesuperior", '\u{00B9}'),
    ("ordmasculine", '\u{00BA}'), ("guillemotright", '\u{00BB}'),
    ("onequarter", '\u{00BC}'), ("onehalf", '\u{00BD}'),
    ("threequarters", '\u{00BE}'), ("questiondown", '\u{00BF}'),
    ("Agrave", '\u{00C0}'), ("Aacute", '\u{00C1}'), ("Acircumflex", '\u{00C2}'),
    ("Atilde", '\u{00C3}'), ("Adieresis", '\u{00C4}'), ("Aring", '\u{00C5}'),
    ("AE", '\u{00C6}'), ("Ccedilla", '\u{00C7}'), ("Egrave", '\u{00C8}'),
    ("Eacute", '\u{00C9}'), ("Ecircumflex", '\u{00CA}'), ("Edieresis", '\u{00CB}'),
    ("Igrave", '\u{00CC}'), ("Iacute", '\u{00CD}'), ("Icircumflex", '\u{00CE}'),
    ("Idieresis", '\u{00CF}'), ("Eth", '\u{00D0}'), ("Ntilde", '\u{00D1}'),
    ("Ograve", '\u{00D2}'), ("Oacute", '\u{00D3}'), ("Ocircumflex", '\u{00D4}'),
    ("Otilde", '\u{00D5}'), ("Odieresis", '\u{00D6}'), ("multiply", '\u{00D7}'),
    ("Oslash", '\u{00D8}'), ("Ugrave", '\u{00D9}'), ("Uacute", '\u{00DA}'),
    ("Ucircumflex", '\u{00DB}'), ("Udieresis", '\u{00DC}'), ("Yacute", '\u{00DD}'),
    ("Thorn", '\u{00DE}'), ("germandbls", '\u{00DF}'),
    ("agrave", '\u{00E0}'), ("aacute", '\u{00E1}'), ("acircumflex", '\u{00E2}'),
    ("atilde", '\u{00E3}'), ("adieresis", '\u{00E4}'), ("aring", '\u{00E5}'),
    ("ae", '\u{00E6}'), ("ccedilla", '\u{00E7}'), ("egrave", '\u{00E8}'),
    ("eacute", '\u{00E9}'), ("ecircumflex", '\u{00EA}'), ("edieresis", '\u{00EB}'),
    ("igrave", '\u{00EC}'), ("iacute", '\u{00ED}'), ("icircumflex", '\u{00EE}'),
    ("idieresis", '\u{00EF}'), ("eth", '\u{00F0}'), ("ntilde", '\u{00F1}'),
    ("ograve", '\u{00F2}'), ("oacute", '\u{00F3}'), ("ocircumflex", '\u{00F4}'),
    ("otilde", '\u{00F5}'), ("odieresis", '\u{00F6}'), ("divide", '\u{00F7}'),
    ("oslash", '\u{00F8}'), ("ugrave", '\u{00F9}'), ("uacute", '\u{00FA}'),
    ("ucircumflex", '\u{00FB}'), ("udieresis", '\u{00FC}'), ("yacute", '\u{00FD}'),
    ("thorn", '\u{00FE}'), ("ydieresis", '\u{00FF}'),
    ("quoteleft", '\u{2018}'), ("quoteright", '\u{2019}'),
    ("quotedblleft", '\u{201C}'), ("quotedblright", '\u{201D}'),
    ("quotesinglbase", '\u{201A}'), ("quotedblbase", '\u{201E}'),
    ("guilsinglleft", '\u{2039}'), ("guilsinglright", '\u{203A}'),
    ("endash", '\u{2013}'), ("emdash", '\u{2014}'), ("bullet", '\u{2022}'),
    ("dagger", '\u{2020}'), ("daggerdbl", '\u{2021}'), ("ellipsis", '\u{2026}'),
    ("perthousand", '\u{2030}'), ("minus", '\u{2212}'), ("fraction", '\u{2044}'),
    ("florin", '\u{0192}'), ("trademark", '\u{2122}'), ("Euro", '\u{20AC}'),
    ("fi", '\u{FB01}'), ("fl", '\u{FB02}'),
    ("OE", '\u{0152}'), ("oe", '\u{0153}'), ("Scaron", '\u{0160}'),
    ("scaron", '\u{0161}'), ("Zcaron", '\u{017D}'), ("zcaron", '\u{017E}'),
    ("Ydieresis", '\u{0178}'), ("Lslash", '\u{0141}'), ("lslash", '\u{0142}'),
    ("dotlessi", '\u{0131}'), ("circumflex", '\u{02C6}'), ("caron", '\u{02C7}'),
    ("breve", '\u{02D8}'), ("dotaccent", '\u{02D9}'), ("ring", '\u{02DA}'),
    ("ogonek", '\u{02DB}'), ("tilde", '\u{02DC}'), ("hungarumlaut", '\u{02DD}'),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_letters() {
        assert_eq!(glyph_to_unicode("A"), Some('A'));
        assert_eq!(glyph_to_unicode("z"), Some('z'));
        assert_eq!(glyph_to_unicode("five"), Some('5'));
    }

    #[test]
    fn test_punctuation_names() {
        assert_eq!(glyph_to_unicode("space"), Some(' '));
        assert_eq!(glyph_to_unicode("quotesingle"), Some('\''));
        assert_eq!(glyph_to_unicode("emdash"), Some('\u{2014}'));
    }

    #[test]
    fn test_accented() {
        assert_eq!(glyph_to_unicode("eacute"), Some('é'));
        assert_eq!(glyph_to_unicode("Adieresis"), Some('Ä'));
    }

    #[test]
    fn test_uni_form() {
        assert_eq!(glyph_to_unicode("uni0041"), Some('A'));
        assert_eq!(glyph_to_unicode("uni20AC"), Some('\u{20AC}'));
        // wrong digit count is not a uniXXXX name
        assert_eq!(glyph_to_unicode("uni41"), None);
    }

    #[test]
    fn test_u_form() {
        assert_eq!(glyph_to_unicode("u0041"), Some('A'));
        assert_eq!(glyph_to_unicode("u1F600"), Some('\u{1F600}'));
    }

    #[test]
    fn test_unknown_names() {
        assert_eq!(glyph_to_unicode("g123"), None);
        assert_eq!(glyph_to_unicode("cid456"), None);
        assert_eq!(glyph_to_unicode(""), None);
    }
}
