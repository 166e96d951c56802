//! Content-stream operators relevant to text extraction.
//!
//! Content streams are postfix: operands come first, then a short operator
//! keyword. Only the operators the text machine reacts to get their own
//! variants; everything else lands in `Other` and is ignored.

use crate::object::Object;

/// One element of a `TJ` array.
#[derive(Debug, Clone, PartialEq)]
pub enum TextElement {
    /// A string to show
    Text(Vec<u8>),
    /// A position adjustment in thousandths of an em (positive moves left)
    Offset(f64),
}

/// A decoded content-stream operator with its operands.
#[derive(Debug, Clone, PartialEq)]
pub enum Operator {
    /// `BT`: begin text object
    BeginText,
    /// `ET`: end text object
    EndText,

    /// `Tf`: select font and size
    SetFont {
        /// Resource name of the font
        name: String,
        /// Font size in text-space units
        size: f64,
    },
    /// `Td`: translate the text line matrix
    MoveText {
        /// x translation
        tx: f64,
        /// y translation
        ty: f64,
    },
    /// `TD`: like `Td`, also sets leading to `-ty`
    MoveTextSetLeading {
        /// x translation
        tx: f64,
        /// y translation
        ty: f64,
    },
    /// `Tm`: set the text matrix absolutely
    SetTextMatrix {
        /// matrix coefficients a b c d e f
        matrix: [f64; 6],
    },
    /// `T*`: move to the next line by leading
    NextLine,
    /// `TL`: set leading
    SetLeading(f64),
    /// `Tc`: set character spacing
    SetCharSpacing(f64),
    /// `Tw`: set word spacing
    SetWordSpacing(f64),
    /// `Tz`: set horizontal scaling (percent)
    SetHorizontalScale(f64),
    /// `Ts`: set text rise
    SetRise(f64),

    /// `Tj`: show a string
    ShowText(Vec<u8>),
    /// `TJ`: show strings with positioning adjustments
    ShowTextAdjusted(Vec<TextElement>),
    /// `'`: next line, then show
    NextLineShowText(Vec<u8>),
    /// `"`: set word and char spacing, next line, then show
    NextLineShowTextSpaced {
        /// word spacing
        word_space: f64,
        /// character spacing
        char_space: f64,
        /// the string to show
        text: Vec<u8>,
    },

    /// `Do`: paint an XObject (text cares about /Form recursion)
    PaintXObject {
        /// Resource name of the XObject
        name: String,
    },
    /// `cm`: concatenate into the CTM
    Concat {
        /// matrix coefficients a b c d e f
        matrix: [f64; 6],
    },
    /// `q`: push graphics state
    SaveState,
    /// `Q`: pop graphics state
    RestoreState,

    /// `BMC`: begin marked content
    BeginMarkedContent {
        /// marked-content tag
        tag: String,
    },
    /// `BDC`: begin marked content with a property list
    BeginMarkedContentProps {
        /// marked-content tag
        tag: String,
        /// inline dictionary or name of a /Properties resource
        properties: Object,
    },
    /// `EMC`: end marked content
    EndMarkedContent,

    /// `BI ... ID ... EI`: inline image, body skipped without tokenizing
    InlineImage,

    /// Any operator the text machine does not act on
    Other {
        /// the raw operator keyword
        name: String,
    },
}
