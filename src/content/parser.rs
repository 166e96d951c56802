//! Content-stream tokenizer.
//!
//! Produces a sequence of `(operands..., operator)` events from decoded
//! content-stream bytes. The operand buffer is bounded; when an operator
//! arrives its handler consumes the operands and the buffer is cleared.
//!
//! Inline images (`BI ... ID <binary> EI`) are the one place the stream is
//! not token-shaped: after `ID` the raw bytes are skipped up to a
//! whitespace-delimited `EI` without ever tokenizing the body.

use crate::content::operators::{Operator, TextElement};
use crate::error::Result;
use crate::lexer::{is_delimiter, is_whitespace};
use crate::object::Object;
use crate::parser::parse_object;

/// Cap on buffered operands between operators.
const MAX_OPERANDS: usize = 128;

/// Parse a content stream into a flat operator sequence.
///
/// Malformed stretches are skipped byte-by-byte; text extraction prefers a
/// partial operator stream over none.
pub fn parse_content_stream(data: &[u8]) -> Result<Vec<Operator>> {
    let mut operators = Vec::new();
    let mut operands: Vec<Object> = Vec::new();
    let mut input = data;

    loop {
        input = skip_ws(input);
        if input.is_empty() {
            break;
        }

        if starts_operator(input) {
            let (rest, name) = read_operator_name(input);
            input = rest;

            if name == "BI" {
                input = skip_inline_image(input);
                operators.push(Operator::InlineImage);
                operands.clear();
                continue;
            }

            operators.push(build_operator(&name, &mut operands));
            operands.clear();
            continue;
        }

        match parse_object(input) {
            Ok((rest, obj)) => {
                if operands.len() < MAX_OPERANDS {
                    operands.push(obj);
                } else {
                    log::warn!("operand buffer overflow, dropping oldest operand");
                    operands.remove(0);
                    operands.push(obj);
                }
                input = rest;
            },
            Err(_) => {
                // unparseable byte; skip it and resynchronize
                input = &input[1..];
            },
        }
    }

    Ok(operators)
}

fn skip_ws(mut input: &[u8]) -> &[u8] {
    loop {
        while let Some((&b, rest)) = input.split_first() {
            if is_whitespace(b) {
                input = rest;
            } else {
                break;
            }
        }
        if input.first() == Some(&b'%') {
            while let Some((&b, rest)) = input.split_first() {
                input = rest;
                if b == b'\r' || b == b'\n' {
                    break;
                }
            }
            continue;
        }
        return input;
    }
}

/// Whether the input starts with an operator keyword rather than an operand.
fn starts_operator(input: &[u8]) -> bool {
    match input[0] {
        b'\'' | b'"' => true,
        b if b.is_ascii_alphabetic() => {
            // `true`, `false`, and `null` are operands, not operators
            !(input.starts_with(b"true") || input.starts_with(b"false") || input.starts_with(b"null"))
        },
        _ => false,
    }
}

fn read_operator_name(input: &[u8]) -> (&[u8], String) {
    let mut end = 0;
    while end < input.len() {
        let b = input[end];
        if b.is_ascii_alphanumeric() || b == b'\'' || b == b'"' || b == b'*' {
            end += 1;
        } else {
            break;
        }
    }
    let name = String::from_utf8_lossy(&input[..end]).into_owned();
    (&input[end..], name)
}

/// Skip `BI ... ID <binary> EI` starting just past `BI`.
///
/// Dictionary tokens are consumed until `ID`; the binary body is then
/// scanned for an `EI` that is preceded by whitespace and followed by
/// whitespace, a delimiter, or end of stream. The body itself is never
/// tokenized.
fn skip_inline_image(mut input: &[u8]) -> &[u8] {
    // dictionary part: tokens until the ID marker
    loop {
        input = skip_ws(input);
        if input.is_empty() {
            return input;
        }
        if input.starts_with(b"ID") && (input.len() == 2 || is_whitespace(input[2])) {
            input = &input[2..];
            // single whitespace byte separates ID from the binary body
            if input.first().copied().is_some_and(is_whitespace) {
                input = &input[1..];
            }
            break;
        }
        match parse_object(input) {
            Ok((rest, _)) => input = rest,
            Err(_) => {
                if input.len() <= 1 {
                    return &input[input.len()..];
                }
                input = &input[1..];
            },
        }
    }

    // binary body: find whitespace-delimited EI
    let mut i = 0;
    while i + 2 < input.len() {
        if is_whitespace(input[i]) && &input[i + 1..i + 3] == b"EI" {
            let after = input.get(i + 3);
            if after.is_none() || after.is_some_and(|&b| is_whitespace(b) || is_delimiter(b)) {
                return &input[i + 3..];
            }
        }
        i += 1;
    }
    // trailing `EI` at the very end without a following byte
    if input.len() >= 3 && is_whitespace(input[input.len() - 3]) && input.ends_with(b"EI") {
        return &input[input.len()..];
    }
    log::warn!("unterminated inline image, skipping rest of stream");
    &input[input.len()..]
}

fn get_number(operands: &[Object], index: usize) -> Option<f64> {
    operands.get(index).and_then(|o| o.as_number())
}

fn get_string(operands: &mut [Object], index: usize) -> Vec<u8> {
    operands
        .get_mut(index)
        .and_then(|o| match o {
            Object::String(s) | Object::HexString(s) => Some(std::mem::take(s)),
            _ => None,
        })
        .unwrap_or_default()
}

fn get_name(operands: &[Object], index: usize) -> String {
    operands
        .get(index)
        .and_then(|o| o.as_name())
        .unwrap_or("")
        .to_string()
}

fn get_matrix(operands: &[Object]) -> [f64; 6] {
    let mut m = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
    for (i, slot) in m.iter_mut().enumerate() {
        if let Some(v) = get_number(operands, i) {
            *slot = v;
        }
    }
    m
}

/// Turn an operator keyword plus collected operands into an [`Operator`].
fn build_operator(name: &str, operands: &mut Vec<Object>) -> Operator {
    match name {
        "BT" => Operator::BeginText,
        "ET" => Operator::EndText,

        "Tf" => Operator::SetFont {
            name: get_name(operands, 0),
            size: get_number(operands, 1).unwrap_or(0.0),
        },
        "Td" => Operator::MoveText {
            tx: get_number(operands, 0).unwrap_or(0.0),
            ty: get_number(operands, 1).unwrap_or(0.0),
        },
        "TD" => Operator::MoveTextSetLeading {
            tx: get_number(operands, 0).unwrap_or(0.0),
            ty: get_number(operands, 1).unwrap_or(0.0),
        },
        "Tm" => Operator::SetTextMatrix {
            matrix: get_matrix(operands),
        },
        "T*" => Operator::NextLine,
        "TL" => Operator::SetLeading(get_number(operands, 0).unwrap_or(0.0)),
        "Tc" => Operator::SetCharSpacing(get_number(operands, 0).unwrap_or(0.0)),
        "Tw" => Operator::SetWordSpacing(get_number(operands, 0).unwrap_or(0.0)),
        "Tz" => Operator::SetHorizontalScale(get_number(operands, 0).unwrap_or(100.0)),
        "Ts" => Operator::SetRise(get_number(operands, 0).unwrap_or(0.0)),

        "Tj" => Operator::ShowText(get_string(operands, 0)),
        "TJ" => {
            let elements = match operands.first_mut() {
                Some(Object::Array(items)) => items
                    .iter_mut()
                    .filter_map(|obj| match obj {
                        Object::String(s) | Object::HexString(s) => {
                            Some(TextElement::Text(std::mem::take(s)))
                        },
                        Object::Integer(i) => Some(TextElement::Offset(*i as f64)),
                        Object::Real(r) => Some(TextElement::Offset(*r)),
                        _ => None,
                    })
                    .collect(),
                _ => Vec::new(),
            };
            Operator::ShowTextAdjusted(elements)
        },
        "'" => Operator::NextLineShowText(get_string(operands, 0)),
        "\"" => Operator::NextLineShowTextSpaced {
            word_space: get_number(operands, 0).unwrap_or(0.0),
            char_space: get_number(operands, 1).unwrap_or(0.0),
            text: get_string(operands, 2),
        },

        "Do" => Operator::PaintXObject {
            name: get_name(operands, 0),
        },
        "cm" => Operator::Concat {
            matrix: get_matrix(operands),
        },
        "q" => Operator::SaveState,
        "Q" => Operator::RestoreState,

        "BMC" => Operator::BeginMarkedContent {
            tag: get_name(operands, 0),
        },
        "BDC" => Operator::BeginMarkedContentProps {
            tag: get_name(operands, 0),
            properties: operands.get(1).cloned().unwrap_or(Object::Null),
        },
        "EMC" => Operator::EndMarkedContent,

        _ => Operator::Other {
            name: name.to_string(),
        },
    }
}
