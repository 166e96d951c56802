//! Recursive-descent PDF object parser.
//!
//! Combines lexer tokens into complete objects: primitives, arrays,
//! dictionaries, indirect references (`N G R` lookahead), and streams.
//!
//! Streams need their `/Length` before the body can be consumed. When
//! `/Length` is an indirect reference the caller supplies a
//! [`LengthResolver`] that is consulted before the body is read; if no
//! resolver is available (or it fails) the parser falls back to scanning
//! for the `endstream` keyword.

use crate::error::{Error, Result};
use crate::lexer::{token, Token};
use crate::object::{Dict, Object, ObjectRef};
use nom::IResult;

/// Resolves an indirect `/Length` reference to its integer value.
pub type LengthResolver<'a> = dyn Fn(ObjectRef) -> Option<i64> + 'a;

/// Decode escape sequences in PDF literal strings.
///
/// Recognized: `\n \r \t \b \f \( \) \\`, `\ddd` octal (1-3 digits), and
/// `\<newline>` line continuation. Unknown escapes keep the backslash
/// literal.
pub fn decode_literal_string_escapes(raw: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(raw.len());
    let mut i = 0;

    while i < raw.len() {
        if raw[i] == b'\\' && i + 1 < raw.len() {
            match raw[i + 1] {
                b'n' => {
                    result.push(b'\n');
                    i += 2;
                },
                b'r' => {
                    result.push(b'\r');
                    i += 2;
                },
                b't' => {
                    result.push(b'\t');
                    i += 2;
                },
                b'b' => {
                    result.push(0x08);
                    i += 2;
                },
                b'f' => {
                    result.push(0x0C);
                    i += 2;
                },
                b'(' => {
                    result.push(b'(');
                    i += 2;
                },
                b')' => {
                    result.push(b')');
                    i += 2;
                },
                b'\\' => {
                    result.push(b'\\');
                    i += 2;
                },
                // line continuation: backslash followed by EOL is dropped
                b'\n' => {
                    i += 2;
                },
                b'\r' => {
                    i += 2;
                    if i < raw.len() && raw[i] == b'\n' {
                        i += 1;
                    }
                },
                c if c.is_ascii_digit() && c < b'8' => {
                    let start = i + 1;
                    let mut octal_value = 0u32;
                    let mut octal_len = 0;
                    for j in 0..3 {
                        match raw.get(start + j) {
                            Some(&d) if (b'0'..b'8').contains(&d) => {
                                octal_value = octal_value * 8 + (d - b'0') as u32;
                                octal_len += 1;
                            },
                            _ => break,
                        }
                    }
                    result.push((octal_value & 0xFF) as u8);
                    i += 1 + octal_len;
                },
                _ => {
                    // unknown escape: keep backslash literal
                    result.push(b'\\');
                    i += 1;
                },
            }
        } else {
            result.push(raw[i]);
            i += 1;
        }
    }

    result
}

/// Decode a hex string to bytes.
///
/// Whitespace is skipped; an odd trailing nibble is treated as followed
/// by `0`.
pub fn decode_hex(hex_bytes: &[u8]) -> Result<Vec<u8>> {
    let mut result = Vec::with_capacity(hex_bytes.len() / 2 + 1);
    let mut hi: Option<u8> = None;

    for &c in hex_bytes {
        if crate::lexer::is_whitespace(c) {
            continue;
        }
        let nibble = match c {
            b'0'..=b'9' => c - b'0',
            b'a'..=b'f' => c - b'a' + 10,
            b'A'..=b'F' => c - b'A' + 10,
            _ => {
                return Err(Error::Parse {
                    offset: 0,
                    reason: format!("invalid hex digit {:#04x}", c),
                });
            },
        };
        match hi.take() {
            Some(h) => result.push(h << 4 | nibble),
            None => hi = Some(nibble),
        }
    }

    if let Some(h) = hi {
        result.push(h << 4);
    }

    Ok(result)
}

/// Parse a PDF object from input bytes.
pub fn parse_object(input: &[u8]) -> IResult<&[u8], Object> {
    parse_object_inner(input, input, None)
}

/// Parse a PDF object, resolving indirect stream `/Length` values through
/// `resolver`.
pub fn parse_object_with<'a>(
    input: &'a [u8],
    resolver: Option<&LengthResolver>,
) -> IResult<&'a [u8], Object> {
    parse_object_inner(input, input, resolver)
}

/// `origin` is the slice the top-level call started from; stream
/// `raw_offset` values are relative to it.
fn parse_object_inner<'a>(
    input: &'a [u8],
    origin: &'a [u8],
    resolver: Option<&LengthResolver>,
) -> IResult<&'a [u8], Object> {
    let (input, tok) = token(input)?;

    match tok {
        Token::Null => Ok((input, Object::Null)),
        Token::True => Ok((input, Object::Boolean(true))),
        Token::False => Ok((input, Object::Boolean(false))),

        Token::Integer(i) => {
            // Could be a plain integer or the start of `num gen R`.
            if i >= 0 {
                if let Ok((input2, Token::Integer(gen))) = token(input) {
                    if (0..=u16::MAX as i64).contains(&gen) {
                        if let Ok((input3, Token::R)) = token(input2) {
                            return Ok((
                                input3,
                                Object::Reference(ObjectRef::new(i as u32, gen as u16)),
                            ));
                        }
                    }
                }
            }
            Ok((input, Object::Integer(i)))
        },

        Token::Real(r) => Ok((input, Object::Real(r))),

        Token::LiteralString(bytes) => {
            let decoded = decode_literal_string_escapes(bytes);
            Ok((input, Object::String(decoded)))
        },

        Token::HexString(hex_bytes) => match decode_hex(hex_bytes) {
            Ok(decoded) => Ok((input, Object::HexString(decoded))),
            Err(_) => Err(nom::Err::Failure(nom::error::Error::new(
                input,
                nom::error::ErrorKind::Fail,
            ))),
        },

        Token::Name(name) => Ok((input, Object::Name(name))),

        Token::ArrayStart => parse_array(input, origin, resolver),

        Token::DictStart => {
            let (remaining, dict) = parse_dictionary(input, origin, resolver)?;

            // A dictionary followed by the `stream` keyword begins a stream.
            if let Ok((stream_input, Token::StreamStart)) = token(remaining) {
                let (final_input, data, raw_offset) =
                    parse_stream_data(stream_input, origin, &dict, resolver)?;
                return Ok((
                    final_input,
                    Object::Stream {
                        dict,
                        data: bytes::Bytes::from(data),
                        raw_offset,
                    },
                ));
            }

            Ok((remaining, Object::Dictionary(dict)))
        },

        _ => Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Tag))),
    }
}

/// Parse stream data after the `stream` keyword.
///
/// The keyword must be followed by LF or CRLF (CR alone is tolerated with a
/// warning). The body is `/Length` bytes, then optional whitespace, then
/// `endstream`.
fn parse_stream_data<'a>(
    input: &'a [u8],
    origin: &'a [u8],
    dict: &Dict,
    resolver: Option<&LengthResolver>,
) -> StreamResult<'a> {
    let input = if input.starts_with(b"\r\n") {
        &input[2..]
    } else if input.starts_with(b"\n") {
        &input[1..]
    } else if input.starts_with(b"\r") {
        log::warn!("stream keyword followed by CR alone, accepting leniently");
        &input[1..]
    } else {
        log::warn!("no newline after stream keyword");
        input
    };

    let raw_offset = origin.len() - input.len();

    let length = match dict.get("Length") {
        Some(Object::Integer(n)) if *n >= 0 => Some(*n as usize),
        Some(Object::Reference(r)) => resolver
            .and_then(|f| f(*r))
            .filter(|n| *n >= 0)
            .map(|n| n as usize),
        _ => None,
    };

    if let Some(length) = length {
        if input.len() >= length {
            let stream_data = input[..length].to_vec();
            let remaining = &input[length..];

            // optional whitespace, then `endstream`
            if let Ok((remaining, Token::StreamEnd)) = token(remaining) {
                return Ok((remaining, stream_data, raw_offset));
            }
            // Length did not land on endstream; fall through to the scan.
            log::warn!("/Length {} does not reach endstream, rescanning", length);
        }
    }

    // Missing, indirect-unresolvable, or wrong /Length: scan for endstream.
    if let Some(pos) = find_endstream(input) {
        let stream_data = input[..pos].to_vec();
        let remaining = &input[pos..];
        let (remaining, _) = token(remaining)?; // consume `endstream`
        return Ok((remaining, stream_data, raw_offset));
    }

    Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Eof)))
}

// Three-value Ok for stream parsing: (remaining, body, raw body offset).
type StreamResult<'a> =
    std::result::Result<(&'a [u8], Vec<u8>, usize), nom::Err<nom::error::Error<&'a [u8]>>>;

fn find_endstream(input: &[u8]) -> Option<usize> {
    let keyword = b"endstream";
    input
        .windows(keyword.len())
        .position(|window| window == keyword)
        // the body ends before the EOL preceding endstream
        .map(|pos| {
            let mut end = pos;
            if end > 0 && input[end - 1] == b'\n' {
                end -= 1;
            }
            if end > 0 && input[end - 1] == b'\r' {
                end -= 1;
            }
            end
        })
}

/// Parse a PDF array: `[ obj1 obj2 ... ]`.
///
/// Hitting end-of-input before `]` closes the array with what was collected
/// (lenient; the caller's error sink decides whether that is fatal).
fn parse_array<'a>(
    input: &'a [u8],
    origin: &'a [u8],
    resolver: Option<&LengthResolver>,
) -> IResult<&'a [u8], Object> {
    let mut objects = Vec::new();
    let mut remaining = input;

    loop {
        match token(remaining) {
            Ok((inp, Token::ArrayEnd)) => return Ok((inp, Object::Array(objects))),
            Ok(_) => match parse_object_inner(remaining, origin, resolver) {
                Ok((inp, obj)) => {
                    objects.push(obj);
                    remaining = inp;
                },
                Err(e) => {
                    if remaining.is_empty() {
                        log::warn!("array closed early at end of input ({} items)", objects.len());
                        return Ok((remaining, Object::Array(objects)));
                    }
                    return Err(e);
                },
            },
            Err(_) => {
                // Untokenizable interior: close the enclosing container early.
                log::warn!("array closed early on invalid token ({} items kept)", objects.len());
                return Ok((remaining, Object::Array(objects)));
            },
        }
    }
}

/// Parse a PDF dictionary: `<< /Key value ... >>`.
///
/// Keys must be names. Duplicate keys keep the first position with the last
/// value. Hitting end-of-input closes the dictionary with what was collected.
fn parse_dictionary<'a>(
    input: &'a [u8],
    origin: &'a [u8],
    resolver: Option<&LengthResolver>,
) -> IResult<&'a [u8], Dict> {
    let mut dict = Dict::new();
    let mut remaining = input;

    loop {
        match token(remaining) {
            Ok((inp, Token::DictEnd)) => return Ok((inp, dict)),
            Ok((inp, Token::Name(key))) => match parse_object_inner(inp, origin, resolver) {
                Ok((inp, value)) => {
                    dict.insert(key, value);
                    remaining = inp;
                },
                Err(e) => {
                    if inp.is_empty() {
                        log::warn!("dictionary closed early at end of input ({} keys)", dict.len());
                        return Ok((inp, dict));
                    }
                    return Err(e);
                },
            },
            Ok(_) => {
                if remaining.is_empty() {
                    return Ok((remaining, dict));
                }
                // key must be a name
                return Err(nom::Err::Error(nom::error::Error::new(
                    remaining,
                    nom::error::ErrorKind::Tag,
                )));
            },
            Err(_) => {
                log::warn!("dictionary closed early on invalid token ({} keys kept)", dict.len());
                return Ok((remaining, dict));
            },
        }
    }
}
