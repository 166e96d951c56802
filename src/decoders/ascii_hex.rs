//! ASCIIHexDecode implementation.
//!
//! Hex nibble pairs up to a `>` terminator; whitespace is skipped; an odd
//! trailing nibble is treated as followed by `0`.

use crate::decoders::{DecodeParams, StreamDecoder};
use crate::error::{Error, Result};

/// ASCIIHexDecode filter implementation.
pub struct AsciiHexDecoder;

impl StreamDecoder for AsciiHexDecoder {
    fn decode(&self, input: &[u8], _params: Option<&DecodeParams>) -> Result<Vec<u8>> {
        let mut output = Vec::with_capacity(input.len() / 2);
        let mut hi: Option<u8> = None;

        for &byte in input {
            if byte == b'>' {
                break;
            }
            if crate::lexer::is_whitespace(byte) {
                continue;
            }
            let nibble = match byte {
                b'0'..=b'9' => byte - b'0',
                b'a'..=b'f' => byte - b'a' + 10,
                b'A'..=b'F' => byte - b'A' + 10,
                c => {
                    return Err(Error::Decode(format!(
                        "ASCIIHexDecode: invalid character {:#04x}",
                        c
                    )));
                },
            };
            match hi.take() {
                Some(h) => output.push(h << 4 | nibble),
                None => hi = Some(nibble),
            }
        }

        if let Some(h) = hi {
            output.push(h << 4);
        }

        Ok(output)
    }

    fn name(&self) -> &str {
        "ASCIIHexDecode"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(input: &[u8]) -> crate::error::Result<Vec<u8>> {
        AsciiHexDecoder.decode(input, None)
    }

    #[test]
    fn test_hex_basic() {
        assert_eq!(decode(b"48656C6C6F>").unwrap(), b"Hello");
    }

    #[test]
    fn test_hex_whitespace_and_case() {
        assert_eq!(decode(b"48 65 6c 6C\n6F>").unwrap(), b"Hello");
    }

    #[test]
    fn test_hex_odd_nibble_padded() {
        assert_eq!(decode(b"ABC>").unwrap(), vec![0xAB, 0xC0]);
    }

    #[test]
    fn test_hex_missing_terminator_tolerated() {
        assert_eq!(decode(b"4869").unwrap(), b"Hi");
    }

    #[test]
    fn test_hex_invalid_char_fails() {
        assert!(decode(b"48XY>").is_err());
    }
}
