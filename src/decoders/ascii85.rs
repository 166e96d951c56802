//! ASCII85Decode (Base85) implementation.
//!
//! Four bytes are encoded as five characters in `!`..=`u`; `z` stands for
//! four zero bytes; `~>` terminates the stream. Trailing partial groups are
//! padded with `u` before decoding and the padding bytes are dropped.

use crate::decoders::{DecodeParams, StreamDecoder};
use crate::error::{Error, Result};

/// ASCII85Decode filter implementation.
pub struct Ascii85Decoder;

impl StreamDecoder for Ascii85Decoder {
    fn decode(&self, input: &[u8], _params: Option<&DecodeParams>) -> Result<Vec<u8>> {
        let mut output = Vec::with_capacity(input.len() * 4 / 5);
        let mut group = [0u8; 5];
        let mut count = 0;

        // optional <~ leader
        let mut data = input;
        if data.starts_with(b"<~") {
            data = &data[2..];
        }

        for &byte in data {
            match byte {
                b'~' => break,
                b'z' => {
                    if count != 0 {
                        return Err(Error::Decode(
                            "ASCII85Decode: 'z' inside a group".to_string(),
                        ));
                    }
                    output.extend_from_slice(&[0, 0, 0, 0]);
                },
                b'!'..=b'u' => {
                    group[count] = byte - b'!';
                    count += 1;
                    if count == 5 {
                        push_group(&mut output, &group, 4)?;
                        count = 0;
                    }
                },
                c if crate::lexer::is_whitespace(c) => {},
                c => {
                    return Err(Error::Decode(format!(
                        "ASCII85Decode: invalid character {:#04x}",
                        c
                    )));
                },
            }
        }

        // partial trailing group: pad with 'u' and keep count-1 bytes
        if count > 0 {
            if count == 1 {
                return Err(Error::Decode(
                    "ASCII85Decode: single trailing character".to_string(),
                ));
            }
            let mut padded = group;
            for slot in padded.iter_mut().take(5).skip(count) {
                *slot = b'u' - b'!';
            }
            push_group(&mut output, &padded, count - 1)?;
        }

        Ok(output)
    }

    fn name(&self) -> &str {
        "ASCII85Decode"
    }
}

fn push_group(output: &mut Vec<u8>, digits: &[u8; 5], take: usize) -> Result<()> {
    let mut acc: u32 = 0;
    for &d in digits {
        acc = acc
            .checked_mul(85)
            .and_then(|v| v.checked_add(d as u32))
            .ok_or_else(|| Error::Decode("ASCII85Decode: group overflow".to_string()))?;
    }
    output.extend_from_slice(&acc.to_be_bytes()[..take]);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(input: &[u8]) -> Result<Vec<u8>> {
        Ascii85Decoder.decode(input, None)
    }

    #[test]
    fn test_ascii85_full_group() {
        // "Easy" (0x45617379) encodes to "7:5Y3"
        assert_eq!(decode(b"7:5Y3~>").unwrap(), b"Easy");
    }

    #[test]
    fn test_ascii85_partial_groups() {
        // 4 chars decode to 3 bytes, 3 chars to 2 bytes
        assert_eq!(decode(b"7:5Y~>").unwrap(), b"Eas");
        assert_eq!(decode(b"7:5~>").unwrap(), b"Ea");
    }

    #[test]
    fn test_ascii85_z_shortcut() {
        assert_eq!(decode(b"z~>").unwrap(), vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_ascii85_z_inside_group_fails() {
        assert!(decode(b"7z5Y3~>").is_err());
    }

    #[test]
    fn test_ascii85_whitespace_skipped() {
        assert_eq!(decode(b"7: 5Y\n3~>").unwrap(), b"Easy");
    }

    #[test]
    fn test_ascii85_leader_accepted() {
        assert_eq!(decode(b"<~7:5Y3~>").unwrap(), b"Easy");
    }

    #[test]
    fn test_ascii85_empty() {
        assert_eq!(decode(b"~>").unwrap(), b"");
    }
}
