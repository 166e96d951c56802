//! LZWDecode implementation.
//!
//! PDF's LZW variant: MSB-first bit order, codes start at 9 bits and grow to
//! 12, clear code 256, EOD 257, first dictionary code 258. By default the
//! code width increases one code early (`/EarlyChange 1`); `/EarlyChange 0`
//! disables that.
//!
//! The weezl crate handles the default case; a hand-rolled decoder covers
//! `/EarlyChange 0` and weezl failures.

use crate::decoders::{DecodeParams, StreamDecoder};
use crate::error::{Error, Result};

const CLEAR_CODE: u16 = 256;
const EOD_CODE: u16 = 257;
const FIRST_CODE: u16 = 258;
const MAX_CODE_WIDTH: u32 = 12;

/// LZWDecode filter implementation.
pub struct LzwDecoder;

impl StreamDecoder for LzwDecoder {
    fn decode(&self, input: &[u8], params: Option<&DecodeParams>) -> Result<Vec<u8>> {
        let early_change = params.map(|p| p.early_change).unwrap_or(1);

        if early_change == 1 {
            if let Ok(data) = decode_weezl(input) {
                return Ok(data);
            }
            log::debug!("weezl LZW decode failed, using fallback decoder");
        }

        decode_lzw(input, early_change != 0)
    }

    fn name(&self) -> &str {
        "LZWDecode"
    }
}

fn decode_weezl(input: &[u8]) -> Result<Vec<u8>> {
    use weezl::{decode::Decoder as WeezlDecoder, BitOrder};

    let mut decoder = WeezlDecoder::new(BitOrder::Msb, 8);
    decoder
        .decode(input)
        .map_err(|e| Error::Decode(format!("LZWDecode: {:?}", e)))
}

/// Fallback decoder honouring the early-change flag.
fn decode_lzw(input: &[u8], early_change: bool) -> Result<Vec<u8>> {
    let mut output = Vec::with_capacity(input.len() * 3);
    let mut table: Vec<Vec<u8>> = Vec::new();
    reset_table(&mut table);

    let mut code_width: u32 = 9;
    let mut bit_buf: u32 = 0;
    let mut bit_count: u32 = 0;
    let mut prev: Option<u16> = None;

    for &byte in input {
        bit_buf = (bit_buf << 8) | byte as u32;
        bit_count += 8;

        while bit_count >= code_width {
            bit_count -= code_width;
            let code = ((bit_buf >> bit_count) & ((1 << code_width) - 1)) as u16;

            match code {
                EOD_CODE => return Ok(output),
                CLEAR_CODE => {
                    reset_table(&mut table);
                    code_width = 9;
                    prev = None;
                },
                _ => {
                    let entry = if (code as usize) < table.len() {
                        table[code as usize].clone()
                    } else if let Some(p) = prev {
                        // code not yet in table: previous sequence plus its
                        // own first byte
                        let mut seq = table[p as usize].clone();
                        seq.push(table[p as usize][0]);
                        seq
                    } else {
                        return Err(Error::Decode(format!(
                            "LZWDecode: code {} before any literal",
                            code
                        )));
                    };

                    output.extend_from_slice(&entry);

                    if let Some(p) = prev {
                        let mut new_seq = table[p as usize].clone();
                        new_seq.push(entry[0]);
                        table.push(new_seq);
                    }
                    prev = Some(code);

                    // Widen when the next code would not fit. With early
                    // change the widening happens one code sooner.
                    let threshold = if early_change {
                        (1usize << code_width) - 1
                    } else {
                        1usize << code_width
                    };
                    if table.len() >= threshold && code_width < MAX_CODE_WIDTH {
                        code_width += 1;
                    }
                },
            }
        }
    }

    Ok(output)
}

fn reset_table(table: &mut Vec<Vec<u8>>) {
    table.clear();
    for i in 0..=255u16 {
        table.push(vec![i as u8]);
    }
    // placeholders for clear and EOD so indices line up with codes
    table.push(Vec::new());
    table.push(Vec::new());
    debug_assert_eq!(table.len(), FIRST_CODE as usize);
}
