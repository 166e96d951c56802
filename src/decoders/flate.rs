//! FlateDecode (zlib/deflate) implementation.
//!
//! The most common PDF compression filter. Decoding is tolerant of the
//! corruption seen in the wild: partial output is kept when the tail of a
//! stream is damaged, and raw deflate (with or without a bogus two-byte
//! header) is tried when the zlib wrapper is broken.

use crate::decoders::{DecodeParams, StreamDecoder};
use crate::error::{Error, Result};
use flate2::read::{DeflateDecoder, ZlibDecoder};
use std::io::Read;

/// FlateDecode filter implementation.
pub struct FlateDecoder;

impl StreamDecoder for FlateDecoder {
    fn decode(&self, input: &[u8], _params: Option<&DecodeParams>) -> Result<Vec<u8>> {
        let mut output = Vec::new();

        let mut decoder = ZlibDecoder::new(input);
        match decoder.read_to_end(&mut output) {
            Ok(_) => return Ok(output),
            Err(e) => {
                if !output.is_empty() {
                    log::warn!(
                        "FlateDecode partial recovery: {} bytes before corruption: {}",
                        output.len(),
                        e
                    );
                    return Ok(output);
                }
            },
        }

        // Broken zlib wrapper: try raw deflate.
        output.clear();
        let mut deflate = DeflateDecoder::new(input);
        match deflate.read_to_end(&mut output) {
            Ok(_) => {
                log::info!("FlateDecode recovered via raw deflate ({} bytes)", output.len());
                return Ok(output);
            },
            Err(_) if !output.is_empty() => {
                log::warn!("raw deflate partial recovery: {} bytes", output.len());
                return Ok(output);
            },
            Err(_) => {},
        }

        // Corrupt two-byte header in front of valid deflate data.
        if input.len() > 2 {
            output.clear();
            let mut deflate = DeflateDecoder::new(&input[2..]);
            if deflate.read_to_end(&mut output).is_ok() && !output.is_empty() {
                log::info!("FlateDecode recovered after skipping header ({} bytes)", output.len());
                return Ok(output);
            }
        }

        Err(Error::Decode("FlateDecode: not a valid zlib or deflate stream".to_string()))
    }

    fn name(&self) -> &str {
        "FlateDecode"
    }
}
