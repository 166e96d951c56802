//! Stream decoder implementations for PDF filters.
//!
//! Decoders for the filters that matter on the text path:
//! - FlateDecode (zlib/deflate) - most common
//! - LZWDecode
//! - ASCII85Decode
//! - ASCIIHexDecode
//! - RunLengthDecode
//!
//! Image-only filters (DCTDecode, CCITTFaxDecode, JBIG2Decode, JPXDecode)
//! are passed through undecoded; their dictionaries stay readable but the
//! payload is never needed for text extraction.
//!
//! Filters compose left-to-right in a pipeline; the optional PNG predictor
//! runs as a post-processing stage.

use crate::error::{Error, Result};

mod ascii85;
mod ascii_hex;
mod flate;
mod lzw;
mod predictor;
mod runlength;

pub use ascii85::Ascii85Decoder;
pub use ascii_hex::AsciiHexDecoder;
pub use flate::FlateDecoder;
pub use lzw::LzwDecoder;
pub use predictor::{decode_predictor, DecodeParams};
pub use runlength::RunLengthDecoder;

// Decompression bomb protection. The format does not bound expansion, so
// these caps keep adversarial streams from exhausting memory.
const MAX_DECOMPRESSION_RATIO: u64 = 1000;
const MAX_DECOMPRESSED_SIZE: usize = 512 * 1024 * 1024;

/// Trait for PDF stream decoders. Each implements one filter algorithm.
pub trait StreamDecoder {
    /// Decode the input data.
    fn decode(&self, input: &[u8], params: Option<&DecodeParams>) -> Result<Vec<u8>>;

    /// Filter name (e.g. "FlateDecode").
    fn name(&self) -> &str;
}

/// A filter stage that returns its input unchanged.
///
/// Used for image codecs whose payloads are opaque to text extraction.
struct PassThrough(&'static str);

impl StreamDecoder for PassThrough {
    fn decode(&self, input: &[u8], _params: Option<&DecodeParams>) -> Result<Vec<u8>> {
        log::debug!("{} payload passed through undecoded ({} bytes)", self.0, input.len());
        Ok(input.to_vec())
    }

    fn name(&self) -> &str {
        self.0
    }
}

fn decoder_for(name: &str) -> Result<Box<dyn StreamDecoder>> {
    Ok(match name {
        "FlateDecode" | "Fl" => Box::new(FlateDecoder),
        "LZWDecode" | "LZW" => Box::new(LzwDecoder),
        "ASCII85Decode" | "A85" => Box::new(Ascii85Decoder),
        "ASCIIHexDecode" | "AHx" => Box::new(AsciiHexDecoder),
        "RunLengthDecode" | "RL" => Box::new(RunLengthDecoder),
        "DCTDecode" | "DCT" => Box::new(PassThrough("DCTDecode")),
        "CCITTFaxDecode" | "CCF" => Box::new(PassThrough("CCITTFaxDecode")),
        "JBIG2Decode" => Box::new(PassThrough("JBIG2Decode")),
        "JPXDecode" => Box::new(PassThrough("JPXDecode")),
        "Crypt" => Box::new(PassThrough("Crypt")),
        other => return Err(Error::UnsupportedFilter(other.to_string())),
    })
}

/// Decode stream data through a filter pipeline.
pub fn decode_stream(data: &[u8], filters: &[String]) -> Result<Vec<u8>> {
    decode_stream_with_params(data, filters, None)
}

/// Decode stream data through a filter pipeline with decode parameters.
///
/// Parameters (predictor, LZW early change) apply to the filter stage they
/// belong to; the PNG predictor post-processes the decompressed bytes.
pub fn decode_stream_with_params(
    data: &[u8],
    filters: &[String],
    params: Option<&DecodeParams>,
) -> Result<Vec<u8>> {
    let compressed_size = data.len().max(1) as u64;
    let mut current = data.to_vec();

    for filter_name in filters {
        let decoder = decoder_for(filter_name)?;
        current = decoder.decode(&current, params)?;

        let ratio = current.len() as u64 / compressed_size;
        if ratio > MAX_DECOMPRESSION_RATIO {
            return Err(Error::Decode(format!(
                "decompression ratio {}:1 exceeds limit {}:1",
                ratio, MAX_DECOMPRESSION_RATIO
            )));
        }
        if current.len() > MAX_DECOMPRESSED_SIZE {
            return Err(Error::Decode(format!(
                "decompressed size {} exceeds limit {}",
                current.len(),
                MAX_DECOMPRESSED_SIZE
            )));
        }
    }

    if let Some(params) = params {
        if params.predictor >= 10 {
            current = decode_predictor(&current, params)?;
        } else if params.predictor != 1 {
            log::debug!("predictor {} ignored (only PNG predictors handled)", params.predictor);
        }
    }

    Ok(current)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_stream_no_filters() {
        let data = b"Hello, World!";
        assert_eq!(decode_stream(data, &[]).unwrap(), data);
    }

    #[test]
    fn test_decode_stream_unsupported_filter() {
        let filters = vec!["NoSuchFilter".to_string()];
        match decode_stream(b"test", &filters) {
            Err(Error::UnsupportedFilter(name)) => assert_eq!(name, "NoSuchFilter"),
            other => panic!("expected UnsupportedFilter, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_decode_stream_pipeline() {
        let filters = vec!["ASCIIHexDecode".to_string()];
        assert_eq!(decode_stream(b"48656C6C6F>", &filters).unwrap(), b"Hello");
    }

    #[test]
    fn test_decode_stream_chained_filters() {
        // ASCIIHex first, producing RunLength data: literal run of "Hi" then EOD
        let filters = vec!["ASCIIHexDecode".to_string(), "RunLengthDecode".to_string()];
        // 01 'H' 'i' 80 -> hex "01486980"
        assert_eq!(decode_stream(b"01486980>", &filters).unwrap(), b"Hi");
    }

    #[test]
    fn test_image_filters_pass_through() {
        let filters = vec!["DCTDecode".to_string()];
        let jpeg = [0xFFu8, 0xD8, 0xFF, 0xE0];
        assert_eq!(decode_stream(&jpeg, &filters).unwrap(), jpeg);
    }

    #[test]
    fn test_abbreviated_filter_names() {
        let filters = vec!["AHx".to_string()];
        assert_eq!(decode_stream(b"4869>", &filters).unwrap(), b"Hi");
    }
}
