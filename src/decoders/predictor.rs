//! PNG predictor post-processing for FlateDecode/LZWDecode.
//!
//! With `/Predictor >= 10` every row starts with a filter-type byte and is
//! reconstructed from the previous row using the PNG algorithms
//! (None/Sub/Up/Average/Paeth).

use crate::error::{Error, Result};

/// Parameters from `/DecodeParms`.
#[derive(Debug, Clone, Copy)]
pub struct DecodeParams {
    /// Predictor algorithm (1 = none, 2 = TIFF, >= 10 = PNG)
    pub predictor: i64,
    /// Samples per row
    pub columns: usize,
    /// Color components per sample
    pub colors: usize,
    /// Bits per component
    pub bits_per_component: usize,
    /// LZW early-change flag (1 = default on)
    pub early_change: i64,
}

impl Default for DecodeParams {
    fn default() -> Self {
        Self {
            predictor: 1,
            columns: 1,
            colors: 1,
            bits_per_component: 8,
            early_change: 1,
        }
    }
}

impl DecodeParams {
    /// Bytes per complete pixel, minimum 1.
    fn bytes_per_pixel(&self) -> usize {
        ((self.colors * self.bits_per_component) / 8).max(1)
    }

    /// Bytes per row, excluding the PNG filter-type byte.
    fn row_bytes(&self) -> usize {
        (self.columns * self.colors * self.bits_per_component).div_ceil(8)
    }
}

/// Undo PNG row prediction.
pub fn decode_predictor(data: &[u8], params: &DecodeParams) -> Result<Vec<u8>> {
    let row_bytes = params.row_bytes();
    if row_bytes == 0 {
        return Ok(data.to_vec());
    }

    let stride = row_bytes + 1; // +1 for the per-row filter type byte
    let bpp = params.bytes_per_pixel();
    let mut output = Vec::with_capacity(data.len());
    let mut prev_row = vec![0u8; row_bytes];

    for chunk in data.chunks(stride) {
        if chunk.is_empty() {
            break;
        }
        let filter_type = chunk[0];
        let mut row = chunk[1..].to_vec();
        if row.len() < row_bytes {
            // truncated final row is kept as-is after reconstruction
            log::debug!("predictor: short row ({} of {} bytes)", row.len(), row_bytes);
        }

        match filter_type {
            0 => {}, // None
            1 => {
                // Sub: add the byte bpp positions to the left
                for i in bpp..row.len() {
                    row[i] = row[i].wrapping_add(row[i - bpp]);
                }
            },
            2 => {
                // Up: add the byte from the previous row
                for i in 0..row.len() {
                    row[i] = row[i].wrapping_add(prev_row[i]);
                }
            },
            3 => {
                // Average of left and up
                for i in 0..row.len() {
                    let left = if i >= bpp { row[i - bpp] as u16 } else { 0 };
                    let up = prev_row[i] as u16;
                    row[i] = row[i].wrapping_add(((left + up) / 2) as u8);
                }
            },
            4 => {
                // Paeth
                for i in 0..row.len() {
                    let left = if i >= bpp { row[i - bpp] } else { 0 };
                    let up = prev_row[i];
                    let up_left = if i >= bpp { prev_row[i - bpp] } else { 0 };
                    row[i] = row[i].wrapping_add(paeth(left, up, up_left));
                }
            },
            t => {
                return Err(Error::Decode(format!("predictor: unknown PNG filter type {}", t)));
            },
        }

        output.extend_from_slice(&row);
        prev_row.clear();
        prev_row.extend_from_slice(&row);
        prev_row.resize(row_bytes, 0);
    }

    Ok(output)
}

/// PNG Paeth predictor function.
fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let p = a as i16 + b as i16 - c as i16;
    let pa = (p - a as i16).abs();
    let pb = (p - b as i16).abs();
    let pc = (p - c as i16).abs();
    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(columns: usize) -> DecodeParams {
        DecodeParams {
            predictor: 12,
            columns,
            colors: 1,
            bits_per_component: 8,
            early_change: 1,
        }
    }

    #[test]
    fn test_predictor_none() {
        // two rows of 3 bytes, filter type 0
        let data = [0, 1, 2, 3, 0, 4, 5, 6];
        assert_eq!(decode_predictor(&data, &params(3)).unwrap(), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_predictor_sub() {
        // filter 1: deltas against left neighbor
        let data = [1, 10, 5, 5];
        assert_eq!(decode_predictor(&data, &params(3)).unwrap(), vec![10, 15, 20]);
    }

    #[test]
    fn test_predictor_up() {
        // row 1 plain, row 2 is deltas against row 1
        let data = [0, 10, 20, 30, 2, 1, 1, 1];
        assert_eq!(
            decode_predictor(&data, &params(3)).unwrap(),
            vec![10, 20, 30, 11, 21, 31]
        );
    }

    #[test]
    fn test_predictor_average() {
        // single row, filter 3: first byte has left=0 up=0
        let data = [3, 10, 10];
        // out[0] = 10 + (0+0)/2 = 10; out[1] = 10 + (10+0)/2 = 15
        assert_eq!(decode_predictor(&data, &params(2)).unwrap(), vec![10, 15]);
    }

    #[test]
    fn test_predictor_paeth_row() {
        // single row: paeth(0,0,0)=0 for first byte, then left neighbor
        let data = [4, 7, 1];
        assert_eq!(decode_predictor(&data, &params(2)).unwrap(), vec![7, 8]);
    }

    #[test]
    fn test_predictor_xref_stream_shape() {
        // typical xref stream: 5 columns, Up filter rows that repeat
        let first = [0u8, 1, 0, 0, 255, 10];
        let second = [2u8, 0, 0, 1, 0, 0]; // adds 1 to column 3
        let mut data = Vec::new();
        data.extend_from_slice(&first);
        data.extend_from_slice(&second);
        let out = decode_predictor(&data, &params(5)).unwrap();
        assert_eq!(out, vec![1, 0, 0, 255, 10, 1, 0, 1, 255, 10]);
    }

    #[test]
    fn test_predictor_unknown_filter_fails() {
        let data = [9, 1, 2];
        assert!(decode_predictor(&data, &params(2)).is_err());
    }

    #[test]
    fn test_paeth_function() {
        assert_eq!(paeth(0, 0, 0), 0);
        assert_eq!(paeth(10, 0, 0), 10);
        assert_eq!(paeth(0, 10, 0), 10);
        assert_eq!(paeth(10, 20, 10), 20);
    }
}
