//! Predictor reversal for Flate/LZW streams (`/DecodeParms /Predictor`).
//!
//! Predictor 2 is the TIFF horizontal differencing predictor; 10-15 are the
//! PNG filters, where every row carries its own filter-type byte.

use crate::error::{Error, Result};

/// Decode parameters for stream decoders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeParams {
    /// Predictor algorithm (1 = none, 2 = TIFF, 10-15 = PNG)
    pub predictor: i64,
    /// Number of columns (width in samples)
    pub columns: usize,
    /// Number of color components per sample
    pub colors: usize,
    /// Bits per component
    pub bits_per_component: usize,
}

impl Default for DecodeParams {
    fn default() -> Self {
        Self {
            predictor: 1,
            columns: 1,
            colors: 1,
            bits_per_component: 8,
        }
    }
}

impl DecodeParams {
    /// Bytes of sample data in one row.
    pub fn row_bytes(&self) -> usize {
        (self.columns * self.colors * self.bits_per_component).div_ceil(8)
    }

    /// Distance in bytes to the corresponding byte of the previous pixel.
    fn pixel_stride(&self) -> usize {
        (self.colors * self.bits_per_component).div_ceil(8).max(1)
    }
}

/// Reverse the predictor named by `params`.
pub fn decode_predictor(data: &[u8], params: &DecodeParams) -> Result<Vec<u8>> {
    match params.predictor {
        1 => Ok(data.to_vec()),
        2 => decode_tiff(data, params),
        10..=15 => decode_png(data, params),
        other => Err(Error::Decode(format!("Unsupported predictor: {}", other))),
    }
}

fn decode_tiff(data: &[u8], params: &DecodeParams) -> Result<Vec<u8>> {
    if params.bits_per_component != 8 {
        return Err(Error::Decode(format!(
            "TIFF predictor with {} bits per component",
            params.bits_per_component
        )));
    }
    let row_bytes = params.row_bytes();
    let stride = params.pixel_stride();
    let mut output = data.to_vec();
    for row in output.chunks_mut(row_bytes) {
        for i in stride..row.len() {
            row[i] = row[i].wrapping_add(row[i - stride]);
        }
    }
    Ok(output)
}

fn decode_png(data: &[u8], params: &DecodeParams) -> Result<Vec<u8>> {
    let row_bytes = params.row_bytes();
    let stride = params.pixel_stride();
    let mut output: Vec<u8> = Vec::with_capacity(data.len());
    let mut prev = vec![0u8; row_bytes];

    // A short final row is tolerated; producers truncate trailing padding
    for (row_idx, chunk) in data.chunks(row_bytes + 1).enumerate() {
        let (tag, encoded) = match chunk.split_first() {
            Some(split) => split,
            None => break,
        };
        let mut row = encoded.to_vec();
        for i in 0..row.len() {
            let left = if i >= stride { row[i - stride] } else { 0 };
            let up = prev[i];
            let up_left = if i >= stride { prev[i - stride] } else { 0 };
            let predicted = match tag {
                0 => 0,
                1 => left,
                2 => up,
                3 => ((left as u16 + up as u16) / 2) as u8,
                4 => paeth(left, up, up_left),
                other => {
                    return Err(Error::Decode(format!(
                        "Invalid PNG predictor tag {} in row {}",
                        other, row_idx
                    )))
                },
            };
            row[i] = row[i].wrapping_add(predicted);
        }
        prev[..row.len()].copy_from_slice(&row);
        output.extend_from_slice(&row);
    }

    Ok(output)
}

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
