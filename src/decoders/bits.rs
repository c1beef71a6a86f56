//! Sub-byte sample unpacking.
//!
//! Rows of 1/2/4-bit samples start on byte boundaries; the padding bits at
//! the end of a row are skipped.

/// Unpack `width * height` samples of `bits` bits each into one byte per
/// sample, scaled to 0-255.
///
/// 8-bit data is returned as-is (truncated to the expected length), 16-bit
/// data keeps the high byte of each sample. Missing trailing samples are
/// filled with zero.
pub fn unpack_bits(data: &[u8], width: usize, height: usize, bits: u8) -> Vec<u8> {
    let max = match bits {
        1 | 2 | 4 => (1u16 << bits) - 1,
        _ => return unpack_indices(data, width, height, bits),
    };
    unpack_indices(data, width, height, bits)
        .into_iter()
        .map(|v| ((v as u16 * 255) / max) as u8)
        .collect()
}

/// Unpack `width * height` samples without scaling, e.g. palette indices.
pub fn unpack_indices(data: &[u8], width: usize, height: usize, bits: u8) -> Vec<u8> {
    let total = width * height;
    match bits {
        8 => {
            let mut out = data[..data.len().min(total)].to_vec();
            out.resize(total, 0);
            out
        },
        16 => {
            let mut out: Vec<u8> = data.chunks_exact(2).take(total).map(|pair| pair[0]).collect();
            out.resize(total, 0);
            out
        },
        1 | 2 | 4 => {
            let bits = bits as usize;
            let row_bytes = (width * bits).div_ceil(8);
            let mask = ((1u16 << bits) - 1) as u8;
            let mut out = Vec::with_capacity(total);
            for y in 0..height {
                let row = data.get(y * row_bytes..).unwrap_or(&[]);
                for x in 0..width {
                    let bit_offset = x * bits;
                    let value = row
                        .get(bit_offset / 8)
                        .map(|byte| (byte >> (8 - bits - bit_offset % 8)) & mask)
                        .unwrap_or(0);
                    out.push(value);
                }
            }
            out
        },
        other => {
            log::warn!("Unsupported sample depth {} bits", other);
            vec![0; total]
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unpack_one_bit_scaled() {
        assert_eq!(unpack_bits(&[0b1010_0000], 3, 1, 1), vec![255, 0, 255]);
    }

    #[test]
    fn test_unpack_rows_are_byte_aligned() {
        // 3 samples per row use 3 bits, the remaining 5 bits are padding
        let data = [0b1110_0000, 0b0100_0000];
        assert_eq!(unpack_indices(&data, 3, 2, 1), vec![1, 1, 1, 0, 1, 0]);
    }

    #[test]
    fn test_unpack_four_bit_indices_unscaled() {
        assert_eq!(unpack_indices(&[0x1F], 2, 1, 4), vec![1, 15]);
        assert_eq!(unpack_bits(&[0x1F], 2, 1, 4), vec![17, 255]);
    }

    #[test]
    fn test_unpack_two_bit() {
        assert_eq!(unpack_bits(&[0b00_01_10_11], 4, 1, 2), vec![0, 85, 170, 255]);
    }

    #[test]
    fn test_unpack_sixteen_bit_high_byte() {
        assert_eq!(unpack_bits(&[0x12, 0x34, 0xAB, 0xCD], 2, 1, 16), vec![0x12, 0xAB]);
    }

    #[test]
    fn test_unpack_short_input_padded() {
        assert_eq!(unpack_bits(&[7], 3, 1, 8), vec![7, 0, 0]);
    }
}
