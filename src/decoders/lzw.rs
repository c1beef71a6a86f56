//! LZWDecode implementation.
//!
//! PDF writes LZW codes MSB-first, starting at 9 bits, with the code width
//! growing one code early (`/EarlyChange 1`, the default). weezl calls the
//! early switch "TIFF size switch"; streams that still fail are retried with
//! the GIF-style late switch.

use crate::decoders::StreamDecoder;
use crate::error::{Error, Result};
use weezl::{decode::Decoder, BitOrder, LzwError, LzwStatus};

/// LZWDecode filter implementation.
pub struct LzwDecoder;

impl StreamDecoder for LzwDecoder {
    fn decode(&self, input: &[u8]) -> Result<Vec<u8>> {
        match run(Decoder::with_tiff_size_switch(BitOrder::Msb, 8), input) {
            Ok(data) => Ok(data),
            Err(early) => {
                log::debug!("LZW decode with early change failed ({:?}), retrying", early);
                run(Decoder::new(BitOrder::Msb, 8), input).map_err(|late| {
                    Error::Decode(format!("LZWDecode error: {:?} / {:?}", early, late))
                })
            },
        }
    }

    fn name(&self) -> &str {
        "LZWDecode"
    }
}

fn run(mut decoder: Decoder, input: &[u8]) -> std::result::Result<Vec<u8>, LzwError> {
    let mut output = Vec::new();
    let mut buffer = [0u8; 4096];
    let mut rest = input;

    loop {
        let result = decoder.decode_bytes(rest, &mut buffer);
        rest = &rest[result.consumed_in..];
        output.extend_from_slice(&buffer[..result.consumed_out]);
        match result.status? {
            LzwStatus::Done => break,
            // Truncated streams without an EOD code keep what was decoded
            LzwStatus::NoProgress => break,
            LzwStatus::Ok => {
                if rest.is_empty() && result.consumed_out == 0 {
                    break;
                }
            },
        }
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use weezl::encode::Encoder;

    #[test]
    fn test_lzw_decode_early_change() {
        let original = b"BT /Helv 12 Tf (Approved) Tj ET BT /Helv 12 Tf (Approved) Tj ET";
        let encoded = Encoder::with_tiff_size_switch(BitOrder::Msb, 8)
            .encode(original)
            .unwrap();
        assert_eq!(LzwDecoder.decode(&encoded).unwrap(), original);
    }

    #[test]
    fn test_lzw_decode_wide_codes() {
        // Enough distinct sequences to push the code width past 9 bits
        let original: Vec<u8> = (0..4000u32).map(|i| (i * 7 % 251) as u8).collect();
        let encoded = Encoder::with_tiff_size_switch(BitOrder::Msb, 8)
            .encode(&original)
            .unwrap();
        assert_eq!(LzwDecoder.decode(&encoded).unwrap(), original);
    }

    #[test]
    fn test_lzw_decoder_name() {
        assert_eq!(LzwDecoder.name(), "LZWDecode");
    }
}
