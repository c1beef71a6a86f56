//! ASCIIHexDecode implementation.
//!
//! Whitespace is ignored, `>` ends the data, and a trailing odd digit is
//! completed with an implicit `0`.

use crate::decoders::StreamDecoder;
use crate::error::{Error, Result};

/// ASCIIHexDecode filter implementation.
pub struct AsciiHexDecoder;

impl StreamDecoder for AsciiHexDecoder {
    fn decode(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut output = Vec::with_capacity(input.len() / 2);
        let mut pending: Option<u8> = None;

        for &c in input.iter().take_while(|&&c| c != b'>') {
            if c.is_ascii_whitespace() {
                continue;
            }
            let nibble = hex_value(c).ok_or_else(|| {
                Error::Decode(format!("ASCIIHexDecode: invalid hex digit '{}'", c as char))
            })?;
            match pending.take() {
                Some(high) => output.push((high << 4) | nibble),
                None => pending = Some(nibble),
            }
        }

        if let Some(high) = pending {
            output.push(high << 4);
        }
        Ok(output)
    }

    fn name(&self) -> &str {
        "ASCIIHexDecode"
    }
}

fn hex_value(digit: u8) -> Option<u8> {
    (digit as char).to_digit(16).map(|v| v as u8)
}
