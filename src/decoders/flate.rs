//! FlateDecode (zlib/deflate) implementation.
//!
//! Some producers write bare deflate data without the two-byte zlib header,
//! so decoding always falls back to raw deflate before giving up.

use crate::decoders::StreamDecoder;
use crate::error::{Error, Result};
use flate2::read::{DeflateDecoder, ZlibDecoder};
use std::io::Read;

/// FlateDecode filter implementation.
///
/// Decompresses data using the zlib/deflate algorithm.
pub struct FlateDecoder;

impl StreamDecoder for FlateDecoder {
    fn decode(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        let zlib_err = match ZlibDecoder::new(input).read_to_end(&mut output) {
            Ok(_) => return Ok(output),
            Err(e) => e,
        };

        log::debug!("Zlib decode failed ({}), trying raw deflate", zlib_err);
        output.clear();
        match DeflateDecoder::new(input).read_to_end(&mut output) {
            Ok(_) => {
                log::debug!("Raw deflate recovery succeeded: {} bytes", output.len());
                Ok(output)
            },
            Err(deflate_err) => Err(Error::Decode(format!(
                "FlateDecode decompression failed. Zlib error: {}, Deflate error: {}. Compressed size: {} bytes.",
                zlib_err,
                deflate_err,
                input.len()
            ))),
        }
    }

    fn name(&self) -> &str {
        "FlateDecode"
    }
}

/// Inflate zlib-wrapped or raw DEFLATE data.
///
/// Never fails loudly: returns `None` when neither format decodes, so callers
/// can skip whatever enhancement needed the data.
pub fn inflate_bytes(compressed: &[u8]) -> Option<Vec<u8>> {
    match FlateDecoder.decode(compressed) {
        Ok(data) => Some(data),
        Err(e) => {
            log::warn!("{}", e);
            None
        },
    }
}
