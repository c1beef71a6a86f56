//! Stream decoder implementations for the filters annotation streams use.
//!
//! - FlateDecode (zlib/deflate) - appearance streams, raw image samples, palettes
//! - LZWDecode - older producers
//! - ASCIIHexDecode - hand-written and text-safe streams
//! - DCTDecode / JPXDecode - terminal; their bytes are handed to the image codec
//!
//! Decoders are chained in `/Filter` order, followed by any `/DecodeParms`
//! predictor.

use crate::error::{Error, Result};
use crate::object::{Dict, Object, ObjectResolver};

mod ascii_hex;
mod bits;
mod flate;
mod lzw;
mod predictor;

pub use ascii_hex::AsciiHexDecoder;
pub use bits::{unpack_bits, unpack_indices};
pub use flate::{inflate_bytes, FlateDecoder};
pub use lzw::LzwDecoder;
pub use predictor::{decode_predictor, DecodeParams};

/// Default limit on the decoded size of a single stream (100 MB).
pub const DEFAULT_MAX_DECOMPRESSED_SIZE: usize = 100 * 1024 * 1024;

/// PDF stream filter types understood by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// FlateDecode (deflate/zlib compression)
    FlateDecode,
    /// LZWDecode (Lempel-Ziv-Welch compression)
    LZWDecode,
    /// ASCIIHexDecode (hexadecimal encoding)
    ASCIIHexDecode,
    /// DCTDecode (JPEG), passed through to the image codec
    DCTDecode,
    /// JPXDecode (JPEG 2000), passed through to the image codec
    JPXDecode,
    /// Any other filter
    Other(String),
}

impl Filter {
    /// Parse a filter name, accepting the inline-image abbreviations.
    pub fn from_name(name: &str) -> Self {
        match name {
            "FlateDecode" | "Fl" => Filter::FlateDecode,
            "LZWDecode" | "LZW" => Filter::LZWDecode,
            "ASCIIHexDecode" | "AHx" => Filter::ASCIIHexDecode,
            "DCTDecode" | "DCT" => Filter::DCTDecode,
            "JPXDecode" => Filter::JPXDecode,
            other => Filter::Other(other.to_string()),
        }
    }

    /// True for filters whose output is a complete encoded image rather
    /// than raw samples.
    pub fn is_photographic(&self) -> bool {
        matches!(self, Filter::DCTDecode | Filter::JPXDecode)
    }

    fn decoder(&self) -> Option<Box<dyn StreamDecoder>> {
        match self {
            Filter::FlateDecode => Some(Box::new(FlateDecoder)),
            Filter::LZWDecode => Some(Box::new(LzwDecoder)),
            Filter::ASCIIHexDecode => Some(Box::new(AsciiHexDecoder)),
            _ => None,
        }
    }
}

/// Trait for PDF stream decoders.
///
/// Each decoder implements a specific PDF filter algorithm and can decode
/// compressed or encoded stream data.
pub trait StreamDecoder {
    /// Decode the input data.
    fn decode(&self, input: &[u8]) -> Result<Vec<u8>>;

    /// Get the name of this decoder (e.g., "FlateDecode").
    fn name(&self) -> &str;
}

/// Stream data after all non-photographic filters were applied.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedStream {
    /// Decoded bytes (still JPEG / JPEG 2000 encoded if `terminal` is set)
    pub data: Vec<u8>,
    /// Photographic filter that still has to be applied by an image codec
    pub terminal: Option<Filter>,
}

/// Extract filter names from a Filter object.
///
/// The Filter entry can be either a single Name or an Array of Names.
pub fn extract_filters<R: ObjectResolver + ?Sized>(resolver: &R, dict: &Dict) -> Vec<Filter> {
    match resolver.get(dict, "Filter") {
        Some(Object::Name(name)) => vec![Filter::from_name(name)],
        Some(Object::Array(arr)) => arr
            .iter()
            .filter_map(|obj| resolver.deref(obj).as_name().map(Filter::from_name))
            .collect(),
        _ => Vec::new(),
    }
}

/// Extract predictor parameters from a DecodeParms entry.
///
/// For a filter array the first dictionary that asks for a predictor wins.
pub fn extract_decode_params<R: ObjectResolver + ?Sized>(
    resolver: &R,
    dict: &Dict,
) -> Option<DecodeParams> {
    let candidates: Vec<&Dict> = match resolver.get(dict, "DecodeParms")? {
        Object::Dictionary(d) => vec![d],
        Object::Array(arr) => arr
            .iter()
            .filter_map(|obj| resolver.deref(obj).as_dict())
            .collect(),
        _ => return None,
    };

    candidates.into_iter().find_map(|params| {
        let predictor = resolver.get_number(params, "Predictor").unwrap_or(1.0) as i64;
        if predictor <= 1 {
            return None;
        }
        let read = |key: &str, default: usize| {
            resolver
                .get_number(params, key)
                .filter(|v| *v >= 1.0)
                .map(|v| v as usize)
                .unwrap_or(default)
        };
        Some(DecodeParams {
            predictor,
            columns: read("Columns", 1),
            colors: read("Colors", 1),
            bits_per_component: read("BitsPerComponent", 8),
        })
    })
}

/// Decode a stream's data through its `/Filter` chain and predictor.
///
/// Decoding stops at a photographic filter, which is reported in
/// [`DecodedStream::terminal`]; predictors are only applied when the chain
/// fully decoded to raw samples.
///
/// # Errors
///
/// - [`Error::UnsupportedFilter`] for filters this pipeline does not implement
/// - [`Error::Decode`] if a decoder fails or the output exceeds `max_size`
pub fn decode_stream<R: ObjectResolver + ?Sized>(
    resolver: &R,
    dict: &Dict,
    data: &[u8],
    max_size: usize,
) -> Result<DecodedStream> {
    let filters = extract_filters(resolver, dict);
    let mut current = data.to_vec();

    for filter in &filters {
        if filter.is_photographic() {
            return Ok(DecodedStream {
                data: current,
                terminal: Some(filter.clone()),
            });
        }

        let decoder = match filter.decoder() {
            Some(decoder) => decoder,
            None => {
                let name = match filter {
                    Filter::Other(name) => name.clone(),
                    other => format!("{:?}", other),
                };
                return Err(Error::UnsupportedFilter(name));
            },
        };

        current = decoder.decode(&current)?;

        if max_size > 0 && current.len() > max_size {
            return Err(Error::Decode(format!(
                "{} output of {} bytes exceeds limit {} bytes",
                decoder.name(),
                current.len(),
                max_size
            )));
        }
    }

    if let Some(params) = extract_decode_params(resolver, dict) {
        current = decode_predictor(&current, &params)?;
    }

    Ok(DecodedStream {
        data: current,
        terminal: None,
    })
}

/// Decode a stream object fully, treating any leftover photographic filter
/// as an error. Used for content and lookup streams, which are never images.
pub fn decode_stream_object<R: ObjectResolver + ?Sized>(
    resolver: &R,
    obj: &Object,
    max_size: usize,
) -> Result<Vec<u8>> {
    let (dict, data) = resolver.deref(obj).as_stream().ok_or_else(|| Error::InvalidObjectType {
        expected: "Stream".to_string(),
        found: obj.type_name().to_string(),
    })?;
    let decoded = decode_stream(resolver, dict, data, max_size)?;
    match decoded.terminal {
        None => Ok(decoded.data),
        Some(filter) => Err(Error::UnsupportedFilter(format!("{:?}", filter))),
    }
}
