//! Native image codec interface.

use std::io::Cursor;

use super::{DecodedRaster, EncodedFormat};
use crate::error::{Error, Result};

/// Decoder for photographic formats and PNG encoder for rasters.
///
/// Implementations are shared across worker threads.
pub trait ImageCodec: Sync {
    /// Decode an encoded image to RGBA.
    fn decode(&self, format: EncodedFormat, bytes: &[u8]) -> Result<DecodedRaster>;

    /// Encode an RGBA raster as PNG.
    fn encode_png(&self, raster: &DecodedRaster) -> Result<Vec<u8>>;
}

/// [`ImageCodec`] backed by the `image` crate (JPEG and PNG; no JPEG 2000).
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultImageCodec;

impl ImageCodec for DefaultImageCodec {
    fn decode(&self, format: EncodedFormat, bytes: &[u8]) -> Result<DecodedRaster> {
        let format = match format {
            EncodedFormat::Jpeg => image::ImageFormat::Jpeg,
            EncodedFormat::Png => image::ImageFormat::Png,
            EncodedFormat::Jpeg2000 => {
                return Err(Error::Image("JPEG 2000 decoding is not available".to_string()))
            },
        };
        let rgba = image::load_from_memory_with_format(bytes, format)?.to_rgba8();
        let (width, height) = rgba.dimensions();
        DecodedRaster::new(width, height, rgba.into_raw())
    }

    fn encode_png(&self, raster: &DecodedRaster) -> Result<Vec<u8>> {
        let buffer = image::RgbaImage::from_raw(raster.width(), raster.height(), raster.pixels().to_vec())
            .ok_or_else(|| Error::Image("Failed to create image buffer".to_string()))?;
        let mut output = Cursor::new(Vec::new());
        buffer
            .write_to(&mut output, image::ImageFormat::Png)
            .map_err(|e| Error::Image(format!("PNG encoding failed: {}", e)))?;
        Ok(output.into_inner())
    }
}
