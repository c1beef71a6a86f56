//! Decoded images: RGBA rasters, pass-through encoded blobs, and the arena
//! that owns them for a load pass.

mod arena;
mod codec;
mod decode;

pub use arena::{ImageArena, ImageHandle};
pub use codec::{DefaultImageCodec, ImageCodec};
pub use decode::{decode_image_object, ImageLimits, DEFAULT_MAX_IMAGE_PIXELS};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

use crate::error::{Error, Result};

/// An RGBA8 pixel buffer. `pixels.len() == width * height * 4` always holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedRaster {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl DecodedRaster {
    /// Wrap an RGBA buffer, checking its length against the dimensions.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(Error::Image(format!(
                "RGBA buffer of {} bytes does not match {}x{} ({} bytes)",
                pixels.len(),
                width,
                height,
                expected
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// A raster filled with one color.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = rgba.repeat(width as usize * height as usize);
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// RGBA bytes, row-major.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// RGBA value at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Some([self.pixels[i], self.pixels[i + 1], self.pixels[i + 2], self.pixels[i + 3]])
    }

    /// Overwrite the alpha channel sample-for-sample. Pixels past the end
    /// of `alpha` keep their current alpha.
    pub fn apply_alpha(&mut self, alpha: &[u8]) {
        for (px, a) in self.pixels.chunks_exact_mut(4).zip(alpha) {
            px[3] = *a;
        }
    }

    /// Copy out a sub-rectangle, clipped to the raster bounds.
    /// Returns `None` if nothing of the region lies inside.
    pub fn crop(&self, x: i64, y: i64, width: i64, height: i64) -> Option<DecodedRaster> {
        let x0 = x.clamp(0, self.width as i64);
        let y0 = y.clamp(0, self.height as i64);
        let x1 = x.saturating_add(width).clamp(0, self.width as i64);
        let y1 = y.saturating_add(height).clamp(0, self.height as i64);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }

        let (cw, ch) = ((x1 - x0) as usize, (y1 - y0) as usize);
        let stride = self.width as usize * 4;
        let mut pixels = Vec::with_capacity(cw * ch * 4);
        for row in y0 as usize..y1 as usize {
            let start = row * stride + x0 as usize * 4;
            pixels.extend_from_slice(&self.pixels[start..start + cw * 4]);
        }
        Some(DecodedRaster {
            width: cw as u32,
            height: ch as u32,
            pixels,
        })
    }
}

/// Format of an image kept in its encoded form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodedFormat {
    /// JPEG (DCTDecode)
    Jpeg,
    /// JPEG 2000 (JPXDecode)
    Jpeg2000,
    /// PNG
    Png,
}

impl EncodedFormat {
    /// MIME type for data URLs.
    pub fn mime_type(&self) -> &'static str {
        match self {
            EncodedFormat::Jpeg => "image/jpeg",
            EncodedFormat::Jpeg2000 => "image/jp2",
            EncodedFormat::Png => "image/png",
        }
    }
}

/// Pixel payload of a decoded image.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageData {
    /// Still-encoded photographic data, handed to a native codec as-is
    Encoded {
        /// Encoding of `bytes`
        format: EncodedFormat,
        /// The encoded image
        bytes: Vec<u8>,
    },
    /// Fully decoded RGBA pixels
    Raster(DecodedRaster),
}

/// An image decoded from a PDF image object or cropped from a page render.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    /// Declared width in pixels
    pub width: u32,
    /// Declared height in pixels
    pub height: u32,
    /// Pixel payload
    pub data: ImageData,
}

impl DecodedImage {
    /// Wrap an RGBA raster.
    pub fn from_raster(raster: DecodedRaster) -> Self {
        Self {
            width: raster.width(),
            height: raster.height(),
            data: ImageData::Raster(raster),
        }
    }

    /// Wrap an encoded blob.
    pub fn encoded(width: u32, height: u32, format: EncodedFormat, bytes: Vec<u8>) -> Self {
        Self {
            width,
            height,
            data: ImageData::Encoded { format, bytes },
        }
    }

    /// The RGBA raster, if this image is already decoded.
    pub fn raster(&self) -> Option<&DecodedRaster> {
        match &self.data {
            ImageData::Raster(r) => Some(r),
            ImageData::Encoded { .. } => None,
        }
    }

    /// Encode as PNG. Encoded JPEG / JPEG 2000 data is decoded first.
    pub fn to_png(&self, codec: &dyn ImageCodec) -> Result<Vec<u8>> {
        match &self.data {
            ImageData::Raster(raster) => codec.encode_png(raster),
            ImageData::Encoded {
                format: EncodedFormat::Png,
                bytes,
            } => Ok(bytes.clone()),
            ImageData::Encoded { format, bytes } => codec.encode_png(&codec.decode(*format, bytes)?),
        }
    }

    /// Export as a `data:` URL. Encoded blobs keep their own format.
    pub fn to_data_url(&self, codec: &dyn ImageCodec) -> Result<String> {
        let (mime, bytes) = match &self.data {
            ImageData::Encoded { format, bytes } => (format.mime_type(), BASE64.encode(bytes)),
            ImageData::Raster(_) => ("image/png", BASE64.encode(self.to_png(codec)?)),
        };
        Ok(format!("data:{};base64,{}", mime, bytes))
    }
}
