//! PDF image XObject decoding.
//!
//! Photographic filters (DCT, JPX) are passed through as encoded blobs unless
//! a soft mask forces a decode to RGBA. Everything else is run through the
//! stream filter chain and expanded sample-by-sample according to the
//! resolved color space.

use super::{DecodedImage, DecodedRaster, EncodedFormat, ImageCodec};
use crate::color::cmyk8_to_rgb;
use crate::color_space::{resolve_color_space, ColorSpaceDescriptor, ColorSpaceKind};
use crate::decoders::{decode_stream, unpack_bits, unpack_indices, Filter, DEFAULT_MAX_DECOMPRESSED_SIZE};
use crate::error::Error;
use crate::object::{Dict, Object, ObjectResolver};
use crate::outcome::Outcome;

/// Default cap on decoded image size (64 megapixels).
pub const DEFAULT_MAX_IMAGE_PIXELS: u64 = 64 * 1024 * 1024;

/// Resource limits applied while decoding one image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageLimits {
    /// Maximum bytes produced by the filter chain (0 = unlimited)
    pub max_stream_size: usize,
    /// Maximum `width * height`
    pub max_pixels: u64,
}

impl Default for ImageLimits {
    fn default() -> Self {
        Self {
            max_stream_size: DEFAULT_MAX_DECOMPRESSED_SIZE,
            max_pixels: DEFAULT_MAX_IMAGE_PIXELS,
        }
    }
}

/// Decode an image XObject (and its `/SMask`, if any).
///
/// Missing dimensions, an empty stream or a failing filter chain yield
/// [`Outcome::Failed`]. Approximations (unknown color space, short sample
/// data, a soft mask that could not be applied) yield [`Outcome::Defaulted`].
pub fn decode_image_object<R: ObjectResolver + ?Sized>(
    resolver: &R,
    obj: &Object,
    codec: &dyn ImageCodec,
    limits: &ImageLimits,
) -> Outcome<DecodedImage> {
    let (dict, data) = match resolver.deref(obj).as_stream() {
        Some(stream) => stream,
        None => {
            return Outcome::Failed(Error::InvalidObjectType {
                expected: "Stream".to_string(),
                found: resolver.deref(obj).type_name().to_string(),
            })
        },
    };

    let (width, height) = match image_dimensions(resolver, dict) {
        Ok(dims) => dims,
        Err(e) => return Outcome::Failed(e),
    };
    if data.is_empty() {
        return Outcome::Failed(Error::Image("Empty image stream".to_string()));
    }
    let pixel_count = width as u64 * height as u64;
    if pixel_count > limits.max_pixels {
        return Outcome::Failed(Error::Image(format!(
            "{}x{} image exceeds {} pixel limit",
            width, height, limits.max_pixels
        )));
    }

    let decoded = match decode_stream(resolver, dict, data, limits.max_stream_size) {
        Ok(decoded) => decoded,
        Err(e) => return Outcome::Failed(e),
    };

    let soft_mask = resolver.get(dict, "SMask").filter(|m| m.as_stream().is_some());

    if let Some(filter) = decoded.terminal {
        let format = match filter {
            Filter::JPXDecode => EncodedFormat::Jpeg2000,
            _ => EncodedFormat::Jpeg,
        };
        return decode_photographic(resolver, width, height, format, decoded.data, soft_mask, codec, limits);
    }

    let is_stencil = resolver.get(dict, "ImageMask").and_then(Object::as_bool).unwrap_or(false);
    let (raster, mut approximate) = if is_stencil {
        (expand_stencil(resolver, dict, &decoded.data, width, height), false)
    } else {
        let bits = resolver
            .get_number(dict, "BitsPerComponent")
            .or_else(|| resolver.get_number(dict, "BPC"))
            .map(|b| b as u8)
            .unwrap_or(8);
        let color_space = resolve_color_space(
            resolver,
            resolver.get(dict, "ColorSpace").or_else(|| resolver.get(dict, "CS")),
            limits.max_stream_size,
        );
        let defaulted_space = color_space.is_defaulted();
        let color_space = match color_space.into_option() {
            Some(cs) => cs,
            None => ColorSpaceDescriptor::rgb(),
        };
        let decode_range = resolver
            .get_numbers(dict, "Decode")
            .filter(|d| d.len() >= 2)
            .map(|d| [d[0], d[1]]);

        let expanded = expand_samples(&decoded.data, width, height, bits, &color_space, decode_range);
        (expanded.raster, expanded.approximate || defaulted_space)
    };

    let mut raster = raster;
    if let Some(mask) = soft_mask {
        match decode_soft_mask(resolver, mask, width, height, codec, limits) {
            Some(alpha) => raster.apply_alpha(&alpha),
            None => {
                log::debug!("Soft mask could not be decoded, image stays opaque");
                approximate = true;
            },
        }
    }

    let image = DecodedImage::from_raster(raster);
    if approximate {
        Outcome::Defaulted(image)
    } else {
        Outcome::Decoded(image)
    }
}

fn image_dimensions<R: ObjectResolver + ?Sized>(resolver: &R, dict: &Dict) -> crate::error::Result<(u32, u32)> {
    let read = |long: &'static str, short: &str| {
        resolver
            .get_number(dict, long)
            .or_else(|| resolver.get_number(dict, short))
            .filter(|v| *v >= 1.0)
            .map(|v| v as u32)
            .ok_or(Error::MissingKey(long))
    };
    Ok((read("Width", "W")?, read("Height", "H")?))
}

#[allow(clippy::too_many_arguments)]
fn decode_photographic<R: ObjectResolver + ?Sized>(
    resolver: &R,
    width: u32,
    height: u32,
    format: EncodedFormat,
    bytes: Vec<u8>,
    soft_mask: Option<&Object>,
    codec: &dyn ImageCodec,
    limits: &ImageLimits,
) -> Outcome<DecodedImage> {
    let mask = match soft_mask {
        Some(mask) => mask,
        None => return Outcome::Decoded(DecodedImage::encoded(width, height, format, bytes)),
    };

    let mut raster = match codec.decode(format, &bytes) {
        Ok(raster) => raster,
        Err(e) => {
            log::warn!("Native decode of masked {:?} image failed: {}", format, e);
            return Outcome::Defaulted(DecodedImage::encoded(width, height, format, bytes));
        },
    };
    // The codec is authoritative for the pixel grid
    match decode_soft_mask(resolver, mask, raster.width(), raster.height(), codec, limits) {
        Some(alpha) => {
            raster.apply_alpha(&alpha);
            Outcome::Decoded(DecodedImage::from_raster(raster))
        },
        None => {
            log::debug!("Soft mask of {:?} image could not be decoded", format);
            Outcome::Defaulted(DecodedImage::encoded(width, height, format, bytes))
        },
    }
}

/// Decode a soft mask to one alpha byte per pixel of the `width x height` target.
fn decode_soft_mask<R: ObjectResolver + ?Sized>(
    resolver: &R,
    mask: &Object,
    width: u32,
    height: u32,
    codec: &dyn ImageCodec,
    limits: &ImageLimits,
) -> Option<Vec<u8>> {
    let (dict, data) = resolver.deref(mask).as_stream()?;
    let (mw, mh) = image_dimensions(resolver, dict).ok()?;
    if mw as u64 * mh as u64 > limits.max_pixels {
        return None;
    }

    let decoded = decode_stream(resolver, dict, data, limits.max_stream_size)
        .map_err(|e| log::debug!("Soft mask stream: {}", e))
        .ok()?;

    let alpha = match decoded.terminal {
        Some(Filter::JPXDecode) => first_channel(&codec.decode(EncodedFormat::Jpeg2000, &decoded.data).ok()?),
        Some(_) => first_channel(&codec.decode(EncodedFormat::Jpeg, &decoded.data).ok()?),
        None => {
            let bits = resolver.get_number(dict, "BitsPerComponent").map(|b| b as u8).unwrap_or(8);
            unpack_bits(&decoded.data, mw as usize, mh as usize, bits)
        },
    };

    if (mw, mh) == (width, height) {
        Some(alpha)
    } else {
        Some(resample_nearest(&alpha, mw, mh, width, height))
    }
}

fn first_channel(raster: &DecodedRaster) -> Vec<u8> {
    raster.pixels().chunks_exact(4).map(|px| px[0]).collect()
}

fn resample_nearest(samples: &[u8], sw: u32, sh: u32, dw: u32, dh: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(dw as usize * dh as usize);
    for y in 0..dh as u64 {
        let sy = (y * sh as u64 / dh as u64) as usize;
        for x in 0..dw as u64 {
            let sx = (x * sw as u64 / dw as u64) as usize;
            out.push(samples.get(sy * sw as usize + sx).copied().unwrap_or(255));
        }
    }
    out
}

/// `/ImageMask` stencil: 0 paints black, 1 leaves the pixel transparent.
fn expand_stencil<R: ObjectResolver + ?Sized>(
    resolver: &R,
    dict: &Dict,
    data: &[u8],
    width: u32,
    height: u32,
) -> DecodedRaster {
    let inverted = resolver
        .get_numbers(dict, "Decode")
        .is_some_and(|d| d.first().copied() == Some(1.0));
    let samples = unpack_indices(data, width as usize, height as usize, 1);

    let mut pixels = Vec::with_capacity(samples.len() * 4);
    for sample in samples {
        let paint = (sample == 0) != inverted;
        pixels.extend_from_slice(if paint { &[0, 0, 0, 255] } else { &[0, 0, 0, 0] });
    }
    DecodedRaster {
        width,
        height,
        pixels,
    }
}

struct Expanded {
    raster: DecodedRaster,
    approximate: bool,
}

fn expand_samples(
    data: &[u8],
    width: u32,
    height: u32,
    bits: u8,
    color_space: &ColorSpaceDescriptor,
    decode_range: Option<[f64; 2]>,
) -> Expanded {
    let pixel_count = width as usize * height as usize;
    let comps = color_space.component_count.max(1);
    let row_samples = width as usize * comps;

    let expected_bytes = (row_samples * bits as usize).div_ceil(8) * height as usize;
    let mut approximate = data.len() < expected_bytes;
    if approximate {
        log::debug!(
            "Image data has {} of {} expected bytes, padding with zeros",
            data.len(),
            expected_bytes
        );
    }

    let mut pixels = Vec::with_capacity(pixel_count * 4);
    match color_space.kind {
        ColorSpaceKind::Indexed => {
            let indices = unpack_indices(data, width as usize, height as usize, bits);
            for index in indices {
                let [r, g, b] = color_space.palette_rgb(index);
                pixels.extend_from_slice(&[r, g, b, 255]);
            }
        },
        kind => {
            let samples = unpack_bits(data, row_samples, height as usize, bits);
            for px in samples.chunks_exact(comps) {
                let rgb = match (kind, comps) {
                    (ColorSpaceKind::Gray, _) => [remap_gray(px[0], decode_range); 3],
                    (ColorSpaceKind::Cmyk, 4) | (ColorSpaceKind::DeviceN, 4) => {
                        cmyk8_to_rgb(px[0], px[1], px[2], px[3])
                    },
                    (_, n) if n >= 3 => [px[0], px[1], px[2]],
                    _ => {
                        approximate = true;
                        [px[0]; 3]
                    },
                };
                pixels.extend_from_slice(&[rgb[0], rgb[1], rgb[2], 255]);
            }
        },
    }

    Expanded {
        raster: DecodedRaster {
            width,
            height,
            pixels,
        },
        approximate,
    }
}

/// Apply a gray `/Decode [d0 d1]` range (component space 0-1).
fn remap_gray(value: u8, decode_range: Option<[f64; 2]>) -> u8 {
    match decode_range {
        Some([d0, d1]) if (d0, d1) != (0.0, 1.0) => {
            let v = d0 + (value as f64 / 255.0) * (d1 - d0);
            (v * 255.0).round().clamp(0.0, 255.0) as u8
        },
        _ => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::DefaultImageCodec;
    use crate::object::ObjectStore;
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn zlib(data: &[u8]) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn image(entries: Vec<(&str, Object)>, data: Vec<u8>) -> Object {
        Object::stream(entries, data)
    }

    fn decode(store: &ObjectStore, obj: &Object) -> Outcome<DecodedImage> {
        decode_image_object(store, obj, &DefaultImageCodec, &ImageLimits::default())
    }

    #[test]
    fn test_gray_flate() {
        let store = ObjectStore::new();
        let obj = image(
            vec![
                ("Width", Object::Integer(2)),
                ("Height", Object::Integer(1)),
                ("BitsPerComponent", Object::Integer(8)),
                ("ColorSpace", Object::name("DeviceGray")),
                ("Filter", Object::name("FlateDecode")),
            ],
            zlib(&[0, 200]),
        );
        let out = decode(&store, &obj);
        assert!(out.is_decoded());
        let raster = out.value().unwrap().raster().unwrap().clone();
        assert_eq!(raster.pixel(1, 0), Some([200, 200, 200, 255]));
    }

    #[test]
    fn test_gray_decode_array_inverts() {
        let store = ObjectStore::new();
        let obj = image(
            vec![
                ("Width", Object::Integer(2)),
                ("Height", Object::Integer(1)),
                ("ColorSpace", Object::name("DeviceGray")),
                ("Decode", Object::numbers(&[1.0, 0.0])),
            ],
            vec![0, 255],
        );
        let out = decode(&store, &obj).into_option().unwrap();
        let raster = out.raster().unwrap();
        assert_eq!(raster.pixel(0, 0), Some([255, 255, 255, 255]));
        assert_eq!(raster.pixel(1, 0), Some([0, 0, 0, 255]));
    }

    #[test]
    fn test_one_bit_gray_rows_are_byte_aligned() {
        let store = ObjectStore::new();
        // 3 pixels per row, rows padded to one byte
        let obj = image(
            vec![
                ("Width", Object::Integer(3)),
                ("Height", Object::Integer(2)),
                ("BitsPerComponent", Object::Integer(1)),
                ("ColorSpace", Object::name("DeviceGray")),
            ],
            vec![0b1010_0000, 0b0100_0000],
        );
        let out = decode(&store, &obj).into_option().unwrap();
        let raster = out.raster().unwrap();
        assert_eq!(raster.pixel(0, 0), Some([255, 255, 255, 255]));
        assert_eq!(raster.pixel(1, 0), Some([0, 0, 0, 255]));
        assert_eq!(raster.pixel(2, 0), Some([255, 255, 255, 255]));
        assert_eq!(raster.pixel(0, 1), Some([0, 0, 0, 255]));
        assert_eq!(raster.pixel(1, 1), Some([255, 255, 255, 255]));
    }

    #[test]
    fn test_cmyk() {
        let store = ObjectStore::new();
        let obj = image(
            vec![
                ("Width", Object::Integer(1)),
                ("Height", Object::Integer(1)),
                ("ColorSpace", Object::name("DeviceCMYK")),
            ],
            vec![255, 0, 0, 0],
        );
        let out = decode(&store, &obj).into_option().unwrap();
        assert_eq!(out.raster().unwrap().pixel(0, 0), Some([0, 255, 255, 255]));
    }

    #[test]
    fn test_indexed_palette() {
        let store = ObjectStore::new();
        let cs = Object::Array(vec![
            Object::name("Indexed"),
            Object::name("DeviceRGB"),
            Object::Integer(1),
            Object::String(vec![0, 255, 0, 255, 0, 0]),
        ]);
        let obj = image(
            vec![
                ("Width", Object::Integer(2)),
                ("Height", Object::Integer(1)),
                ("BitsPerComponent", Object::Integer(8)),
                ("ColorSpace", cs),
            ],
            vec![0, 1],
        );
        let out = decode(&store, &obj);
        assert!(out.is_decoded());
        let raster = out.value().unwrap().raster().unwrap().clone();
        assert_eq!(raster.pixel(0, 0), Some([0, 255, 0, 255]));
        assert_eq!(raster.pixel(1, 0), Some([255, 0, 0, 255]));
    }

    #[test]
    fn test_indexed_four_bit_indices_not_scaled() {
        let store = ObjectStore::new();
        let cs = Object::Array(vec![
            Object::name("Indexed"),
            Object::name("DeviceGray"),
            Object::Integer(1),
            Object::String(vec![10, 240]),
        ]);
        let obj = image(
            vec![
                ("Width", Object::Integer(2)),
                ("Height", Object::Integer(1)),
                ("BitsPerComponent", Object::Integer(4)),
                ("ColorSpace", cs),
            ],
            vec![0x01],
        );
        let out = decode(&store, &obj).into_option().unwrap();
        let raster = out.raster().unwrap();
        assert_eq!(raster.pixel(0, 0), Some([10, 10, 10, 255]));
        assert_eq!(raster.pixel(1, 0), Some([240, 240, 240, 255]));
    }

    #[test]
    fn test_soft_mask_sets_alpha() {
        let mut store = ObjectStore::new();
        let mask = store.insert(
            5,
            Object::stream(
                vec![
                    ("Width", Object::Integer(2)),
                    ("Height", Object::Integer(1)),
                    ("BitsPerComponent", Object::Integer(8)),
                    ("Filter", Object::name("FlateDecode")),
                ],
                zlib(&[0, 128]),
            ),
        );
        let obj = image(
            vec![
                ("Width", Object::Integer(2)),
                ("Height", Object::Integer(1)),
                ("ColorSpace", Object::name("DeviceRGB")),
                ("SMask", Object::Reference(mask)),
            ],
            vec![255, 0, 0, 0, 0, 255],
        );
        let out = decode(&store, &obj);
        assert!(out.is_decoded());
        let raster = out.value().unwrap().raster().unwrap().clone();
        assert_eq!(raster.pixel(0, 0), Some([255, 0, 0, 0]));
        assert_eq!(raster.pixel(1, 0), Some([0, 0, 255, 128]));
    }

    #[test]
    fn test_stencil_mask() {
        let store = ObjectStore::new();
        let obj = image(
            vec![
                ("Width", Object::Integer(2)),
                ("Height", Object::Integer(1)),
                ("ImageMask", Object::Boolean(true)),
            ],
            vec![0b0100_0000],
        );
        let out = decode(&store, &obj).into_option().unwrap();
        let raster = out.raster().unwrap();
        assert_eq!(raster.pixel(0, 0), Some([0, 0, 0, 255]));
        assert_eq!(raster.pixel(1, 0), Some([0, 0, 0, 0]));
    }

    #[test]
    fn test_jpeg_passes_through() {
        let store = ObjectStore::new();
        let bytes = vec![0xFF, 0xD8, 0xFF, 0xE0];
        let obj = image(
            vec![
                ("Width", Object::Integer(10)),
                ("Height", Object::Integer(20)),
                ("Filter", Object::name("DCTDecode")),
            ],
            bytes.clone(),
        );
        let out = decode(&store, &obj);
        assert!(out.is_decoded());
        assert_eq!(
            out.into_option().unwrap(),
            DecodedImage::encoded(10, 20, EncodedFormat::Jpeg, bytes)
        );
    }

    #[test]
    fn test_jpx_with_mask_falls_back_to_blob() {
        let store = ObjectStore::new();
        let mask = Object::stream(
            vec![("Width", Object::Integer(1)), ("Height", Object::Integer(1))],
            vec![255],
        );
        let obj = image(
            vec![
                ("Width", Object::Integer(1)),
                ("Height", Object::Integer(1)),
                ("Filter", Object::name("JPXDecode")),
                ("SMask", mask),
            ],
            vec![0, 0, 0, 12],
        );
        let out = decode(&store, &obj);
        assert!(out.is_defaulted());
        assert!(matches!(
            out.into_option().unwrap().data,
            crate::images::ImageData::Encoded {
                format: EncodedFormat::Jpeg2000,
                ..
            }
        ));
    }

    #[test]
    fn test_missing_dimensions_and_empty_data() {
        let store = ObjectStore::new();
        let no_width = image(vec![("Height", Object::Integer(1))], vec![1, 2, 3]);
        assert!(matches!(decode(&store, &no_width).error(), Some(Error::MissingKey("Width"))));

        let empty = image(
            vec![("Width", Object::Integer(1)), ("Height", Object::Integer(1))],
            Vec::new(),
        );
        assert!(decode(&store, &empty).is_failed());

        assert!(decode(&store, &Object::Integer(3)).is_failed());
    }

    #[test]
    fn test_pixel_limit() {
        let store = ObjectStore::new();
        let obj = image(
            vec![("Width", Object::Integer(100)), ("Height", Object::Integer(100))],
            vec![0; 16],
        );
        let limits = ImageLimits {
            max_pixels: 1000,
            ..ImageLimits::default()
        };
        let out = decode_image_object(&store, &obj, &DefaultImageCodec, &limits);
        assert!(matches!(out.error(), Some(Error::Image(_))));
    }

    #[test]
    fn test_short_data_is_defaulted() {
        let store = ObjectStore::new();
        let obj = image(
            vec![
                ("Width", Object::Integer(2)),
                ("Height", Object::Integer(2)),
                ("ColorSpace", Object::name("DeviceRGB")),
            ],
            vec![10, 20, 30],
        );
        let out = decode(&store, &obj);
        assert!(out.is_defaulted());
        let raster = out.value().unwrap().raster().unwrap().clone();
        assert_eq!(raster.pixel(0, 0), Some([10, 20, 30, 255]));
        assert_eq!(raster.pixel(1, 1), Some([0, 0, 0, 255]));
    }

    #[test]
    fn test_resample_nearest() {
        assert_eq!(resample_nearest(&[0, 255], 2, 1, 4, 1), vec![0, 0, 255, 255]);
    }
}
