//! Image color space resolution.
//!
//! Turns a `/ColorSpace` entry (a name or a `[family params...]` array) into
//! a [`ColorSpaceDescriptor`] the raster decoder can expand to RGBA.
//! Unknown or malformed spaces resolve to RGB and are reported as
//! [`Outcome::Defaulted`]; a best-effort preview beats no image.

use crate::color::cmyk8_to_rgb;
use crate::decoders::decode_stream_object;
use crate::error::Error;
use crate::object::{Object, ObjectResolver};
use crate::outcome::Outcome;

/// Nesting limit for Indexed bases.
const MAX_COLOR_SPACE_DEPTH: u32 = 4;

/// Largest component count accepted from `/N` or a DeviceN colorant list.
const MAX_COLOR_COMPONENTS: usize = 32;

/// Family of a resolved color space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpaceKind {
    /// One gray channel (also Separation tints)
    Gray,
    /// Red, green, blue
    Rgb,
    /// Cyan, magenta, yellow, black
    Cmyk,
    /// Palette lookup
    Indexed,
    /// N colorants
    DeviceN,
}

/// Resolved color space of one image.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorSpaceDescriptor {
    /// Color space family
    pub kind: ColorSpaceKind,
    /// Samples per pixel in the image data (1 for Indexed)
    pub component_count: usize,
    /// Palette bytes for Indexed spaces
    pub palette: Option<Vec<u8>>,
    /// Family of the palette entries
    pub base_kind: Option<ColorSpaceKind>,
    /// Bytes per palette entry
    pub base_component_count: Option<usize>,
    /// Highest valid palette index
    pub high_value: Option<u32>,
}

impl ColorSpaceDescriptor {
    fn simple(kind: ColorSpaceKind, component_count: usize) -> Self {
        Self {
            kind,
            component_count,
            palette: None,
            base_kind: None,
            base_component_count: None,
            high_value: None,
        }
    }

    /// DeviceGray.
    pub fn gray() -> Self {
        Self::simple(ColorSpaceKind::Gray, 1)
    }

    /// DeviceRGB.
    pub fn rgb() -> Self {
        Self::simple(ColorSpaceKind::Rgb, 3)
    }

    /// DeviceCMYK.
    pub fn cmyk() -> Self {
        Self::simple(ColorSpaceKind::Cmyk, 4)
    }

    /// DeviceN with `n` colorants.
    pub fn device_n(n: usize) -> Self {
        Self::simple(ColorSpaceKind::DeviceN, n)
    }

    /// Indexed space over `base` with the given lookup table.
    pub fn indexed(base: &ColorSpaceDescriptor, high_value: u32, palette: Vec<u8>) -> Self {
        Self {
            kind: ColorSpaceKind::Indexed,
            component_count: 1,
            palette: Some(palette),
            base_kind: Some(base.kind),
            base_component_count: Some(base.component_count),
            high_value: Some(high_value),
        }
    }

    /// Look up a palette index. Out-of-range indices clamp to `high_value`;
    /// entries past the end of a short lookup table read as zero.
    pub fn palette_rgb(&self, index: u8) -> [u8; 3] {
        let palette = self.palette.as_deref().unwrap_or(&[]);
        let width = self.base_component_count.unwrap_or(3).max(1);
        let index = match self.high_value {
            Some(hival) => (index as u32).min(hival) as usize,
            None => index as usize,
        };
        let start = index * width;
        let mut entry = [0u8; 4];
        for (i, slot) in entry.iter_mut().enumerate().take(width.min(4)) {
            *slot = palette.get(start + i).copied().unwrap_or(0);
        }
        match (self.base_kind, width) {
            (Some(ColorSpaceKind::Cmyk), 4) => cmyk8_to_rgb(entry[0], entry[1], entry[2], entry[3]),
            (Some(ColorSpaceKind::Gray), 1) => [entry[0]; 3],
            _ => [entry[0], entry[1], entry[2]],
        }
    }
}

/// Resolve an image's `/ColorSpace` entry. A missing entry defaults to RGB.
pub fn resolve_color_space<R: ObjectResolver + ?Sized>(
    resolver: &R,
    color_space: Option<&Object>,
    max_stream_size: usize,
) -> Outcome<ColorSpaceDescriptor> {
    match color_space {
        Some(obj) => resolve_value(resolver, obj, max_stream_size, 0),
        None => Outcome::Defaulted(ColorSpaceDescriptor::rgb()),
    }
}

fn resolve_value<R: ObjectResolver + ?Sized>(
    resolver: &R,
    obj: &Object,
    max_stream_size: usize,
    depth: u32,
) -> Outcome<ColorSpaceDescriptor> {
    if depth > MAX_COLOR_SPACE_DEPTH {
        log::warn!("Color space nesting deeper than {}, using RGB", MAX_COLOR_SPACE_DEPTH);
        return Outcome::Defaulted(ColorSpaceDescriptor::rgb());
    }

    match resolver.deref(obj) {
        Object::Name(name) => resolve_name(name),
        Object::Array(items) => resolve_array(resolver, items, max_stream_size, depth),
        other => {
            log::debug!("Unexpected color space object {}, using RGB", other.type_name());
            Outcome::Defaulted(ColorSpaceDescriptor::rgb())
        },
    }
}

fn resolve_name(name: &str) -> Outcome<ColorSpaceDescriptor> {
    match name {
        "DeviceGray" | "CalGray" | "G" => Outcome::Decoded(ColorSpaceDescriptor::gray()),
        "DeviceCMYK" | "CMYK" => Outcome::Decoded(ColorSpaceDescriptor::cmyk()),
        "DeviceRGB" | "CalRGB" | "RGB" => Outcome::Decoded(ColorSpaceDescriptor::rgb()),
        other => {
            log::debug!("Unrecognized color space /{}, using RGB", other);
            Outcome::Defaulted(ColorSpaceDescriptor::rgb())
        },
    }
}

fn resolve_array<R: ObjectResolver + ?Sized>(
    resolver: &R,
    items: &[Object],
    max_stream_size: usize,
    depth: u32,
) -> Outcome<ColorSpaceDescriptor> {
    let family = match items.first().map(|o| resolver.deref(o)).and_then(Object::as_name) {
        Some(name) => name,
        None => return Outcome::Defaulted(ColorSpaceDescriptor::rgb()),
    };

    match family {
        "ICCBased" => {
            let n = items
                .get(1)
                .and_then(|profile| resolver.deref(profile).as_dict())
                .and_then(|dict| resolver.get_number(dict, "N"))
                .filter(|n| (1.0..=MAX_COLOR_COMPONENTS as f64).contains(n))
                .map(|n| n as usize);
            match n {
                Some(1) => Outcome::Decoded(ColorSpaceDescriptor::gray()),
                Some(4) => Outcome::Decoded(ColorSpaceDescriptor::cmyk()),
                Some(3) => Outcome::Decoded(ColorSpaceDescriptor::rgb()),
                Some(n) if n > 0 => Outcome::Defaulted(ColorSpaceDescriptor::simple(ColorSpaceKind::Rgb, n)),
                _ => Outcome::Defaulted(ColorSpaceDescriptor::rgb()),
            }
        },
        "Indexed" | "I" if items.len() >= 4 => resolve_indexed(resolver, items, max_stream_size, depth),
        // Single tint channel; not colorimetric
        "Separation" => Outcome::Defaulted(ColorSpaceDescriptor::gray()),
        "DeviceN" if items.len() >= 3 => {
            let n = resolver.deref(&items[1]).as_array().map(|names| names.len()).unwrap_or(4);
            if n > MAX_COLOR_COMPONENTS {
                log::warn!("DeviceN with {} colorants, using RGB", n);
                return Outcome::Defaulted(ColorSpaceDescriptor::rgb());
            }
            Outcome::Decoded(ColorSpaceDescriptor::device_n(n.max(1)))
        },
        // Calibrated and device families may also appear in array form
        "CalGray" | "CalRGB" | "DeviceGray" | "DeviceRGB" | "DeviceCMYK" => resolve_name(family),
        other => {
            log::debug!("Unrecognized color space family /{}, using RGB", other);
            Outcome::Defaulted(ColorSpaceDescriptor::rgb())
        },
    }
}

fn resolve_indexed<R: ObjectResolver + ?Sized>(
    resolver: &R,
    items: &[Object],
    max_stream_size: usize,
    depth: u32,
) -> Outcome<ColorSpaceDescriptor> {
    let base = resolve_value(resolver, &items[1], max_stream_size, depth + 1);
    let base_defaulted = !base.is_decoded();
    let base = base.into_option().unwrap_or_else(ColorSpaceDescriptor::rgb);

    let high_value = resolver
        .deref(&items[2])
        .as_number()
        .map(|v| v.clamp(0.0, 255.0) as u32)
        .unwrap_or(255);

    let lookup = resolver.deref(&items[3]);
    let palette = match lookup {
        Object::String(bytes) => Ok(bytes.clone()),
        Object::Stream { .. } => decode_stream_object(resolver, lookup, max_stream_size),
        other => Err(Error::InvalidObjectType {
            expected: "String or Stream".to_string(),
            found: other.type_name().to_string(),
        }),
    };

    match palette {
        Ok(palette) => {
            let descriptor = ColorSpaceDescriptor::indexed(&base, high_value, palette);
            if base_defaulted {
                Outcome::Defaulted(descriptor)
            } else {
                Outcome::Decoded(descriptor)
            }
        },
        Err(e) => {
            log::warn!("Unreadable Indexed lookup table: {}", e);
            Outcome::Defaulted(ColorSpaceDescriptor::indexed(&base, high_value, Vec::new()))
        },
    }
}
