//! Color values and their hex-string form.
//!
//! Annotation dictionaries carry colors as 1, 3 or 4 component arrays
//! (`/C`, `/IC`, `/MK /BC`). Most producers write components in 0.0-1.0, but
//! some write 0-255; [`color_array_to_hex`] detects which.

/// Default stroke color.
pub const BLACK_HEX: &str = "#000000";

/// A device color as found in an annotation dictionary or content stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnnotationColor {
    /// Grayscale (1 component)
    Gray(f64),
    /// RGB color (3 components)
    Rgb(f64, f64, f64),
    /// CMYK color (4 components)
    Cmyk(f64, f64, f64, f64),
}

impl AnnotationColor {
    /// Build a color from a component array. Components are expected in 0-1.
    ///
    /// Returns `None` for component counts other than 1, 3 and 4.
    pub fn from_components(components: &[f64]) -> Option<Self> {
        match *components {
            [g] => Some(Self::Gray(g)),
            [r, g, b] => Some(Self::Rgb(r, g, b)),
            [c, m, y, k] => Some(Self::Cmyk(c, m, y, k)),
            _ => None,
        }
    }

    /// Convert to 8-bit RGB.
    pub fn to_rgb8(&self) -> [u8; 3] {
        match *self {
            Self::Gray(g) => {
                let v = unit_to_byte(g);
                [v, v, v]
            },
            Self::Rgb(r, g, b) => [unit_to_byte(r), unit_to_byte(g), unit_to_byte(b)],
            Self::Cmyk(c, m, y, k) => cmyk_to_rgb(c, m, y, k),
        }
    }

    /// Lowercase `#rrggbb` form.
    pub fn to_hex(&self) -> String {
        rgb_to_hex(self.to_rgb8())
    }
}

/// Naive CMYK to RGB conversion (no ICC transform), components in 0-1.
pub fn cmyk_to_rgb(c: f64, m: f64, y: f64, k: f64) -> [u8; 3] {
    let channel = |v: f64| unit_to_byte((1.0 - v.clamp(0.0, 1.0)) * (1.0 - k.clamp(0.0, 1.0)));
    [channel(c), channel(m), channel(y)]
}

/// Naive CMYK to RGB conversion for 8-bit samples.
pub fn cmyk8_to_rgb(c: u8, m: u8, y: u8, k: u8) -> [u8; 3] {
    let unit = |v: u8| v as f64 / 255.0;
    cmyk_to_rgb(unit(c), unit(m), unit(y), unit(k))
}

/// Format 8-bit RGB as lowercase `#rrggbb`.
pub fn rgb_to_hex(rgb: [u8; 3]) -> String {
    format!("#{:02x}{:02x}{:02x}", rgb[0], rgb[1], rgb[2])
}

/// Convert an annotation color array to `#rrggbb`.
///
/// Three-component arrays whose values are all `<= 1` are read as 0-1,
/// otherwise as 0-255. Gray and CMYK arrays are always 0-1. Returns `None`
/// for empty arrays and unsupported component counts.
pub fn color_array_to_hex(components: &[f64]) -> Option<String> {
    if let [r, g, b] = *components {
        let normalized = r <= 1.0 && g <= 1.0 && b <= 1.0;
        let scale = if normalized { 255.0 } else { 1.0 };
        let byte = |v: f64| (v * scale).round().clamp(0.0, 255.0) as u8;
        return Some(rgb_to_hex([byte(r), byte(g), byte(b)]));
    }
    AnnotationColor::from_components(components).map(|c| c.to_hex())
}

fn unit_to_byte(v: f64) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}
