//! Default appearance (`/DA`) strings and appearance content scanning.
//!
//! Only the handful of operators a free text box needs are recognized; this
//! is pattern matching over operator text, not a content stream interpreter.

use lazy_static::lazy_static;
use regex::Regex;

use crate::color::color_array_to_hex;

lazy_static! {
    static ref RE_FONT_REF: Regex = Regex::new(r"/([^\s)]+)\s+[\d.]+\s+Tf").unwrap();
    static ref RE_FONT_SIZE: Regex = Regex::new(r"(\d+(?:\.\d+)?)\s+Tf").unwrap();
    static ref RE_FILL_RGB: Regex = Regex::new(r"([\d.]+)\s+([\d.]+)\s+([\d.]+)\s+rg\b").unwrap();
    static ref RE_FILL_GRAY: Regex = Regex::new(r"(?:^|\s)([\d.]+)\s+g\b").unwrap();
    static ref RE_STROKE_RGB: Regex = Regex::new(r"([\d.]+)\s+([\d.]+)\s+([\d.]+)\s+RG\b").unwrap();
}

/// Parsed `/DA` string, e.g. `/Helv 12 Tf 0 0 1 rg`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DefaultAppearance {
    /// Font resource name without the slash
    pub font_ref: Option<String>,
    /// Font size in points
    pub font_size: Option<f64>,
    /// Text color as `#rrggbb`
    pub text_color: Option<String>,
}

impl DefaultAppearance {
    /// Parse a DA string. Unrecognized content is ignored.
    pub fn parse(da: &str) -> Self {
        let font_ref = RE_FONT_REF.captures(da).map(|c| c[1].to_string());
        let font_size = RE_FONT_SIZE
            .captures(da)
            .and_then(|c| c[1].parse::<f64>().ok())
            .filter(|size| *size > 0.0);

        let text_color = match RE_FILL_RGB.captures(da) {
            Some(c) => parse_components(&[&c[1], &c[2], &c[3]]).and_then(|rgb| color_array_to_hex(&rgb)),
            None => RE_FILL_GRAY
                .captures(da)
                .and_then(|c| parse_components(&[&c[1]]))
                .and_then(|gray| color_array_to_hex(&gray)),
        };

        Self {
            font_ref,
            font_size,
            text_color,
        }
    }
}

/// First `r g b RG` stroke color in decoded appearance content.
pub fn scan_stroke_color(content: &str) -> Option<String> {
    let c = RE_STROKE_RGB.captures(content)?;
    let rgb = parse_components(&[&c[1], &c[2], &c[3]])?;
    // Operands are always 0-1 here, even when all three are 1
    let byte = |v: f64| (v * 255.0).round().clamp(0.0, 255.0) as u8;
    Some(crate::color::rgb_to_hex([byte(rgb[0]), byte(rgb[1]), byte(rgb[2])]))
}

fn parse_components(parts: &[&str]) -> Option<Vec<f64>> {
    parts.iter().map(|p| p.parse::<f64>().ok()).collect()
}
