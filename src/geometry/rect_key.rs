//! Rectangle keys for correlating render-and-crop results with annotations.

use std::fmt;

use super::PdfRect;

/// Largest per-coordinate difference at which two rectangle keys still name
/// the same annotation.
pub const RECT_MATCH_TOLERANCE: f64 = 1.0;

/// An annotation rectangle used as a lookup key.
///
/// Equality is exact on the string form (`"x0,y0,x1,y1"`); use
/// [`RectKey::matches_within`] for tolerant comparison.
#[derive(Debug, Clone)]
pub struct RectKey {
    text: String,
    coords: [f64; 4],
}

impl RectKey {
    /// Build a key from four rectangle coordinates, in the order given.
    pub fn new(coords: [f64; 4]) -> Self {
        let text = coords.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(",");
        Self { text, coords }
    }

    /// Build a key from a normalized PDF rectangle.
    pub fn from_rect(rect: &PdfRect) -> Self {
        Self::new(rect.coords())
    }

    /// The string form.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The coordinates this key was built from.
    pub fn coords(&self) -> [f64; 4] {
        self.coords
    }

    /// True if every coordinate differs by at most `tolerance`.
    pub fn matches_within(&self, other: &RectKey, tolerance: f64) -> bool {
        self.coords
            .iter()
            .zip(other.coords.iter())
            .all(|(a, b)| (a - b).abs() <= tolerance)
    }
}

impl PartialEq for RectKey {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for RectKey {}

impl std::hash::Hash for RectKey {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.text.hash(state);
    }
}

impl fmt::Display for RectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
