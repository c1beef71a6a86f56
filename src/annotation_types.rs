//! Core annotation enums per PDF spec ISO 32000-1:2008, Section 12.5.
//!
//! The subtype enum is closed: every subtype the normalizer knows gets a
//! variant, everything else lands in [`AnnotationSubtype::Other`] and is
//! reported as unsupported.

use bitflags::bitflags;
use serde::Serialize;

/// Annotation subtype per PDF spec Table 169.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AnnotationSubtype {
    /// Text annotation (sticky note) - Section 12.5.6.4
    Text,
    /// Free text annotation - Section 12.5.6.6
    FreeText,
    /// Line annotation - Section 12.5.6.7
    Line,
    /// Square annotation - Section 12.5.6.8
    Square,
    /// Circle annotation - Section 12.5.6.8
    Circle,
    /// Polygon annotation - Section 12.5.6.9
    Polygon,
    /// Polyline annotation - Section 12.5.6.9
    PolyLine,
    /// Highlight annotation - Section 12.5.6.10
    Highlight,
    /// Underline annotation - Section 12.5.6.10
    Underline,
    /// Squiggly underline annotation - Section 12.5.6.10
    Squiggly,
    /// Strikeout annotation - Section 12.5.6.10
    StrikeOut,
    /// Rubber stamp annotation - Section 12.5.6.12
    Stamp,
    /// Ink annotation - Section 12.5.6.13
    Ink,
    /// Any subtype without a record mapping (Link, Popup, Widget, ...)
    Other(String),
}

impl AnnotationSubtype {
    /// Get PDF name for this subtype.
    pub fn pdf_name(&self) -> &str {
        match self {
            Self::Text => "Text",
            Self::FreeText => "FreeText",
            Self::Line => "Line",
            Self::Square => "Square",
            Self::Circle => "Circle",
            Self::Polygon => "Polygon",
            Self::PolyLine => "PolyLine",
            Self::Highlight => "Highlight",
            Self::Underline => "Underline",
            Self::Squiggly => "Squiggly",
            Self::StrikeOut => "StrikeOut",
            Self::Stamp => "Stamp",
            Self::Ink => "Ink",
            Self::Other(name) => name,
        }
    }

    /// Parse from PDF name.
    pub fn from_pdf_name(name: &str) -> Self {
        match name {
            "Text" => Self::Text,
            "FreeText" => Self::FreeText,
            "Line" => Self::Line,
            "Square" => Self::Square,
            "Circle" => Self::Circle,
            "Polygon" => Self::Polygon,
            "PolyLine" => Self::PolyLine,
            "Highlight" => Self::Highlight,
            "Underline" => Self::Underline,
            "Squiggly" => Self::Squiggly,
            "StrikeOut" => Self::StrikeOut,
            "Stamp" => Self::Stamp,
            "Ink" => Self::Ink,
            other => Self::Other(other.to_string()),
        }
    }

    /// Subtypes whose `/IC` interior color is meaningful.
    pub fn has_interior_color(&self) -> bool {
        matches!(
            self,
            Self::FreeText | Self::Square | Self::Circle | Self::Line | Self::PolyLine | Self::Polygon
        )
    }
}

impl std::fmt::Display for AnnotationSubtype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.pdf_name())
    }
}

bitflags! {
    /// Annotation flags (`/F` entry).
    ///
    /// Per PDF spec Table 165 (Annotation flags).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct AnnotationFlags: u32 {
        /// Bit 1: Do not display if no handler is available
        const INVISIBLE = 1 << 0;
        /// Bit 2: Do not display or print
        const HIDDEN = 1 << 1;
        /// Bit 3: Print the annotation
        const PRINT = 1 << 2;
        /// Bit 4: Do not scale with page magnification
        const NO_ZOOM = 1 << 3;
        /// Bit 5: Do not rotate with the page
        const NO_ROTATE = 1 << 4;
        /// Bit 6: Do not display on screen
        const NO_VIEW = 1 << 5;
        /// Bit 7: Do not allow interaction
        const READ_ONLY = 1 << 6;
        /// Bit 8: Do not allow deletion or property changes
        const LOCKED = 1 << 7;
        /// Bit 9: Invert NO_VIEW for certain events
        const TOGGLE_NO_VIEW = 1 << 8;
        /// Bit 10: Do not allow contents changes
        const LOCKED_CONTENTS = 1 << 9;
    }
}

/// Border style of a shape or text box outline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BorderStyle {
    /// Continuous stroke
    #[default]
    Solid,
    /// `/S /D`
    Dashed,
    /// `/S /B` and `/S /I` are drawn as a dotted outline
    Dotted,
}

impl BorderStyle {
    /// Map a `/BS /S` name.
    pub fn from_pdf_name(name: &str) -> Self {
        match name {
            "D" => Self::Dashed,
            "B" | "I" => Self::Dotted,
            _ => Self::Solid,
        }
    }
}

/// Line ending drawn at one end of a line record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineEnding {
    /// No decoration
    #[default]
    None,
    /// Open arrow head
    Open,
    /// Closed (filled) arrow head
    Closed,
    /// Diamond
    Diamond,
    /// Circle
    Circle,
    /// Square
    Square,
    /// Slash
    Slash,
    /// Perpendicular bar
    Butt,
}

impl LineEnding {
    /// Map an `/LE` name. Reverse arrows and unknown names draw nothing.
    pub fn from_pdf_name(name: &str) -> Self {
        match name {
            "OpenArrow" => Self::Open,
            "ClosedArrow" => Self::Closed,
            "Diamond" => Self::Diamond,
            "Circle" => Self::Circle,
            "Square" => Self::Square,
            "Slash" => Self::Slash,
            "Butt" => Self::Butt,
            _ => Self::None,
        }
    }

    /// True for any visible decoration.
    pub fn is_decorated(&self) -> bool {
        *self != Self::None
    }
}
