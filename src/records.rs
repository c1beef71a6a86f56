//! Normalized annotation records.
//!
//! One record per supported PDF annotation, in Y-down page space. Records
//! serialize to the JSON shape the editor consumes: camelCase fields and a
//! `"type"` tag naming the record kind.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};

use crate::annotation_types::{BorderStyle, LineEnding};
use crate::annotations::AnnotationId;
use crate::appearance::ColorSource;
use crate::geometry::{Point, Rect};
use crate::images::ImageHandle;

fn serialize_timestamp<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Fields shared by every record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordCommon {
    /// Source annotation on its page
    pub source: AnnotationId,
    /// 1-based page number
    pub page: usize,
    /// `/T`, or the configured default author
    pub author: String,
    /// `/Subj`, empty when absent
    pub subject: String,
    /// `/CreationDate` in UTC
    #[serde(serialize_with = "serialize_timestamp")]
    pub created_at: DateTime<Utc>,
    /// `/M` in UTC
    #[serde(serialize_with = "serialize_timestamp")]
    pub modified_at: DateTime<Utc>,
    /// Constant opacity in `[0, 1]`
    pub opacity: f64,
    /// Flag bit 8
    pub locked: bool,
    /// Flag bit 3
    pub printable: bool,
    /// Flag bit 7
    pub read_only: bool,
}

/// Highlight, underline, strikeout or squiggly markup.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkupRecord {
    /// Shared fields
    #[serde(flatten)]
    pub common: RecordCommon,
    /// Union of `rects`, or `/Rect` without quad points
    #[serde(flatten)]
    pub bounds: Rect,
    /// One rectangle per quad
    pub rects: Vec<Rect>,
    /// Markup color
    pub color: String,
}

/// Rectangle or ellipse.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeRecord {
    /// Shared fields
    #[serde(flatten)]
    pub common: RecordCommon,
    /// Bounding box
    #[serde(flatten)]
    pub bounds: Rect,
    /// Outline color
    pub stroke_color: String,
    /// Interior color
    pub fill_color: Option<String>,
    /// Outline width
    pub line_width: f64,
    /// Outline style
    pub border_style: BorderStyle,
}

/// Straight line, with or without arrow heads.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineRecord {
    /// Shared fields
    #[serde(flatten)]
    pub common: RecordCommon,
    /// First `/L` point x
    pub start_x: f64,
    /// First `/L` point y
    pub start_y: f64,
    /// Second `/L` point x
    pub end_x: f64,
    /// Second `/L` point y
    pub end_y: f64,
    /// Decoration at the start point
    pub start_head: LineEnding,
    /// Decoration at the end point
    pub end_head: LineEnding,
    /// Arrow head size
    pub head_size: f64,
    /// Line color
    pub stroke_color: String,
    /// Fill of closed line endings
    pub fill_color: Option<String>,
    /// Stroke width
    pub line_width: f64,
    /// Stroke style
    pub border_style: BorderStyle,
}

/// Freehand ink stroke.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawRecord {
    /// Shared fields
    #[serde(flatten)]
    pub common: RecordCommon,
    /// Points of the first `/InkList` stroke
    pub path: Vec<Point>,
    /// Stroke color
    pub stroke_color: String,
    /// Stroke width
    pub line_width: f64,
    /// Stroke style
    pub border_style: BorderStyle,
}

/// Open polyline.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolylineRecord {
    /// Shared fields
    #[serde(flatten)]
    pub common: RecordCommon,
    /// Vertices
    pub points: Vec<Point>,
    /// Stroke color
    pub stroke_color: String,
    /// Stroke width
    pub line_width: f64,
    /// Stroke style
    pub border_style: BorderStyle,
}

/// Closed polygon, reduced to its bounding box and side count.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PolygonRecord {
    /// Shared fields
    #[serde(flatten)]
    pub common: RecordCommon,
    /// Bounding box of the vertices
    #[serde(flatten)]
    pub bounds: Rect,
    /// Number of vertices
    pub sides: usize,
    /// Outline color
    pub stroke_color: String,
    /// Interior color
    pub fill_color: Option<String>,
    /// Outline width
    pub line_width: f64,
    /// Outline style
    pub border_style: BorderStyle,
}

/// Sticky note.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRecord {
    /// Shared fields
    #[serde(flatten)]
    pub common: RecordCommon,
    /// Icon box, always 24x24 at the top-left of `/Rect`
    #[serde(flatten)]
    pub bounds: Rect,
    /// `/Contents`
    pub text: String,
    /// Icon color
    pub color: String,
    /// `/Name`
    pub icon: String,
}

/// Free text box.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextBoxRecord {
    /// Shared fields
    #[serde(flatten)]
    pub common: RecordCommon,
    /// Unrotated box, positioned so its center matches the `/Rect` center
    #[serde(flatten)]
    pub bounds: Rect,
    /// Clockwise rotation in degrees
    pub rotation: f64,
    /// `/Contents`
    pub text: String,
    /// Border color
    pub stroke_color: String,
    /// Where the border color came from
    pub stroke_color_source: ColorSource,
    /// Background color
    pub fill_color: Option<String>,
    /// Text color
    pub text_color: String,
    /// Font size in points
    pub font_size: f64,
    /// Font family
    pub font_family: String,
    /// Bold face
    pub font_bold: bool,
    /// Italic face
    pub font_italic: bool,
    /// Underlined text
    pub font_underline: bool,
    /// Struck-through text
    pub font_strikethrough: bool,
    /// Border style
    pub border_style: BorderStyle,
    /// Border width
    pub line_width: f64,
}

/// Free text box with a leader line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalloutRecord {
    /// Box fields
    #[serde(flatten)]
    pub text_box: TextBoxRecord,
    /// Arrow tip x
    pub arrow_x: f64,
    /// Arrow tip y
    pub arrow_y: f64,
    /// Knee point x
    pub knee_x: f64,
    /// Knee point y
    pub knee_y: f64,
}

/// Image stamp.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    /// Shared fields
    #[serde(flatten)]
    pub common: RecordCommon,
    /// Stamp rectangle
    #[serde(flatten)]
    pub bounds: Rect,
    /// Image in the load result's arena
    pub image_id: ImageHandle,
    /// Width at load time
    pub original_width: f64,
    /// Height at load time
    pub original_height: f64,
    /// Always 0 for loaded stamps
    pub rotation: f64,
}

/// A normalized annotation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
#[allow(missing_docs)]
pub enum AnnotationRecord {
    TextHighlight(MarkupRecord),
    TextUnderline(MarkupRecord),
    TextStrikethrough(MarkupRecord),
    TextSquiggly(MarkupRecord),
    Box(ShapeRecord),
    Circle(ShapeRecord),
    Line(LineRecord),
    Arrow(LineRecord),
    Draw(DrawRecord),
    Polyline(PolylineRecord),
    Polygon(PolygonRecord),
    Comment(CommentRecord),
    Textbox(TextBoxRecord),
    Callout(CalloutRecord),
    Image(ImageRecord),
}

impl AnnotationRecord {
    /// The `"type"` tag of this record.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TextHighlight(_) => "textHighlight",
            Self::TextUnderline(_) => "textUnderline",
            Self::TextStrikethrough(_) => "textStrikethrough",
            Self::TextSquiggly(_) => "textSquiggly",
            Self::Box(_) => "box",
            Self::Circle(_) => "circle",
            Self::Line(_) => "line",
            Self::Arrow(_) => "arrow",
            Self::Draw(_) => "draw",
            Self::Polyline(_) => "polyline",
            Self::Polygon(_) => "polygon",
            Self::Comment(_) => "comment",
            Self::Textbox(_) => "textbox",
            Self::Callout(_) => "callout",
            Self::Image(_) => "image",
        }
    }

    /// Common fields.
    pub fn common(&self) -> &RecordCommon {
        match self {
            Self::TextHighlight(r) | Self::TextUnderline(r) | Self::TextStrikethrough(r) | Self::TextSquiggly(r) => {
                &r.common
            },
            Self::Box(r) | Self::Circle(r) => &r.common,
            Self::Line(r) | Self::Arrow(r) => &r.common,
            Self::Draw(r) => &r.common,
            Self::Polyline(r) => &r.common,
            Self::Polygon(r) => &r.common,
            Self::Comment(r) => &r.common,
            Self::Textbox(r) => &r.common,
            Self::Callout(r) => &r.text_box.common,
            Self::Image(r) => &r.common,
        }
    }

    /// Image referenced by an image record.
    pub fn image_handle(&self) -> Option<ImageHandle> {
        match self {
            Self::Image(r) => Some(r.image_id),
            _ => None,
        }
    }

    /// Shift image handles after the page arena was merged at `offset`.
    pub fn rebase_images(&mut self, offset: u32) {
        if let Self::Image(r) = self {
            r.image_id = r.image_id.rebased(offset);
        }
    }
}
