//! PDF annotation to record conversion.
//!
//! Each supported subtype has one conversion function; [`normalize_annotation`]
//! dispatches over [`AnnotationSubtype`] exhaustively. Every Y coordinate is
//! flipped here, through the page's [`PageSpace`], and nowhere else.

use chrono::{DateTime, Utc};

use crate::annotation_types::{AnnotationFlags, AnnotationSubtype, BorderStyle};
use crate::annotations::PdfAnnotation;
use crate::appearance::{select_border_color, DefaultAppearance, ExtractedStyle};
use crate::color::{color_array_to_hex, BLACK_HEX};
use crate::config::LoaderConfig;
use crate::dates::parse_pdf_date;
use crate::error::{Error, Result};
use crate::fonts::map_pdf_font_name;
use crate::geometry::{
    recover_unrotated_size, rotation_from_matrix_angle, PageSpace, PdfRect, Rect, RectKey,
};
use crate::outcome::Outcome;
use crate::page::PageInput;
use crate::records::{
    AnnotationRecord, CalloutRecord, CommentRecord, DrawRecord, ImageRecord, LineRecord, MarkupRecord,
    PolygonRecord, PolylineRecord, RecordCommon, ShapeRecord, TextBoxRecord,
};
use crate::stamps::StampImageMap;

/// Default markup and sticky note color.
pub const MARKUP_DEFAULT_COLOR: &str = "#ffff00";

/// Default callout background.
pub const CALLOUT_DEFAULT_FILL: &str = "#ffffd0";

const DEFAULT_FONT_FAMILY: &str = "Arial";
const DEFAULT_FONT_SIZE: f64 = 14.0;
const DEFAULT_SHAPE_LINE_WIDTH: f64 = 2.0;
const DEFAULT_TEXT_BOX_LINE_WIDTH: f64 = 1.0;
const COMMENT_ICON_SIZE: f64 = 24.0;
const DEFAULT_COMMENT_ICON: &str = "comment";
const ARROW_HEAD_SIZE: f64 = 12.0;

/// Per-page inputs shared by every conversion on that page.
#[derive(Debug, Clone)]
pub struct NormalizeContext<'a> {
    /// 1-based page number
    pub page_number: usize,
    /// Y flip for the page
    pub space: PageSpace,
    /// Author for annotations without `/T`
    pub default_author: &'a str,
    /// Timestamp used for missing or invalid dates
    pub loaded_at: DateTime<Utc>,
}

impl<'a> NormalizeContext<'a> {
    /// Context for one page of a load pass started at `loaded_at`.
    pub fn new(page: &PageInput<'_>, config: &'a LoaderConfig, loaded_at: DateTime<Utc>) -> Self {
        Self {
            page_number: page.page_number,
            space: page.space(),
            default_author: &config.default_author,
            loaded_at,
        }
    }
}

/// Convert one annotation.
///
/// Returns [`Outcome::Failed`] for subtypes without a record kind, missing
/// geometry and stamps without an image. A present but unparseable date
/// yields [`Outcome::Defaulted`].
pub fn normalize_annotation(
    annot: &PdfAnnotation,
    style: Option<&ExtractedStyle>,
    stamps: &StampImageMap,
    ctx: &NormalizeContext<'_>,
) -> Outcome<AnnotationRecord> {
    let empty = ExtractedStyle::default();
    let style = style.unwrap_or(&empty);

    let rect = match annot.rect {
        Some(rect) => rect,
        None => return Outcome::Failed(Error::MissingKey("Rect")),
    };
    let (common, dates_defaulted) = record_common(annot, style, ctx);
    let space = &ctx.space;

    let converted = match &annot.subtype {
        AnnotationSubtype::Highlight => Ok(AnnotationRecord::TextHighlight(markup(annot, &rect, common, space))),
        AnnotationSubtype::Underline => Ok(AnnotationRecord::TextUnderline(markup(annot, &rect, common, space))),
        AnnotationSubtype::StrikeOut => Ok(AnnotationRecord::TextStrikethrough(markup(annot, &rect, common, space))),
        AnnotationSubtype::Squiggly => Ok(AnnotationRecord::TextSquiggly(markup(annot, &rect, common, space))),
        AnnotationSubtype::Square => Ok(AnnotationRecord::Box(shape(annot, style, &rect, common, space))),
        AnnotationSubtype::Circle => Ok(AnnotationRecord::Circle(shape(annot, style, &rect, common, space))),
        AnnotationSubtype::Line => line(annot, style, common, space),
        AnnotationSubtype::Ink => ink(annot, common, space).map(AnnotationRecord::Draw),
        AnnotationSubtype::PolyLine => polyline(annot, common, space).map(AnnotationRecord::Polyline),
        AnnotationSubtype::Polygon => polygon(annot, style, common, space).map(AnnotationRecord::Polygon),
        AnnotationSubtype::Text => Ok(AnnotationRecord::Comment(comment(annot, &rect, common, space))),
        AnnotationSubtype::FreeText => Ok(free_text(annot, style, &rect, common, space)),
        AnnotationSubtype::Stamp => stamp(annot, &rect, stamps, common, space).map(AnnotationRecord::Image),
        AnnotationSubtype::Other(name) => Err(Error::UnsupportedSubtype(name.clone())),
    };

    match converted {
        Ok(record) if dates_defaulted => Outcome::Defaulted(record),
        Ok(record) => Outcome::Decoded(record),
        Err(e) => Outcome::Failed(e),
    }
}

fn record_common(annot: &PdfAnnotation, style: &ExtractedStyle, ctx: &NormalizeContext<'_>) -> (RecordCommon, bool) {
    let mut defaulted = false;
    let mut date = |text: &Option<String>| match text.as_deref().map(parse_pdf_date) {
        Some(Some(at)) => at,
        Some(None) => {
            log::debug!("Annotation {} has an unparseable date {:?}", annot.id, text);
            defaulted = true;
            ctx.loaded_at
        },
        None => ctx.loaded_at,
    };
    let created_at = date(&annot.creation_date);
    let modified_at = date(&annot.modification_date);

    let common = RecordCommon {
        source: annot.id,
        page: ctx.page_number,
        author: annot
            .author
            .clone()
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| ctx.default_author.to_string()),
        subject: annot.subject.clone().unwrap_or_default(),
        created_at,
        modified_at,
        opacity: style
            .opacity
            .or(annot.fill_opacity)
            .unwrap_or(1.0)
            .clamp(0.0, 1.0),
        locked: annot.flags.contains(AnnotationFlags::LOCKED),
        printable: annot.flags.contains(AnnotationFlags::PRINT),
        read_only: annot.flags.contains(AnnotationFlags::READ_ONLY),
    };
    (common, defaulted)
}

fn hex_or(components: &Option<Vec<f64>>, default: &str) -> String {
    hex(components).unwrap_or_else(|| default.to_string())
}

fn hex(components: &Option<Vec<f64>>) -> Option<String> {
    components.as_deref().and_then(color_array_to_hex)
}

fn border_style(annot: &PdfAnnotation) -> BorderStyle {
    annot
        .border_style
        .as_deref()
        .map(BorderStyle::from_pdf_name)
        .unwrap_or_default()
}

/// Positive stroke width, else `default`.
fn line_width(annot: &PdfAnnotation, default: f64) -> f64 {
    annot.stroke_width().filter(|w| *w > 0.0).unwrap_or(default)
}

fn interior_color(annot: &PdfAnnotation, style: &ExtractedStyle) -> Option<String> {
    style.interior_color.clone().or_else(|| hex(&annot.interior_color))
}

fn markup(annot: &PdfAnnotation, rect: &PdfRect, common: RecordCommon, space: &PageSpace) -> MarkupRecord {
    let rects = annot
        .quad_points
        .as_deref()
        .map(|qp| space.quad_rects(qp))
        .unwrap_or_default();
    let bounds = Rect::bounding(&rects).unwrap_or_else(|| space.rect(rect));
    MarkupRecord {
        common,
        bounds,
        rects,
        color: hex_or(&annot.color, MARKUP_DEFAULT_COLOR),
    }
}

fn shape(
    annot: &PdfAnnotation,
    style: &ExtractedStyle,
    rect: &PdfRect,
    common: RecordCommon,
    space: &PageSpace,
) -> ShapeRecord {
    ShapeRecord {
        common,
        bounds: space.rect(rect),
        stroke_color: hex_or(&annot.color, BLACK_HEX),
        fill_color: interior_color(annot, style),
        line_width: line_width(annot, DEFAULT_SHAPE_LINE_WIDTH),
        border_style: border_style(annot),
    }
}

fn line(
    annot: &PdfAnnotation,
    style: &ExtractedStyle,
    common: RecordCommon,
    space: &PageSpace,
) -> Result<AnnotationRecord> {
    let l = annot
        .line
        .as_deref()
        .filter(|l| l.len() >= 4)
        .ok_or_else(|| Error::InvalidGeometry("/L needs 4 numbers".to_string()))?;
    let [x1, y1, x2, y2] = style.line_coords.unwrap_or([l[0], l[1], l[2], l[3]]);
    let (start_head, end_head) = annot.line_endings;

    let record = LineRecord {
        common,
        start_x: x1,
        start_y: space.flip_y(y1),
        end_x: x2,
        end_y: space.flip_y(y2),
        start_head,
        end_head,
        head_size: ARROW_HEAD_SIZE,
        stroke_color: hex_or(&annot.color, BLACK_HEX),
        fill_color: interior_color(annot, style),
        line_width: line_width(annot, DEFAULT_SHAPE_LINE_WIDTH),
        border_style: border_style(annot),
    };
    Ok(if start_head.is_decorated() || end_head.is_decorated() {
        AnnotationRecord::Arrow(record)
    } else {
        AnnotationRecord::Line(record)
    })
}

fn ink(annot: &PdfAnnotation, common: RecordCommon, space: &PageSpace) -> Result<DrawRecord> {
    let stroke = annot
        .ink_list
        .first()
        .ok_or_else(|| Error::InvalidGeometry("empty /InkList".to_string()))?;
    Ok(DrawRecord {
        common,
        path: space.points(stroke),
        stroke_color: hex_or(&annot.color, BLACK_HEX),
        line_width: line_width(annot, DEFAULT_SHAPE_LINE_WIDTH),
        border_style: border_style(annot),
    })
}

fn vertices(annot: &PdfAnnotation, min_numbers: usize) -> Result<&[f64]> {
    annot
        .vertices
        .as_deref()
        .filter(|v| v.len() >= min_numbers)
        .ok_or_else(|| Error::InvalidGeometry(format!("/Vertices needs {} numbers", min_numbers)))
}

fn polyline(annot: &PdfAnnotation, common: RecordCommon, space: &PageSpace) -> Result<PolylineRecord> {
    Ok(PolylineRecord {
        common,
        points: space.points(vertices(annot, 4)?),
        stroke_color: hex_or(&annot.color, BLACK_HEX),
        line_width: line_width(annot, DEFAULT_SHAPE_LINE_WIDTH),
        border_style: border_style(annot),
    })
}

fn polygon(
    annot: &PdfAnnotation,
    style: &ExtractedStyle,
    common: RecordCommon,
    space: &PageSpace,
) -> Result<PolygonRecord> {
    let v = vertices(annot, 6)?;
    let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
    let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for xy in v.chunks_exact(2) {
        min_x = min_x.min(xy[0]);
        max_x = max_x.max(xy[0]);
        min_y = min_y.min(xy[1]);
        max_y = max_y.max(xy[1]);
    }

    Ok(PolygonRecord {
        common,
        bounds: Rect::new(min_x, space.flip_y(max_y), max_x - min_x, max_y - min_y),
        sides: v.len() / 2,
        stroke_color: hex_or(&annot.color, BLACK_HEX),
        fill_color: interior_color(annot, style),
        line_width: line_width(annot, DEFAULT_SHAPE_LINE_WIDTH),
        border_style: border_style(annot),
    })
}

fn comment(annot: &PdfAnnotation, rect: &PdfRect, common: RecordCommon, space: &PageSpace) -> CommentRecord {
    CommentRecord {
        common,
        bounds: Rect::new(rect.x0, space.flip_y(rect.y1), COMMENT_ICON_SIZE, COMMENT_ICON_SIZE),
        text: annot.contents.clone().unwrap_or_default(),
        color: hex_or(&annot.color, MARKUP_DEFAULT_COLOR),
        icon: annot
            .icon
            .clone()
            .unwrap_or_else(|| DEFAULT_COMMENT_ICON.to_string()),
    }
}

/// Whole-box rotation: the custom key wins, then the appearance matrix.
fn free_text_rotation(style: &ExtractedStyle) -> f64 {
    match style.rotation {
        Some(r) if r != 0.0 => r.round(),
        _ => style
            .matrix_angle
            .map(rotation_from_matrix_angle)
            .unwrap_or(0.0),
    }
}

fn free_text(
    annot: &PdfAnnotation,
    style: &ExtractedStyle,
    rect: &PdfRect,
    common: RecordCommon,
    space: &PageSpace,
) -> AnnotationRecord {
    let da = annot
        .default_appearance
        .as_deref()
        .map(DefaultAppearance::parse)
        .unwrap_or_default();
    let da_font = da.font_ref.as_deref().and_then(map_pdf_font_name);

    let rotation = free_text_rotation(style);
    let (width, height) = recover_unrotated_size((rect.width(), rect.height()), rotation, style.bbox_size);
    let center_x = rect.x0 + rect.width() / 2.0;
    let center_y = space.flip_y(rect.y1) + rect.height() / 2.0;

    let (stroke_color, stroke_color_source) = select_border_color(
        style.interior_color.clone(),
        style.stroke_color.clone(),
        hex(&annot.mk_border_color),
    );
    let fill_color = hex(&annot.color).or_else(|| hex(&annot.mk_background_color));

    let text_box = TextBoxRecord {
        common,
        bounds: Rect::new(center_x - width / 2.0, center_y - height / 2.0, width, height),
        rotation,
        text: annot.contents.clone().unwrap_or_default(),
        stroke_color,
        stroke_color_source,
        fill_color,
        text_color: da.text_color.unwrap_or_else(|| BLACK_HEX.to_string()),
        font_size: da.font_size.unwrap_or(DEFAULT_FONT_SIZE),
        font_family: style
            .font_family
            .clone()
            .or_else(|| da_font.as_ref().map(|f| f.family.clone()))
            .unwrap_or_else(|| DEFAULT_FONT_FAMILY.to_string()),
        font_bold: style.font_bold == Some(true) || da_font.as_ref().is_some_and(|f| f.bold),
        font_italic: style.font_italic == Some(true) || da_font.as_ref().is_some_and(|f| f.italic),
        font_underline: style.font_underline == Some(true),
        font_strikethrough: style.font_strikethrough == Some(true),
        border_style: border_style(annot),
        line_width: style
            .border_width
            .or_else(|| annot.stroke_width().filter(|w| *w > 0.0))
            .unwrap_or(DEFAULT_TEXT_BOX_LINE_WIDTH),
    };

    match annot.callout_line.as_deref() {
        Some(cl) if cl.len() >= 4 => {
            let (knee_x, knee_y) = if cl.len() >= 6 { (cl[2], cl[3]) } else { (cl[0], cl[1]) };
            let mut text_box = text_box;
            text_box.fill_color = text_box
                .fill_color
                .or_else(|| Some(CALLOUT_DEFAULT_FILL.to_string()));
            AnnotationRecord::Callout(CalloutRecord {
                text_box,
                arrow_x: cl[0],
                arrow_y: space.flip_y(cl[1]),
                knee_x,
                knee_y: space.flip_y(knee_y),
            })
        },
        _ => AnnotationRecord::Textbox(text_box),
    }
}

fn stamp(
    annot: &PdfAnnotation,
    rect: &PdfRect,
    stamps: &StampImageMap,
    common: RecordCommon,
    space: &PageSpace,
) -> Result<ImageRecord> {
    let key = RectKey::from_rect(rect);
    let image_id = stamps
        .lookup(Some(annot.id), &key)
        .ok_or_else(|| Error::StampImageMissing(key.to_string()))?;
    Ok(ImageRecord {
        common,
        bounds: space.rect(rect),
        image_id,
        original_width: rect.width(),
        original_height: rect.height(),
        rotation: 0.0,
    })
}
