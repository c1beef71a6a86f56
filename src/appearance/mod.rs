//! Appearance and style extraction.
//!
//! Annotation dictionaries spread a single visual property over several
//! optional keys (`/C`, `/IC`, `/MK`, `/DA`, `/RC`) and an optional rendered
//! appearance stream. This pass collects what can be discovered into an
//! [`ExtractedStyle`] per annotation; the normalizer decides precedence.

pub mod da;
pub mod rich_text;

pub use da::{scan_stroke_color, DefaultAppearance};
pub use rich_text::RichTextStyle;

use std::collections::HashMap;

use rayon::prelude::*;
use serde::Serialize;

use crate::annotation_types::AnnotationSubtype;
use crate::annotations::{rich_contents, AnnotationId};
use crate::color::{color_array_to_hex, BLACK_HEX};
use crate::decoders::decode_stream_object;
use crate::fonts::{map_pdf_font_name, FontStyle};
use crate::geometry::matrix_angle_degrees;
use crate::object::{decode_text_string, Dict, Object, ObjectResolver};

/// Custom whole-annotation rotation key. The standard `/Rotation` key turns
/// text inside the box and is deliberately not read.
pub const ROTATION_KEY: &str = "OPS_Rotation";

/// Style properties recovered for one annotation.
///
/// Every field is optional: `None` means "not discoverable", never zero or false.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedStyle {
    /// `/CA` in `[0, 1]`
    pub opacity: Option<f64>,
    /// `/IC` as `#rrggbb`
    pub interior_color: Option<String>,
    /// First `RG` stroke color in the appearance content
    pub stroke_color: Option<String>,
    /// `/BS /W` or `/Border[2]`
    pub border_width: Option<f64>,
    /// `/L` endpoints in their original order
    pub line_coords: Option<[f64; 4]>,
    /// Custom rotation key value
    pub rotation: Option<f64>,
    /// Angle of the appearance `/Matrix`
    pub matrix_angle: Option<f64>,
    /// Display family of the resolved font
    pub font_family: Option<String>,
    /// Bold face detected
    pub font_bold: Option<bool>,
    /// Italic face detected
    pub font_italic: Option<bool>,
    /// Underline detected in rich contents
    pub font_underline: Option<bool>,
    /// Strikethrough detected in rich contents
    pub font_strikethrough: Option<bool>,
    /// Unrotated `/BBox` size of the appearance stream
    pub bbox_size: Option<(f64, f64)>,
}

impl ExtractedStyle {
    /// True if nothing was discovered.
    pub fn is_empty(&self) -> bool {
        *self == ExtractedStyle::default()
    }

    fn apply_font(&mut self, font: FontStyle) {
        self.font_family = Some(font.family);
        if font.bold {
            self.font_bold = Some(true);
        }
        if font.italic {
            self.font_italic = Some(true);
        }
    }
}

/// Which provider supplied a free text border color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ColorSource {
    /// `/IC`
    InteriorColor,
    /// `RG` operator in the appearance stream
    AppearanceStroke,
    /// `/MK /BC`
    BorderCharacteristics,
    /// Nothing found
    Default,
}

/// First provider that has a value.
pub fn first_available<T>(
    providers: impl IntoIterator<Item = (ColorSource, Option<T>)>,
) -> Option<(T, ColorSource)> {
    providers
        .into_iter()
        .find_map(|(source, value)| value.map(|v| (v, source)))
}

/// Resolve a free text border color.
///
/// Interior color, then appearance stroke. A black (or missing) result
/// yields to `/MK /BC` when present; otherwise black.
pub fn select_border_color(
    interior: Option<String>,
    appearance_stroke: Option<String>,
    mk_border: Option<String>,
) -> (String, ColorSource) {
    let primary = first_available([
        (ColorSource::InteriorColor, interior),
        (ColorSource::AppearanceStroke, appearance_stroke),
    ]);
    match primary {
        Some((color, source)) if color != BLACK_HEX => (color, source),
        primary => match mk_border {
            Some(color) => (color, ColorSource::BorderCharacteristics),
            None => primary.unwrap_or_else(|| (BLACK_HEX.to_string(), ColorSource::Default)),
        },
    }
}

/// The normal appearance stream of an annotation.
///
/// `/AP /N` may be a state dictionary; then the state named by `/AS` is
/// used, falling back to the first stream entry.
pub fn normal_appearance<'a, R: ObjectResolver + ?Sized>(resolver: &'a R, dict: &'a Dict) -> Option<&'a Object> {
    let ap = resolver.get_dict(dict, "AP")?;
    let normal = resolver.get(ap, "N")?;
    if normal.as_stream().is_some() {
        return Some(normal);
    }

    let states = normal.as_dict()?;
    let selected = resolver
        .get_name(dict, "AS")
        .and_then(|state| resolver.get(states, state))
        .filter(|s| s.as_stream().is_some());
    selected.or_else(|| {
        states
            .values()
            .map(|v| resolver.deref(v))
            .find(|v| v.as_stream().is_some())
    })
}

/// Extract the style of one annotation.
pub fn extract_style<R: ObjectResolver + ?Sized>(resolver: &R, dict: &Dict, max_stream_size: usize) -> ExtractedStyle {
    let mut style = ExtractedStyle {
        opacity: resolver
            .get_number(dict, "CA")
            .filter(|ca| (0.0..=1.0).contains(ca)),
        ..ExtractedStyle::default()
    };

    let subtype = match resolver.get_name(dict, "Subtype") {
        Some(name) => AnnotationSubtype::from_pdf_name(name),
        None => return style,
    };

    if subtype.has_interior_color() {
        style.interior_color = resolver
            .get_numbers(dict, "IC")
            .and_then(|ic| color_array_to_hex(&ic));

        if subtype == AnnotationSubtype::Line {
            style.line_coords = resolver
                .get_numbers(dict, "L")
                .and_then(|l| l.get(..4).map(|c| [c[0], c[1], c[2], c[3]]));
        }
    }

    if subtype == AnnotationSubtype::FreeText {
        extract_free_text(resolver, dict, &mut style, max_stream_size);
    }

    style
}

fn extract_free_text<R: ObjectResolver + ?Sized>(
    resolver: &R,
    dict: &Dict,
    style: &mut ExtractedStyle,
    max_stream_size: usize,
) {
    style.border_width = resolver
        .get_dict(dict, "BS")
        .and_then(|bs| resolver.get_number(bs, "W"))
        .or_else(|| {
            resolver
                .get_numbers(dict, "Border")
                .and_then(|b| b.get(2).copied())
        });

    let font_ref = resolver
        .get_text(dict, "DA")
        .and_then(|da| DefaultAppearance::parse(&da).font_ref);

    if let Some(font_ref) = &font_ref {
        let dr_font = resolver
            .get_dict(dict, "DR")
            .and_then(|dr| resolver.get_dict(dr, "Font"))
            .and_then(|fonts| base_font_style(resolver, fonts, font_ref));
        if let Some(font) = dr_font {
            style.apply_font(font);
        }
    }

    if let Some(rc) = rich_contents(resolver, dict) {
        let rich = RichTextStyle::parse(&rc);
        if rich.underline == Some(true) {
            style.font_underline = Some(true);
        }
        if rich.strikethrough == Some(true) {
            style.font_strikethrough = Some(true);
        }
        if style.font_bold.is_none() {
            style.font_bold = rich.bold.filter(|b| *b);
        }
        if style.font_italic.is_none() {
            style.font_italic = rich.italic.filter(|i| *i);
        }
    }

    style.rotation = resolver.get_number(dict, ROTATION_KEY);

    let appearance = match normal_appearance(resolver, dict) {
        Some(appearance) => appearance,
        None => return,
    };
    let ap_dict = match appearance.as_stream() {
        Some((ap_dict, _)) => ap_dict,
        None => return,
    };

    style.matrix_angle = resolver
        .get_numbers(ap_dict, "Matrix")
        .filter(|m| m.len() >= 4)
        .and_then(|m| matrix_angle_degrees(&m));

    if style.font_family.is_none() {
        let fonts = resolver
            .get_dict(ap_dict, "Resources")
            .and_then(|res| resolver.get_dict(res, "Font"));
        if let Some(fonts) = fonts {
            // The DA font first, then every other resource font
            let candidates = font_ref
                .iter()
                .map(String::as_str)
                .chain(fonts.keys().map(String::as_str).filter(|k| Some(*k) != font_ref.as_deref()));
            if let Some(font) = candidates
                .into_iter()
                .find_map(|key| base_font_style(resolver, fonts, key))
            {
                style.apply_font(font);
            }
        }
    }

    style.bbox_size = resolver
        .get_numbers(ap_dict, "BBox")
        .filter(|b| b.len() >= 4)
        .map(|b| ((b[2] - b[0]).abs(), (b[3] - b[1]).abs()));

    if style.interior_color.is_none() {
        match decode_stream_object(resolver, appearance, max_stream_size) {
            Ok(content) => style.stroke_color = scan_stroke_color(&decode_text_string(&content)),
            Err(e) => log::debug!("Appearance content unreadable: {}", e),
        }
    }
}

fn base_font_style<R: ObjectResolver + ?Sized>(resolver: &R, fonts: &Dict, key: &str) -> Option<FontStyle> {
    let font = resolver.get_dict(fonts, key)?;
    map_pdf_font_name(resolver.get_name(font, "BaseFont")?)
}

/// Extract styles for all annotations of a page, in parallel.
///
/// Annotations with nothing discoverable are left out of the map.
pub fn extract_page_styles<R: ObjectResolver + ?Sized>(
    resolver: &R,
    annotations: &[(AnnotationId, &Dict)],
    max_stream_size: usize,
) -> HashMap<AnnotationId, ExtractedStyle> {
    annotations
        .par_iter()
        .filter_map(|(id, dict)| {
            let style = extract_style(resolver, dict, max_stream_size);
            (!style.is_empty()).then_some((*id, style))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ObjectStore;

    fn dict_of(obj: Object) -> Dict {
        obj.as_dict().unwrap().clone()
    }

    #[test]
    fn test_opacity_range() {
        let store = ObjectStore::new();
        let ok = dict_of(Object::dict([("Subtype", Object::name("Ink")), ("CA", Object::Real(0.5))]));
        assert_eq!(extract_style(&store, &ok, 0).opacity, Some(0.5));

        let bad = dict_of(Object::dict([("Subtype", Object::name("Ink")), ("CA", Object::Real(1.5))]));
        assert!(extract_style(&store, &bad, 0).is_empty());
    }

    #[test]
    fn test_interior_color_only_for_shapes() {
        let store = ObjectStore::new();
        let square = dict_of(Object::dict([
            ("Subtype", Object::name("Square")),
            ("IC", Object::numbers(&[0.0, 1.0, 0.0])),
        ]));
        assert_eq!(extract_style(&store, &square, 0).interior_color.as_deref(), Some("#00ff00"));

        let highlight = dict_of(Object::dict([
            ("Subtype", Object::name("Highlight")),
            ("IC", Object::numbers(&[0.0, 1.0, 0.0])),
        ]));
        assert!(extract_style(&store, &highlight, 0).interior_color.is_none());
    }

    #[test]
    fn test_line_coords_keep_order() {
        let store = ObjectStore::new();
        let line = dict_of(Object::dict([
            ("Subtype", Object::name("Line")),
            ("L", Object::numbers(&[300.0, 100.0, 50.0, 400.0])),
        ]));
        assert_eq!(
            extract_style(&store, &line, 0).line_coords,
            Some([300.0, 100.0, 50.0, 400.0])
        );
    }

    #[test]
    fn test_free_text_fonts_and_appearance() {
        let store = ObjectStore::new();
        let font = Object::dict([("BaseFont", Object::name("ABCDEF+OpenSans-Bold"))]);
        let ap = Object::stream(
            [
                ("Matrix", Object::numbers(&[0.866, 0.5, -0.5, 0.866, 0.0, 0.0])),
                ("BBox", Object::numbers(&[0.0, 0.0, 100.0, -50.0])),
            ],
            b"0 0 1 RG 1 w 0 0 100 50 re S".to_vec(),
        );
        let dict = dict_of(Object::dict([
            ("Subtype", Object::name("FreeText")),
            ("DA", Object::String(b"/F1 11 Tf 0 g".to_vec())),
            ("DR", Object::dict([("Font", Object::dict([("F1", font)]))])),
            ("Border", Object::numbers(&[0.0, 0.0, 2.0])),
            ("RC", Object::String(b"<p style=\"text-decoration:underline\">hi</p>".to_vec())),
            (ROTATION_KEY, Object::Integer(15)),
            ("Rotation", Object::Integer(90)),
            ("AP", Object::dict([("N", ap)])),
        ]));

        let style = extract_style(&store, &dict, 0);
        assert_eq!(style.font_family.as_deref(), Some("Open Sans"));
        assert_eq!(style.font_bold, Some(true));
        assert_eq!(style.font_italic, None);
        assert_eq!(style.font_underline, Some(true));
        assert_eq!(style.border_width, Some(2.0));
        assert_eq!(style.rotation, Some(15.0));
        assert_eq!(style.matrix_angle, Some(30.0));
        assert_eq!(style.bbox_size, Some((100.0, 50.0)));
        assert_eq!(style.stroke_color.as_deref(), Some("#0000ff"));
    }

    #[test]
    fn test_appearance_font_fallback_scans_all_keys() {
        let store = ObjectStore::new();
        let ap = Object::stream(
            [(
                "Resources",
                Object::dict([(
                    "Font",
                    Object::dict([
                        ("F9", Object::dict([("BaseFont", Object::name("F9"))])),
                        ("F2", Object::dict([("BaseFont", Object::name("Courier-Bold"))])),
                    ]),
                )]),
            )],
            Vec::new(),
        );
        let dict = dict_of(Object::dict([
            ("Subtype", Object::name("FreeText")),
            ("DA", Object::String(b"/F9 12 Tf".to_vec())),
            ("AP", Object::dict([("N", ap)])),
        ]));

        let style = extract_style(&store, &dict, 0);
        assert_eq!(style.font_family.as_deref(), Some("Courier New"));
        assert_eq!(style.font_bold, Some(true));
    }

    #[test]
    fn test_appearance_state_dictionary() {
        let store = ObjectStore::new();
        let on = Object::stream([("BBox", Object::numbers(&[0.0, 0.0, 5.0, 5.0]))], Vec::new());
        let off = Object::stream([("BBox", Object::numbers(&[0.0, 0.0, 9.0, 9.0]))], Vec::new());
        let dict = dict_of(Object::dict([
            ("AS", Object::name("On")),
            ("AP", Object::dict([("N", Object::dict([("Off", off), ("On", on)]))])),
        ]));
        let normal = normal_appearance(&store, &dict).unwrap();
        assert_eq!(
            store.get_numbers(normal.as_stream().unwrap().0, "BBox"),
            Some(vec![0.0, 0.0, 5.0, 5.0])
        );
    }

    #[test]
    fn test_border_color_precedence() {
        let red = Some("#ff0000".to_string());
        let blue = Some("#0000ff".to_string());
        let black = Some(BLACK_HEX.to_string());

        assert_eq!(
            select_border_color(red.clone(), blue.clone(), None),
            ("#ff0000".to_string(), ColorSource::InteriorColor)
        );
        assert_eq!(
            select_border_color(None, blue.clone(), red.clone()),
            ("#0000ff".to_string(), ColorSource::AppearanceStroke)
        );
        assert_eq!(
            select_border_color(black.clone(), None, red.clone()),
            ("#ff0000".to_string(), ColorSource::BorderCharacteristics)
        );
        assert_eq!(
            select_border_color(black, blue, None),
            (BLACK_HEX.to_string(), ColorSource::InteriorColor)
        );
        assert_eq!(
            select_border_color(None, None, None),
            (BLACK_HEX.to_string(), ColorSource::Default)
        );
    }

    #[test]
    fn test_page_styles_skip_empty() {
        let store = ObjectStore::new();
        let a = dict_of(Object::dict([("Subtype", Object::name("Ink")), ("CA", Object::Real(0.3))]));
        let b = dict_of(Object::dict([("Subtype", Object::name("Ink"))]));
        let annots = vec![(AnnotationId::new(0, None), &a), (AnnotationId::new(1, None), &b)];
        let styles = extract_page_styles(&store, &annots, 0);
        assert_eq!(styles.len(), 1);
        assert_eq!(styles[&AnnotationId::new(0, None)].opacity, Some(0.3));
    }
}
