//! Raw PDF annotation dictionaries.
//!
//! [`PdfAnnotation::parse`] reads every entry the normalizer consumes into
//! plain PDF-space values. Nothing is transformed here: coordinates stay
//! Y-up, colors stay component arrays, dates stay PDF date strings.

use serde::Serialize;

use crate::annotation_types::{AnnotationFlags, AnnotationSubtype, LineEnding};
use crate::decoders::{decode_stream_object, DEFAULT_MAX_DECOMPRESSED_SIZE};
use crate::error::{Error, Result};
use crate::geometry::PdfRect;
use crate::object::{decode_text_string, Dict, Object, ObjectRef, ObjectResolver};

/// Identity of an annotation within its page.
///
/// `index` is the position in the page's `/Annots` array; `object` is the
/// indirect reference when the annotation is not inlined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct AnnotationId {
    /// Position in `/Annots`
    pub index: usize,
    /// Indirect object reference, if any
    #[serde(serialize_with = "serialize_object_ref")]
    pub object: Option<ObjectRef>,
}

fn serialize_object_ref<S: serde::Serializer>(
    reference: &Option<ObjectRef>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match reference {
        Some(r) => serializer.serialize_str(&r.to_string()),
        None => serializer.serialize_none(),
    }
}

impl AnnotationId {
    /// Create an identity.
    pub fn new(index: usize, object: Option<ObjectRef>) -> Self {
        Self { index, object }
    }
}

impl std::fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.object {
            Some(r) => write!(f, "#{} ({})", self.index, r),
            None => write!(f, "#{}", self.index),
        }
    }
}

/// A PDF annotation as stored in the document.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfAnnotation {
    /// Identity on the page
    pub id: AnnotationId,
    /// Parsed `/Subtype`
    pub subtype: AnnotationSubtype,
    /// `/Rect`, normalized so `x0 <= x1`, `y0 <= y1`
    pub rect: Option<PdfRect>,
    /// `/Contents`
    pub contents: Option<String>,
    /// `/T`
    pub author: Option<String>,
    /// `/Subj`
    pub subject: Option<String>,
    /// `/CreationDate` as a PDF date string
    pub creation_date: Option<String>,
    /// `/M` as a PDF date string
    pub modification_date: Option<String>,
    /// `/F`
    pub flags: AnnotationFlags,
    /// `/C`
    pub color: Option<Vec<f64>>,
    /// `/IC`
    pub interior_color: Option<Vec<f64>>,
    /// `/ca` (non-stroking constant opacity)
    pub fill_opacity: Option<f64>,
    /// `/BS /S`
    pub border_style: Option<String>,
    /// `/BS /W`
    pub border_width: Option<f64>,
    /// `/Border [h v width ...]`
    pub border: Option<Vec<f64>>,
    /// `/QuadPoints`
    pub quad_points: Option<Vec<f64>>,
    /// `/L`
    pub line: Option<Vec<f64>>,
    /// `/LE`
    pub line_endings: (LineEnding, LineEnding),
    /// `/InkList`, one coordinate list per stroke
    pub ink_list: Vec<Vec<f64>>,
    /// `/Vertices`
    pub vertices: Option<Vec<f64>>,
    /// `/CL`
    pub callout_line: Option<Vec<f64>>,
    /// `/DA`
    pub default_appearance: Option<String>,
    /// `/RC` (string or stream)
    pub rich_contents: Option<String>,
    /// `/Name` icon of text annotations
    pub icon: Option<String>,
    /// `/MK /BC`
    pub mk_border_color: Option<Vec<f64>>,
    /// `/MK /BG`
    pub mk_background_color: Option<Vec<f64>>,
}

impl PdfAnnotation {
    /// Parse an annotation dictionary.
    ///
    /// # Errors
    ///
    /// Fails only when `/Subtype` is missing; every other entry is optional.
    pub fn parse<R: ObjectResolver + ?Sized>(resolver: &R, id: AnnotationId, dict: &Dict) -> Result<Self> {
        let subtype = resolver
            .get_name(dict, "Subtype")
            .map(AnnotationSubtype::from_pdf_name)
            .ok_or(Error::MissingKey("Subtype"))?;

        let rect = resolver
            .get_numbers(dict, "Rect")
            .and_then(|values| PdfRect::from_array(&values));

        let bs = resolver.get_dict(dict, "BS");
        let mk = resolver.get_dict(dict, "MK");

        let line_endings = match resolver.get_array(dict, "LE") {
            Some(items) => {
                let ending = |i: usize| {
                    items
                        .get(i)
                        .and_then(|o| resolver.deref(o).as_name())
                        .map(LineEnding::from_pdf_name)
                        .unwrap_or_default()
                };
                (ending(0), ending(1))
            },
            None => (LineEnding::None, LineEnding::None),
        };

        let ink_list = resolver
            .get_array(dict, "InkList")
            .map(|strokes| strokes.iter().filter_map(|s| resolver.numbers(s)).collect())
            .unwrap_or_default();

        Ok(PdfAnnotation {
            id,
            subtype,
            rect,
            contents: resolver.get_text(dict, "Contents"),
            author: resolver.get_text(dict, "T"),
            subject: resolver.get_text(dict, "Subj"),
            creation_date: resolver.get_text(dict, "CreationDate"),
            modification_date: resolver.get_text(dict, "M"),
            flags: resolver
                .get(dict, "F")
                .and_then(Object::as_integer)
                .map(|f| AnnotationFlags::from_bits_truncate(f as u32))
                .unwrap_or_default(),
            color: non_empty(resolver.get_numbers(dict, "C")),
            interior_color: non_empty(resolver.get_numbers(dict, "IC")),
            fill_opacity: resolver.get_number(dict, "ca"),
            border_style: bs.and_then(|bs| resolver.get_name(bs, "S")).map(str::to_string),
            border_width: bs.and_then(|bs| resolver.get_number(bs, "W")),
            border: resolver.get_numbers(dict, "Border"),
            quad_points: non_empty(resolver.get_numbers(dict, "QuadPoints")),
            line: resolver.get_numbers(dict, "L"),
            line_endings,
            ink_list,
            vertices: resolver.get_numbers(dict, "Vertices"),
            callout_line: resolver.get_numbers(dict, "CL"),
            default_appearance: resolver.get_text(dict, "DA"),
            rich_contents: rich_contents(resolver, dict),
            icon: resolver.get_name(dict, "Name").map(str::to_string),
            mk_border_color: mk.and_then(|mk| non_empty(resolver.get_numbers(mk, "BC"))),
            mk_background_color: mk.and_then(|mk| non_empty(resolver.get_numbers(mk, "BG"))),
        })
    }

    /// Width from `/BS /W`, falling back to the third `/Border` element.
    pub fn stroke_width(&self) -> Option<f64> {
        self.border_width
            .or_else(|| self.border.as_ref().and_then(|b| b.get(2).copied()))
    }
}

fn non_empty(values: Option<Vec<f64>>) -> Option<Vec<f64>> {
    values.filter(|v| !v.is_empty())
}

pub(crate) fn rich_contents<R: ObjectResolver + ?Sized>(resolver: &R, dict: &Dict) -> Option<String> {
    match resolver.get(dict, "RC")? {
        Object::String(bytes) => Some(decode_text_string(bytes)),
        stream @ Object::Stream { .. } => match decode_stream_object(resolver, stream, DEFAULT_MAX_DECOMPRESSED_SIZE) {
            Ok(bytes) => Some(decode_text_string(&bytes)),
            Err(e) => {
                log::debug!("Rich contents stream unreadable: {}", e);
                None
            },
        },
        _ => None,
    }
}

/// Collect the annotation dictionaries of a page in `/Annots` order.
///
/// Entries that do not resolve to a dictionary are skipped with a debug log;
/// indices still count them so identities match the `/Annots` positions.
pub fn page_annotation_dicts<'a, R: ObjectResolver + ?Sized>(
    resolver: &'a R,
    page: &'a Dict,
) -> Vec<(AnnotationId, &'a Dict)> {
    let annots = match resolver.get_array(page, "Annots") {
        Some(annots) => annots,
        None => return Vec::new(),
    };

    annots
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            let id = AnnotationId::new(index, entry.as_reference());
            match resolver.deref(entry).as_dict() {
                Some(dict) => Some((id, dict)),
                None => {
                    log::debug!("Annotation {} is not a dictionary", id);
                    None
                },
            }
        })
        .collect()
}
