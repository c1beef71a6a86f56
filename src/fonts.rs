//! PostScript font name to display family mapping.
//!
//! Free text annotations name their font either through a resource key
//! (`/F1`, `/Helv`) or a `/BaseFont` such as `ABCDEF+SegoeUI-BoldItalic`.
//! The standard 14 fonts and their common abbreviations map through a fixed
//! table; everything else goes through a heuristic that strips the subset tag
//! and style suffix and splits CamelCase.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

lazy_static! {
    /// Pure resource key names carry no family information.
    static ref RE_RESOURCE_KEY: Regex = Regex::new(r"^[Ff]\d+$").unwrap();

    /// Six uppercase letters and `+` mark an embedded subset.
    static ref RE_SUBSET_PREFIX: Regex = Regex::new(r"^[A-Z]{6}\+").unwrap();

    static ref RE_STYLE_SUFFIX: Regex = Regex::new(
        r"(?i)[-,](Bold|Italic|Regular|Light|Medium|Semibold|SemiBold|Thin|ExtraBold|Black|Oblique|BoldItalic|BoldOblique|It)+$"
    ).unwrap();

    static ref RE_BOLD: Regex = Regex::new(r"(?i)bold|black|extrabold").unwrap();
    static ref RE_ITALIC: Regex = Regex::new(r"(?i)italic|oblique|(?:^|-)it$").unwrap();
    static ref RE_CAMEL_BOUNDARY: Regex = Regex::new(r"([a-z])([A-Z])").unwrap();
}

/// Display family and style of a PDF font.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FontStyle {
    /// Family name usable by a text renderer
    pub family: String,
    /// Bold face
    pub bold: bool,
    /// Italic or oblique face
    pub italic: bool,
}

impl FontStyle {
    fn new(family: &str, bold: bool, italic: bool) -> Self {
        Self {
            family: family.to_string(),
            bold,
            italic,
        }
    }
}

fn standard_font(name: &str) -> Option<FontStyle> {
    let (family, bold, italic) = match name {
        "Helv" | "Helvetica" => ("Helvetica", false, false),
        "HeBo" | "Helvetica-Bold" => ("Helvetica", true, false),
        "Helvetica-Oblique" => ("Helvetica", false, true),
        "Helvetica-BoldOblique" => ("Helvetica", true, true),
        "Cour" | "Courier" => ("Courier New", false, false),
        "Courier-Bold" => ("Courier New", true, false),
        "Courier-Oblique" => ("Courier New", false, true),
        "Courier-BoldOblique" => ("Courier New", true, true),
        "TiRo" | "Times" | "Times-Roman" => ("Times New Roman", false, false),
        "Times-Bold" => ("Times New Roman", true, false),
        "Times-Italic" => ("Times New Roman", false, true),
        "Times-BoldItalic" => ("Times New Roman", true, true),
        "Symbol" => ("Symbol", false, false),
        "ZapfDingbats" | "ZaDb" => ("ZapfDingbats", false, false),
        "Arial" | "ArialMT" => ("Arial", false, false),
        "Arial-BoldMT" => ("Arial", true, false),
        "Arial-ItalicMT" => ("Arial", false, true),
        "Arial-BoldItalicMT" => ("Arial", true, true),
        _ => return None,
    };
    Some(FontStyle::new(family, bold, italic))
}

/// Map a PDF font name (with or without the leading `/`) to a family and style.
///
/// Returns `None` for bare resource keys like `F1` and for names that are
/// empty once the subset prefix and style suffix are removed.
pub fn map_pdf_font_name(name: &str) -> Option<FontStyle> {
    let name = name.strip_prefix('/').unwrap_or(name);
    if name.is_empty() || RE_RESOURCE_KEY.is_match(name) {
        return None;
    }
    if let Some(style) = standard_font(name) {
        return Some(style);
    }

    let cleaned = RE_SUBSET_PREFIX.replace(name, "");
    let (bold, italic) = match RE_STYLE_SUFFIX.find(&cleaned) {
        Some(suffix) => {
            let suffix = suffix.as_str().to_lowercase();
            (RE_BOLD.is_match(&suffix), RE_ITALIC.is_match(&suffix))
        },
        None => (false, false),
    };
    let base = RE_STYLE_SUFFIX.replace(&cleaned, "");
    let family = RE_CAMEL_BOUNDARY.replace_all(&base, "$1 $2");

    if family.is_empty() {
        log::debug!("Font name {} has no family part", name);
        return None;
    }
    Some(FontStyle::new(&family, bold, italic))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_fonts() {
        assert_eq!(map_pdf_font_name("/Helv"), Some(FontStyle::new("Helvetica", false, false)));
        assert_eq!(
            map_pdf_font_name("Times-BoldItalic"),
            Some(FontStyle::new("Times New Roman", true, true))
        );
        assert_eq!(map_pdf_font_name("Cour").map(|f| f.family), Some("Courier New".to_string()));
    }

    #[test]
    fn test_resource_keys_skipped() {
        assert!(map_pdf_font_name("F1").is_none());
        assert!(map_pdf_font_name("/f12").is_none());
        assert!(map_pdf_font_name("").is_none());
    }

    #[test]
    fn test_subset_and_style_suffix() {
        assert_eq!(
            map_pdf_font_name("ABCDEF+SegoeUI-BoldItalic"),
            Some(FontStyle::new("Segoe UI", true, true))
        );
        assert_eq!(
            map_pdf_font_name("OpenSans-Regular"),
            Some(FontStyle::new("Open Sans", false, false))
        );
        assert_eq!(
            map_pdf_font_name("Calibri,Italic"),
            Some(FontStyle::new("Calibri", false, true))
        );
    }

    #[test]
    fn test_short_italic_suffix() {
        assert_eq!(
            map_pdf_font_name("MinionPro-It"),
            Some(FontStyle::new("Minion Pro", false, true))
        );
        assert_eq!(
            map_pdf_font_name("Roboto-Black"),
            Some(FontStyle::new("Roboto", true, false))
        );
    }
}
