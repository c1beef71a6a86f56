//! Inline CSS hints in `/RC` rich contents.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref RE_DECORATION: Regex = Regex::new(r#"(?i)text-decoration\s*:\s*([^;"']+)"#).unwrap();
    static ref RE_WEIGHT: Regex = Regex::new(r#"(?i)font-weight\s*:\s*([^;"']+)"#).unwrap();
    static ref RE_STYLE: Regex = Regex::new(r#"(?i)font-style\s*:\s*([^;"']+)"#).unwrap();
    static ref RE_BOLD_VALUE: Regex = Regex::new(r"(?i)bold|[7-9]00").unwrap();
    static ref RE_ITALIC_VALUE: Regex = Regex::new(r"(?i)italic|oblique").unwrap();
}

/// Text styling found in a rich contents string.
///
/// Each field is `None` when the property does not appear at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RichTextStyle {
    /// `font-weight` is bold or 700-900
    pub bold: Option<bool>,
    /// `font-style` is italic or oblique
    pub italic: Option<bool>,
    /// `text-decoration` includes underline
    pub underline: Option<bool>,
    /// `text-decoration` includes line-through
    pub strikethrough: Option<bool>,
}

impl RichTextStyle {
    /// Scan the first occurrence of each property.
    pub fn parse(rich_contents: &str) -> Self {
        let value = |re: &Regex| re.captures(rich_contents).map(|c| c[1].to_lowercase());

        let decoration = value(&RE_DECORATION);
        Self {
            bold: value(&RE_WEIGHT).map(|w| RE_BOLD_VALUE.is_match(&w)),
            italic: value(&RE_STYLE).map(|s| RE_ITALIC_VALUE.is_match(&s)),
            underline: decoration.as_ref().map(|d| d.contains("underline")),
            strikethrough: decoration.as_ref().map(|d| d.contains("line-through")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decorations() {
        let style = RichTextStyle::parse(r#"<span style="text-decoration: underline line-through">x</span>"#);
        assert_eq!(style.underline, Some(true));
        assert_eq!(style.strikethrough, Some(true));
        assert_eq!(style.bold, None);
    }

    #[test]
    fn test_weight_and_style() {
        let style = RichTextStyle::parse("<p style='font-weight:700;font-style:Oblique'>x</p>");
        assert_eq!(style.bold, Some(true));
        assert_eq!(style.italic, Some(true));

        let plain = RichTextStyle::parse("<p style='font-weight:normal'>x</p>");
        assert_eq!(plain.bold, Some(false));
        assert_eq!(plain.underline, None);
    }
}
