//! PDF date strings and date field naming conventions.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

lazy_static! {
    /// `D:YYYYMMDDHHmmSSOHH'mm'` with every part after the year optional.
    /// Anchored at both ends so other formats fall through to RFC 3339.
    static ref RE_PDF_DATE: Regex = Regex::new(
        r"^(?:D:)?(\d{4})(\d{2})?(\d{2})?(\d{2})?(\d{2})?(\d{2})?(?:([Zz+\-])(?:(\d{2})'?(?:(\d{2})'?)?)?)?$"
    )
    .unwrap();

    static ref RE_DAY: Regex = Regex::new(r"(?i)^(d|dd|dag|day)(\b|_|$)").unwrap();
    static ref RE_MONTH: Regex = Regex::new(r"(?i)^(m|mm|mnd|maand|month)(\b|_|$)").unwrap();
    static ref RE_YEAR: Regex = Regex::new(r"(?i)^(y|yy|yyyy|jr|jaar|year)(\b|_|$)").unwrap();
}

/// Parse a PDF date string to UTC.
///
/// Missing month and day default to `01`, missing time parts to `00`.
/// A `+HH'mm'` / `-HH'mm'` offset is converted to UTC; no offset or `Z`
/// means UTC. RFC 3339 strings are accepted too.
pub fn parse_pdf_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    let caps = match RE_PDF_DATE.captures(text) {
        Some(caps) => caps,
        None => return DateTime::parse_from_rfc3339(text).ok().map(|d| d.with_timezone(&Utc)),
    };

    let part = |i: usize, default: u32| -> u32 {
        caps.get(i)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(default)
    };
    let year = caps[1].parse::<i32>().ok()?;
    let naive = NaiveDate::from_ymd_opt(year, part(2, 1), part(3, 1))?
        .and_hms_opt(part(4, 0), part(5, 0), part(6, 0))?;

    let offset_minutes = match caps.get(7).map(|m| m.as_str()) {
        Some(sign @ ("+" | "-")) => {
            let minutes = (part(8, 0) * 60 + part(9, 0)) as i64;
            if sign == "-" {
                -minutes
            } else {
                minutes
            }
        },
        _ => 0,
    };

    Some(naive.and_utc() - Duration::minutes(offset_minutes))
}

/// Part of a split date entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DatePart {
    /// Day of month
    Day,
    /// Month
    Month,
    /// Year
    Year,
}

/// Classify a dotted form field name like `1.date01.m` by its last segment.
///
/// Names without a dot never classify.
pub fn detect_date_part_by_name(field_name: &str) -> Option<DatePart> {
    let (_, last) = field_name.rsplit_once('.')?;
    if RE_DAY.is_match(last) {
        Some(DatePart::Day)
    } else if RE_MONTH.is_match(last) {
        Some(DatePart::Month)
    } else if RE_YEAR.is_match(last) {
        Some(DatePart::Year)
    } else {
        None
    }
}
