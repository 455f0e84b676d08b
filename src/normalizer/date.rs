//! Tolerant date handling.
//!
//! Feeds in the wild publish dates in many historical formats. Parsing walks
//! an ordered list of known layouts and takes the first match; display
//! conversion falls back to the raw text when nothing matches.

use std::cmp::Ordering;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::domain::Post;

/// Used when the configured display format is not a valid strftime string.
pub const FALLBACK_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy)]
enum Layout {
    /// RFC 2822 / RFC 1123, numeric offset or the zone names chrono knows.
    Rfc2822,
    Rfc3339,
    /// Carries a numeric `%z` offset.
    Zoned(&'static str),
    /// Ends in a zone abbreviation; the abbreviation is read as UTC.
    NamedZone(&'static str),
    /// Date and time without a zone, read as UTC.
    Naive(&'static str),
    /// Date only, midnight UTC.
    Date(&'static str),
}

const LAYOUTS: &[Layout] = &[
    Layout::Rfc2822,
    Layout::Zoned("%a, %d %b %Y %H:%M:%S %z"),
    Layout::NamedZone("%a, %d %b %Y %H:%M:%S"),
    Layout::NamedZone("%A, %d-%b-%y %H:%M:%S"),
    Layout::Zoned("%d %b %Y %H:%M:%S %z"),
    Layout::NamedZone("%d %b %Y %H:%M:%S"),
    Layout::NamedZone("%d-%b-%y %H:%M:%S"),
    Layout::Rfc3339,
    Layout::Naive("%Y-%m-%dT%H:%M:%S"),
    Layout::Naive("%Y-%m-%d %H:%M:%S"),
    // Year-day-month variant some generators emit
    Layout::Naive("%Y-%d-%mT%H:%M:%S"),
    Layout::Date("%B %d, %Y"),
    Layout::Date("%d/%b/%Y"),
    Layout::Date("%d-%b-%Y"),
    Layout::Date("%Y-%m-%d"),
    Layout::Date("%m/%d/%Y"),
];

impl Layout {
    fn parse(self, s: &str) -> Option<DateTime<Utc>> {
        match self {
            Layout::Rfc2822 => DateTime::parse_from_rfc2822(s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            Layout::Rfc3339 => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            Layout::Zoned(fmt) => DateTime::parse_from_str(s, fmt)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            Layout::NamedZone(fmt) => {
                let (rest, zone) = s.rsplit_once(' ')?;
                if zone.is_empty() || !zone.chars().all(|c| c.is_ascii_alphabetic()) {
                    return None;
                }
                NaiveDateTime::parse_from_str(rest.trim_end(), fmt)
                    .ok()
                    .map(|dt| dt.and_utc())
            }
            Layout::Naive(fmt) => NaiveDateTime::parse_from_str(s, fmt)
                .ok()
                .map(|dt| dt.and_utc()),
            Layout::Date(fmt) => NaiveDate::parse_from_str(s, fmt)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc()),
        }
    }
}

/// Parse a feed timestamp against the known layouts, first match wins.
///
/// The signature matches feed-rs' timestamp parser hook.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    LAYOUTS.iter().find_map(|layout| layout.parse(s))
}

/// Reformat `raw` in the display `format`, or return it untouched when no
/// layout matches.
pub fn convert_date(raw: &str, format: &str) -> String {
    match parse_date(raw) {
        Some(dt) => format_date(&dt, format),
        None => raw.to_string(),
    }
}

pub fn format_date(dt: &DateTime<Utc>, format: &str) -> String {
    let format = if is_valid_format(format) {
        format
    } else {
        FALLBACK_DATE_FORMAT
    };
    dt.format(format).to_string()
}

/// Whether chrono accepts `format` as a strftime string.
pub fn is_valid_format(format: &str) -> bool {
    !format.is_empty() && !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}

/// Newest first; undated posts after dated ones.
pub fn newest_first(a: &Post, b: &Post) -> Ordering {
    match (a.published_at, b.published_at) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, TimeZone, Timelike};

    use super::*;

    fn ymd_hms(s: &str) -> (i32, u32, u32, u32, u32, u32) {
        let dt = parse_date(s).unwrap_or_else(|| panic!("failed to parse {:?}", s));
        (
            dt.year(),
            dt.month(),
            dt.day(),
            dt.hour(),
            dt.minute(),
            dt.second(),
        )
    }

    #[test]
    fn test_rfc1123_with_offset() {
        assert_eq!(
            ymd_hms("Mon, 02 Jan 2006 15:04:05 -0700"),
            (2006, 1, 2, 22, 4, 5)
        );
    }

    #[test]
    fn test_rfc1123_with_zone_name() {
        assert_eq!(
            ymd_hms("Mon, 02 Jan 2006 15:04:05 GMT"),
            (2006, 1, 2, 15, 4, 5)
        );
        // Unknown abbreviations are read as UTC
        assert_eq!(
            ymd_hms("Mon, 02 Jan 2006 15:04:05 CEST"),
            (2006, 1, 2, 15, 4, 5)
        );
    }

    #[test]
    fn test_rfc850_style() {
        assert_eq!(
            ymd_hms("Monday, 02-Jan-06 15:04:05 MST"),
            (2006, 1, 2, 15, 4, 5)
        );
    }

    #[test]
    fn test_without_weekday() {
        assert_eq!(ymd_hms("02 Jan 2006 15:04:05 +0000"), (2006, 1, 2, 15, 4, 5));
        assert_eq!(ymd_hms("02 Jan 2006 15:04:05 UTC"), (2006, 1, 2, 15, 4, 5));
        assert_eq!(ymd_hms("02-Jan-06 15:04:05 PST"), (2006, 1, 2, 15, 4, 5));
    }

    #[test]
    fn test_rfc3339_and_iso() {
        assert_eq!(ymd_hms("2024-03-05T10:20:30Z"), (2024, 3, 5, 10, 20, 30));
        assert_eq!(
            ymd_hms("2024-03-05T10:20:30+02:00"),
            (2024, 3, 5, 8, 20, 30)
        );
        assert_eq!(ymd_hms("2024-03-05T10:20:30"), (2024, 3, 5, 10, 20, 30));
        assert_eq!(ymd_hms("2024-03-05 10:20:30"), (2024, 3, 5, 10, 20, 30));
    }

    #[test]
    fn test_date_only_layouts() {
        assert_eq!(ymd_hms("January 02, 2006"), (2006, 1, 2, 0, 0, 0));
        assert_eq!(ymd_hms("02/Jan/2006"), (2006, 1, 2, 0, 0, 0));
        assert_eq!(ymd_hms("02-Jan-2006"), (2006, 1, 2, 0, 0, 0));
        assert_eq!(ymd_hms("2006-01-02"), (2006, 1, 2, 0, 0, 0));
        assert_eq!(ymd_hms("01/02/2006"), (2006, 1, 2, 0, 0, 0));
    }

    #[test]
    fn test_convert_date_reformats() {
        assert_eq!(
            convert_date("Mon, 02 Jan 2006 15:04:05 GMT", "%d/%m/%Y"),
            "02/01/2006"
        );
        assert_eq!(convert_date("2006-01-02", "%Y.%m.%d"), "2006.01.02");
    }

    #[test]
    fn test_convert_date_preserves_unparseable() {
        assert_eq!(convert_date("sometime last week", "%d/%m/%Y"), "sometime last week");
        assert_eq!(convert_date("", "%d/%m/%Y"), "");
    }

    #[test]
    fn test_invalid_display_format_falls_back() {
        assert!(!is_valid_format("%Q"));
        let dt = Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap();
        assert_eq!(format_date(&dt, "%Q"), "2024-02-29");
    }

    #[test]
    fn test_newest_first_keeps_ties_and_puts_undated_last() {
        let mut a = Post::new("a", "A", "x");
        a.published_at = Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        let mut b = Post::new("b", "B", "x");
        b.published_at = Some(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap());
        let c = Post::new("c", "C", "x");
        let d = Post::new("d", "D", "x");
        let mut e = Post::new("e", "E", "x");
        e.published_at = a.published_at;

        let mut posts = vec![c, a, d, b, e];
        posts.sort_by(newest_first);

        let ids: Vec<&str> = posts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "e", "c", "d"]);
    }
}
