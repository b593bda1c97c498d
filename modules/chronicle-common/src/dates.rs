//! Best-effort date normalization.
//!
//! Extracted date strings arrive in whatever shape the source text used:
//! ISO dates, RFC 3339 timestamps, "November 24, 2023", "24 Nov 2023",
//! US slash dates. Everything normalizes to a `NaiveDate`; anything that
//! doesn't resolve to a full calendar date is rejected rather than
//! guessed at (a partial parse that lands in the wrong year would
//! silently misplace an event on the timeline).

use chrono::{DateTime, NaiveDate, NaiveDateTime};

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%B %d %Y",
    "%d-%m-%Y",
];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Parse a date string in any of the supported shapes. Returns `None`
/// for anything that does not resolve to a full calendar date.
pub fn parse_flexible(raw: &str) -> Option<NaiveDate> {
    let cleaned = strip_ordinals(raw.trim());
    if cleaned.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(&cleaned) {
        return Some(dt.date_naive());
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(&cleaned, fmt) {
            return Some(dt.date());
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(&cleaned, fmt) {
            return Some(d);
        }
    }

    None
}

/// Remove English ordinal suffixes after day numbers ("24th" → "24") so
/// that "November 24th, 2023" parses with the plain formats.
fn strip_ordinals(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let chars: Vec<char> = raw.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_ascii_digit() {
            out.push(c);
            i += 1;
            continue;
        }

        let prev_is_digit = i > 0 && chars[i - 1].is_ascii_digit();
        if prev_is_digit && i + 1 < chars.len() {
            let pair: String = chars[i..i + 2].iter().collect();
            let suffix = pair.to_ascii_lowercase();
            if matches!(suffix.as_str(), "st" | "nd" | "rd" | "th") {
                let next_ok = i + 2 >= chars.len() || !chars[i + 2].is_alphanumeric();
                if next_ok {
                    i += 2;
                    continue;
                }
            }
        }

        out.push(c);
        i += 1;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn iso_date() {
        assert_eq!(parse_flexible("2024-03-01"), Some(date(2024, 3, 1)));
    }

    #[test]
    fn rfc3339_timestamp() {
        assert_eq!(
            parse_flexible("2023-11-24T09:30:00Z"),
            Some(date(2023, 11, 24))
        );
    }

    #[test]
    fn long_month_names() {
        assert_eq!(parse_flexible("November 24, 2023"), Some(date(2023, 11, 24)));
        assert_eq!(parse_flexible("24 November 2023"), Some(date(2023, 11, 24)));
        assert_eq!(parse_flexible("Mar 3, 2024"), Some(date(2024, 3, 3)));
    }

    #[test]
    fn ordinal_suffixes() {
        assert_eq!(
            parse_flexible("November 24th, 2023"),
            Some(date(2023, 11, 24))
        );
        assert_eq!(parse_flexible("March 1st, 2024"), Some(date(2024, 3, 1)));
        assert_eq!(parse_flexible("May 2nd 2024"), Some(date(2024, 5, 2)));
    }

    #[test]
    fn slash_dates() {
        assert_eq!(parse_flexible("03/01/2024"), Some(date(2024, 3, 1)));
        assert_eq!(parse_flexible("2024/03/01"), Some(date(2024, 3, 1)));
    }

    #[test]
    fn rejects_partial_and_garbage() {
        assert_eq!(parse_flexible("2024"), None);
        assert_eq!(parse_flexible("last Tuesday"), None);
        assert_eq!(parse_flexible("early March"), None);
        assert_eq!(parse_flexible(""), None);
        assert_eq!(parse_flexible("   "), None);
    }

    #[test]
    fn whitespace_trimmed() {
        assert_eq!(parse_flexible("  2024-03-01  "), Some(date(2024, 3, 1)));
    }
}
