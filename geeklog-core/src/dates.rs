//! Timestamp parsing and display formatting.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use std::fmt::Write;

/// Date-time layouts accepted for free-text timestamps, tried in order.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%d %B %Y %H:%M",
    "%B %d, %Y %H:%M",
];

/// Date-only layouts; they resolve to local midnight.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", "%Y/%m/%d", "%d %B %Y", "%d %b %Y", "%B %d, %Y", "%b %d, %Y", "%B %d %Y",
    "%b %d %Y",
];

/// Current time as epoch seconds.
pub fn now() -> i64 {
    Utc::now().timestamp()
}

/// Parse a header timestamp: numeric epoch seconds, else free text.
pub fn parse_timestamp(value: &str) -> Option<i64> {
    let value = value.trim();
    if let Ok(epoch) = value.parse::<i64>() {
        return Some(epoch);
    }
    parse_free_date(value)
}

/// Parse a human-written date into epoch seconds.
///
/// Accepts RFC 3339, RFC 2822, `@<epoch>`, `now`, and the common
/// `YYYY-MM-DD [HH:MM[:SS]]` and `12 March 2021` style layouts. Times without
/// an offset are read in the local time zone.
pub fn parse_free_date(text: &str) -> Option<i64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if text.eq_ignore_ascii_case("now") {
        return Some(now());
    }
    if let Some(epoch) = text.strip_prefix('@') {
        return epoch.trim().parse().ok();
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.timestamp());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.timestamp());
    }

    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return local_epoch(naive);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return local_epoch(date.and_hms_opt(0, 0, 0)?);
        }
    }

    None
}

fn local_epoch(naive: NaiveDateTime) -> Option<i64> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.timestamp())
}

/// Format epoch seconds with a strftime pattern in local time.
///
/// Invalid patterns or out-of-range timestamps yield an empty string instead
/// of panicking inside `Display`.
pub fn format_epoch(epoch: i64, pattern: &str) -> String {
    let items: Vec<Item<'_>> = StrftimeItems::new(pattern).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        tracing::warn!("Invalid date format pattern '{}'", pattern);
        return String::new();
    }

    let Some(utc) = DateTime::<Utc>::from_timestamp(epoch, 0) else {
        return String::new();
    };
    let local = utc.with_timezone(&Local);

    let mut out = String::new();
    match write!(out, "{}", local.format_with_items(items.into_iter())) {
        Ok(()) => out,
        Err(_) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_timestamps() {
        assert_eq!(parse_timestamp("1700000000"), Some(1_700_000_000));
        assert_eq!(parse_timestamp(" 42 "), Some(42));
        assert_eq!(parse_timestamp("@1234"), Some(1234));
    }

    #[test]
    fn test_rfc_formats() {
        assert_eq!(
            parse_free_date("2021-03-12T10:00:00Z"),
            Some(1_615_543_200)
        );
        assert_eq!(
            parse_free_date("Fri, 12 Mar 2021 10:00:00 +0000"),
            Some(1_615_543_200)
        );
    }

    #[test]
    fn test_local_formats_are_ordered() {
        let day = parse_free_date("2021-03-12").unwrap();
        let later = parse_free_date("2021-03-12 10:30").unwrap();
        let written = parse_free_date("12 March 2021").unwrap();
        assert_eq!(day, written);
        assert_eq!(later - day, 10 * 3600 + 30 * 60);
        assert!(parse_free_date("March 13, 2021").unwrap() > day);
    }

    #[test]
    fn test_garbage_is_absent() {
        assert_eq!(parse_timestamp("whenever"), None);
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_free_date("2021-13-45"), None);
    }

    #[test]
    fn test_format_epoch() {
        let mid_year = parse_free_date("2020-06-15 12:00").unwrap();
        assert_eq!(format_epoch(mid_year, "%F"), "2020-06-15");
        assert_eq!(format_epoch(mid_year, "%Y"), "2020");
        assert!(!format_epoch(mid_year, "%c").is_empty());
    }

    #[test]
    fn test_bad_pattern_does_not_panic() {
        assert_eq!(format_epoch(0, "%Q broken %"), "");
    }
}
