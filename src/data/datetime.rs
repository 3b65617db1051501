//! Date/time text recognition
//!
//! Values map to milliseconds since the Unix epoch (UTC). Naive values are
//! taken as UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d.%m.%Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%d.%m.%Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%d %b %Y",
    "%d %B %Y",
];

/// Parse a date or date-time string; `None` if no supported format matches
pub fn parse_datetime_millis(text: &str) -> Option<i64> {
    let s = text.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.and_utc().timestamp_millis());
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return date_to_millis(date);
        }
    }

    // Year-month ("2024-03")
    if s.len() == 7 && s.as_bytes()[4] == b'-' {
        if let Ok(date) = NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d") {
            return date_to_millis(date);
        }
    }

    // Bare year ("2022") is January 1st
    if s.len() == 4 && s.bytes().all(|b| b.is_ascii_digit()) {
        let year = s.parse::<i32>().ok()?;
        return NaiveDate::from_ymd_opt(year, 1, 1).and_then(date_to_millis);
    }

    None
}

fn date_to_millis(date: NaiveDate) -> Option<i64> {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_formats() {
        let day = parse_datetime_millis("2024-01-02").unwrap();
        assert_eq!(parse_datetime_millis("2024/01/02"), Some(day));
        assert_eq!(parse_datetime_millis("01/02/2024"), Some(day));
        assert_eq!(parse_datetime_millis("Jan 02, 2024"), Some(day));
        assert_eq!(parse_datetime_millis("2024-01-02 00:00:00"), Some(day));
        assert_eq!(parse_datetime_millis("2024-01-02T00:00:00Z"), Some(day));
        assert_eq!(parse_datetime_millis("2024-01-02 00:00:01.5"), Some(day + 1500));
        assert_eq!(parse_datetime_millis("2024-01"), parse_datetime_millis("2024-01-01"));
    }

    #[test]
    fn test_bare_year_is_first_of_january() {
        assert_eq!(parse_datetime_millis("2022"), parse_datetime_millis("2022-01-01"));
        assert_eq!(parse_datetime_millis(" 1999 "), parse_datetime_millis("1999-01-01"));
        assert_eq!(parse_datetime_millis("202"), None);
        assert_eq!(parse_datetime_millis("20222"), None);
    }

    #[test]
    fn test_rejects_non_dates() {
        assert_eq!(parse_datetime_millis("male"), None);
        assert_eq!(parse_datetime_millis(""), None);
        assert_eq!(parse_datetime_millis("2024-13-45"), None);
        assert_eq!(parse_datetime_millis("42"), None);
    }
}
