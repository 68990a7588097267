//! Date parsing and display formatting for catalog records.

use chrono::{DateTime, NaiveDate};

/// Parses a date submitted on a form.
///
/// Accepts an ISO-8601 calendar date ("2014-10-06") or a full RFC 3339
/// timestamp, which is truncated to its calendar date.
pub fn parse_iso_date(text: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|timestamp| timestamp.date_naive())
}

/// Formats a date for display, e.g. "Oct 6, 2014".
pub fn format_date_med(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// Formats an optional date, rendering an absent date as the empty string.
pub fn format_optional_date(date: Option<NaiveDate>) -> String {
    date.map(format_date_med).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_calendar_date() {
        assert_eq!(
            parse_iso_date("2014-10-06"),
            NaiveDate::from_ymd_opt(2014, 10, 6)
        );
    }

    #[test]
    fn parses_rfc3339_timestamp() {
        assert_eq!(
            parse_iso_date("2014-10-06T12:30:00Z"),
            NaiveDate::from_ymd_opt(2014, 10, 6)
        );
    }

    #[test]
    fn rejects_non_dates() {
        assert_eq!(parse_iso_date("next tuesday"), None);
        assert_eq!(parse_iso_date("2014-13-40"), None);
        assert_eq!(parse_iso_date(""), None);
    }

    #[test]
    fn formats_without_zero_padding() {
        let date = NaiveDate::from_ymd_opt(2014, 10, 6).unwrap();
        assert_eq!(format_date_med(date), "Oct 6, 2014");
        let date = NaiveDate::from_ymd_opt(1999, 12, 25).unwrap();
        assert_eq!(format_date_med(date), "Dec 25, 1999");
    }

    #[test]
    fn optional_formatting() {
        assert_eq!(format_optional_date(None), "");
        assert_eq!(
            format_optional_date(NaiveDate::from_ymd_opt(1970, 1, 1)),
            "Jan 1, 1970"
        );
    }
}
