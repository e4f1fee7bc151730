// Utility functions
use chrono::{DateTime, NaiveDateTime, Utc};

/// Parses an RFC 3339 timestamp, converts it to UTC and drops the offset.
pub fn parse_utc_naive(date_str: &str) -> Option<NaiveDateTime> {
    DateTime::parse_from_rfc3339(date_str.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc).naive_utc())
}

/// Cuts `text` to at most `max` characters, marking the cut with an ellipsis.
pub fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out: String = text.chars().take(max - 1).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn offset_is_folded_into_utc() {
        let parsed = parse_utc_naive("2024-03-01T14:30:00+02:00").unwrap();
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap();
        assert_eq!(parsed, expected);
    }

    #[test]
    fn garbage_is_none() {
        assert_eq!(parse_utc_naive("yesterday"), None);
        assert_eq!(parse_utc_naive(""), None);
    }

    #[test]
    fn truncates_on_char_boundary() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("ünïcödé text", 5), "ünïc…");
    }

    #[test]
    fn zero_width_truncates_to_nothing() {
        assert_eq!(truncate_chars("crash", 0), "");
        assert_eq!(truncate_chars("crash", 1), "…");
        assert_eq!(truncate_chars("", 0), "");
    }
}
