//! Shared formatting helpers for report output.
//!
//! Pure string formatting, no layout. Views call these so the CLI and any
//! other renderer print numbers the same way.

use crate::model::{StatusValue, parse_number};

/// Decimal places for millisecond durations.
pub const DURATION_PRECISION: usize = 3;

/// Format milliseconds with fixed precision: `"12.345"`.
pub fn format_ms(ms: f64) -> String {
    format!("{:.*}", DURATION_PRECISION, ms)
}

/// Format a status value as a plain integer: `"240"`, `"-2"`.
///
/// Numeric raw values are truncated like counters; text is shown verbatim.
pub fn format_status_value(value: &StatusValue) -> String {
    match value {
        StatusValue::Delta(d) => d.to_string(),
        StatusValue::Raw(raw) => match parse_number(raw) {
            Some(v) => format!("{}", v.trunc() as i64),
            None => raw.clone(),
        },
    }
}

/// Uppercase the first character: `"sending data"` -> `"Sending data"`.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Format an `EXPLAIN` filtered value as a rounded percentage: `"33%"`.
pub fn format_filtered(raw: Option<&str>) -> String {
    let pct = raw.and_then(parse_number).unwrap_or(0.0);
    format!("{:.0}%", pct)
}

/// Separate comma-joined index names for readability: `"a, b"`.
pub fn format_key_list(raw: Option<&str>) -> String {
    raw.map(|s| s.replace(',', ", ")).unwrap_or_default()
}

/// Format epoch seconds as UTC timestamp: `"2024-01-02 03:04:05"`.
pub fn format_timestamp(ts: i64) -> String {
    chrono::DateTime::<chrono::Utc>::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ts.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_ms() {
        assert_eq!(format_ms(0.0), "0.000");
        assert_eq!(format_ms(12.3456), "12.346");
        assert_eq!(format_ms(0.047), "0.047");
    }

    #[test]
    fn test_format_status_value() {
        assert_eq!(format_status_value(&StatusValue::Delta(240)), "240");
        assert_eq!(format_status_value(&StatusValue::Delta(-2)), "-2");
        assert_eq!(
            format_status_value(&StatusValue::Raw("10.499000".into())),
            "10"
        );
        assert_eq!(format_status_value(&StatusValue::Raw("n/a".into())), "n/a");
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("sending data"), "Sending data");
        assert_eq!(capitalize("Opening tables"), "Opening tables");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_format_filtered() {
        assert_eq!(format_filtered(Some("100.00")), "100%");
        assert_eq!(format_filtered(Some("33.33")), "33%");
        assert_eq!(format_filtered(None), "0%");
    }

    #[test]
    fn test_format_key_list() {
        assert_eq!(format_key_list(Some("PRIMARY,idx_email")), "PRIMARY, idx_email");
        assert_eq!(format_key_list(None), "");
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0), "1970-01-01 00:00:00");
    }
}
