//! # Field Normalization
//!
//! Tolerant parsers for loosely-typed wire fields, used in both directions:
//! import (row → entity) and export (entity → row).
//!
//! ## Normalization Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Tolerance Ladder                                     │
//! │                                                                         │
//! │  Flags   "Y"/"1"/"true" (any case) → true, everything else → false     │
//! │  Dates   four explicit formats in priority order, then a general        │
//! │          fallback set, then "absent" - never an error                   │
//! │  Prices  see Price::parse_lenient                                       │
//! │                                                                         │
//! │  The rule everywhere: a single bad FIELD degrades to its neutral        │
//! │  value; it never aborts the row, and a bad row never aborts the file.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;

// =============================================================================
// Flags
// =============================================================================

/// Parses a yes/no wire flag.
///
/// Case-insensitive; `"y"`, `"1"` and `"true"` are true, anything else
/// (including empty or absent) is false.
///
/// ## Example
/// ```rust
/// use stockline_core::normalize::parse_flag;
///
/// assert!(parse_flag("Y"));
/// assert!(parse_flag("TRUE"));
/// assert!(!parse_flag("N"));
/// assert!(!parse_flag(""));
/// ```
pub fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "y" | "1" | "true"
    )
}

/// Renders a flag for the wire as `"Y"` / `"N"`.
pub fn format_flag(value: bool) -> &'static str {
    if value {
        "Y"
    } else {
        "N"
    }
}

// =============================================================================
// Dates
// =============================================================================

/// Explicit date formats, tried in priority order.
///
/// Order matters for ambiguous day/month inputs: `03/04/2024` resolves as
/// day-first (3 April) because `%d/%m/%Y` precedes `%m/%d/%Y`.
const DATE_FORMATS: &[&str] = &["%Y/%m/%d", "%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y"];

/// General fallback formats for free-form inputs the explicit list misses.
const FALLBACK_FORMATS: &[&str] = &[
    "%Y%m%d",
    "%d-%m-%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
];

/// Parses a wire date field.
///
/// Tries the explicit formats first, then the general fallback set, then a
/// timestamp prefix (`2024-01-31T10:00:00` style). A value nothing matches
/// is treated as absent, not as an error.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use stockline_core::normalize::parse_date;
///
/// let expected = NaiveDate::from_ymd_opt(2024, 1, 31);
/// assert_eq!(parse_date("2024/01/31"), expected);
/// assert_eq!(parse_date("31/01/2024"), expected);
/// assert_eq!(parse_date("not a date"), None);
/// ```
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    for fmt in DATE_FORMATS.iter().chain(FALLBACK_FORMATS) {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date);
        }
    }

    // Timestamps: keep the calendar date, drop the time-of-day.
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }

    None
}

/// Renders an optional date for the wire.
///
/// Uses the export contract's `yyyy/MM/dd` shape; an absent date becomes an
/// empty string so the round trip re-imports it as absent.
pub fn format_date(value: Option<NaiveDate>) -> String {
    match value {
        Some(date) => date.format("%Y/%m/%d").to_string(),
        None => String::new(),
    }
}

/// Trims a wire text field, collapsing blank values to `None`.
pub fn normalize_optional(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_parse_flag_truthy() {
        for raw in ["Y", "y", "1", "true", "TRUE", "True", " y "] {
            assert!(parse_flag(raw), "{raw:?} should be true");
        }
    }

    #[test]
    fn test_parse_flag_everything_else_is_false() {
        for raw in ["N", "n", "", "0", "false", "yes", "garbage"] {
            assert!(!parse_flag(raw), "{raw:?} should be false");
        }
    }

    #[test]
    fn test_parse_date_explicit_formats() {
        assert_eq!(parse_date("2024/01/31"), Some(d(2024, 1, 31)));
        assert_eq!(parse_date("2024-01-31"), Some(d(2024, 1, 31)));
        assert_eq!(parse_date("31/01/2024"), Some(d(2024, 1, 31)));
        assert_eq!(parse_date("01/31/2024"), Some(d(2024, 1, 31)));
    }

    #[test]
    fn test_parse_date_ambiguous_resolves_day_first() {
        // 03/04/2024 matches %d/%m/%Y before %m/%d/%Y: 3 April, not 4 March.
        assert_eq!(parse_date("03/04/2024"), Some(d(2024, 4, 3)));
    }

    #[test]
    fn test_parse_date_fallbacks() {
        assert_eq!(parse_date("20240131"), Some(d(2024, 1, 31)));
        assert_eq!(parse_date("31 Jan 2024"), Some(d(2024, 1, 31)));
        assert_eq!(parse_date("January 31, 2024"), Some(d(2024, 1, 31)));
        assert_eq!(parse_date("2024-01-31T10:30:00"), Some(d(2024, 1, 31)));
    }

    #[test]
    fn test_parse_date_garbage_is_absent() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("   "), None);
        assert_eq!(parse_date("not a date"), None);
        assert_eq!(parse_date("2024/13/45"), None);
    }

    #[test]
    fn test_format_date_round_trip() {
        let date = Some(d(2024, 1, 31));
        assert_eq!(format_date(date), "2024/01/31");
        assert_eq!(parse_date(&format_date(date)), date);
        assert_eq!(format_date(None), "");
        assert_eq!(parse_date(&format_date(None)), None);
    }

    #[test]
    fn test_normalize_optional() {
        assert_eq!(normalize_optional(Some("  x  ")), Some("x".to_string()));
        assert_eq!(normalize_optional(Some("   ")), None);
        assert_eq!(normalize_optional(Some("")), None);
        assert_eq!(normalize_optional(None), None);
    }
}
