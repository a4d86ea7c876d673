//! Cell-level coercions shared by every module.
//!
//! Spreadsheet tools hand back integers as floats (`12.0`), booleans as
//! words, and dates with a time tacked on; all parsing here is total over
//! blank-filled strings.

use chrono::NaiveDate;

pub fn is_blank(raw: &str) -> bool {
    raw.trim().is_empty()
}

/// Numeric-id rule used everywhere: float-then-int coercion, never a raw
/// int parse, so `"12.0"` survives.
pub fn parse_id(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let f: f64 = trimmed.parse().ok()?;
    if !f.is_finite() {
        return None;
    }
    Some(f.trunc() as i64)
}

pub fn parse_int(raw: &str) -> Option<i64> {
    parse_id(raw)
}

/// Lenient boolean words; anything unrecognized falls back to `default`.
pub fn parse_bool(raw: &str, default: bool) -> bool {
    let v = raw.trim().to_ascii_lowercase();
    match v.as_str() {
        "" => default,
        "true" | "1" | "yes" | "y" => true,
        "false" | "0" | "no" | "n" => false,
        _ => default,
    }
}

/// Normalize to `YYYY-MM-DD`. Accepts a trailing time part (Excel date
/// cells arrive as `2026-01-05 00:00:00`).
pub fn normalize_date(raw: &str) -> Option<String> {
    let mut v = raw.trim();
    if v.is_empty() {
        return None;
    }
    if let Some((date, _)) = v.split_once(' ') {
        v = date;
    }
    NaiveDate::parse_from_str(v, "%Y-%m-%d").ok()?;
    Some(v.to_string())
}

/// Normalize to `HH:MM`.
pub fn normalize_time_hm(raw: &str) -> Option<String> {
    let v = raw.trim();
    let (h, m) = v.split_once(':')?;
    let h: u8 = h.parse().ok()?;
    let m: u8 = m.parse().ok()?;
    if h > 23 || m > 59 {
        return None;
    }
    Some(format!("{h:02}:{m:02}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_arrive_as_floats() {
        assert_eq!(parse_id("12.0"), Some(12));
        assert_eq!(parse_id(" 5 "), Some(5));
        assert_eq!(parse_id("abc"), None);
        assert_eq!(parse_id(""), None);
        assert_eq!(parse_id("12.7"), Some(12));
    }

    #[test]
    fn bool_words() {
        assert!(parse_bool("TRUE", false));
        assert!(parse_bool("y", false));
        assert!(!parse_bool("0", true));
        assert!(parse_bool("", true));
        assert!(!parse_bool("maybe", false));
    }

    #[test]
    fn date_strips_time_part() {
        assert_eq!(
            normalize_date("2026-01-05 00:00:00"),
            Some("2026-01-05".to_string())
        );
        assert_eq!(normalize_date("2026-13-05"), None);
        assert_eq!(normalize_date(""), None);
    }

    #[test]
    fn times_are_zero_padded() {
        assert_eq!(normalize_time_hm("9:5"), Some("09:05".to_string()));
        assert_eq!(normalize_time_hm("23:59"), Some("23:59".to_string()));
        assert_eq!(normalize_time_hm("24:00"), None);
        assert_eq!(normalize_time_hm("1222"), None);
    }
}
