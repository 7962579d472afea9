//! Formatting utilities shared across CLI, TUI, and core.

use chrono::{DateTime, Utc};

/// Placeholder for values the source did not provide.
pub const DASH: &str = "—";

/// Insert thousands separators into the integer part of a plain decimal
/// string ("-1234567.5" → "-1,234,567.5"). Anything that is not a plain
/// decimal (NaN, inf, exponents) is returned unchanged.
pub fn group_thousands(s: &str) -> String {
    let (sign, rest) = match s.strip_prefix('-') {
        Some(r) => ("-", r),
        None => ("", s),
    };
    let (int_part, frac) = match rest.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (rest, None),
    };
    if int_part.is_empty() || !int_part.bytes().all(|b| b.is_ascii_digit()) {
        return s.to_string();
    }
    if let Some(f) = frac {
        if !f.bytes().all(|b| b.is_ascii_digit()) {
            return s.to_string();
        }
    }

    let len = int_part.len();
    let mut grouped = String::with_capacity(len + len / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}

/// Format a JSON number with thousands separators, keeping its precision:
/// `1000000` → "1,000,000", `1234.5` → "1,234.5".
pub fn format_json_number(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        group_thousands(&i.to_string())
    } else if let Some(u) = n.as_u64() {
        group_thousands(&u.to_string())
    } else {
        n.as_f64()
            .map(format_f64)
            .unwrap_or_else(|| n.to_string())
    }
}

/// Shortest round-trip representation of an f64, with separators.
pub fn format_f64(v: f64) -> String {
    group_thousands(&v.to_string())
}

/// Whole-dollar USD with separators: 1234567.8 → "$1,234,568".
pub fn format_usd_whole(v: f64) -> String {
    format!("${}", group_thousands(&format!("{v:.0}")))
}

/// Abbreviated USD for chart labels: "$1.23B", "$4.50M", "$12.35K".
pub fn format_usd_compact(v: f64) -> String {
    let abs = v.abs();
    if abs >= 1_000_000_000.0 {
        format!("${:.2}B", v / 1_000_000_000.0)
    } else if abs >= 1_000_000.0 {
        format!("${:.2}M", v / 1_000_000.0)
    } else if abs >= 1_000.0 {
        format!("${:.2}K", v / 1_000.0)
    } else {
        format!("${v:.2}")
    }
}

/// A value that is already a percentage: 1.234 → "1.23%".
pub fn format_change_pct(v: f64) -> String {
    format!("{v:.2}%")
}

pub fn format_opt_usd(v: Option<f64>) -> String {
    v.map(format_usd_whole).unwrap_or_else(|| DASH.to_string())
}

pub fn format_opt_pct(v: Option<f64>) -> String {
    v.filter(|x| x.is_finite())
        .map(format_change_pct)
        .unwrap_or_else(|| DASH.to_string())
}

/// Calendar date of a series point.
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Truncate to at most `max` characters, respecting char boundaries.
pub fn truncate_str(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Determine if a change is positive, negative, or flat.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sign {
    Positive,
    Negative,
    Zero,
}

/// Sign of an optional change; missing or non-finite counts as zero.
pub fn sign_of(v: Option<f64>) -> Sign {
    match v {
        Some(x) if x.is_finite() && x > 0.0 => Sign::Positive,
        Some(x) if x.is_finite() && x < 0.0 => Sign::Negative,
        _ => Sign::Zero,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_group_thousands_integers() {
        assert_eq!(group_thousands("0"), "0");
        assert_eq!(group_thousands("999"), "999");
        assert_eq!(group_thousands("1000"), "1,000");
        assert_eq!(group_thousands("1000000"), "1,000,000");
        assert_eq!(group_thousands("1234567890"), "1,234,567,890");
    }

    #[test]
    fn test_group_thousands_negative_and_fraction() {
        assert_eq!(group_thousands("-1234"), "-1,234");
        assert_eq!(group_thousands("-123"), "-123");
        assert_eq!(group_thousands("1234567.891"), "1,234,567.891");
    }

    #[test]
    fn test_group_thousands_passthrough() {
        assert_eq!(group_thousands("NaN"), "NaN");
        assert_eq!(group_thousands("inf"), "inf");
        assert_eq!(group_thousands("1e21"), "1e21");
        assert_eq!(group_thousands(""), "");
    }

    #[test]
    fn test_format_json_number() {
        let n = serde_json::Number::from(1_000_000);
        assert_eq!(format_json_number(&n), "1,000,000");
        let f = serde_json::Number::from_f64(1234.5).unwrap();
        assert_eq!(format_json_number(&f), "1,234.5");
        let neg = serde_json::Number::from(-42_000);
        assert_eq!(format_json_number(&neg), "-42,000");
    }

    #[test]
    fn test_format_usd_whole() {
        assert_eq!(format_usd_whole(1_234_567.8), "$1,234,568");
        assert_eq!(format_usd_whole(0.0), "$0");
        assert_eq!(format_usd_whole(-500.0), "$-500");
    }

    #[test]
    fn test_format_usd_compact() {
        assert_eq!(format_usd_compact(12_340_000_000.0), "$12.34B");
        assert_eq!(format_usd_compact(1_234_567.89), "$1.23M");
        assert_eq!(format_usd_compact(12_345.67), "$12.35K");
        assert_eq!(format_usd_compact(123.45), "$123.45");
    }

    #[test]
    fn test_format_opt_pct() {
        assert_eq!(format_opt_pct(Some(1.234)), "1.23%");
        assert_eq!(format_opt_pct(Some(-18.1818)), "-18.18%");
        assert_eq!(format_opt_pct(None), DASH);
        assert_eq!(format_opt_pct(Some(f64::NAN)), DASH);
    }

    #[test]
    fn test_format_date() {
        let d = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        assert_eq!(format_date(&d), "2023-11-14");
    }

    #[test]
    fn test_truncate_str_char_boundary() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 5), "hello");
        assert_eq!(truncate_str("été-été", 3), "été");
    }

    #[test]
    fn test_sign_of() {
        assert_eq!(sign_of(Some(2.0)), Sign::Positive);
        assert_eq!(sign_of(Some(-0.01)), Sign::Negative);
        assert_eq!(sign_of(Some(0.0)), Sign::Zero);
        assert_eq!(sign_of(None), Sign::Zero);
    }
}
