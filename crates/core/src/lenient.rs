//! Lenient scalar decoding for feed payloads.
//!
//! The feeds are inconsistent about scalar representation: the same
//! field may arrive as a float, an integer, or a numeric string. Every
//! payload type in [`crate::payload`] routes its scalars through the
//! helpers here so the same ordered attempt (native number, then
//! string-to-number, else absent) applies everywhere. A value that cannot
//! be read is `None`, never a decode error.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::types::Timestamp;

/// Naive layouts accepted when a timestamp carries no offset. `%.f`
/// accepts an absent fractional part.
const NAIVE_TIMESTAMP_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Read a finite number from a JSON value.
pub fn number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

/// Read a non-negative whole number that fits in `u32`.
pub fn count(value: &Value) -> Option<u32> {
    number(value)
        .filter(|v| *v >= 0.0 && v.fract() == 0.0 && *v <= f64::from(u32::MAX))
        .map(|v| v as u32)
}

/// Read a boolean flag. Accepts `true`/`false`, `0`/`1`, and their
/// string spellings.
pub fn flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => flag_from_number(number(value)?),
        },
        _ => flag_from_number(number(value)?),
    }
}

fn flag_from_number(n: f64) -> Option<bool> {
    if n == 0.0 {
        Some(false)
    } else if n == 1.0 {
        Some(true)
    } else {
        None
    }
}

/// Read a string, rendering bare numbers as their decimal text.
pub fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Parse a feed timestamp.
///
/// Accepts RFC 3339 (with or without fractional seconds) and naive
/// `YYYY-MM-DD[T ]HH:MM:SS[.fff]`, which is taken as UTC.
pub fn timestamp(raw: &str) -> Option<Timestamp> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

// ---------------------------------------------------------------------------
// serde adapters
// ---------------------------------------------------------------------------

/// `deserialize_with` adapter for `Option<f64>` fields.
pub fn opt_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(number(&Value::deserialize(deserializer)?))
}

/// `deserialize_with` adapter for `Option<u32>` fields.
pub fn opt_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    Ok(count(&Value::deserialize(deserializer)?))
}

/// `deserialize_with` adapter for `Option<bool>` fields.
pub fn opt_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    Ok(flag(&Value::deserialize(deserializer)?))
}

/// `deserialize_with` adapter for `Option<String>` fields.
pub fn opt_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(text(&Value::deserialize(deserializer)?))
}

/// `deserialize_with` adapter for numeric arrays. Unreadable entries
/// become NaN so positions are preserved; a non-array is empty.
pub fn f64_seq<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<f64>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Array(items) => Ok(items
            .iter()
            .map(|item| number(item).unwrap_or(f64::NAN))
            .collect()),
        _ => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Timelike};
    use serde_json::json;

    use super::*;

    #[test]
    fn number_accepts_all_three_representations() {
        assert_eq!(number(&json!(0.042)), Some(0.042));
        assert_eq!(number(&json!(3)), Some(3.0));
        assert_eq!(number(&json!(" 7.83 ")), Some(7.83));
    }

    #[test]
    fn number_rejects_garbage_without_error() {
        assert_eq!(number(&json!("n/a")), None);
        assert_eq!(number(&json!(null)), None);
        assert_eq!(number(&json!({"v": 1})), None);
        assert_eq!(number(&json!("NaN")), None);
    }

    #[test]
    fn count_requires_whole_non_negative() {
        assert_eq!(count(&json!("64")), Some(64));
        assert_eq!(count(&json!(2.5)), None);
        assert_eq!(count(&json!(-1)), None);
    }

    #[test]
    fn flag_spellings() {
        assert_eq!(flag(&json!(true)), Some(true));
        assert_eq!(flag(&json!("FALSE")), Some(false));
        assert_eq!(flag(&json!(1)), Some(true));
        assert_eq!(flag(&json!("0")), Some(false));
        assert_eq!(flag(&json!(2)), None);
    }

    #[test]
    fn timestamp_with_and_without_subseconds() {
        let whole = timestamp("2024-03-01T12:15:00Z").expect("rfc3339");
        let frac = timestamp("2024-03-01T12:15:00.250+00:00").expect("rfc3339 fractional");
        assert_eq!(whole.minute(), 15);
        assert_eq!(frac.timestamp_subsec_millis(), 250);
    }

    #[test]
    fn naive_timestamp_is_utc() {
        let ts = timestamp("2024-03-01 06:45:00").expect("naive");
        assert_eq!(ts.day(), 1);
        assert_eq!(ts.hour(), 6);
        assert!(timestamp("yesterday").is_none());
    }
}
