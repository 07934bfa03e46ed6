//! `date` / `strtotime` built-ins.
//!
//! Format strings use the subset of PHP date codes templates actually rely
//! on; unknown characters pass through literally and a backslash escapes the
//! following character.

use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc};
use serde_json::Value;

use crate::value::{as_i64, render};

/// Numeric operand: epoch seconds. String operand: parse then re-format.
/// Unparsable strings pass through unchanged; other shapes are returned
/// as-is.
pub(super) fn date(value: &Value, format: &str) -> Value {
    if let Some(ts) = as_i64(value) {
        if let Some(dt) = Utc.timestamp_opt(ts, 0).single() {
            return Value::String(format_date(&dt, format));
        }
        return value.clone();
    }
    if let Value::String(s) = value {
        if let Some(dt) = parse_datetime(s) {
            return Value::String(format_date(&dt, format));
        }
        return value.clone();
    }
    value.clone()
}

/// Epoch seconds for a parsable date string, null otherwise.
pub(super) fn strtotime(s: &str) -> Value {
    match parse_datetime(s) {
        Some(dt) => Value::from(dt.timestamp()),
        None => Value::Null,
    }
}

fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("now") {
        return Some(Utc::now());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y/%m/%d %H:%M:%S"] {
        if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(d) = chrono::NaiveDate::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&d.and_hms_opt(0, 0, 0)?));
        }
    }
    None
}

fn format_date(dt: &DateTime<Utc>, format: &str) -> String {
    let mut out = String::with_capacity(format.len() * 2);
    let mut chars = format.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            }
            'Y' => out.push_str(&dt.year().to_string()),
            'y' => out.push_str(&format!("{:02}", dt.year() % 100)),
            'm' => out.push_str(&format!("{:02}", dt.month())),
            'n' => out.push_str(&dt.month().to_string()),
            'd' => out.push_str(&format!("{:02}", dt.day())),
            'j' => out.push_str(&dt.day().to_string()),
            'H' => out.push_str(&format!("{:02}", dt.hour())),
            'G' => out.push_str(&dt.hour().to_string()),
            'i' => out.push_str(&format!("{:02}", dt.minute())),
            's' => out.push_str(&format!("{:02}", dt.second())),
            'D' => out.push_str(&dt.format("%a").to_string()),
            'l' => out.push_str(&dt.format("%A").to_string()),
            'M' => out.push_str(&dt.format("%b").to_string()),
            'F' => out.push_str(&dt.format("%B").to_string()),
            'U' => out.push_str(&dt.timestamp().to_string()),
            other => out.push(other),
        }
    }
    out
}
