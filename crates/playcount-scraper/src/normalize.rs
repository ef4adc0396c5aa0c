//! Conversion of loosely-typed count values into plain integers.
//!
//! Pages report counts either as JSON numbers or as display strings such as
//! `"12.3K"`, `"2M"` or `"1,234"`. Anything else is "absent", which is a
//! routine outcome rather than an error.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

static SUFFIXED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+(?:\.\d+)?)([KM])$").expect("valid regex"));
static DIGITS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+$").expect("valid regex"));

/// Normalizes a JSON value into a non-negative integer count.
///
/// Numbers pass through (fractional values are rounded, negatives are
/// rejected). Strings go through [`normalize_count_str`]. Booleans, objects,
/// arrays and `null` yield `None`.
#[must_use]
pub fn normalize_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                return Some(u);
            }
            let f = n.as_f64()?;
            float_to_count(f)
        }
        Value::String(s) => normalize_count_str(s),
        _ => None,
    }
}

/// Normalizes a display string: trims, uppercases, strips thousands
/// separators, then accepts `<digits>[.<digits>]K|M` or plain digits.
#[must_use]
pub fn normalize_count_str(raw: &str) -> Option<u64> {
    let cleaned = raw.trim().to_uppercase().replace(',', "");

    if let Some(caps) = SUFFIXED_RE.captures(&cleaned) {
        let base: f64 = caps.get(1)?.as_str().parse().ok()?;
        let multiplier = match caps.get(2)?.as_str() {
            "K" => 1_000.0,
            _ => 1_000_000.0,
        };
        return float_to_count(base * multiplier);
    }

    if DIGITS_RE.is_match(&cleaned) {
        return cleaned.parse::<u64>().ok();
    }

    None
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn float_to_count(f: f64) -> Option<u64> {
    if !f.is_finite() || f < 0.0 {
        return None;
    }
    let rounded = f.round();
    // u64::MAX is not exactly representable; 2^64 is the first value out of range.
    if rounded >= 18_446_744_073_709_551_616.0 {
        return None;
    }
    Some(rounded as u64)
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
