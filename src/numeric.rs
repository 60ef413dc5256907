//! Numeric coercion shared by the adapter boundary, statistics and formatting.
//!
//! "Missing" has exactly one representation in this crate: `None`. Anything
//! that is not a finite number (null, booleans, objects, NaN, text that does
//! not parse) collapses into it here, so downstream code never re-checks.

use serde_json::Value;

/// Coerce a loosely typed JSON value into a finite number.
///
/// Accepts JSON numbers and numeric strings (surrounding whitespace allowed).
pub fn coerce(value: &Value) -> Option<f64> {
    // ---
    match value {
        Value::Number(n) => finite(n.as_f64()),
        Value::String(s) => finite(s.trim().parse::<f64>().ok()),
        _ => None,
    }
}

/// Coerce an optional JSON value; absent and null are both missing.
pub fn coerce_opt(value: Option<&Value>) -> Option<f64> {
    value.and_then(coerce)
}

/// Drop non-finite values.
pub fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// Render an identifier that may arrive as a string or a number.
///
/// Blank strings count as absent.
pub fn id_string(value: &Value) -> Option<String> {
    // ---
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
