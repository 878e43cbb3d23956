//! Conversion between form text and typed configuration values.

use crate::tree::Value;

/// Keys with this prefix are edited through a masked field.
pub const MASKED_KEY_PREFIX: &str = "password";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Masked,
}

pub fn field_kind_for_key(key: &str) -> FieldKind {
    if key.starts_with(MASKED_KEY_PREFIX) {
        FieldKind::Masked
    } else {
        FieldKind::Text
    }
}

/// True iff `s` is non-empty and parses in full as a finite float.
/// Surrounding ASCII whitespace is ignored.
pub fn is_numeric(s: &str) -> bool {
    parse_finite(s).is_some()
}

/// Numeric test over a typed value: only string values can be numeric text.
pub fn is_numeric_value(v: &Value) -> bool {
    v.as_str().is_some_and(is_numeric)
}

fn parse_finite(s: &str) -> Option<f64> {
    let t = s.trim_matches(|c: char| c.is_ascii_whitespace());
    if t.is_empty() {
        return None;
    }
    t.parse::<f64>().ok().filter(|f| f.is_finite())
}

/// Coerces raw form input into the value that gets persisted.
///
/// Numeric input is truncated toward zero, so `"42.9"` is stored as `42`.
/// Exponent forms go through the float parse too: `"1e3"` is stored as `1000`.
pub fn parse_form_value(raw: &str) -> Value {
    match raw {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    match parse_finite(raw) {
        // `as` saturates at the i64 bounds.
        Some(f) => Value::Int(f.trunc() as i64),
        None => Value::Str(raw.to_string()),
    }
}
