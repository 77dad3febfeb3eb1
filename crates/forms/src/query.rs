//! `application/x-www-form-urlencoded` → JSON object, typed by schema.

use crate::FormError;
use serde_json::{Map, Number, Value};
use std::collections::HashMap;
use tracing::debug;

/// Decode `query` into an object holding only the fields declared in
/// the schema's top-level `properties`, each cast by its `type`:
///
/// - `number`: the longest leading decimal number
/// - `integer`: the leading (optionally signed) digits
/// - `boolean`: `true` only for the literal `"true"`
/// - anything else: the decoded string
///
/// When a field repeats, the first occurrence wins.
pub fn decode_form_query(schema: &Value, query: &str) -> Result<Map<String, Value>, FormError> {
    let params = parse_query(query);
    let mut decoded = Map::new();
    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return Ok(decoded);
    };

    for (field, property) in properties {
        let Some(raw) = params.get(field.as_str()) else {
            continue;
        };
        let value = match property.get("type").and_then(Value::as_str) {
            Some("number") => leading_float(raw)
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| invalid(field, "number", raw))?,
            Some("integer") => leading_int(raw)
                .map(Value::from)
                .ok_or_else(|| invalid(field, "integer", raw))?,
            Some("boolean") => Value::Bool(raw == "true"),
            _ => Value::String(raw.clone()),
        };
        decoded.insert(field.clone(), value);
    }
    debug!(fields = decoded.len(), "Decoded form query");
    Ok(decoded)
}

fn invalid(field: &str, expected: &'static str, value: &str) -> FormError {
    FormError::InvalidNumber {
        field: field.to_string(),
        expected,
        value: value.to_string(),
    }
}

/// `+` and `%XX` decoding per `application/x-www-form-urlencoded`;
/// the first occurrence of a key wins.
fn parse_query(query: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();
    for (key, value) in form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
        params
            .entry(key.into_owned())
            .or_insert_with(|| value.into_owned());
    }
    params
}

/// Longest prefix of `raw` (after leading whitespace) that reads as a
/// decimal number, e.g. `"3.5kg"` → `3.5`.
fn leading_float(raw: &str) -> Option<f64> {
    let trimmed = raw.trim_start();
    let bytes = trimmed.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let digits_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    if bytes.get(end) == Some(&b'.') {
        end += 1;
        while bytes.get(end).is_some_and(u8::is_ascii_digit) {
            end += 1;
        }
    }
    if end == digits_start || &trimmed[digits_start..end] == "." {
        return None;
    }
    // optional exponent, only if it has digits
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        if bytes.get(exp).is_some_and(u8::is_ascii_digit) {
            while bytes.get(exp).is_some_and(u8::is_ascii_digit) {
                exp += 1;
            }
            end = exp;
        }
    }
    trimmed[..end].parse().ok()
}

/// Leading signed integer of `raw`, e.g. `"42px"` → `42`.
fn leading_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let bytes = trimmed.as_bytes();
    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let digits_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    if end == digits_start {
        return None;
    }
    trimmed[..end].parse().ok()
}
