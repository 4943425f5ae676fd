//! Forgiving field deserializers for request bodies written by browsers.
//!
//! A field with the wrong JSON type is treated as absent instead of failing
//! the whole body, so a stray `"duration": "45"` or `"prompt": 3` is handled
//! by the endpoint's own defaults and validation.

use std::str::FromStr;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// `Some(s)` only for a JSON string.
pub fn string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

/// A JSON number, or a string holding one.
pub fn number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    Ok(value.filter(|v| v.is_finite()))
}

/// Like [`number`], truncated toward zero.
pub fn integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(number(deserializer)?.map(|v| v.trunc() as i64))
}

/// A JSON number only; strings, numeric or not, are `None`.
pub fn integer_literal<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|v| v.is_finite()).map(|v| v.trunc() as i64)),
        _ => None,
    })
}

/// A JSON string parsed with [`FromStr`]; unknown values become `None`.
pub fn parsed<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    Ok(string(deserializer)?.and_then(|s| s.parse().ok()))
}
