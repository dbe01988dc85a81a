//! Lenient deserializers shared by several records.

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Int(i64),
    Float(f64),
}

/// Deserializes an optional identifier that the API sends either as a JSON
/// string or as a number (company RUCs are the usual offenders).
///
/// # Errors
///
/// Fails when the value is neither null, a string, nor a number.
pub fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<StringOrNumber>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        StringOrNumber::String(s) if s.trim().is_empty() => None,
        StringOrNumber::String(s) => Some(s),
        StringOrNumber::Int(n) => Some(n.to_string()),
        StringOrNumber::Float(n) => Some(n.to_string()),
    }))
}
