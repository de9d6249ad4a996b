//! Serde helpers shared by the request payloads.

use serde::{Deserialize, Deserializer};

/// Distinguish an absent field from an explicit `null` in a partial update.
///
/// Use together with `#[serde(default)]`: absent gives `None`, `null` gives
/// `Some(None)` and a value gives `Some(Some(v))`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Trim free text; blank input becomes `None`.
pub fn normalize_text(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
