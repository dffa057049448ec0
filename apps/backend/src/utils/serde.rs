//! Serde helpers for partial-update payloads.

use serde::{Deserialize, Deserializer};

/// Deserializes a field that distinguishes "absent" from "explicit null".
///
/// Use together with `#[serde(default)]`:
/// - field absent        -> `None`
/// - field is `null`     -> `Some(None)`
/// - field has a value   -> `Some(Some(value))`
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
