//! Field validation for write payloads.
//!
//! Validators collect every problem into [`FieldErrors`] instead of failing on
//! the first one, so clients get the full list in a single response.

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::{AppError, Result};

lazy_static! {
    static ref HEX_COLOR_RE: Regex = Regex::new(r"^#([A-Fa-f0-9]{6}|[A-Fa-f0-9]{3})$").unwrap();
}

/// Key used for errors that concern the object as a whole.
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

/// Validation messages keyed by JSON field name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// `Ok(())` when nothing was reported, otherwise a validation error.
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self))
        }
    }
}

/// How a write request treats fields missing from the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// POST: required fields must be present.
    Create,
    /// PUT: required fields must be present; absent optional fields are kept.
    Replace,
    /// PATCH: only supplied fields change.
    Patch,
}

impl WriteMode {
    fn requires_all(self) -> bool {
        matches!(self, WriteMode::Create | WriteMode::Replace)
    }
}

/// Resolves a required field from the request and the stored value.
pub fn required<T>(
    errors: &mut FieldErrors,
    field: &str,
    mode: WriteMode,
    incoming: Option<Option<T>>,
    current: Option<T>,
) -> Option<T> {
    match incoming {
        Some(Some(value)) => Some(value),
        Some(None) => {
            errors.add(field, "This field may not be null.");
            None
        }
        None if mode.requires_all() => {
            errors.add(field, "This field is required.");
            None
        }
        None => current,
    }
}

/// Resolves an optional (nullable) field: absent keeps the stored value,
/// explicit null clears it.
pub fn optional<T>(incoming: Option<Option<T>>, current: Option<T>) -> Option<T> {
    match incoming {
        Some(value) => value,
        None => current,
    }
}

/// Trims a text field and turns blank strings into `None`.
pub fn normalize_text(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

pub fn check_not_blank(errors: &mut FieldErrors, field: &str, value: Option<&str>) {
    if let Some(v) = value {
        if v.trim().is_empty() {
            errors.add(field, "This field may not be blank.");
        }
    }
}

pub fn check_max_len(errors: &mut FieldErrors, field: &str, value: Option<&str>, max: usize) {
    if let Some(v) = value {
        if v.chars().count() > max {
            errors.add(
                field,
                format!("Ensure this field has no more than {} characters.", max),
            );
        }
    }
}

/// Accepts absolute http(s) URLs up to `max` characters.
pub fn check_url(errors: &mut FieldErrors, field: &str, value: Option<&str>, max: usize) {
    let Some(v) = value else { return };
    check_max_len(errors, field, Some(v), max);
    match reqwest::Url::parse(v) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {}
        _ => errors.add(field, "Enter a valid URL."),
    }
}

pub fn check_hex_color(errors: &mut FieldErrors, field: &str, value: Option<&str>) {
    if let Some(v) = value {
        if !HEX_COLOR_RE.is_match(v) {
            errors.add(field, "Color must be #RRGGBB or #RGB.");
        }
    }
}

pub fn check_min<T>(errors: &mut FieldErrors, field: &str, value: Option<T>, min: T)
where
    T: PartialOrd + std::fmt::Display,
{
    if let Some(v) = value {
        if v < min {
            errors.add(
                field,
                format!("Ensure this value is greater than or equal to {}.", min),
            );
        }
    }
}

pub fn check_max<T>(errors: &mut FieldErrors, field: &str, value: Option<T>, max: T)
where
    T: PartialOrd + std::fmt::Display,
{
    if let Some(v) = value {
        if v > max {
            errors.add(
                field,
                format!("Ensure this value is less than or equal to {}.", max),
            );
        }
    }
}

pub fn check_range<T>(errors: &mut FieldErrors, field: &str, value: Option<T>, min: T, max: T)
where
    T: PartialOrd + std::fmt::Display + Copy,
{
    check_min(errors, field, value, min);
    check_max(errors, field, value, max);
}

/// Rejects NaN and infinities, which JSON numbers can't round-trip.
pub fn check_finite(errors: &mut FieldErrors, field: &str, value: Option<f64>) {
    if let Some(v) = value {
        if !v.is_finite() {
            errors.add(field, "A valid number is required.");
        }
    }
}

/// Reports every id from `missing` as a dangling reference.
pub fn report_missing_ids(errors: &mut FieldErrors, field: &str, missing: &[i64]) {
    for id in missing {
        errors.add(
            field,
            format!("Invalid pk \"{}\" - object does not exist.", id),
        );
    }
}

/// Rounds to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_modes() {
        let mut errors = FieldErrors::new();
        assert_eq!(
            required(&mut errors, "titulo", WriteMode::Patch, None, Some("Old")),
            Some("Old")
        );
        assert!(errors.is_empty());

        assert_eq!(
            required::<&str>(&mut errors, "titulo", WriteMode::Replace, None, Some("Old")),
            None
        );
        assert_eq!(
            errors.get("titulo"),
            Some(&["This field is required.".to_string()][..])
        );
    }

    #[test]
    fn test_required_rejects_null() {
        let mut errors = FieldErrors::new();
        assert_eq!(
            required::<&str>(&mut errors, "nome", WriteMode::Patch, Some(None), Some("Old")),
            None
        );
        assert_eq!(
            errors.get("nome"),
            Some(&["This field may not be null.".to_string()][..])
        );

        let mut errors = FieldErrors::new();
        assert_eq!(
            required(&mut errors, "nome", WriteMode::Create, Some(Some("New")), None),
            Some("New")
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn test_optional_null_clears() {
        assert_eq!(optional(None, Some(3)), Some(3));
        assert_eq!(optional(Some(None), Some(3)), None);
        assert_eq!(optional(Some(Some(4)), Some(3)), Some(4));
    }

    #[test]
    fn test_hex_color() {
        let mut errors = FieldErrors::new();
        check_hex_color(&mut errors, "cor", Some("#fff"));
        check_hex_color(&mut errors, "cor", Some("#A1B2C3"));
        assert!(errors.is_empty());

        check_hex_color(&mut errors, "cor", Some("red"));
        check_hex_color(&mut errors, "cor", Some("#12345"));
        assert_eq!(errors.get("cor").map(|e| e.len()), Some(2));
    }

    #[test]
    fn test_url() {
        let mut errors = FieldErrors::new();
        check_url(&mut errors, "url", Some("https://www.netflix.com"), 255);
        assert!(errors.is_empty());

        check_url(&mut errors, "url", Some("netflix"), 255);
        check_url(&mut errors, "foto", Some("ftp://example.com/a.png"), 255);
        assert!(errors.get("url").is_some());
        assert!(errors.get("foto").is_some());
    }

    #[test]
    fn test_max_len_counts_chars() {
        let mut errors = FieldErrors::new();
        check_max_len(&mut errors, "nome", Some("ação"), 4);
        assert!(errors.is_empty());
        check_max_len(&mut errors, "nome", Some("ações"), 4);
        assert!(!errors.is_empty());
    }

    #[test]
    fn test_range() {
        let mut errors = FieldErrors::new();
        check_range(&mut errors, "anoLancamento", Some(1999), 1900, 2100);
        assert!(errors.is_empty());
        check_range(&mut errors, "anoLancamento", Some(1850), 1900, 2100);
        check_range(&mut errors, "notaImdb", Some(10.5), 0.0, 10.0);
        assert!(errors.get("anoLancamento").is_some());
        assert!(errors.get("notaImdb").is_some());
    }

    #[test]
    fn test_into_result() {
        assert!(FieldErrors::new().into_result().is_ok());

        let mut errors = FieldErrors::new();
        errors.add(NON_FIELD_ERRORS, "broken");
        assert!(matches!(errors.into_result(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_round1() {
        assert_eq!(round1(7.456), 7.5);
        assert_eq!(round1(8.0), 8.0);
    }
}
