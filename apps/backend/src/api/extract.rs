//! Extractors that report rejections with the JSON error envelope.

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::{AppError, Result};

/// `Json` body extractor.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// `Path` extractor.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

/// `Query` extractor.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// Parses an optional query filter. Missing or blank values mean "no filter".
pub fn parse_filter<T>(value: Option<&str>, name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
{
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => v.parse::<T>().map(Some).map_err(|_| {
            AppError::BadRequest(format!("Invalid value for '{}': {}", name, v))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_filter_blank_is_none() {
        assert_eq!(parse_filter::<bool>(None, "ativa").unwrap(), None);
        assert_eq!(parse_filter::<bool>(Some(""), "ativa").unwrap(), None);
        assert_eq!(parse_filter::<i64>(Some("  "), "obra").unwrap(), None);
    }

    #[test]
    fn test_parse_filter_values() {
        assert_eq!(parse_filter::<bool>(Some("false"), "ativa").unwrap(), Some(false));
        assert_eq!(parse_filter::<i64>(Some(" 7 "), "obra").unwrap(), Some(7));
        assert!(matches!(
            parse_filter::<i64>(Some("seven"), "obra"),
            Err(AppError::BadRequest(_))
        ));
    }
}
