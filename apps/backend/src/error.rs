//! Application error types for the Moviendo backend.
//!
//! Provides a unified error type that implements `IntoResponse` for Axum and
//! renders every failure with the same JSON envelope.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::db::DbError;
use crate::validation::FieldErrors;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    /// SQLite-specific errors (for direct rusqlite usage)
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Configuration loading/parsing errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Payload failed field validation
    #[error("Validation failed: {0:?}")]
    Validation(FieldErrors),

    /// Malformed request (bad JSON, bad path or query parameter)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Route exists but not for this method
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// Unique or foreign key conflict
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The TMDB API failed or answered something unusable
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// A dependency is not configured
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error envelope returned for every failed request.
///
/// `path` is filled in by [`crate::middleware::error_envelope`], which is the
/// only place that sees the request URI.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorBody {
    pub status: u16,
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub timestamp: String,
    /// Messages per field, for validation failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub errors: Option<FieldErrors>,
}

impl ErrorBody {
    fn new(status: StatusCode, error: &str, message: impl Into<String>) -> Self {
        Self {
            status: status.as_u16(),
            error: error.to_string(),
            message: message.into(),
            path: None,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            errors: None,
        }
    }

    /// Renders the envelope, keeping a copy in the response extensions so
    /// middleware can rewrite it.
    pub fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = (status, Json(self.clone())).into_response();
        response.extensions_mut().insert(self);
        response
    }
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

const INTERNAL_MESSAGE: &str = "An internal server error occurred.";
const CONFLICT_MESSAGE: &str = "Data integrity conflict (unique or foreign key).";

impl AppError {
    fn to_body(&self) -> ErrorBody {
        match self {
            AppError::Sqlite(e) | AppError::Database(DbError::Connection(e))
                if is_constraint_violation(e) =>
            {
                tracing::warn!("Constraint violation: {}", e);
                ErrorBody::new(StatusCode::CONFLICT, "Conflict", CONFLICT_MESSAGE)
            }
            AppError::Database(e) => {
                // Log full error details but don't expose to client
                tracing::error!("Database error: {:?}", e);
                ErrorBody::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error",
                    INTERNAL_MESSAGE,
                )
            }
            AppError::Sqlite(e) => {
                tracing::error!("SQLite error: {:?}", e);
                ErrorBody::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error",
                    INTERNAL_MESSAGE,
                )
            }
            AppError::Config(e) => {
                tracing::error!("Config error: {:?}", e);
                ErrorBody::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error",
                    INTERNAL_MESSAGE,
                )
            }
            AppError::Validation(errors) => {
                let mut body = ErrorBody::new(
                    StatusCode::BAD_REQUEST,
                    "Validation error",
                    "Check the invalid fields.",
                );
                body.errors = Some(errors.clone());
                body
            }
            AppError::BadRequest(msg) => {
                // Bad request messages are safe to expose (client-caused errors)
                ErrorBody::new(StatusCode::BAD_REQUEST, "Invalid parameter", msg.clone())
            }
            AppError::NotFound(msg) => ErrorBody::new(StatusCode::NOT_FOUND, "Not found", msg.clone()),
            AppError::MethodNotAllowed => ErrorBody::new(
                StatusCode::METHOD_NOT_ALLOWED,
                "Method not allowed",
                "This method is not allowed on this resource.",
            ),
            AppError::Conflict(msg) => ErrorBody::new(StatusCode::CONFLICT, "Conflict", msg.clone()),
            AppError::Upstream(msg) => {
                tracing::warn!("Upstream error: {}", msg);
                ErrorBody::new(StatusCode::BAD_GATEWAY, "Bad gateway", msg.clone())
            }
            AppError::Unavailable(msg) => {
                ErrorBody::new(StatusCode::SERVICE_UNAVAILABLE, "Service unavailable", msg.clone())
            }
            AppError::Internal(msg) => {
                // Log full error but don't expose internal details
                tracing::error!("Internal error: {}", msg);
                ErrorBody::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error",
                    INTERNAL_MESSAGE,
                )
            }
        }
    }

    /// Maps "no rows" to a not-found error for the given resource.
    pub fn not_found_or(resource: &str) -> impl FnOnce(rusqlite::Error) -> AppError + '_ {
        move |e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                AppError::NotFound(format!("{} not found.", resource))
            }
            _ => AppError::Sqlite(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_body().into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
