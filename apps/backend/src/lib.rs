//! Moviendo Backend Library
//!
//! Core functionality for the Moviendo movie and series catalog backend.
//! This library exposes modules for use in integration tests.

use axum::response::Json;
use rusqlite::Connection;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use utoipa::ToSchema;

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod services;
pub mod utils;
pub mod validation;

use config::Config;
use services::TmdbApi;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Arc<Mutex<Connection>>,
    pub tmdb_client: Option<Arc<dyn TmdbApi>>,
}

impl AppState {
    /// Get a reference to the TMDB client, if configured.
    pub fn tmdb_client(&self) -> Option<&dyn TmdbApi> {
        self.tmdb_client.as_deref()
    }
}

#[derive(Serialize, ToSchema)]
pub struct ApiResponse {
    pub message: String,
    pub version: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = ApiResponse)),
    tag = "health"
)]
pub async fn health_check() -> Json<ApiResponse> {
    Json(ApiResponse {
        message: "Moviendo Backend is running".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
