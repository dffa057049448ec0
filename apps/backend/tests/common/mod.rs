//! Test infrastructure for Moviendo backend integration tests.
//!
//! Provides a `TestApp` wrapper around `axum_test::TestServer` backed by an
//! in-memory database, plus a scripted TMDB fake.

#![allow(dead_code)]

use async_trait::async_trait;
use axum_test::TestServer;
use rusqlite::Connection;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Mutex;

use moviendo::error::{AppError, Result};
use moviendo::services::tmdb::{TmdbApi, TmdbDetails, TmdbMediaType, TmdbSearchResult};
use moviendo::{api, config::Config, db, AppState};

/// Test application wrapper around axum_test::TestServer.
pub struct TestApp {
    server: TestServer,
    db: Arc<Mutex<Connection>>,
}

impl TestApp {
    /// Create a new test application with in-memory database and no TMDB client.
    pub async fn new() -> Self {
        Self::build(None)
    }

    /// Create a test application whose TMDB calls are answered by `fake`.
    pub async fn with_tmdb(fake: FakeTmdb) -> Self {
        Self::build(Some(Arc::new(fake)))
    }

    fn build(tmdb_client: Option<Arc<dyn TmdbApi>>) -> Self {
        let conn = db::init_db_memory().expect("Failed to initialize test database");
        let db = Arc::new(Mutex::new(conn));

        let config = Config {
            server: moviendo::config::ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_origins: Vec::new(),
            },
            database: moviendo::config::DatabaseConfig {
                path: ":memory:".into(),
            },
            tmdb: Default::default(),
        };

        let state = AppState {
            config: Arc::new(config),
            db: Arc::clone(&db),
            tmdb_client,
        };

        // Same router as main.rs
        let app = api::router(state);
        let server = TestServer::new(app).expect("Failed to create test server");

        Self { server, db }
    }

    /// Get a reference to the test server.
    pub fn server(&self) -> &TestServer {
        &self.server
    }

    /// Get a reference to the database connection.
    pub fn db(&self) -> &Arc<Mutex<Connection>> {
        &self.db
    }

    /// POSTs `body` to `path`, asserts 201 and returns the created id.
    pub async fn create(&self, path: &str, body: Value) -> i64 {
        let response = self.server.post(path).json(&body).await;
        assert_eq!(
            response.status_code(),
            axum::http::StatusCode::CREATED,
            "POST {} failed: {}",
            path,
            response.text()
        );
        response.json::<Value>()["id"]
            .as_i64()
            .expect("created entity should have an id")
    }

    /// Creates a work with the minimum required fields.
    pub async fn create_obra(&self, titulo: &str, tipo: &str, status: &str) -> i64 {
        self.create(
            "/api/obras",
            serde_json::json!({ "titulo": titulo, "tipo": tipo, "status": status }),
        )
        .await
    }
}

/// In-process TMDB stand-in with canned answers.
#[derive(Default)]
pub struct FakeTmdb {
    pub details: Vec<(i64, TmdbMediaType, TmdbDetails)>,
    pub results: Vec<TmdbSearchResult>,
    /// When set, every call fails like an unreachable TMDB.
    pub unreachable: bool,
    pub searches: std::sync::Mutex<Vec<(String, Option<u32>)>>,
}

impl FakeTmdb {
    pub fn with_details(mut self, media: TmdbMediaType, details: TmdbDetails) -> Self {
        self.details.push((details.id, media, details));
        self
    }
}

#[async_trait]
impl TmdbApi for FakeTmdb {
    async fn search_multi(&self, query: &str, page: Option<u32>) -> Result<Vec<TmdbSearchResult>> {
        if self.unreachable {
            return Err(AppError::Upstream("TMDB request failed".to_string()));
        }
        self.searches
            .lock()
            .unwrap()
            .push((query.to_string(), page));
        Ok(self.results.clone())
    }

    async fn get_details(&self, tmdb_id: i64, media: TmdbMediaType) -> Result<TmdbDetails> {
        if self.unreachable {
            return Err(AppError::Upstream("TMDB request failed".to_string()));
        }
        self.details
            .iter()
            .find(|(id, m, _)| *id == tmdb_id && *m == media)
            .map(|(_, _, details)| details.clone())
            .ok_or_else(|| AppError::NotFound(format!("TMDB resource not found: /{}/{}", media, tmdb_id)))
    }

    fn image_base_url(&self) -> &str {
        "https://image.tmdb.org/t/p"
    }
}
