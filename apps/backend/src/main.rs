use std::sync::Arc;
use tokio::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use moviendo::config::Config;
use moviendo::error::{AppError, Result};
use moviendo::services::{TmdbApi, TmdbClient};
use moviendo::{api, db, AppState};

fn init_tracing() {
    // RUST_LOG overrides the default filter
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("moviendo=debug,tower_http=debug,axum=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Builds the TMDB client when credentials are present.
///
/// A broken client is logged and left out so the catalog still serves;
/// the TMDB endpoints then answer 503.
fn build_tmdb_client(config: &Config) -> Option<Arc<dyn TmdbApi>> {
    if !config.tmdb.has_credentials() {
        return None;
    }
    match TmdbClient::new_shared(&config.tmdb) {
        Ok(client) => {
            tracing::info!(language = %config.tmdb.language, "TMDB client initialized");
            Some(client as Arc<dyn TmdbApi>)
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to create TMDB client");
            None
        }
    }
}

async fn run() -> Result<()> {
    let config = Config::load()?;
    tracing::info!("Configuration loaded successfully");
    tracing::debug!("Server: {}:{}", config.server.host, config.server.port);
    tracing::debug!("TMDB: {:?}", config.tmdb);

    let db_path = &config.database.path;
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            AppError::Internal(format!("cannot create database directory {:?}: {}", parent, e))
        })?;
    }
    let conn = db::init_db(db_path)?;
    tracing::info!("Database initialized at {:?}", db_path);

    let tmdb_client = build_tmdb_client(&config);
    let addr = config.server_addr();

    let state = AppState {
        config: Arc::new(config),
        db: Arc::new(Mutex::new(conn)),
        tmdb_client,
    };
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Internal(format!("failed to bind {}: {}", addr, e)))?;
    tracing::info!("Moviendo Backend listening on {}", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::Internal(format!("server error: {}", e)))
}

#[tokio::main]
async fn main() {
    init_tracing();
    tracing::info!("Starting Moviendo Backend v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run().await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}
