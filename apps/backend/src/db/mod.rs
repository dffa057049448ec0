//! Database module for the Moviendo catalog.
//!
//! Provides connection setup, embedded migrations, models and shared queries.

use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;
use std::path::Path;
use thiserror::Error;

pub mod models;
pub mod queries;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("src/db/migrations");
}

/// Failure while opening or migrating the catalog database.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Database connection error: {0}")]
    Connection(#[from] rusqlite::Error),
    #[error("Migration error: {0}")]
    Migration(#[from] refinery::Error),
}

/// Opens the catalog database at `db_path` and brings its schema up to date.
pub fn init_db<P: AsRef<Path>>(db_path: P) -> Result<Connection, DbError> {
    prepare(Connection::open(db_path)?)
}

/// In-memory catalog, used by the test suites.
pub fn init_db_memory() -> Result<Connection, DbError> {
    prepare(Connection::open_in_memory()?)
}

fn prepare(mut conn: Connection) -> Result<Connection, DbError> {
    // Foreign keys are off by default in SQLite; cascades depend on them.
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;
         PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;
         PRAGMA busy_timeout = 5000;",
    )?;
    register_functions(&conn)?;
    let report = embedded::migrations::runner().run(&mut conn)?;
    for migration in report.applied_migrations() {
        tracing::info!(version = migration.version(), name = migration.name(), "Applied migration");
    }
    Ok(conn)
}

/// SQLite's `LOWER` only folds ASCII, which misses accented titles.
fn register_functions(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "unicode_lower",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let value: Option<String> = ctx.get(0)?;
            Ok(value.map(|v| v.to_lowercase()))
        },
    )
}
