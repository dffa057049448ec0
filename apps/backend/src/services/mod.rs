//! Application services for the Moviendo backend.

pub mod importer;
pub mod tmdb;

pub use tmdb::{TmdbApi, TmdbClient, TmdbMediaType};
