//! HTTP middleware for the Moviendo backend.

mod envelope;

pub use envelope::error_envelope;
