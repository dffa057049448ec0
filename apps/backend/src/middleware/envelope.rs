//! Completes error envelopes with the request path.

use axum::{
    body::Body,
    http::{header::ALLOW, Request},
    middleware::Next,
    response::Response,
};

use crate::error::ErrorBody;

/// Fills `path` on every error response produced by the inner service.
///
/// Successful responses pass through untouched.
pub async fn error_envelope(request: Request<Body>, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let response = next.run(request).await;

    let Some(mut body) = response.extensions().get::<ErrorBody>().cloned() else {
        return response;
    };
    body.path = Some(path);

    let allow = response.headers().get(ALLOW).cloned();
    let mut rewritten = body.into_response();
    if let Some(allow) = allow {
        rewritten.headers_mut().insert(ALLOW, allow);
    }
    rewritten
}
