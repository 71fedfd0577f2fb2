// src/logging_middleware.rs
//! Request logging middleware

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tracing::debug;

/// Logs method, path, status and latency for every request.
///
/// Bodies and headers are deliberately not logged; the Authorization header
/// carries the session token.
pub async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    debug!(
        method = %method,
        path = %path,
        status = %response.status(),
        latency_ms = %started.elapsed().as_millis(),
        "Request handled"
    );

    response
}
