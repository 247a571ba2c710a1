//! Request/response logging middleware.
//!
//! # Responsibilities
//! - Tag every request with a short random id
//! - Log request and response with path, status, and elapsed time
//! - Record per-request metrics
//!
//! Credential values never appear in these logs; only path, status, and
//! timing are recorded.

use std::time::Instant;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use uuid::Uuid;

use crate::observability::metrics;

/// Log one request/response pair and record its metrics.
pub async fn log_requests(request: Request, next: Next) -> Response {
    let start_time = Instant::now();
    let request_id = make_short_id();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    tracing::info!(
        request_id = %request_id,
        method = %method,
        path = %path,
        "HTTP request"
    );

    let response = next.run(request).await;

    let status = response.status().as_u16();
    tracing::info!(
        request_id = %request_id,
        path = %path,
        status,
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        "HTTP response"
    );
    metrics::record_request(&path, status, start_time);

    response
}

/// A random 8-character id, cheap enough to mint per request.
fn make_short_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}
