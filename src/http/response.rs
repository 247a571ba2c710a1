//! Error response shape.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// JSON body returned for every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Build (and log) a failure response.
pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let message = message.into();
    tracing::error!(status = status.as_u16(), error = %message, "Request failed");
    (status, Json(ErrorBody { error: message })).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response_status() {
        let response = error_response(StatusCode::BAD_REQUEST, "failed to decode JSON body");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
