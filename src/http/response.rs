//! Responses the gateway writes itself.
//!
//! Upstream responses are relayed as received; the only response the gateway
//! authors is the fixed error below. It never names the target, so callers
//! learn nothing about backend topology.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

/// Body of every forwarding failure.
pub const FALLBACK_ERROR_BODY: &str =
    "Something went wrong. And we are reporting a custom error message.";

/// `500 Internal Server Error`, `Content-Type: text/plain`, fixed body.
pub fn fallback_error_response() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [(header::CONTENT_TYPE, "text/plain")],
        FALLBACK_ERROR_BODY,
    )
        .into_response()
}
