// src/server/handlers/mod.rs
//! HTTP request handlers for the catalogue server

pub mod extensions;
pub mod operations;

use crate::protocol::NOT_FOUND_BODY;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Plain-text 404 used for unknown paths, unknown ids and malformed queries
pub fn not_found() -> Response {
    (StatusCode::NOT_FOUND, NOT_FOUND_BODY).into_response()
}

/// Fallback for any unrouted path
pub async fn fallback(uri: axum::http::Uri) -> Response {
    tracing::debug!("No route for {}", uri);
    not_found()
}
