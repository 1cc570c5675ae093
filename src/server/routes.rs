// src/server/routes.rs
//! Axum router configuration for the catalogue server

use crate::server::handlers::{self, extensions, operations};
use crate::server::ServerState;
use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Create the main application router
pub fn create_router(state: Arc<ServerState>) -> Router {
    // CORS configuration - the catalogue is public and read-only
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/extensions", get(extensions::search_extensions))
        .route("/install", get(operations::install))
        .route("/uninstall", get(operations::uninstall))
        .fallback(handlers::fallback)
        .layer(cors)
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
