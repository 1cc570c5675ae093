// src/server/handlers/operations.rs
//! Install and uninstall endpoints
//!
//! Both are simulated: a known id always succeeds and nothing is persisted,
//! so concurrent requests need no coordination.

use super::not_found;
use crate::package::Package;
use crate::protocol::{OperationParams, OperationResponse};
use crate::server::ServerState;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

/// GET /install?id=<id>
pub async fn install(
    State(state): State<Arc<ServerState>>,
    params: Result<Query<OperationParams>, QueryRejection>,
) -> Response {
    match resolve(&state, params) {
        Ok(package) => {
            tracing::info!("Installing extension: {}", package.id);
            Json(OperationResponse::ok(&package.id)).into_response()
        }
        Err(response) => response,
    }
}

/// GET /uninstall?id=<id>
pub async fn uninstall(
    State(state): State<Arc<ServerState>>,
    params: Result<Query<OperationParams>, QueryRejection>,
) -> Response {
    match resolve(&state, params) {
        Ok(package) => {
            tracing::info!("Uninstalling extension: {}", package.id);
            Json(OperationResponse::ok(&package.id)).into_response()
        }
        Err(response) => response,
    }
}

/// Find the package named by the `id` query parameter, or a 404 response
fn resolve<'a>(
    state: &'a ServerState,
    params: Result<Query<OperationParams>, QueryRejection>,
) -> Result<&'a Package, Response> {
    let id = match params {
        Ok(Query(OperationParams { id: Some(id) })) if !id.is_empty() => id,
        Ok(_) => {
            tracing::debug!("Operation request without an id");
            return Err(not_found());
        }
        Err(e) => {
            tracing::debug!("Malformed operation query: {}", e);
            return Err(not_found());
        }
    };

    state.catalog.find(&id).ok_or_else(|| {
        tracing::warn!("Unknown extension id: {}", id);
        not_found()
    })
}
