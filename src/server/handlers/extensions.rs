// src/server/handlers/extensions.rs
//! Catalogue search endpoint

use super::not_found;
use crate::protocol::SearchParams;
use crate::server::ServerState;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

/// GET /extensions?q=<keyword>
///
/// Returns every package matching the keyword as a JSON array.
/// A missing or empty keyword returns the whole catalogue.
pub async fn search_extensions(
    State(state): State<Arc<ServerState>>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Response {
    let Query(params) = match params {
        Ok(params) => params,
        Err(e) => {
            tracing::debug!("Malformed search query: {}", e);
            return not_found();
        }
    };

    let results = state.catalog.search(&params.q);
    tracing::info!("Search '{}': {} result(s)", params.q, results.len());
    Json(results).into_response()
}
