//! Client-facing front end.

use crate::AppState;
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use meshcache_core::Error;
use serde::Deserialize;
use std::sync::Arc;

/// Query string of `GET /api`.
#[derive(Debug, Deserialize)]
pub struct KeyQuery {
    /// Key to resolve.
    pub key: String,
}

/// `GET /api?key=...`: resolves a key through this node's group.
pub async fn get_value(
    State(state): State<Arc<AppState>>,
    Query(query): Query<KeyQuery>,
) -> Response {
    match state.group.get(&query.key).await {
        Ok(view) => (
            [(header::CONTENT_TYPE, "application/octet-stream")],
            view.to_vec(),
        )
            .into_response(),
        Err(err @ Error::EmptyKey) => (StatusCode::BAD_REQUEST, err.to_string()).into_response(),
        Err(err @ Error::NotFound(_)) => (StatusCode::NOT_FOUND, err.to_string()).into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response(),
    }
}

/// `GET /api/stats`: group counters for monitoring.
pub async fn group_stats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.group.stats())
}
