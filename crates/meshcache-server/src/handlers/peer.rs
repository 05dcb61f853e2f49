//! Node-to-node fetch endpoint.

use crate::wire;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use meshcache_core::Error;
use std::sync::Arc;

/// `GET {base_path}/{group}/{key}`: resolves a key on behalf of a peer.
///
/// Unknown group names are rejected with 404; loader failures come back as
/// 500 with the loader's message. Successful responses carry the bincode
/// value frame as an opaque octet stream.
pub async fn fetch_key(
    State(state): State<Arc<AppState>>,
    Path((group_name, key)): Path<(String, String)>,
) -> Response {
    let Some(group) = state.registry.get(&group_name) else {
        return (
            StatusCode::NOT_FOUND,
            format!("no such group: {group_name}"),
        )
            .into_response();
    };

    match group.get(&key).await {
        Ok(view) => match wire::encode_value(&view) {
            Ok(body) => (
                [(header::CONTENT_TYPE, "application/octet-stream")],
                body,
            )
                .into_response(),
            Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response(),
        },
        Err(err @ Error::EmptyKey) => (StatusCode::BAD_REQUEST, err.to_string()).into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response(),
    }
}

/// `GET {base_path}`: liveness probe target.
pub async fn health() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "application/octet-stream")], "ok")
}
