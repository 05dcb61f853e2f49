//! Failure-notification endpoint.

use crate::wire::FailureNotice;
use crate::AppState;
use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

/// `PUT /sentinel`: a sentinel reports a dead peer.
///
/// The named peer is dropped from this node's ring and client table, under
/// the pool lock. No acknowledgement body; any 2xx suffices for the sender.
pub async fn failure_notice(
    State(state): State<Arc<AppState>>,
    Json(notice): Json<FailureNotice>,
) -> StatusCode {
    if state.pool.remove_peer(&notice.peer_name) {
        tracing::info!(
            peer = %notice.peer_name,
            sentinel = %notice.sentinel_name,
            detected_time = %notice.detected_time,
            "dead peer removed from pool"
        );
    } else {
        tracing::debug!(peer = %notice.peer_name, "failure notice for unknown peer");
    }
    StatusCode::OK
}
