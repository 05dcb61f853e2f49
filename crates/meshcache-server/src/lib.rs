//! `MeshCache` node library.
//!
//! Everything a cache node needs on top of `meshcache-core`: the HTTP pool
//! implementing peer selection, the per-peer client stub, the sentinel, the
//! wire frames and the axum routers. The `meshcache-server` binary wires
//! these together from configuration; integration tests wire them up with
//! ephemeral listeners instead.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod handlers;
pub mod pool;
pub mod sentinel;
pub mod wire;

use axum::{
    routing::{get, put},
    Router,
};
use meshcache_core::{Group, Registry};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub use client::HttpClient;
pub use handlers::{failure_notice, fetch_key, get_value, group_stats, health};
pub use pool::{HttpPool, PoolOptions};
pub use sentinel::{PeerHealth, Sentinel, SentinelOptions, DEATH_THRESHOLD};
pub use wire::{FailureNotice, ValueFrame};

/// State shared across handlers of one node.
pub struct AppState {
    /// Groups served by this node.
    pub registry: Arc<Registry>,
    /// The group the front-end API answers from.
    pub group: Group,
    /// Peer selector, also mutated by failure notices.
    pub pool: Arc<HttpPool>,
}

/// Builds the node-to-node router: health at the base path, key fetches
/// under it, and the sentinel notification endpoint.
pub fn peer_router(state: Arc<AppState>) -> Router {
    let base = state.pool.base_path().trim_end_matches('/').to_owned();
    Router::new()
        .route(&base, get(health))
        .route(&format!("{base}/{{group}}/{{key}}"), get(fetch_key))
        .route("/sentinel", put(failure_notice))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Builds the client-facing router.
pub fn api_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api", get(get_value))
        .route("/api/stats", get(group_stats))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
