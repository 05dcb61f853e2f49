//! Router tests driven in-process with `tower::ServiceExt::oneshot`, no
//! listeners involved.

mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use common::scores_loader;
use meshcache_core::Registry;
use meshcache_server::{peer_router, wire, AppState, FailureNotice, HttpPool};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn test_state(group_name: &str, peers: &[String]) -> Arc<AppState> {
    let (loader, _) = scores_loader(Duration::ZERO);
    let registry = Arc::new(Registry::new());
    let group = meshcache_core::Group::builder(group_name, loader).build();
    registry.add(group.clone()).unwrap();

    let pool = Arc::new(HttpPool::new("http://localhost:8001"));
    if !peers.is_empty() {
        pool.set_peers(peers).unwrap();
    }
    Arc::new(AppState {
        registry,
        group,
        pool,
    })
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = peer_router(test_state("scores", &[]));

    let response = app
        .oneshot(Request::builder().uri("/_mesh").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_fetch_key_returns_value_frame() {
    let app = peer_router(test_state("scores", &[]));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/_mesh/scores/Tom")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap()),
        Some("application/octet-stream")
    );

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let view = wire::decode_value(&body).unwrap();
    assert_eq!(view.as_slice(), b"630");
}

#[tokio::test]
async fn test_unknown_group_is_rejected() {
    let app = peer_router(test_state("scores", &[]));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/_mesh/users/Tom")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_failure_notice_mutates_pool() {
    let peers = vec![
        "http://localhost:8001".to_owned(),
        "http://localhost:8002".to_owned(),
    ];
    let state = test_state("scores", &peers);
    let app = peer_router(Arc::clone(&state));

    let notice = FailureNotice {
        detected_time: chrono::Utc::now(),
        sentinel_name: "http://localhost:10000".to_owned(),
        peer_name: "http://localhost:8002".to_owned(),
    };
    let response = app
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/sentinel")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&notice).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(state.pool.peers(), vec!["http://localhost:8001".to_owned()]);
}
