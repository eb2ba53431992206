//! End-to-end tests against the axum router, with no real socket bound.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::connect_info::ConnectInfo;
use axum::http::{Request, StatusCode};
use sha2::{Digest, Sha256};
use tower::ServiceExt;

use peerwatch::http::{app, AppState};
use peerwatch::metrics::MetricRing;
use peerwatch::peer_set::PeerSet;
use peerwatch::types::{BandwidthExperimentResult, ErrorBody, Glimpse};

fn state_with_allowed(allowed: &str) -> AppState {
    AppState {
        peers: Arc::new(PeerSet::new(Duration::from_secs(30), "self-host".to_string())),
        metrics: Arc::new(MetricRing::new(1000)),
        allowed_peers: allowed.parse().unwrap(),
    }
}

fn with_remote(mut request: Request<Body>, remote: SocketAddr) -> Request<Body> {
    request.extensions_mut().insert(ConnectInfo(remote));
    request
}

#[tokio::test]
async fn get_peers_starts_empty() {
    let router = app(state_with_allowed("0.0.0.0/0"));
    let response = router
        .oneshot(Request::builder().uri("/peers").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let peers: Vec<Glimpse> = serde_json::from_slice(&body).unwrap();
    assert!(peers.is_empty());
}

#[tokio::test]
async fn post_peers_from_disallowed_ip_is_forbidden() {
    let router = app(state_with_allowed("10.0.0.0/8"));
    let request = with_remote(
        Request::builder().method("POST").uri("/peers").body(Body::empty()).unwrap(),
        "203.0.113.5:4000".parse().unwrap(),
    );

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let error: ErrorBody = serde_json::from_slice(&body).unwrap();
    assert_eq!(error.error, "source ip not allowed");
}

#[tokio::test]
async fn post_peers_from_allowed_ip_registers_caller() {
    let router = app(state_with_allowed("10.0.0.0/8"));
    let request = with_remote(
        Request::builder().method("POST").uri("/peers").body(Body::empty()).unwrap(),
        "10.0.0.42:4000".parse().unwrap(),
    );

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let peers: Vec<Glimpse> = serde_json::from_slice(&body).unwrap();
    assert!(peers.iter().any(|g| g.host == "10.0.0.42"));
}

#[tokio::test]
async fn bandwidth_probe_reports_a_matching_digest() {
    let router = app(state_with_allowed("0.0.0.0/0"));

    let payload = vec![7u8; 4096];
    let expected_digest = hex::encode(Sha256::digest(&payload));

    let request = Request::builder().method("POST").uri("/bandwidth").body(Body::from(payload)).unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let result: BandwidthExperimentResult = serde_json::from_slice(&body).unwrap();
    assert_eq!(result.num_bytes, 4096);
    assert_eq!(result.sha256, expected_digest);
}

#[tokio::test]
async fn metrics_data_reflects_a_completed_bandwidth_probe() {
    let state = state_with_allowed("0.0.0.0/0");
    let metrics = state.metrics.clone();
    let router = app(state);

    let request =
        Request::builder().method("POST").uri("/bandwidth").body(Body::from(vec![1u8; 1024])).unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(metrics.snapshot()["bandwidth"].len(), 1);

    let data_response =
        router.oneshot(Request::builder().uri("/metrics/data").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(data_response.status(), StatusCode::OK);
}

#[tokio::test]
async fn dashboard_routes_serve_html() {
    let router = app(state_with_allowed("0.0.0.0/0"));
    for path in ["/", "/metrics"] {
        let response =
            router.clone().oneshot(Request::builder().uri(path).body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers().get("content-type").unwrap().to_str().unwrap();
        assert!(content_type.starts_with("text/html"));
    }
}
