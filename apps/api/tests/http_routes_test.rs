//! Integration tests for the HTTP surface
//!
//! Health probes and presence lookups, exercised through the full router.

mod common;

use axum::{body::Body, http::Request, http::StatusCode, Router};
use std::sync::Arc;
use tower::ServiceExt;

use common::*;
use parley_api::config::Config;
use parley_api::routes::build_router;
use parley_api::websocket::RealtimeHub;

fn create_test_app(hub: &RealtimeHub) -> Router {
    build_router(hub.clone(), Arc::new(Config::default()))
}

async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

fn json(body: &[u8]) -> serde_json::Value {
    serde_json::from_slice(body).expect("json body")
}

#[tokio::test]
async fn test_root_endpoint() {
    let hub = RealtimeHub::default();
    let (status, body) = get(create_test_app(&hub), "/").await;

    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8(body).unwrap().contains("Parley"));
}

#[tokio::test]
async fn test_simple_health_check() {
    let hub = RealtimeHub::default();
    let (status, body) = get(create_test_app(&hub), "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(&body[..], b"OK");
}

#[tokio::test]
async fn test_liveness_probe() {
    let hub = RealtimeHub::default();
    let (status, body) = get(create_test_app(&hub), "/health/live").await;

    assert_eq!(status, StatusCode::OK);
    let probe = json(&body);
    assert_eq!(probe["status"], "alive");
    assert!(probe["version"].is_string());
}

#[tokio::test]
async fn test_readiness_probe_reports_realtime_counts() {
    let hub = RealtimeHub::default();
    let c = TestChannel::connect_quiet(&hub, Some("c"));
    let _observer = TestChannel::connect_quiet(&hub, None);
    c.send(&hub, join("g1"));
    c.send(&hub, group_typing("c", "g1", true));

    let (status, body) = get(create_test_app(&hub), "/health/ready").await;

    assert_eq!(status, StatusCode::OK);
    let probe = json(&body);
    assert_eq!(probe["status"], "ready");
    assert_eq!(probe["connections"], 2);
    assert_eq!(probe["onlineUsers"], 1);
    assert_eq!(probe["activeRooms"], 1);
    assert_eq!(probe["typingConversations"], 1);
    assert_eq!(probe["typingExpiryEnabled"], false);
}

#[tokio::test]
async fn test_presence_online_list() {
    let hub = RealtimeHub::default();
    let _b = TestChannel::connect_quiet(&hub, Some("u2"));
    let _a = TestChannel::connect_quiet(&hub, Some("u1"));
    let _anon = TestChannel::connect_quiet(&hub, None);

    let (status, body) = get(create_test_app(&hub), "/presence/online").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body), serde_json::json!({ "userIds": ["u1", "u2"] }));
}

#[tokio::test]
async fn test_presence_single_user() {
    let hub = RealtimeHub::default();
    let a = TestChannel::connect_quiet(&hub, Some("u1"));

    let (status, body) = get(create_test_app(&hub), "/presence/u1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body), serde_json::json!({ "userId": "u1", "online": true }));

    hub.disconnect(&a.handle);

    let (_, body) = get(create_test_app(&hub), "/presence/u1").await;
    assert_eq!(json(&body)["online"], false);
}

#[tokio::test]
async fn test_presence_rejects_invalid_user_id() {
    let hub = RealtimeHub::default();
    let (status, body) = get(create_test_app(&hub), "/presence/bad.id").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["code"], "INVALID_PARAM");
}
