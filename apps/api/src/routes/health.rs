//! Health check HTTP route handlers
//!
//! - `GET /health` - Simple liveness check (returns 200 OK)
//! - `GET /health/live` - Kubernetes-style liveness probe
//! - `GET /health/ready` - Readiness check with realtime counters

use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;

use crate::config::Config;
use crate::websocket::RealtimeHub;

/// Shared application state for health check handlers
#[derive(Clone)]
pub struct HealthState {
    pub config: Arc<Config>,
    pub hub: RealtimeHub,
}

impl HealthState {
    pub fn new(config: Arc<Config>, hub: RealtimeHub) -> Self {
        Self { config, hub }
    }
}

/// Readiness report
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessResponse {
    pub status: &'static str,
    pub environment: String,
    /// Live channels, anonymous ones included
    pub connections: usize,
    pub online_users: usize,
    pub active_rooms: usize,
    pub typing_conversations: usize,
    pub typing_expiry_enabled: bool,
}

/// Create health check router
pub fn health_router(state: HealthState) -> Router {
    Router::new()
        .route("/", get(simple_health))
        .route("/live", get(liveness_probe))
        .route("/ready", get(readiness_probe))
        .with_state(state)
}

/// Simple health check - always returns OK if the server is running
async fn simple_health() -> &'static str {
    "OK"
}

/// Liveness probe
///
/// Only proves the process answers HTTP; it never inspects realtime state.
async fn liveness_probe() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "alive",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Readiness probe
///
/// The realtime core has no external dependencies, so readiness is always
/// reported along with the current in-memory counters.
async fn readiness_probe(State(state): State<HealthState>) -> Json<ReadinessResponse> {
    let hub = &state.hub;

    Json(ReadinessResponse {
        status: "ready",
        environment: state.config.environment().to_string(),
        connections: hub.registry().connection_count(),
        online_users: hub.registry().online_count(),
        active_rooms: hub.rooms().room_count(),
        typing_conversations: hub.typing().conversation_count(),
        typing_expiry_enabled: state.config.realtime().typing_expiry_enabled(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_simple_health() {
        let response = simple_health().await;
        assert_eq!(response, "OK");
    }

    #[tokio::test]
    async fn test_liveness_probe() {
        let response = liveness_probe().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_readiness_reports_counts() {
        let hub = RealtimeHub::default();
        let (tx, _rx) = mpsc::unbounded_channel();
        let handle = hub.connect(Some("u1".to_string()), tx);
        let (anon_tx, _anon_rx) = mpsc::unbounded_channel();
        hub.connect(None, anon_tx);
        hub.rooms().join(handle.id(), "g1");

        let state = HealthState::new(Arc::new(Config::default()), hub);
        let Json(report) = readiness_probe(State(state)).await;

        assert_eq!(report.status, "ready");
        assert_eq!(report.environment, "development");
        assert_eq!(report.connections, 2);
        assert_eq!(report.online_users, 1);
        assert_eq!(report.active_rooms, 1);
        assert_eq!(report.typing_conversations, 0);
        assert!(!report.typing_expiry_enabled);
    }
}
