//! HTTP route handlers for the Parley API
//!
//! - `/ws` WebSocket upgrade for the realtime channel
//! - `/health` probes
//! - `/presence` read-only presence lookups

pub mod health;
pub mod presence;

pub use health::{health_router, HealthState};
pub use presence::presence_router;

use axum::{
    http::{header, Method},
    routing::get,
    Extension, Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Config;
use crate::websocket::{ws_handler, RealtimeHub};

/// Assemble the application router around a hub instance
pub fn build_router(hub: RealtimeHub, config: Arc<Config>) -> Router {
    let cors_layer = build_cors_layer(&config);

    Router::new()
        .route("/", get(root))
        .route("/ws", get(ws_handler))
        // Nested health routes: /health, /health/live, /health/ready
        .nest("/health", health_router(HealthState::new(config, hub.clone())))
        .nest("/presence", presence_router(hub.clone()))
        .layer(Extension(hub))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
}

/// Build the CORS layer based on configuration.
///
/// In production mode:
/// - If `CORS_ORIGINS` is set, only those origins are allowed
/// - If `CORS_ORIGINS` is not set, CORS requests are rejected (no origins allowed)
///
/// In development mode:
/// - If `CORS_ORIGINS` is set, those origins are used
/// - If `CORS_ORIGINS` is not set, permissive CORS is used for convenience
pub fn build_cors_layer(config: &Config) -> CorsLayer {
    match &config.cors_allowed_origins {
        Some(origins) if !origins.is_empty() => {
            let allowed_origins: Vec<_> = origins
                .iter()
                .filter_map(|origin| {
                    origin.parse().ok().or_else(|| {
                        tracing::warn!("Invalid CORS origin '{}', skipping", origin);
                        None
                    })
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::error!("No valid CORS origins configured, CORS requests will be rejected");
                CorsLayer::new()
            } else {
                tracing::info!(
                    "CORS configured with {} allowed origin(s): {:?}",
                    allowed_origins.len(),
                    origins
                );
                CorsLayer::new()
                    .allow_origin(allowed_origins)
                    .allow_methods([Method::GET, Method::OPTIONS])
                    .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::ORIGIN])
                    .max_age(std::time::Duration::from_secs(3600))
            }
        }
        _ if config.is_production() => {
            tracing::warn!(
                "CORS_ORIGINS not configured in production mode. \
                 CORS requests will be rejected. Set CORS_ORIGINS to allow cross-origin requests."
            );
            CorsLayer::new()
        }
        _ => {
            tracing::warn!(
                "Using permissive CORS in development mode. \
                 Set CORS_ORIGINS for production-like behavior."
            );
            CorsLayer::permissive()
        }
    }
}

async fn root() -> &'static str {
    "Parley realtime service"
}
