use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use parley_api::config::Config;
use parley_api::routes::build_router;
use parley_api::websocket::RealtimeHub;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Arc::new(Config::from_env()?);

    // Initialize tracing
    let filter = EnvFilter::try_new(config.log_filter()).context("Invalid RUST_LOG / LOG_LEVEL")?;
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        environment = %config.environment(),
        "Starting Parley realtime server on port {}",
        config.port
    );

    let hub = RealtimeHub::new(config.realtime().clone());
    let _sweeper = hub.spawn_typing_sweeper();

    let app = build_router(hub, config.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Listening on {}", addr);
    tracing::info!("WebSocket endpoint at ws://{}/ws?userId=<id>", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
