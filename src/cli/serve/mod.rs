//! Serve command - runs the identity API

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::info;

use crate::api::create_router;
use crate::config::AppConfig;
use crate::infrastructure::logging::init_logging;

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().unwrap_or_default();
    init_logging(&config.logging);

    let state = crate::create_app_state(&config).await?;
    let app = create_router(state, config.server.request_timeout());

    let addr = build_socket_addr(&config)?;
    info!("Starting identity API on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

fn build_socket_addr(config: &AppConfig) -> anyhow::Result<SocketAddr> {
    Ok(SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    )))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
