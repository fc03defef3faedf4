use anyhow::Context;
use tracing::{debug, info, warn};

use crate::app::{build_router, AppState};
use crate::config::AppConfig;

pub async fn handle(port: Option<u16>) -> anyhow::Result<()> {
    let mut config = AppConfig::from_env().context("invalid configuration")?;
    if let Some(port) = port {
        config.server.port = port;
    }

    info!("Starting Remna Mini App API in {} mode", config.environment);
    info!("Panel API: {}", config.panel.base_url);
    info!("Admin Telegram ids configured: {}", config.telegram.admin_ids.len());
    debug!("Admin Telegram ids: {:?}", config.telegram.admin_ids.iter().collect::<Vec<_>>());
    if config.telegram.admin_ids.is_empty() {
        warn!("ADMIN_TELEGRAM_IDS is empty; every authenticated request will be rejected");
    }
    if config.environment.is_development() {
        warn!("Development mode: requests without init-data are treated as an admin");
    }

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let state = AppState::new(config).context("failed to create panel client")?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    info!("Remna Mini App API listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
