use std::net::SocketAddr;

use axum::Router;
use configs::AppConfig;
use service::{build_store, StringService};
use tracing::info;

use crate::routes::{self, AppState};

/// Create the shared store handle and wrap it for the handlers.
/// Called once per process; every request reuses the same client.
pub async fn build_state(cfg: &AppConfig) -> anyhow::Result<AppState> {
    let store = build_store(&cfg.store).await?;
    Ok(AppState { strings: StringService::new(store, cfg.store.record_key.clone()) })
}

/// Router with state attached, ready for `axum::serve` or the Lambda adapter.
pub async fn build_app(cfg: &AppConfig) -> anyhow::Result<Router> {
    let state = build_state(cfg).await?;
    Ok(routes::build_router(state))
}

fn bind_addr(cfg: &AppConfig) -> anyhow::Result<SocketAddr> {
    Ok(format!("{}:{}", cfg.server.host, cfg.server.port).parse()?)
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!(service = "server", event = "shutdown_signal", "received Ctrl+C, draining connections");
    }
}

/// Public entry: build the app and run the HTTP server until Ctrl+C
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    let app = build_app(&cfg).await?;

    let addr = bind_addr(&cfg)?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, backend = ?cfg.store.backend, "starting string store server");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
