// Account Service - Web Server
// REST API with Axum over the configured account store

use anyhow::{Context, Result};
use tracing::info;

use account_service::{logging, router, seed, AppConfig, VERSION};

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_logging();

    let config = AppConfig::load().context("Failed to load configuration")?;
    info!(version = VERSION, ?config, "configuration loaded");

    let store = config.store.open().context("Failed to open account store")?;
    let accounts = store.count()?;
    info!(backend = ?config.store.backend, accounts, "account store opened");

    if config.seed {
        let seeded = seed::seed_defaults(store.as_ref())?;
        info!(count = seeded.len(), "sample accounts seeded");
    }

    let app = router(store);

    let addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    info!(%addr, "server running; API at /accounts");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "cannot listen for Ctrl+C");
    }
}
