use anyhow::Context;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, warn};

use storefront_rs::{
    create_router, init_observability, shutdown_observability, ApiState, Config, Database,
    Metrics,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logging is not up yet; failures surface through anyhow
    let config = Config::from_environment().context("failed to load configuration")?;

    init_observability(
        &config.observability.service_name,
        &config.observability.service_version,
        config.observability.otlp_endpoint.as_deref(),
        &config.observability.log_level,
        config.observability.enable_json_logging,
    )
    .context("failed to initialize observability")?;

    info!(
        "Starting {} v{}",
        config.observability.service_name, config.observability.service_version
    );
    info!("Database: {}", config.database.database_url);

    let metrics = Arc::new(Metrics::new().context("failed to register metrics")?);

    let database = Database::connect(&config.database)
        .await
        .context("failed to open database")?;
    info!("Repositories initialized successfully");

    let state = ApiState::from_database(database.clone(), metrics);
    let app = create_router(state, &config.server);

    let addr: SocketAddr = config
        .server
        .bind_address()
        .parse()
        .context("invalid server bind address")?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    database.close().await;
    shutdown_observability().await;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            warn!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await
        }
    }
}
