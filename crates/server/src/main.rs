//! rawx chunk server binary.

use anyhow::{Context, Result};
use clap::Parser;
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use rawx_core::config::AppConfig;
use rawx_server::{AppState, RawxMetrics, create_router};
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// rawx - chunk storage server
#[derive(Parser, Debug)]
#[command(name = "rawxd")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "RAWX_CONFIG", default_value = "config/rawx.toml")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("rawx v{}", env!("CARGO_PKG_VERSION"));

    // The file is optional: defaults and RAWX_ variables cover every field.
    let mut figment = Figment::new();
    if std::path::Path::new(&args.config).exists() {
        tracing::info!(config_path = %args.config, "Loading configuration from file");
        figment = figment.merge(Toml::file(&args.config));
    } else {
        tracing::info!(config_path = %args.config, "No config file found, using defaults and environment");
    }

    let config: AppConfig = figment
        .merge(Env::prefixed("RAWX_").split("__"))
        .extract()
        .context("failed to load configuration")?;

    let repository = rawx_storage::from_config(&config.storage)
        .await
        .context("failed to initialize storage")?;
    repository
        .health_check()
        .await
        .context("storage health check failed")?;
    tracing::info!(backend = repository.backend_name(), "Storage backend ready");

    let notifier = rawx_server::notify::from_config(&config.notify);
    tracing::info!(notifier = notifier.name(), "Chunk events enabled");

    let metrics = RawxMetrics::new().context("failed to register metrics")?;

    let addr: SocketAddr = config.server.bind.parse().context("invalid bind address")?;
    tracing::info!(
        compression = ?config.server.compression,
        service_url = config.server.advertised_url(),
        "Serving chunks"
    );
    if config.server.compression.is_enabled() {
        tracing::warn!("Compressed chunks are stored but cannot be served by GET");
    }

    let state = AppState::new(config, repository, notifier, metrics);
    let app = create_router(state);

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
