//! Gig worker audit engine server.

use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gig_audit::api::{AppState, create_router};
use gig_audit::config::{AppConfig, ConfigLoader};
use gig_audit::simulator::{FixtureSource, seed};
use gig_audit::store::Store;

/// Serves the audit engine HTTP API.
#[derive(Debug, Parser)]
#[command(name = "gig-audit", version, about)]
struct Cli {
    /// Configuration file. Built-in defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overriding `server.host` and `server.port`.
    #[arg(short, long)]
    bind: Option<String>,

    /// Dataset fixture (YAML or JSON) to import before serving.
    #[arg(long)]
    seed: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "gig_audit=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config: AppConfig = match &cli.config {
        Some(path) => ConfigLoader::load(path)?.into_config(),
        None => AppConfig::default(),
    };
    let bind = cli
        .bind
        .clone()
        .unwrap_or_else(|| config.server.bind_address());

    info!(version = env!("CARGO_PKG_VERSION"), "Starting gig audit engine");

    let store = Store::connect(&config.database).await?;
    if let Some(fixture) = &cli.seed {
        let summary = seed(&store, &FixtureSource::new(fixture)).await?;
        info!(rows = summary.total(), fixture = %fixture.display(), "Fixture imported");
    }

    let app = create_router(AppState::new(store.clone(), config));
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!(address = %bind, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // Without a signal handler the server runs until killed
        std::future::pending::<()>().await;
    }
}
