//! Shared-board Carcassonne table server.

use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod protocol;
mod room;
mod server;

use config::ServerConfig;
use server::ServerState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.log_filter))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let catalog = config.load_catalog()?;
    info!(
        tiles = catalog.len(),
        source = ?config.catalog_path,
        "Starting Carcassonne server..."
    );

    let state = Arc::new(ServerState::new(catalog));

    server::run_server(config.addr, state).await
}
