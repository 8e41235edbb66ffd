//! # Lingua Relay - Main Application Entry Point
//!
//! TCP relay server that receives length-prefixed audio recordings from
//! connected peers, runs them through an external speech translation pipeline,
//! and broadcasts the translated audio to every other peer.
//!
//! ## Application Architecture:
//! - **config**: Layered configuration (TOML file + environment variables)
//! - **error**: The relay's error taxonomy
//! - **framing**: Length-prefixed wire codec
//! - **state**: Shared application state (config, registry, pipeline)
//! - **relay**: Registry, session loop, broadcast dispatcher, TCP acceptor
//! - **translation**: External speech collaborator interface and pipeline

mod config;
mod error;
mod framing;
mod relay;
mod state;
mod translation;

use anyhow::Result;
use config::AppConfig;
use relay::RelayServer;
use state::AppState;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional; ignore a missing file.
    dotenv::dotenv().ok();

    init_tracing()?;

    let config = AppConfig::load()?;
    config.validate()?;

    info!("Starting lingua-relay v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Relaying between '{}' and '{}' on {}:{}",
        config.languages.primary_tts,
        config.languages.secondary_tts,
        config.server.host,
        config.server.port
    );

    // The translation backend is an external collaborator; the stub accepts
    // connections but never produces a broadcast until a real speech stack is
    // plugged in here.
    let backend = Arc::new(translation::UnconfiguredBackend);
    let state = Arc::new(AppState::new(config, backend));

    let server = RelayServer::bind(Arc::clone(&state)).await?;

    tokio::select! {
        result = server.run() => {
            // The accept loop only returns on an unrecoverable failure.
            if let Err(err) = result {
                error!("Server error: {}", err);
                return Err(err.into());
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received, stopping server");
        }
    }

    info!("Server stopped");
    Ok(())
}

/// Initialize structured logging.
///
/// `RUST_LOG` controls verbosity; defaults to debug output for this crate.
fn init_tracing() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lingua_relay=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    Ok(())
}

/// Resolve when the process receives SIGTERM or SIGINT.
async fn shutdown_signal() {
    let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        .expect("Failed to install SIGTERM handler");
    let mut sigint = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt())
        .expect("Failed to install SIGINT handler");

    tokio::select! {
        _ = sigterm.recv() => info!("Received SIGTERM"),
        _ = sigint.recv() => info!("Received SIGINT"),
    }
}
