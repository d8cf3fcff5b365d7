#![forbid(unsafe_code)]
//! HTTP API server for basewatch

use basewatch::api::{run_api_server, AppState};
use basewatch::config::load_config;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the TOML config file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Port to listen on, overriding config and $PORT
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;
    let port = args.port.unwrap_or(config.api.port);

    let state = AppState::from_config(&config)?;
    tracing::info!(
        endpoints = state.ledger.client().pool().len(),
        timeout_ms = config.rpc.timeout_ms,
        retry_delay_ms = config.rpc.retry_delay_ms,
        "basewatch starting"
    );

    run_api_server(Arc::new(state), port).await
}
