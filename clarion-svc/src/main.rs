//! clarion-svc - Batch Media Enhancement Service
//!
//! Submits local media files to the remote enhancement API, polls each
//! submission until ready, and streams the enhanced result back to disk,
//! many files at a time. Callers submit a batch over HTTP and poll the
//! returned job handle for per-file results.

use anyhow::Result;
use clap::Parser;
use clarion_common::TomlConfig;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use clarion_svc::AppState;

#[derive(Debug, Parser)]
#[command(name = "clarion-svc", about = "Batch media enhancement service")]
struct Args {
    /// Path to TOML config file (default: ~/.config/clarion/clarion.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides config)
    #[arg(long)]
    port: Option<u16>,

    /// API key for the remote enhancement service (overrides config)
    #[arg(long, env = "CLARION_API_KEY")]
    api_key: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    // Priority: CLI > ENV > TOML > defaults
    let mut config = TomlConfig::load(args.config.as_deref())?;
    config.apply_env();
    if let Some(port) = args.port {
        config.listen_port = port;
    }
    if let Some(api_key) = args.api_key {
        config.api_key = Some(api_key);
    }

    info!("Starting clarion-svc (Batch Media Enhancement)");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Remote API: {}", config.api_base_url);
    info!("Max concurrency: {}", config.max_concurrency);
    if config.api_key.is_none() {
        tracing::warn!("No API key configured; jobs must carry their own");
    }

    let listen_port = config.listen_port;
    let state = AppState::new(config);
    let app = clarion_svc::build_router(state);

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", listen_port)).await?;
    info!("Listening on http://127.0.0.1:{}", listen_port);
    info!("Health check: http://127.0.0.1:{}/health", listen_port);

    axum::serve(listener, app).await?;

    Ok(())
}
