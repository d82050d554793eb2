//! Backend proxy shim.
//!
//! # Architecture Overview
//!
//! ```text
//!     Browser / client                     a2a-proxy                          Backend
//!   ┌───────────────────┐      ┌───────────────────────────────┐      ┌──────────────┐
//!   │ ProxyFetch        │      │ GET/POST /api/proxy/{*path}   │      │              │
//!   │  rewrites backend │─────▶│  → target URL                 │─────▶│ NEXT_PUBLIC_ │
//!   │  URLs to          │      │  → fixed JSON headers         │      │ A2A_URL      │
//!   │  /api/proxy/...   │◀─────│  ← stream (SSE / text)        │◀─────│              │
//!   │                   │      │  ← re-encoded JSON            │      │              │
//!   └───────────────────┘      │  ← 500 {"error","details"}    │      └──────────────┘
//!                              └───────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use a2a_proxy::config::{load_config, validate_config, ConfigError, ProxyConfig};
use a2a_proxy::http::HttpServer;
use a2a_proxy::lifecycle::{wait_for_signal, Shutdown};
use a2a_proxy::observability::{logging, metrics};
use clap::Parser;
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(name = "a2a-proxy")]
#[command(about = "Forward /api/proxy/* to a single backend", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overrides the config file.
    #[arg(short, long)]
    bind: Option<String>,

    /// Backend base URL, overrides NEXT_PUBLIC_A2A_URL and the config file.
    #[arg(long)]
    backend_url: Option<String>,
}

/// Resolve configuration: defaults < file < environment < flags.
fn resolve_config(cli: &Cli) -> Result<ProxyConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };

    config.apply_env();

    if let Some(bind) = &cli.bind {
        config.listener.bind_address = bind.clone();
    }
    if let Some(url) = &cli.backend_url {
        config.backend.base_url = url.clone();
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    logging::init_logging(&config.observability.log_level);

    tracing::info!("a2a-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        backend = %config.backend.base_url,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config)?;
    let server_shutdown = shutdown.subscribe();

    let mut serving = tokio::spawn(server.run(listener, server_shutdown));

    tokio::select! {
        _ = wait_for_signal() => {
            shutdown.trigger();
            serving.await??;
        }
        result = &mut serving => result??,
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
