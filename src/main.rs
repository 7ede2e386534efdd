//! Mock API server.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌────────────────────────────────────────────┐
//!   Client Request   │  middleware: request id, trace, origin     │
//!   ─────────────────┼─▶ gate, cors, timeout, body limit          │
//!                    │        │                                   │
//!                    │        ├── GET /          → health         │
//!                    │        ├── /admin/routes* → admin ──┐      │
//!                    │        └── anything else  → routing │      │
//!                    │                              │      │      │
//!                    │                              ▼      ▼      │
//!                    │                         store (db.json)    │
//!                    └────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

use mock_api_server::config::load_config;
use mock_api_server::lifecycle::{bind, wait_for_signal, Shutdown};
use mock_api_server::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "mock-api-server")]
#[command(about = "Replays operator-registered HTTP routes", long_about = None)]
struct Args {
    /// Optional TOML configuration file; environment variables override it.
    #[arg(short, long, env = "MOCK_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    logging::init_tracing(&config.observability.log_level);
    tracing::info!("mock-api-server v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        address = %config.listener.address(),
        store = %config.store.path,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let (server, listener) = bind(config).await?;

    let shutdown = Shutdown::new();
    let signal = shutdown.subscribe();
    tokio::spawn(async move {
        wait_for_signal().await;
        shutdown.trigger();
    });

    server.run(listener, signal).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
