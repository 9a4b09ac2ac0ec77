//! Storefront edge
//!
//! Sits in front of the marketplace: forwards `/api/*` to the REST backend
//! and guards page navigation by role.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌────────────────────────────────────────────┐
//!                      │              STOREFRONT EDGE               │
//!                      │  ┌──────────┐   ┌──────────┐               │
//!   Client ───────────▶│  │ request  │──▶│  guard   │──┐            │
//!                      │  │ id/trace │   │ (pages)  │  │            │
//!                      │  └──────────┘   └────┬─────┘  │ allow      │
//!                      │                      ▼        ▼            │
//!                      │               ┌──────────┐ ┌──────────┐    │
//!                      │               │ session  │ │  proxy   │    ├──▶ Backend /api/*
//!                      │               │  check   │ │ forward  │    ├──▶ Page origin
//!                      │               └──────────┘ └──────────┘    │
//!                      │  ┌──────────────────────────────────────┐  │
//!                      │  │ config (+reload) · logging · metrics │  │
//!                      │  │ lifecycle: signals, graceful stop    │  │
//!                      │  └──────────────────────────────────────┘  │
//!                      └────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use storefront_edge::config::{load_config, watcher::ConfigWatcher};
use storefront_edge::lifecycle::{signals::spawn_signal_handler, Shutdown};
use storefront_edge::observability::{logging::init_logging, metrics::init_metrics};
use storefront_edge::EdgeServer;

#[derive(Parser)]
#[command(name = "storefront-edge")]
#[command(about = "API proxy and role guard for the marketplace storefront", long_about = None)]
struct Args {
    /// TOML config file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reload the config file when it changes.
    #[arg(short, long, requires = "config")]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = load_config(args.config.as_deref())?;
    init_logging(&config.observability);

    tracing::info!("storefront-edge v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        backend = config.backend.base_url.as_deref().unwrap_or_default(),
        pages = config.pages.origin_url.as_deref().unwrap_or("none"),
        rules = config.guard.rules.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    // Keep the watcher alive for the life of the server
    let (config_updates, _watcher) = match (&args.config, args.watch) {
        (Some(path), true) => {
            let (watcher, updates) = ConfigWatcher::new(path, &config);
            (updates, Some(watcher.run()?))
        }
        _ => {
            let (_, updates) = mpsc::unbounded_channel();
            (updates, None)
        }
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    spawn_signal_handler(&shutdown);

    let server = EdgeServer::new(config)?;
    server.run(listener, config_updates, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
