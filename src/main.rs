//! nvel-static front controller.
//!
//! ```text
//!     Client Request            ┌──────────────────────────────────────────────┐
//!     GET /pt-br/chapters/4 ───▶│  http::server ──▶ routing ──▶ fetch          │───▶ Backend
//!                               │                   grammar     GET            │     /pt-br/chapters/4
//!     Client Response ◀─────────│  http::response ◀─────────────── stream ◀────│◀───
//!     (backend bytes or 404)    │                                              │
//!                               │  config (+watcher)  observability  lifecycle │
//!                               └──────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use nvel_static::config::watcher::ConfigWatcher;
use nvel_static::config::{load_config, FrontConfig};
use nvel_static::lifecycle::{wait_for_signal, Shutdown};
use nvel_static::observability::{logging, metrics};
use nvel_static::routing::{parse_path, PathRouter};
use nvel_static::HttpServer;

#[derive(Parser)]
#[command(name = "nvel-static", version)]
#[command(about = "Front controller that serves friendly URLs from the nvel backend", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "nvel-static.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server (default)
    Serve,
    /// Print the routing decision for each query as JSON, without fetching
    Resolve {
        /// Raw queries, e.g. `pt-br/chapters/4`
        #[arg(required = true)]
        queries: Vec<String>,
    },
    /// Validate the configuration file and print the effective config
    Check,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(&cli.config).await,
        Commands::Resolve { queries } => resolve(&cli.config, &queries),
        Commands::Check => {
            let config = load_config(&cli.config)?;
            println!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

/// Load the config file, falling back to defaults when it does not exist.
fn load_or_default(path: &Path) -> Result<(FrontConfig, bool), Box<dyn std::error::Error>> {
    if path.exists() {
        Ok((load_config(path)?, true))
    } else {
        Ok((FrontConfig::default(), false))
    }
}

fn resolve(path: &Path, queries: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let (config, _) = load_or_default(path)?;
    let router = PathRouter::new(config.backend.url.clone(), config.routing.variant);

    for query in queries {
        let parsed = parse_path(query, router.variant());
        let line = serde_json::json!({
            "query": query,
            "language": parsed.as_ref().ok().map(|p| p.language.clone()),
            "page": parsed.as_ref().ok().map(|p| p.page.to_string()),
            "route": router.route(query),
        });
        println!("{}", serde_json::to_string(&line)?);
    }
    Ok(())
}

async fn serve(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let (config, from_file) = load_or_default(path)?;

    logging::init_logging(&config.observability);
    tracing::info!("nvel-static v{} starting", env!("CARGO_PKG_VERSION"));

    if !from_file {
        tracing::warn!(path = ?path, "Config file not found, using defaults");
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        backend_url = %config.backend.url,
        variant = %config.routing.variant,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    // The watcher must outlive the server; dropping it stops notifications.
    let (_watcher, config_updates) = if from_file {
        let (watcher, updates) = ConfigWatcher::new(path);
        match watcher.run() {
            Ok(w) => (Some(w), updates),
            Err(e) => {
                tracing::warn!(error = %e, "Config hot reload unavailable");
                (None, updates)
            }
        }
    } else {
        let (_, updates) = mpsc::unbounded_channel();
        (None, updates)
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        let signal = wait_for_signal().await;
        tracing::info!(signal, "Signal received, draining connections");
        signal_shutdown.trigger();
    });

    let server = HttpServer::new(config)?;
    server.run(listener, config_updates, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
