//! Relay Server
//!
//! Run with: cargo run --bin relay -- --port 3000
//!
//! # Configuration
//!
//! Settings come from a TOML file (`--config`, or the default search
//! locations), then environment variables, then command-line flags:
//! - `RELAY_HOST`: Host to bind to (default: 0.0.0.0)
//! - `RELAY_PORT` / `PORT`: Port to listen on (default: 3000)
//! - `RELAY_MAX_CONNECTIONS`: Connection limit (default: 1000)
//! - `RELAY_QUEUE_CAPACITY`: Per-connection outbound buffer (default: 256)
//! - `RELAY_LOG_LEVEL`, `RELAY_LOG_FORMAT`: Logging (default: info, pretty)
//! - `RUST_LOG`: Full filter directive, overrides `RELAY_LOG_LEVEL`

use anyhow::Context;
use clap::{Parser, Subcommand};
use relay::config::{generate_default_config, Config, LoggingConfig};
use relay::{serve, AppState};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "relay")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Real-time message relay over WebSocket")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the relay server (default)
    Serve,
    /// Print a default config file to stdout
    InitConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Some(Commands::InitConfig) = cli.command {
        print!("{}", generate_default_config());
        return Ok(());
    }

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::load_default(),
    };

    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    init_tracing(&config.logging);

    tracing::info!("Starting relay v{}", env!("CARGO_PKG_VERSION"));
    if let Some(path) = &cli.config {
        tracing::info!("Loaded config from {:?}", path);
    }
    tracing::info!(
        max_connections = config.relay.max_connections,
        queue_capacity = config.relay.outbound_queue_capacity,
        "Relay configured"
    );

    serve(AppState::new(config)).await?;

    tracing::info!("Relay stopped");
    Ok(())
}

/// Initialize tracing
fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("relay={},tower_http=info", logging.level).into()
    });

    let registry = tracing_subscriber::registry().with(filter);

    if logging.is_json() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
