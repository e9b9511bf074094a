//! framecast relay daemon — entry point.
//!
//! ```text
//! framecast-relayd                  Run with defaults (port 5073)
//! framecast-relayd --port 6000      Override the listen port
//! framecast-relayd --config <path>  Load a custom config TOML
//! framecast-relayd --gen-config     Write default config to stdout
//! ```

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use framecast_core::{FrameSocket, Receiver, Relay};

use crate::config::RelayConfig;

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "framecast-relayd", about = "framecast relay daemon")]
struct Cli {
    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "framecast-relayd.toml")]
    config: PathBuf,

    /// Override the configured listen port.
    #[arg(short, long)]
    port: Option<u16>,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // --gen-config: dump defaults and exit.
    if cli.gen_config {
        let text = toml::to_string_pretty(&RelayConfig::default())?;
        println!("{text}");
        return Ok(());
    }

    let config = RelayConfig::load(&cli.config);

    // Init tracing.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let port = cli.port.unwrap_or(config.network.listen_port);

    info!("framecast-relayd v{}", env!("CARGO_PKG_VERSION"));
    info!("listen port: {port}");
    info!("receive buffer: {} bytes", config.network.buffer_size);

    // Bind failure at startup is the one fatal error.
    let socket = match FrameSocket::bind(port).await {
        Ok(socket) => Arc::new(socket),
        Err(e) => {
            error!("could not bind UDP port {port}: {e}");
            return Err(e.into());
        }
    };

    let relay = Relay::new(Arc::clone(&socket));
    let receiver = Receiver::new(Arc::clone(&socket), config.network.buffer_size, relay)?;

    // Ctrl-C closes the socket, which ends the receive loop cleanly.
    let shutdown = Arc::clone(&socket);
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("ctrl-c received — shutting down");
        shutdown.close();
    });

    receiver.run().await;
    info!("relay stopped");

    Ok(())
}
