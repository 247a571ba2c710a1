//! Transform adapter entry point.
//!
//! Startup order: parse CLI → load config → init logging/metrics → compile
//! routes → bind listener → serve. Any startup failure exits non-zero
//! before the listener accepts traffic.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use transform_adapter::bridge::HttpBridgeClient;
use transform_adapter::config::load_config;
use transform_adapter::http::HttpServer;
use transform_adapter::lifecycle::Shutdown;
use transform_adapter::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "transform-adapter")]
#[command(about = "HTTP transform adapter for the device bridge", long_about = None)]
struct Cli {
    /// Path to the adapter configuration file.
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(&cli.config)?;
    logging::init(&config.observability.log_level);

    tracing::info!(
        bind_address = %config.listener.bind_address,
        bridge_url = %config.bridge.base_url,
        routes = config.routes.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => {
                tracing::error!(
                    metrics_address = %config.observability.metrics_address,
                    "Failed to parse metrics address"
                );
            }
        }
    }

    let new_bridge_client = HttpBridgeClient::factory(&config.bridge)?;
    let server = HttpServer::new(&config, new_bridge_client)?;

    let listener = TcpListener::bind(config.listener.bind_address.as_str()).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
