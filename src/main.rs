//! HTTP management interface (v1)
//!
//! # Architecture Overview
//!
//! ```text
//!   management.toml
//!        │
//!        ▼
//!   ┌──────────┐   ┌────────────────┐   ┌────────────────────┐   ┌───────────────┐
//!   │  config  │──▶│ EndpointConfig │──▶│ CapabilityGraph-   │──▶│   service     │
//!   │ validate │   └────────────────┘   │ Builder + wiring   │   │   container   │
//!   └──────────┘                        │ (+ upgrade channel)│   │ (topo order)  │
//!                                       └────────────────────┘   └───────┬───────┘
//!                                                                        │
//!        ┌───────────────────────────────────────────────────────────────┘
//!        ▼
//!   ┌────────────┐   ┌──────────────────────────┐   SIGTERM/SIGINT
//!   │  startup   │──▶│ ManagementHttpServer     │◀──────────────────
//!   │  assemble  │   │  admission gate → routes │   begin_shutdown → drain → stop
//!   └────────────┘   └──────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use http_management::config::{load_config, EndpointConfig};
use http_management::graph::upgrade::DEFAULT_NODE_NAME;
use http_management::http::ManagementHttpServer;
use http_management::lifecycle::{signals, startup, DrainOutcome};
use http_management::management::StandaloneController;
use http_management::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "http-management")]
#[command(about = "HTTP management interface with graceful request draining", long_about = None)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "management.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(&args.config)?;

    logging::init_tracing(&config.observability.log_level);
    tracing::info!(config = ?args.config, "http-management v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let endpoint = EndpointConfig::from_interface(&config.http_interface, config.running_mode)?;
    let (_container, outcome) = startup::install_services(&config, &endpoint)?;

    if outcome.is_empty() {
        tracing::info!("No HTTP management runtime required for this process");
        return Ok(());
    }

    tracing::info!(
        services = ?outcome.services.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
        upgrade_connector = ?outcome.upgrade.as_ref().map(|u| u.connector.name()),
        "Management services installed"
    );

    let node_name = config
        .node_name
        .clone()
        .unwrap_or_else(|| DEFAULT_NODE_NAME.to_string());
    let controller = Arc::new(StandaloneController::new(node_name, config.running_mode));

    let runtime = startup::assemble(&config, &endpoint, controller).await?;
    let server = ManagementHttpServer::new(runtime);

    match server
        .run(signals::termination_signal(), config.shutdown.drain_timeout())
        .await?
    {
        DrainOutcome::Drained => tracing::info!("Shutdown complete"),
        DrainOutcome::Forced { outstanding } => {
            tracing::warn!(outstanding, "Shutdown forced with management requests in flight")
        }
    }

    Ok(())
}
