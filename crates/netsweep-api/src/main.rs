//! netsweep-api: HTTP service wrapping the netsweep scan engine.
//!
//! ## Environment variables
//!
//! | Variable                    | Default          | Description              |
//! |-----------------------------|------------------|--------------------------|
//! | `NETSWEEP__SWEEP__NETWORK`  | `192.168.1.0/24` | Network to sweep         |
//! | `RUST_LOG`                  | `info`           | Log filter               |

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use netsweep_api::{router, ScanController, SweepPipeline};
use netsweep_discover::config::SweepConfig;
use netsweep_discover::vendor::VendorLookup;
use netsweep_discover::ScanOrchestrator;

#[derive(Parser)]
#[command(name = "netsweep-api")]
#[command(about = "HTTP control plane for the netsweep network scanner")]
struct Cli {
    /// Network to scan (CIDR notation). Overrides the config file.
    #[arg(short, long)]
    network: Option<String>,

    /// API server port.
    #[arg(short, long, default_value_t = 8080)]
    port: u16,

    /// Address to bind.
    #[arg(long, default_value = "0.0.0.0")]
    bind: std::net::IpAddr,

    /// Config file prefix (default: netsweep).
    #[arg(short, long, default_value = "netsweep")]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).json().init();

    let cli = Cli::parse();
    let mut config = SweepConfig::load(&cli.config)?;
    if let Some(network) = cli.network {
        config.network = network;
    }
    let addresses = netsweep_discover::range::block_size(&config.network)?;

    let vendors = if config.vendor_lookup {
        Some(VendorLookup::new(&config.vendor_api_url, config.vendor_timeout())?)
    } else {
        None
    };
    let pipeline = SweepPipeline::new(ScanOrchestrator::from_config(&config), vendors);
    let controller = ScanController::new(&config.network, Arc::new(pipeline));

    let addr = SocketAddr::new(cli.bind, cli.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(
        addr = %addr,
        network = %config.network,
        addresses,
        "API server listening"
    );

    axum::serve(listener, router(controller)).await?;
    Ok(())
}
