//! CLI entry point for the netsweep network scanner.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use netsweep_core::persist::{load_scan, save_scan};
use netsweep_discover::config::SweepConfig;
use netsweep_discover::diff::diff_scans;
use netsweep_discover::report::{diff_report, host_table};
use netsweep_discover::vendor::VendorLookup;
use netsweep_discover::ScanOrchestrator;

#[derive(Parser)]
#[command(name = "netsweep")]
#[command(about = "Sweep an IPv4 network for live hosts and open ports")]
struct Cli {
    /// Network to scan (CIDR notation, e.g., 192.168.1.0/24).
    #[arg(short, long)]
    target: Option<String>,

    /// File to save scan results to.
    #[arg(short, long, default_value = "scan-latest.json")]
    save: PathBuf,

    /// Previous scan file to compare against.
    #[arg(long)]
    compare: Option<PathBuf>,

    /// Skip MAC vendor lookups.
    #[arg(long)]
    no_vendor: bool,

    /// Config file prefix (default: netsweep).
    #[arg(short, long, default_value = "netsweep")]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let mut config = SweepConfig::load(&cli.config)?;
    if let Some(target) = &cli.target {
        config.network = target.clone();
    }
    if cli.no_vendor {
        config.vendor_lookup = false;
    }

    // Fail fast on a bad target here; the engine itself would just return
    // an empty result.
    let addresses = netsweep_discover::range::block_size(&config.network)?;

    // Read the baseline before the sweep so `--compare` and `--save` may
    // name the same file.
    let previous = match &cli.compare {
        Some(path) => Some(load_scan(path).map_err(|e| {
            anyhow::anyhow!("Failed to load previous scan {}: {e}", path.display())
        })?),
        None => None,
    };

    println!("Scanning network: {} ({addresses} addresses)", config.network);
    let orchestrator = ScanOrchestrator::from_config(&config);
    let mut result = orchestrator.scan(&config.network).await;

    if config.vendor_lookup {
        let lookup = VendorLookup::new(&config.vendor_api_url, config.vendor_timeout())?;
        result = lookup.enrich(result).await;
    }

    println!();
    print!("{}", host_table(&result));

    match save_scan(&cli.save, &result) {
        Ok(()) => println!("\nScan results saved to: {}", cli.save.display()),
        Err(e) => {
            tracing::warn!(path = %cli.save.display(), error = %e, "Failed to save scan");
            println!("\nWarning: failed to save scan: {e}");
        }
    }

    if let Some(previous) = previous {
        let taken = previous.timestamp().with_timezone(&chrono::Local);
        println!(
            "\nComparing with previous scan from {}",
            taken.format("%Y-%m-%d %H:%M:%S")
        );
        let diff = diff_scans(&previous, &result);
        tracing::info!(
            added = diff.summary.added_count,
            removed = diff.summary.removed_count,
            unchanged = diff.summary.unchanged_count,
            "Scan comparison complete"
        );
        print!("{}", diff_report(&diff));
    }

    Ok(())
}
