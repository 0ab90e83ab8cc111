//! Sweep orchestration.
//!
//! One tokio task per address runs probe → resolve → port scan and sends the
//! finished `Host` to the orchestrator over a channel. The orchestrator is
//! the only owner of the result collection. Addresses are drawn lazily and a
//! task is only spawned once it holds a host permit, so at most
//! `max_concurrent_hosts` pipelines exist at any time. The port scanner
//! carries its own bound on concurrent connects.

use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Instant;

use netsweep_core::{Host, ScanResult};
use tokio::sync::{mpsc, Semaphore};
use tokio::task::{JoinError, JoinSet};
use uuid::Uuid;

use crate::config::SweepConfig;
use crate::neighbor::IpNeighResolver;
use crate::ports::PortScanner;
use crate::probe::{HostProber, PingProbe};
use crate::range::{self, AddressRange};

/// Drives a full sweep of a CIDR block.
#[derive(Clone)]
pub struct ScanOrchestrator {
    prober: HostProber,
    ports: PortScanner,
    max_concurrent_hosts: usize,
}

impl ScanOrchestrator {
    pub fn new(prober: HostProber, ports: PortScanner, max_concurrent_hosts: usize) -> Self {
        Self {
            prober,
            ports,
            max_concurrent_hosts: max_concurrent_hosts.max(1),
        }
    }

    /// Wire the system collaborators (`ping`, `ip neigh`, TCP connect) from
    /// configuration.
    pub fn from_config(config: &SweepConfig) -> Self {
        let probe = Arc::new(PingProbe::new(&config.ping_path, config.probe_timeout()));
        let resolver = Arc::new(IpNeighResolver::new(&config.ip_path));
        let connects = Arc::new(Semaphore::new(config.max_concurrent_connects.max(1)));
        Self::new(
            HostProber::new(probe, resolver),
            PortScanner::new(config.connect_timeout(), connects),
            config.max_concurrent_hosts,
        )
    }

    /// Sweep `cidr` and return every reachable host.
    ///
    /// Never fails: a malformed block produces an empty result and failed
    /// probes simply leave the address out. Returns only after every
    /// address pipeline has finished.
    pub async fn scan(&self, cidr: &str) -> ScanResult {
        let scan_id = Uuid::new_v4();
        let start = Instant::now();
        let addresses = range::enumerate_or_empty(cidr);

        tracing::info!(
            scan_id = %scan_id,
            network = %cidr,
            addresses = addresses.remaining(),
            max_concurrent_hosts = self.max_concurrent_hosts,
            "Starting sweep"
        );

        let hosts = self.sweep(addresses).await;
        let result = ScanResult::new(cidr.trim(), hosts);

        tracing::info!(
            scan_id = %scan_id,
            network = %cidr,
            hosts_up = result.len(),
            duration_ms = start.elapsed().as_millis(),
            "Sweep complete"
        );

        result
    }

    /// Run the full pipeline for one address.
    pub async fn scan_host(&self, ip: Ipv4Addr) -> Option<Host> {
        let mac = self.prober.resolve_host(ip).await?;
        let open_ports = self.ports.scan(ip).await;
        tracing::debug!(ip = %ip, mac = %mac, open = open_ports.len(), "Host up");
        Some(Host::new(ip, mac, open_ports))
    }

    async fn sweep(&self, addresses: AddressRange) -> Vec<Host> {
        let permits = Arc::new(Semaphore::new(self.max_concurrent_hosts));
        let (tx, mut rx) = mpsc::channel::<Host>(self.max_concurrent_hosts);

        // Feeding and draining run side by side: a pipeline holding a permit
        // may be waiting on channel capacity.
        let feed = async move {
            let mut pipelines = JoinSet::new();
            for ip in addresses {
                let Ok(permit) = permits.clone().acquire_owned().await else {
                    break;
                };
                let this = self.clone();
                let tx = tx.clone();

                pipelines.spawn(async move {
                    let _permit = permit;
                    if let Some(host) = this.scan_host(ip).await {
                        // The receiver outlives every pipeline.
                        let _ = tx.send(host).await;
                    }
                });

                while let Some(joined) = pipelines.try_join_next() {
                    log_panic(joined);
                }
            }
            // Channel closes once the last pipeline drops its sender.
            drop(tx);
            pipelines
        };

        let collect = async {
            let mut hosts = Vec::new();
            while let Some(host) = rx.recv().await {
                hosts.push(host);
            }
            hosts
        };

        let (mut pipelines, hosts) = tokio::join!(feed, collect);
        while let Some(joined) = pipelines.join_next().await {
            log_panic(joined);
        }

        hosts
    }
}

fn log_panic(joined: Result<(), JoinError>) {
    if let Err(e) = joined {
        tracing::error!(error = %e, "Address pipeline panicked");
    }
}
