//! Link-layer address lookup from the local neighbor (ARP) cache.

use std::net::Ipv4Addr;
use std::path::PathBuf;

use async_trait::async_trait;
use netsweep_core::UNKNOWN_MAC;
use tokio::process::Command;

/// Reads the link-layer address of a neighbor.
///
/// Only call this through [`crate::probe::HostProber`]: the cache is filled
/// by the reachability probe, not by the lookup.
#[async_trait]
pub trait NeighborResolver: Send + Sync {
    /// The MAC address for `ip`, or `"Unknown"` when none is cached.
    async fn resolve(&self, ip: Ipv4Addr) -> String;
}

/// Resolver over `ip neigh show <addr>`, falling back to `/proc/net/arp`.
pub struct IpNeighResolver {
    ip_path: String,
    arp_table: PathBuf,
}

impl IpNeighResolver {
    pub fn new(ip_path: &str) -> Self {
        Self {
            ip_path: ip_path.to_string(),
            arp_table: PathBuf::from("/proc/net/arp"),
        }
    }

    pub fn with_arp_table(mut self, path: impl Into<PathBuf>) -> Self {
        self.arp_table = path.into();
        self
    }

    async fn from_ip_neigh(&self, ip: Ipv4Addr) -> Option<String> {
        let output = Command::new(&self.ip_path)
            .args(["neigh", "show"])
            .arg(ip.to_string())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| tracing::debug!(ip = %ip, error = %e, "ip neigh unavailable"))
            .ok()?;

        if !output.status.success() {
            return None;
        }
        parse_lladdr(&String::from_utf8_lossy(&output.stdout))
    }

    async fn from_arp_table(&self, ip: Ipv4Addr) -> Option<String> {
        let content = tokio::fs::read_to_string(&self.arp_table).await.ok()?;
        parse_proc_arp(&content, ip)
    }
}

#[async_trait]
impl NeighborResolver for IpNeighResolver {
    async fn resolve(&self, ip: Ipv4Addr) -> String {
        if let Some(mac) = self.from_ip_neigh(ip).await {
            return mac;
        }
        if let Some(mac) = self.from_arp_table(ip).await {
            return mac;
        }
        tracing::debug!(ip = %ip, "No neighbor entry");
        UNKNOWN_MAC.to_string()
    }
}

/// Take the token following `lladdr` in `ip neigh` output.
///
/// ```text
/// 192.168.1.1 dev eth0 lladdr aa:bb:cc:dd:ee:ff REACHABLE
/// ```
pub fn parse_lladdr(output: &str) -> Option<String> {
    let mut fields = output.split_whitespace();
    while let Some(field) = fields.next() {
        if field == "lladdr" {
            return fields.next().map(str::to_string);
        }
    }
    None
}

/// Find the hardware address for `ip` in `/proc/net/arp` content.
///
/// Incomplete entries (all-zero address) are treated as misses.
pub fn parse_proc_arp(content: &str, ip: Ipv4Addr) -> Option<String> {
    let ip_str = ip.to_string();
    content
        .lines()
        .skip(1)
        .map(|line| line.split_whitespace().collect::<Vec<_>>())
        .filter(|fields| fields.len() >= 4 && fields[0] == ip_str)
        .map(|fields| fields[3])
        .find(|mac| *mac != "00:00:00:00:00:00")
        .map(str::to_string)
}
