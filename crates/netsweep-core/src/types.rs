//! Core value types for a network sweep.
//!
//! A `ScanResult` is assembled once per sweep and handed to consumers
//! (persistence, diffing, the control plane) fully built. Nothing mutates it
//! afterwards; enrichment produces new values.

use std::collections::{BTreeMap, BTreeSet};
use std::net::Ipv4Addr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Link-layer address reported when the neighbor cache has no entry.
pub const UNKNOWN_MAC: &str = "Unknown";

// ── Host ──────────────────────────────────────────────────────────

/// A live host discovered by a sweep.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Host {
    pub ip: Ipv4Addr,
    pub mac: String,
    /// Files written by older tools carry `null` for hosts with no open ports.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub open_ports: BTreeSet<u16>,
    #[serde(default)]
    pub vendor: Option<String>,
}

impl Host {
    pub fn new(ip: Ipv4Addr, mac: impl Into<String>, open_ports: BTreeSet<u16>) -> Self {
        Self {
            ip,
            mac: mac.into(),
            open_ports,
            vendor: None,
        }
    }

    /// Return a copy of this host with the vendor name attached.
    pub fn with_vendor(self, vendor: impl Into<String>) -> Self {
        Self {
            vendor: Some(vendor.into()),
            ..self
        }
    }

    pub fn mac_known(&self) -> bool {
        self.mac != UNKNOWN_MAC
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ── Scan Result ───────────────────────────────────────────────────

/// The aggregate of one sweep: when it ran, what it covered, what it found.
///
/// Hosts are unique by address. They are kept in ascending address order,
/// but that is a presentation detail; compare results as sets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScanResult {
    timestamp: DateTime<Utc>,
    network: String,
    /// `null` when an older tool found nothing.
    #[serde(default, deserialize_with = "null_as_empty")]
    hosts: Vec<Host>,
}

impl ScanResult {
    /// Build a result stamped with the current time.
    pub fn new(network: impl Into<String>, hosts: impl IntoIterator<Item = Host>) -> Self {
        Self::from_parts(Utc::now(), network, hosts)
    }

    /// Build a result from explicit parts. A later host with the same address
    /// replaces an earlier one.
    pub fn from_parts(
        timestamp: DateTime<Utc>,
        network: impl Into<String>,
        hosts: impl IntoIterator<Item = Host>,
    ) -> Self {
        let by_ip: BTreeMap<Ipv4Addr, Host> = hosts.into_iter().map(|h| (h.ip, h)).collect();
        Self {
            timestamp,
            network: network.into(),
            hosts: by_ip.into_values().collect(),
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn network(&self) -> &str {
        &self.network
    }

    pub fn hosts(&self) -> &[Host] {
        &self.hosts
    }

    pub fn host(&self, ip: Ipv4Addr) -> Option<&Host> {
        self.hosts
            .binary_search_by_key(&ip, |h| h.ip)
            .ok()
            .map(|i| &self.hosts[i])
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    /// Produce a new result with every host passed through `f`.
    /// Timestamp and network are preserved.
    pub fn map_hosts<F>(self, f: F) -> Self
    where
        F: FnMut(Host) -> Host,
    {
        Self::from_parts(self.timestamp, self.network, self.hosts.into_iter().map(f))
    }

    /// Re-establish the uniqueness invariant on a value that came from
    /// outside (e.g. deserialized from disk).
    pub fn normalized(self) -> Self {
        Self::from_parts(self.timestamp, self.network, self.hosts)
    }
}
