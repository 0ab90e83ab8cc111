//! Change detection between two scans.
//!
//! Hosts are matched by address only. A host present in both scans is
//! unchanged as far as this module is concerned, even if its MAC, vendor
//! or open ports moved.

use std::collections::HashMap;
use std::net::Ipv4Addr;

use netsweep_core::{Host, ScanResult};
use serde::Serialize;

/// Hosts that appeared and disappeared between two scans.
///
/// Order within each list is unspecified.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HostDiff {
    pub added: Vec<Host>,
    pub removed: Vec<Host>,
    pub summary: DiffSummary,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiffSummary {
    pub added_count: u32,
    pub removed_count: u32,
    pub unchanged_count: u32,
}

impl HostDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Compare an old and a new host collection keyed by address.
pub fn diff_hosts(old: &[Host], new: &[Host]) -> HostDiff {
    let old_by_ip: HashMap<Ipv4Addr, &Host> = old.iter().map(|h| (h.ip, h)).collect();
    let new_by_ip: HashMap<Ipv4Addr, &Host> = new.iter().map(|h| (h.ip, h)).collect();

    let added: Vec<Host> = new_by_ip
        .iter()
        .filter(|(ip, _)| !old_by_ip.contains_key(*ip))
        .map(|(_, h)| (*h).clone())
        .collect();

    let removed: Vec<Host> = old_by_ip
        .iter()
        .filter(|(ip, _)| !new_by_ip.contains_key(*ip))
        .map(|(_, h)| (*h).clone())
        .collect();

    let unchanged = new_by_ip.len() - added.len();

    let summary = DiffSummary {
        added_count: added.len() as u32,
        removed_count: removed.len() as u32,
        unchanged_count: unchanged as u32,
    };

    HostDiff {
        added,
        removed,
        summary,
    }
}

/// Diff two complete scans, `previous` being the older one.
pub fn diff_scans(previous: &ScanResult, current: &ScanResult) -> HostDiff {
    if previous.network() != current.network() {
        tracing::warn!(
            previous = %previous.network(),
            current = %current.network(),
            "Comparing scans of different networks"
        );
    }
    diff_hosts(previous.hosts(), current.hosts())
}
