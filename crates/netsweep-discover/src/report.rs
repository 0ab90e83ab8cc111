//! Plain-text rendering of scan results and diffs for the terminal.

use std::fmt::Write;

use netsweep_core::{Host, ScanResult};

use crate::diff::HostDiff;

const PORTS_COLUMN: usize = 18;

/// Render the host table for a scan.
pub fn host_table(result: &ScanResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Found {} active hosts ===", result.len());
    let _ = writeln!(
        out,
        "{:<15} {:<20} {:<25} {:<20}",
        "IP Address", "MAC Address", "Vendor", "Open Ports"
    );
    let _ = writeln!(out, "{}", "-".repeat(85));
    for host in result.hosts() {
        let _ = writeln!(
            out,
            "{:<15} {:<20} {:<25} {:<20}",
            host.ip.to_string(),
            host.mac,
            host.vendor.as_deref().unwrap_or(""),
            format_ports(host)
        );
    }
    out
}

/// Render the added / removed sections of a diff.
pub fn diff_report(diff: &HostDiff) -> String {
    let mut out = String::new();

    if !diff.added.is_empty() {
        let _ = writeln!(out, "NEW HOSTS DETECTED ({}):", diff.added.len());
        for host in &diff.added {
            let _ = writeln!(out, "  + {}", host_line(host));
        }
    }

    if !diff.removed.is_empty() {
        let _ = writeln!(out, "HOSTS OFFLINE ({}):", diff.removed.len());
        for host in &diff.removed {
            let _ = writeln!(out, "  - {}", host_line(host));
        }
    }

    if diff.is_empty() {
        let _ = writeln!(out, "No changes detected - network is stable");
    }

    out
}

fn host_line(host: &Host) -> String {
    format!(
        "{} ({}) - {}",
        host.ip,
        host.mac,
        host.vendor.as_deref().unwrap_or("")
    )
}

/// Comma-separated open ports, cut at the column width.
pub fn format_ports(host: &Host) -> String {
    if host.open_ports.is_empty() {
        return "None".to_string();
    }

    let joined = host
        .open_ports
        .iter()
        .map(u16::to_string)
        .collect::<Vec<_>>()
        .join(",");

    if joined.len() > PORTS_COLUMN {
        format!("{}...", &joined[..PORTS_COLUMN])
    } else {
        joined
    }
}
