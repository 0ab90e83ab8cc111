//! netsweep-discover: Concurrent IPv4 sweep engine.
//!
//! Expands a CIDR block, probes every address for reachability, resolves
//! live hosts' MAC addresses and open ports, and diffs scans against each
//! other to report hosts that appeared or went offline.

pub mod config;
pub mod diff;
pub mod error;
pub mod neighbor;
pub mod ports;
pub mod probe;
pub mod range;
pub mod report;
pub mod scanner;
pub mod vendor;

pub use scanner::ScanOrchestrator;
