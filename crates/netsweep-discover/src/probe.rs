//! Reachability probing and the probe-then-resolve protocol.
//!
//! The neighbor cache only learns an address after traffic has been sent to
//! it, so link-layer resolution is only meaningful after a reachability
//! probe against the same address. [`HostProber::resolve_host`] is the one
//! place that sequences the two.

use std::net::Ipv4Addr;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::neighbor::NeighborResolver;

/// Bounded-time liveness test for one address.
///
/// Implementations must return within their own timeout and report any
/// failure of the underlying mechanism as `false`.
#[async_trait]
pub trait ReachabilityProbe: Send + Sync {
    async fn is_reachable(&self, ip: Ipv4Addr) -> bool;
}

/// Reachability via one ICMP echo sent by the system `ping` utility.
pub struct PingProbe {
    ping_path: String,
    timeout: Duration,
}

impl PingProbe {
    pub fn new(ping_path: &str, timeout: Duration) -> Self {
        Self {
            ping_path: ping_path.to_string(),
            timeout,
        }
    }

    /// `-W` takes whole seconds; never pass 0, which means "wait forever" on
    /// some ping builds.
    fn wait_secs(&self) -> u64 {
        self.timeout.as_secs().max(1)
    }
}

#[async_trait]
impl ReachabilityProbe for PingProbe {
    async fn is_reachable(&self, ip: Ipv4Addr) -> bool {
        let child = Command::new(&self.ping_path)
            .args(["-c", "1", "-W"])
            .arg(self.wait_secs().to_string())
            .arg(ip.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status();

        match tokio::time::timeout(self.timeout, child).await {
            Ok(Ok(status)) => status.success(),
            Ok(Err(e)) => {
                tracing::debug!(ip = %ip, error = %e, "ping could not be spawned");
                false
            }
            Err(_) => {
                tracing::trace!(ip = %ip, "ping timed out");
                false
            }
        }
    }
}

/// Sequences "probe, then resolve" for a single address.
#[derive(Clone)]
pub struct HostProber {
    probe: Arc<dyn ReachabilityProbe>,
    resolver: Arc<dyn NeighborResolver>,
}

impl HostProber {
    pub fn new(probe: Arc<dyn ReachabilityProbe>, resolver: Arc<dyn NeighborResolver>) -> Self {
        Self { probe, resolver }
    }

    /// Probe `ip` and, only if it answered, look up its link-layer address.
    ///
    /// Returns `None` for an unreachable address. A reachable address whose
    /// neighbor entry is missing yields `Some("Unknown")`.
    pub async fn resolve_host(&self, ip: Ipv4Addr) -> Option<String> {
        if !self.probe.is_reachable(ip).await {
            return None;
        }
        Some(self.resolver.resolve(ip).await)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory collaborators shared by the probe and scanner tests.

    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;

    /// Which collaborator was called, in call order.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Call {
        Probe(Ipv4Addr),
        Resolve(Ipv4Addr),
    }

    pub type CallLog = Arc<Mutex<Vec<Call>>>;

    /// Answers from a fixed set of live addresses, optionally after a delay,
    /// and records the peak number of concurrent probes.
    pub struct StaticProbe {
        live: HashSet<Ipv4Addr>,
        delay: Duration,
        log: CallLog,
        in_flight: AtomicUsize,
        pub peak: AtomicUsize,
    }

    impl StaticProbe {
        pub fn new(live: impl IntoIterator<Item = Ipv4Addr>, log: CallLog) -> Self {
            Self {
                live: live.into_iter().collect(),
                delay: Duration::ZERO,
                log,
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }

        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    #[async_trait]
    impl ReachabilityProbe for StaticProbe {
        async fn is_reachable(&self, ip: Ipv4Addr) -> bool {
            self.log.lock().unwrap().push(Call::Probe(ip));
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.live.contains(&ip)
        }
    }

    /// Neighbor table backed by a map; misses resolve to "Unknown".
    pub struct StaticResolver {
        table: HashMap<Ipv4Addr, String>,
        log: CallLog,
    }

    impl StaticResolver {
        pub fn new(table: HashMap<Ipv4Addr, String>, log: CallLog) -> Self {
            Self { table, log }
        }
    }

    #[async_trait]
    impl NeighborResolver for StaticResolver {
        async fn resolve(&self, ip: Ipv4Addr) -> String {
            self.log.lock().unwrap().push(Call::Resolve(ip));
            self.table
                .get(&ip)
                .cloned()
                .unwrap_or_else(|| netsweep_core::UNKNOWN_MAC.to_string())
        }
    }
}
