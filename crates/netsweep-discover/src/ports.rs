//! TCP connect probing of a fixed port set.

use std::collections::BTreeSet;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::net::TcpStream;
use tokio::sync::Semaphore;
use tokio::time::timeout;

/// Ports probed on every live host.
pub const COMMON_PORTS: [u16; 10] = [21, 22, 23, 25, 80, 443, 445, 3389, 8080, 8443];

/// Connects to each candidate port of a host concurrently.
///
/// Every attempt holds a permit from `connects` for its duration, so one
/// semaphore shared between scanners caps open sockets for a whole sweep.
#[derive(Clone)]
pub struct PortScanner {
    ports: Arc<[u16]>,
    connect_timeout: Duration,
    connects: Arc<Semaphore>,
}

impl PortScanner {
    pub fn new(connect_timeout: Duration, connects: Arc<Semaphore>) -> Self {
        Self::with_ports(&COMMON_PORTS, connect_timeout, connects)
    }

    /// Scanner over an explicit candidate set. Duplicates are dropped.
    pub fn with_ports(ports: &[u16], connect_timeout: Duration, connects: Arc<Semaphore>) -> Self {
        let unique: BTreeSet<u16> = ports.iter().copied().filter(|p| *p != 0).collect();
        Self {
            ports: unique.into_iter().collect(),
            connect_timeout,
            connects,
        }
    }

    pub fn ports(&self) -> &[u16] {
        &self.ports
    }

    /// Return the open subset of the candidate ports.
    ///
    /// Waits for every attempt; latency is that of the slowest one.
    pub async fn scan(&self, ip: Ipv4Addr) -> BTreeSet<u16> {
        let attempts = self.ports.iter().map(move |&port| async move {
            self.is_open(SocketAddr::from((ip, port))).await.then_some(port)
        });

        join_all(attempts).await.into_iter().flatten().collect()
    }

    async fn is_open(&self, addr: SocketAddr) -> bool {
        let Ok(_permit) = self.connects.acquire().await else {
            return false;
        };

        match timeout(self.connect_timeout, TcpStream::connect(addr)).await {
            Ok(Ok(_stream)) => {
                tracing::trace!(addr = %addr, "Port open");
                true
            }
            Ok(Err(e)) => {
                tracing::trace!(addr = %addr, error = %e, "Connect failed");
                false
            }
            Err(_) => {
                tracing::trace!(addr = %addr, "Connect timed out");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use tokio::net::{TcpListener, TcpSocket};

    use super::*;

    async fn listener() -> (TcpListener, u16) {
        let l = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = l.local_addr().unwrap().port();
        (l, port)
    }

    /// A loopback port with nothing listening on it.
    async fn closed_port() -> u16 {
        let (l, port) = listener().await;
        drop(l);
        port
    }

    fn scanner(ports: &[u16]) -> PortScanner {
        PortScanner::with_ports(ports, Duration::from_millis(500), Arc::new(Semaphore::new(64)))
    }

    #[test]
    fn test_default_port_set() {
        let s = PortScanner::new(Duration::from_millis(500), Arc::new(Semaphore::new(1)));
        assert_eq!(s.ports(), &COMMON_PORTS);
    }

    #[tokio::test]
    async fn test_open_and_closed_ports() {
        let (_open, open_port) = listener().await;
        let closed = closed_port().await;

        let found = scanner(&[closed, open_port]).scan(Ipv4Addr::LOCALHOST).await;
        assert_eq!(found, BTreeSet::from([open_port]));
    }

    #[tokio::test]
    async fn test_result_independent_of_port_order() {
        let (_a, pa) = listener().await;
        let (_b, pb) = listener().await;
        let closed = closed_port().await;

        let forward = scanner(&[pa, closed, pb]).scan(Ipv4Addr::LOCALHOST).await;
        let reverse = scanner(&[pb, closed, pa]).scan(Ipv4Addr::LOCALHOST).await;

        assert_eq!(forward, reverse);
        assert_eq!(forward, BTreeSet::from([pa, pb]));
    }

    #[tokio::test]
    async fn test_open_ports_are_subset_of_candidates() {
        let (_l, port) = listener().await;
        let s = scanner(&[port, port, 0]);
        assert_eq!(s.ports(), &[port]);

        let found = s.scan(Ipv4Addr::LOCALHOST).await;
        assert!(found.iter().all(|p| s.ports().contains(p)));
    }

    #[tokio::test]
    async fn test_single_permit_still_completes() {
        let (_a, pa) = listener().await;
        let (_b, pb) = listener().await;
        let s = PortScanner::with_ports(
            &[pa, pb],
            Duration::from_millis(500),
            Arc::new(Semaphore::new(1)),
        );
        assert_eq!(s.scan(Ipv4Addr::LOCALHOST).await, BTreeSet::from([pa, pb]));
    }

    #[tokio::test]
    async fn test_closed_semaphore_reports_closed() {
        let (_l, port) = listener().await;
        let permits = Arc::new(Semaphore::new(4));
        permits.close();
        let s = PortScanner::with_ports(&[port], Duration::from_millis(500), permits);
        assert!(s.scan(Ipv4Addr::LOCALHOST).await.is_empty());
    }

    #[tokio::test]
    async fn test_stalled_connect_hits_timeout() {
        // A listener with a zero backlog that never accepts: once its queue
        // holds one connection, further SYNs are dropped and connects hang.
        let socket = TcpSocket::new_v4().unwrap();
        socket.bind("127.0.0.1:0".parse().unwrap()).unwrap();
        let listener = socket.listen(0).unwrap();
        let addr = listener.local_addr().unwrap();

        let mut held = Vec::new();
        let mut stalled = false;
        for _ in 0..16 {
            match timeout(Duration::from_millis(200), TcpStream::connect(addr)).await {
                Ok(Ok(stream)) => held.push(stream),
                Ok(Err(_)) => break,
                Err(_) => {
                    stalled = true;
                    break;
                }
            }
        }
        assert!(stalled, "accept queue never filled");

        let s = PortScanner::with_ports(
            &[addr.port()],
            Duration::from_millis(100),
            Arc::new(Semaphore::new(4)),
        );
        let start = Instant::now();
        let found = s.scan(Ipv4Addr::LOCALHOST).await;
        let elapsed = start.elapsed();

        assert!(found.is_empty());
        assert!(elapsed >= Duration::from_millis(100), "returned after {elapsed:?}");
        assert!(elapsed < Duration::from_secs(1), "returned after {elapsed:?}");
        drop(listener);
    }
}
