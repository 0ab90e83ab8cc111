//! CIDR block enumeration.
//!
//! Every address inside the mask is returned, network and broadcast
//! included. No exclusion is applied even for /0../30 blocks.

use std::net::Ipv4Addr;

use ipnet::Ipv4Net;

use crate::error::{DiscoverError, Result};

/// Lazy ascending walk over the addresses of one block.
///
/// Holds two counters regardless of block size; a /8 costs the same as a /30
/// until it is iterated.
#[derive(Debug, Clone)]
pub struct AddressRange {
    next: u64,
    end: u64,
}

impl AddressRange {
    fn empty() -> Self {
        Self { next: 0, end: 0 }
    }

    /// Addresses not yet yielded.
    pub fn remaining(&self) -> u64 {
        self.end - self.next
    }
}

impl Iterator for AddressRange {
    type Item = Ipv4Addr;

    fn next(&mut self) -> Option<Ipv4Addr> {
        if self.next >= self.end {
            return None;
        }
        let ip = Ipv4Addr::from(self.next as u32);
        self.next += 1;
        Some(ip)
    }

    fn nth(&mut self, n: usize) -> Option<Ipv4Addr> {
        self.next = self.next.saturating_add(n as u64).min(self.end);
        self.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let exact = usize::try_from(self.remaining()).ok();
        (exact.unwrap_or(usize::MAX), exact)
    }
}

/// Walk every address of a CIDR block, ascending.
///
/// A base address with host bits set (`10.0.0.5/30`) is truncated to its
/// network, so the walk is the same as for `10.0.0.4/30`.
pub fn addresses(cidr: &str) -> Result<AddressRange> {
    let net = parse_block(cidr)?;
    Ok(AddressRange {
        next: u64::from(u32::from(net.network())),
        end: u64::from(u32::from(net.broadcast())) + 1,
    })
}

/// Expand a CIDR block into every address it contains, ascending.
pub fn enumerate(cidr: &str) -> Result<Vec<Ipv4Addr>> {
    Ok(addresses(cidr)?.collect())
}

/// Orchestrator-facing variant of [`addresses`]: a malformed block yields
/// no addresses instead of an error.
pub fn enumerate_or_empty(cidr: &str) -> AddressRange {
    match addresses(cidr) {
        Ok(range) => range,
        Err(e) => {
            tracing::warn!(cidr = %cidr, error = %e, "Unparseable network, nothing to scan");
            AddressRange::empty()
        }
    }
}

/// Number of addresses in a block without materializing them. Doubles as
/// the up-front validity check for a configured target.
pub fn block_size(cidr: &str) -> Result<u64> {
    Ok(addresses(cidr)?.remaining())
}

fn parse_block(cidr: &str) -> Result<Ipv4Net> {
    cidr.trim()
        .parse::<Ipv4Net>()
        .map_err(|e| DiscoverError::InvalidCidr {
            cidr: cidr.to_string(),
            reason: e.to_string(),
        })
}
