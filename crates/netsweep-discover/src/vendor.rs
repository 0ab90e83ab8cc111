//! MAC vendor enrichment over an HTTP lookup service.
//!
//! Runs after a sweep completes, on a finished `ScanResult`; the scan engine
//! itself never calls out to the network for names.

use std::time::Duration;

use netsweep_core::{Host, ScanResult};
use reqwest::{Client, StatusCode};

/// Vendor reported for hosts whose MAC could not be resolved.
pub const NOT_APPLICABLE: &str = "N/A";
/// Vendor reported when the service has no entry for the MAC.
pub const UNKNOWN_VENDOR: &str = "Unknown Vendor";
/// Vendor reported when the service could not be reached or read.
pub const LOOKUP_FAILED: &str = "Lookup Failed";

const MAX_VENDOR_CHARS: usize = 23;

/// Client for a `GET {base_url}/{mac}` vendor service returning plain text.
pub struct VendorLookup {
    client: Client,
    base_url: String,
}

impl VendorLookup {
    pub fn new(base_url: &str, timeout: Duration) -> reqwest::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("netsweep/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Display name for the vendor of `mac`. Never fails; failures map to
    /// the constants above.
    pub async fn lookup(&self, mac: &str) -> String {
        if mac == netsweep_core::UNKNOWN_MAC {
            return NOT_APPLICABLE.to_string();
        }

        let url = format!("{}/{}", self.base_url, mac);
        let response = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!(mac = %mac, error = %e, "Vendor lookup request failed");
                return LOOKUP_FAILED.to_string();
            }
        };

        if response.status() != StatusCode::OK {
            tracing::debug!(mac = %mac, status = %response.status(), "Vendor not found");
            return UNKNOWN_VENDOR.to_string();
        }

        match response.text().await {
            Ok(body) => truncate_vendor(body.trim()),
            Err(e) => {
                tracing::debug!(mac = %mac, error = %e, "Vendor lookup body unreadable");
                LOOKUP_FAILED.to_string()
            }
        }
    }

    /// Return a copy of `result` with every host's vendor resolved.
    ///
    /// Hosts are looked up one at a time; public lookup services rate-limit
    /// bursts.
    pub async fn enrich(&self, result: ScanResult) -> ScanResult {
        let mut vendors = Vec::with_capacity(result.len());
        for host in result.hosts() {
            let vendor = if host.mac_known() {
                self.lookup(&host.mac).await
            } else {
                NOT_APPLICABLE.to_string()
            };
            vendors.push(vendor);
        }

        let mut vendors = vendors.into_iter();
        result.map_hosts(|host: Host| match vendors.next() {
            Some(vendor) => host.with_vendor(vendor),
            None => host,
        })
    }
}

fn truncate_vendor(name: &str) -> String {
    name.chars().take(MAX_VENDOR_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::net::Ipv4Addr;

    use axum::extract::Path;
    use axum::http::StatusCode as AxumStatus;
    use axum::routing::get;
    use axum::Router;

    use super::*;

    async fn vendor_for(Path(mac): Path<String>) -> Result<String, AxumStatus> {
        match mac.as_str() {
            "aa:bb:cc:00:00:01" => Ok("  Acme Networks  \n".to_string()),
            "aa:bb:cc:00:00:02" => Ok("Extremely Long Vendor Name Incorporated".to_string()),
            _ => Err(AxumStatus::NOT_FOUND),
        }
    }

    async fn spawn_service() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().route("/:mac", get(vendor_for));
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/")
    }

    fn lookup(base: &str) -> VendorLookup {
        VendorLookup::new(base, Duration::from_secs(2)).unwrap()
    }

    #[test]
    fn test_truncate_vendor() {
        assert_eq!(truncate_vendor("Short"), "Short");
        assert_eq!(truncate_vendor("ABCDEFGHIJKLMNOPQRSTUVWXYZ"), "ABCDEFGHIJKLMNOPQRSTUVW");
        assert_eq!(truncate_vendor("Ünïcödé Vendor GmbH & Co. KG").chars().count(), 23);
    }

    #[tokio::test]
    async fn test_unknown_mac_skips_lookup() {
        let v = lookup("http://127.0.0.1:9");
        assert_eq!(v.lookup("Unknown").await, NOT_APPLICABLE);
    }

    #[tokio::test]
    async fn test_lookup_outcomes() {
        let v = lookup(&spawn_service().await);
        assert_eq!(v.lookup("aa:bb:cc:00:00:01").await, "Acme Networks");
        assert_eq!(v.lookup("aa:bb:cc:00:00:02").await, "Extremely Long Vendor N");
        assert_eq!(v.lookup("aa:bb:cc:00:00:03").await, UNKNOWN_VENDOR);
    }

    #[tokio::test]
    async fn test_unreachable_service() {
        let port = {
            let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            l.local_addr().unwrap().port()
        };
        let v = lookup(&format!("http://127.0.0.1:{port}"));
        assert_eq!(v.lookup("aa:bb:cc:00:00:01").await, LOOKUP_FAILED);
    }

    #[tokio::test]
    async fn test_enrich_attaches_vendors() {
        let v = lookup(&spawn_service().await);
        let result = ScanResult::new(
            "10.0.0.0/30",
            vec![
                Host::new(Ipv4Addr::new(10, 0, 0, 1), "aa:bb:cc:00:00:01", BTreeSet::new()),
                Host::new(Ipv4Addr::new(10, 0, 0, 2), "Unknown", BTreeSet::from([22])),
            ],
        );

        let enriched = v.enrich(result.clone()).await;
        assert_eq!(enriched.timestamp(), result.timestamp());
        assert_eq!(
            enriched.host(Ipv4Addr::new(10, 0, 0, 1)).unwrap().vendor.as_deref(),
            Some("Acme Networks")
        );
        assert_eq!(
            enriched.host(Ipv4Addr::new(10, 0, 0, 2)).unwrap().vendor.as_deref(),
            Some(NOT_APPLICABLE)
        );
    }
}
