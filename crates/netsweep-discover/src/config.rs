//! Configuration for the netsweep scanner.

use std::time::Duration;

use serde::Deserialize;

use crate::error::{DiscoverError, Result};

/// Top-level sweep configuration.
///
/// Loaded from the `[sweep]` table of `netsweep.toml` or
/// `NETSWEEP__SWEEP__*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct SweepConfig {
    /// Network to sweep (CIDR notation).
    #[serde(default = "default_network")]
    pub network: String,

    /// Path to the ping binary used as the reachability primitive.
    #[serde(default = "default_ping_path")]
    pub ping_path: String,

    /// Path to the iproute2 `ip` binary used to read the neighbor cache.
    #[serde(default = "default_ip_path")]
    pub ip_path: String,

    /// Upper bound on a single reachability probe.
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,

    /// Upper bound on a single TCP connect attempt.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Maximum address pipelines in flight at once.
    #[serde(default = "default_max_hosts")]
    pub max_concurrent_hosts: usize,

    /// Maximum TCP connect attempts in flight at once, across all hosts.
    #[serde(default = "default_max_connects")]
    pub max_concurrent_connects: usize,

    /// Resolve vendor names for discovered MAC addresses.
    #[serde(default = "default_true")]
    pub vendor_lookup: bool,

    /// Base URL of the MAC vendor lookup service.
    #[serde(default = "default_vendor_api_url")]
    pub vendor_api_url: String,

    #[serde(default = "default_vendor_timeout_ms")]
    pub vendor_timeout_ms: u64,
}

impl SweepConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn vendor_timeout(&self) -> Duration {
        Duration::from_millis(self.vendor_timeout_ms)
    }

    /// Reject settings that would stall or never finish a sweep.
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent_hosts == 0 {
            return Err(DiscoverError::Config(
                "max_concurrent_hosts must be at least 1".to_string(),
            ));
        }
        if self.max_concurrent_connects == 0 {
            return Err(DiscoverError::Config(
                "max_concurrent_connects must be at least 1".to_string(),
            ));
        }
        if self.probe_timeout_ms == 0 || self.connect_timeout_ms == 0 {
            return Err(DiscoverError::Config("timeouts must be non-zero".to_string()));
        }
        Ok(())
    }

    /// Load from an optional `<file_prefix>.toml` and the environment.
    /// Missing sources fall back to defaults.
    pub fn load(file_prefix: &str) -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::File::with_name(file_prefix).required(false))
            .add_source(
                config::Environment::with_prefix("NETSWEEP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| DiscoverError::Config(e.to_string()))?;

        let sweep = match cfg.get::<SweepConfig>("sweep") {
            Ok(c) => c,
            Err(config::ConfigError::NotFound(_)) => SweepConfig::default(),
            Err(e) => return Err(DiscoverError::Config(e.to_string())),
        };
        sweep.validate()?;
        Ok(sweep)
    }
}

fn default_network() -> String {
    "192.168.1.0/24".to_string()
}

fn default_ping_path() -> String {
    "ping".to_string()
}

fn default_ip_path() -> String {
    "ip".to_string()
}

fn default_probe_timeout_ms() -> u64 {
    1000
}

fn default_connect_timeout_ms() -> u64 {
    500
}

fn default_max_hosts() -> usize {
    256
}

fn default_max_connects() -> usize {
    2560
}

fn default_true() -> bool {
    true
}

fn default_vendor_api_url() -> String {
    "https://api.macvendors.com".to_string()
}

fn default_vendor_timeout_ms() -> u64 {
    2000
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            network: default_network(),
            ping_path: default_ping_path(),
            ip_path: default_ip_path(),
            probe_timeout_ms: default_probe_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            max_concurrent_hosts: default_max_hosts(),
            max_concurrent_connects: default_max_connects(),
            vendor_lookup: default_true(),
            vendor_api_url: default_vendor_api_url(),
            vendor_timeout_ms: default_vendor_timeout_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = SweepConfig::default();
        assert_eq!(config.network, "192.168.1.0/24");
        assert_eq!(config.probe_timeout(), Duration::from_secs(1));
        assert_eq!(config.connect_timeout(), Duration::from_millis(500));
        assert_eq!(config.max_concurrent_hosts, 256);
        assert!(config.vendor_lookup);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_limits_rejected() {
        let config = SweepConfig {
            max_concurrent_hosts: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(DiscoverError::Config(_))));

        let config = SweepConfig {
            max_concurrent_connects: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file_with_partial_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("netsweep.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[sweep]\nnetwork = \"10.1.0.0/28\"\nmax_concurrent_hosts = 8\nvendor_lookup = false"
        )
        .unwrap();

        let prefix = dir.path().join("netsweep");
        let config = SweepConfig::load(prefix.to_str().unwrap()).unwrap();
        assert_eq!(config.network, "10.1.0.0/28");
        assert_eq!(config.max_concurrent_hosts, 8);
        assert!(!config.vendor_lookup);
        assert_eq!(config.connect_timeout_ms, 500);
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("missing");
        let config = SweepConfig::load(prefix.to_str().unwrap()).unwrap();
        assert_eq!(config.max_concurrent_connects, 2560);
    }
}
