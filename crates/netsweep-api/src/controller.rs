//! Scan lifecycle state machine.
//!
//! ```text
//!   Idle ──trigger──▶ Scanning ──sweep finished──▶ Idle (+ new snapshot)
//!          (409 if already Scanning)
//! ```
//!
//! State lives in a `tokio::sync::watch` channel. Transitions go through
//! `send_if_modified` / `send_modify`, so exactly one trigger can win the
//! Idle → Scanning edge. Readers take a cloned snapshot via `borrow()` and
//! never wait for an in-flight sweep.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use netsweep_core::ScanResult;
use netsweep_discover::diff::{diff_scans, HostDiff};
use netsweep_discover::vendor::VendorLookup;
use netsweep_discover::ScanOrchestrator;
use serde::Serialize;
use tokio::sync::watch;

use crate::error::{ApiError, Result};

/// Produces a complete, enriched scan of a network.
#[async_trait]
pub trait Sweeper: Send + Sync + 'static {
    async fn sweep(&self, network: &str) -> ScanResult;
}

/// The production sweep: orchestrator followed by optional vendor lookup.
pub struct SweepPipeline {
    orchestrator: ScanOrchestrator,
    vendors: Option<VendorLookup>,
}

impl SweepPipeline {
    pub fn new(orchestrator: ScanOrchestrator, vendors: Option<VendorLookup>) -> Self {
        Self {
            orchestrator,
            vendors,
        }
    }
}

#[async_trait]
impl Sweeper for SweepPipeline {
    async fn sweep(&self, network: &str) -> ScanResult {
        let result = self.orchestrator.scan(network).await;
        match &self.vendors {
            Some(lookup) => lookup.enrich(result).await,
            None => result,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Scanning {
        started_at: DateTime<Utc>,
    },
}

/// A completed scan, numbered in completion order starting at 1.
#[derive(Debug)]
pub struct Snapshot {
    pub version: u64,
    pub result: ScanResult,
}

#[derive(Debug, Clone, Default)]
pub struct ControllerState {
    pub phase: Phase,
    pub latest: Option<Arc<Snapshot>>,
    pub previous: Option<Arc<Snapshot>>,
}

impl ControllerState {
    pub fn is_scanning(&self) -> bool {
        matches!(self.phase, Phase::Scanning { .. })
    }
}

/// Body of `GET /status`.
#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub scanning: bool,
    pub network: String,
    pub scan_started_at: Option<DateTime<Utc>>,
    pub last_scan: Option<DateTime<Utc>>,
    pub host_count: usize,
    pub version: u64,
}

/// Owns the scan lifecycle for one configured network.
#[derive(Clone)]
pub struct ScanController {
    network: Arc<str>,
    sweeper: Arc<dyn Sweeper>,
    state: Arc<watch::Sender<ControllerState>>,
}

impl ScanController {
    pub fn new(network: &str, sweeper: Arc<dyn Sweeper>) -> Self {
        let (state, _) = watch::channel(ControllerState::default());
        Self {
            network: Arc::from(network),
            sweeper,
            state: Arc::new(state),
        }
    }

    pub fn network(&self) -> &str {
        &self.network
    }

    /// Start a background sweep. Fails if one is already running.
    pub fn trigger(&self) -> Result<DateTime<Utc>> {
        let started_at = Utc::now();
        let accepted = self.state.send_if_modified(|state| match state.phase {
            Phase::Scanning { .. } => false,
            Phase::Idle => {
                state.phase = Phase::Scanning { started_at };
                true
            }
        });

        if !accepted {
            tracing::info!(network = %self.network, "Scan trigger rejected, sweep in flight");
            return Err(ApiError::ScanInProgress);
        }

        tracing::info!(network = %self.network, "Scan triggered");
        let this = self.clone();
        tokio::spawn(async move { this.run().await });
        Ok(started_at)
    }

    /// Run the sweep in its own task so a panic still returns us to Idle.
    async fn run(self) {
        let sweeper = self.sweeper.clone();
        let network = self.network.to_string();
        let outcome = tokio::spawn(async move { sweeper.sweep(&network).await }).await;

        let mut published = None;
        self.state.send_modify(|state| {
            state.phase = Phase::Idle;
            match outcome {
                Ok(result) => {
                    let version = state.latest.as_ref().map_or(1, |s| s.version + 1);
                    let snapshot = Arc::new(Snapshot { version, result });
                    state.previous = state.latest.replace(snapshot.clone());
                    published = Some((state.previous.clone(), snapshot));
                }
                Err(e) => {
                    tracing::error!(network = %self.network, error = %e, "Sweep task failed");
                }
            }
        });

        if let Some((previous, latest)) = published {
            let hosts = latest.result.len();
            match previous {
                Some(previous) => {
                    let diff = diff_scans(&previous.result, &latest.result);
                    tracing::info!(
                        version = latest.version,
                        hosts,
                        added = diff.summary.added_count,
                        removed = diff.summary.removed_count,
                        "Scan published"
                    );
                }
                None => tracing::info!(version = latest.version, hosts, "Scan published"),
            }
        }
    }

    /// A consistent copy of the current state.
    pub fn snapshot(&self) -> ControllerState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ControllerState> {
        self.state.subscribe()
    }

    pub fn latest(&self) -> Result<Arc<Snapshot>> {
        self.snapshot().latest.ok_or(ApiError::NoResults)
    }

    pub fn status(&self) -> StatusReport {
        let state = self.snapshot();
        let scan_started_at = match state.phase {
            Phase::Scanning { started_at } => Some(started_at),
            Phase::Idle => None,
        };
        StatusReport {
            scanning: state.is_scanning(),
            network: self.network.to_string(),
            scan_started_at,
            last_scan: state.latest.as_ref().map(|s| s.result.timestamp()),
            host_count: state.latest.as_ref().map_or(0, |s| s.result.len()),
            version: state.latest.as_ref().map_or(0, |s| s.version),
        }
    }

    /// Hosts added and removed between the last two completed scans.
    pub fn changes(&self) -> Result<HostDiff> {
        let state = self.snapshot();
        match (state.previous, state.latest) {
            (Some(previous), Some(latest)) => Ok(diff_scans(&previous.result, &latest.result)),
            _ => Err(ApiError::NotEnoughScans),
        }
    }
}
