//! netsweep-api: HTTP control plane for the netsweep scanner.
//!
//! Starts at most one sweep at a time, keeps the most recent completed
//! result, and serves it without ever waiting on a sweep in progress.

pub mod controller;
pub mod error;
pub mod routes;

pub use controller::{ScanController, SweepPipeline, Sweeper};
pub use routes::router;
