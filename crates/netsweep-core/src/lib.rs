//! netsweep-core: Shared scan types, persistence, and error handling.
//!
//! This crate provides the value types every netsweep component exchanges:
//! - `Host` and `ScanResult`, the immutable output of one sweep
//! - JSON persistence of scan results
//! - Common error types

pub mod error;
pub mod persist;
pub mod types;

pub use error::PersistError;
pub use types::{Host, ScanResult, UNKNOWN_MAC};
