//! Error types for the netsweep-discover crate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiscoverError {
    #[error("Invalid CIDR block {cidr:?}: {reason}")]
    InvalidCidr { cidr: String, reason: String },

    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, DiscoverError>;
