use std::path::PathBuf;

use thiserror::Error;

/// Failure to save or load a scan result.
///
/// This is the only error class that reaches callers of the scan pipeline;
/// probing failures are absorbed as absent hosts or closed ports.
#[derive(Error, Debug)]
pub enum PersistError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PersistError>;
