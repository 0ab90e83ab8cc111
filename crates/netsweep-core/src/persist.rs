//! JSON persistence for scan results.
//!
//! One file holds one `ScanResult`:
//! ```text
//! { "timestamp": "...", "network": "192.168.1.0/24", "hosts": [ ... ] }
//! ```

use std::fs;
use std::path::Path;

use crate::error::{PersistError, Result};
use crate::types::ScanResult;

/// Write a scan result as pretty-printed JSON, creating parent directories.
pub fn save_scan(path: impl AsRef<Path>, result: &ScanResult) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| io_error(path, e))?;
    }

    let json = serde_json::to_string_pretty(result)?;
    fs::write(path, json).map_err(|e| io_error(path, e))?;

    tracing::debug!(
        path = %path.display(),
        hosts = result.len(),
        "Scan result saved"
    );

    Ok(())
}

/// Read a scan result previously written by [`save_scan`].
pub fn load_scan(path: impl AsRef<Path>) -> Result<ScanResult> {
    let path = path.as_ref();
    let json = fs::read_to_string(path).map_err(|e| io_error(path, e))?;
    let result: ScanResult = serde_json::from_str(&json)?;
    Ok(result.normalized())
}

fn io_error(path: &Path, source: std::io::Error) -> PersistError {
    PersistError::Io {
        path: path.to_path_buf(),
        source,
    }
}
