//! Error types for the netsweep-api crate.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Scan already in progress")]
    ScanInProgress,

    #[error("No scan results available. Trigger a scan first with POST /scan")]
    NoResults,

    #[error("At least two completed scans are needed to report changes")]
    NotEnoughScans,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::ScanInProgress => StatusCode::CONFLICT,
            Self::NoResults | Self::NotEnoughScans => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.to_string() });
        (self.status(), Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
