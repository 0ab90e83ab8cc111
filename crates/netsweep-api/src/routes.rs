//! HTTP routes.
//!
//! ```text
//! GET  /           API information
//! POST /scan       trigger a background sweep (409 if one is running)
//! GET  /hosts      most recent completed scan
//! GET  /status     whether a sweep is running, last completion time
//! GET  /changes    hosts added / removed between the last two scans
//! ```

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::Router;
use serde_json::json;

use crate::controller::{ScanController, StatusReport};
use crate::error::Result;

pub fn router(controller: ScanController) -> Router {
    Router::new()
        .route("/", get(info))
        .route("/scan", post(trigger_scan))
        .route("/hosts", get(hosts))
        .route("/status", get(status))
        .route("/changes", get(changes))
        .with_state(controller)
}

async fn info(State(controller): State<ScanController>) -> impl IntoResponse {
    Json(json!({
        "name": "netsweep API",
        "version": env!("CARGO_PKG_VERSION"),
        "network": controller.network(),
        "endpoints": [
            "/scan (POST) - Trigger new scan",
            "/hosts (GET) - Get current hosts",
            "/status (GET) - Get scanner status",
            "/changes (GET) - Hosts added/removed since the previous scan",
        ],
    }))
}

async fn trigger_scan(State(controller): State<ScanController>) -> Result<impl IntoResponse> {
    let started_at = controller.trigger()?;
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "status": "Scan started",
            "message": "Scan running in background. Check /status for progress.",
            "started_at": started_at,
        })),
    ))
}

async fn hosts(State(controller): State<ScanController>) -> Result<impl IntoResponse> {
    let snapshot = controller.latest()?;
    Ok(Json(snapshot.result.clone()))
}

async fn status(State(controller): State<ScanController>) -> Json<StatusReport> {
    Json(controller.status())
}

async fn changes(State(controller): State<ScanController>) -> Result<impl IntoResponse> {
    Ok(Json(controller.changes()?))
}
