//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use homestay_common::config::StorageBackend;
use serde::Serialize;

use crate::AppState;

/// Health check response: status, module name, version, and active media backend
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
    pub storage: StorageBackend,
}

/// GET /health
///
/// Does not require a session.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module: "homestay-web".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        storage: state.media.backend(),
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
