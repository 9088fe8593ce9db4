//! Health check handlers.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};

use crate::state::AppState;

/// Health response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub status: String,
    pub version: String,
    pub timestamp: String,
    pub provider_configured: bool,
    pub sample_available: bool,
}

/// Health check endpoint for liveness checks.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
        provider_configured: state.provider.is_some(),
        sample_available: state.generator.sample_available(),
    })
}

/// Root greeting.
pub async fn root() -> Json<Value> {
    Json(json!({ "HELLO": true }))
}
