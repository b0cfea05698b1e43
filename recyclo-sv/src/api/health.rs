//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
    /// Model class names in output order
    pub classes: Vec<String>,
    /// Confidence threshold of the gate
    pub threshold: f64,
    pub classifier: bool,
}

/// GET /health
///
/// No authentication.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module: "recyclo-sv".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        classes: state.labels.names().to_vec(),
        threshold: state.engine.gate().threshold(),
        classifier: state.classifier.is_some(),
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
