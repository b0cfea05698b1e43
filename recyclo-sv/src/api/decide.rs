//! Decision submission
//!
//! POST /api/decide takes a prediction made elsewhere (label plus
//! confidence) and returns disposal advice.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use recyclo_common::db::NewDecisionRecord;
use recyclo_common::{Decision, ItemAttributes};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use super::user::OptionalUser;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct DecideRequest {
    #[serde(default, alias = "material")]
    pub material_label: Option<String>,
    pub confidence: Option<f64>,
    /// Arbitrary flags, normalized by `ItemAttributes::from_json`
    #[serde(default, alias = "attrs")]
    pub attributes: Option<Value>,
    #[serde(default, alias = "city")]
    pub locale: Option<String>,
}

/// POST /api/decide
pub async fn decide(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    payload: Result<Json<DecideRequest>, JsonRejection>,
) -> Result<Json<Decision>, DecideError> {
    let Json(request) = payload.map_err(|e| DecideError::BadRequest(e.body_text()))?;

    let confidence = request
        .confidence
        .ok_or_else(|| DecideError::BadRequest("confidence is required".to_string()))?;
    let attrs = ItemAttributes::from_json(request.attributes.as_ref());

    let decision = state.engine.decide(
        request.material_label.as_deref().unwrap_or_default(),
        confidence,
        &attrs,
        request.locale.as_deref(),
    )?;

    record_decision(&state, user.as_deref(), &decision).await;

    Ok(Json(decision))
}

/// Append the decision to the user's history.
///
/// Anonymous callers are not logged. Failures are logged and dropped so the
/// caller still gets the advice.
pub async fn record_decision(state: &AppState, user: Option<&str>, decision: &Decision) {
    let Some(user_id) = user else {
        return;
    };

    let record = NewDecisionRecord {
        user_id: user_id.to_string(),
        label: decision.action.clone(),
        category: decision.category,
        confidence: decision.confidence,
        locale: decision.locale.key().to_string(),
    };

    if let Err(e) = state.logs.insert(&record).await {
        warn!("Failed to log decision for user {}: {}", user_id, e);
    }
}

#[derive(Debug)]
pub enum DecideError {
    BadRequest(String),
    Internal(String),
}

impl From<recyclo_common::Error> for DecideError {
    fn from(e: recyclo_common::Error) -> Self {
        match e {
            recyclo_common::Error::InvalidInput(msg) => DecideError::BadRequest(msg),
            other => DecideError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for DecideError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            DecideError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            DecideError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
