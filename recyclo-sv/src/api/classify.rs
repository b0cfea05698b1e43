//! Image classification
//!
//! POST /api/classify decodes an uploaded image, asks the configured
//! classifier for class probabilities and runs the same decision pipeline
//! as /api/decide on the top prediction.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use recyclo_common::classifier::{decode_image_payload, prepare_image, Prediction};
use recyclo_common::{Decision, ItemAttributes};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::decide::record_decision;
use super::user::OptionalUser;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ClassifyRequest {
    /// Base64 or data URL
    #[serde(default)]
    pub image_data: Option<String>,
    #[serde(default, alias = "attributes")]
    pub attrs: Option<Value>,
    #[serde(default, alias = "locale")]
    pub city: Option<String>,
}

/// POST /api/classify
pub async fn classify(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
    payload: Result<Json<ClassifyRequest>, JsonRejection>,
) -> Result<Json<Decision>, ClassifyError> {
    let Json(request) = payload.map_err(|e| ClassifyError::BadRequest(e.body_text()))?;

    let classifier = state.classifier.clone().ok_or(ClassifyError::Unavailable)?;

    let image_data = request
        .image_data
        .filter(|data| !data.trim().is_empty())
        .ok_or_else(|| ClassifyError::BadRequest("No image data provided.".to_string()))?;

    // Decoding and resizing are CPU-bound
    let image = tokio::task::spawn_blocking(move || {
        decode_image_payload(&image_data).map(|img| prepare_image(&img))
    })
    .await
    .map_err(|e| ClassifyError::Internal(format!("image task failed: {}", e)))?
    .map_err(|e| ClassifyError::BadRequest(e.to_string()))?;

    let probabilities = classifier.predict(&image).await.map_err(|e| {
        warn!("Classifier '{}' failed: {}", classifier.name(), e);
        ClassifyError::Classifier(e.to_string())
    })?;

    let prediction = Prediction::from_probabilities(&probabilities, &state.labels)
        .map_err(|e| ClassifyError::Classifier(e.to_string()))?;
    debug!(
        "Prediction: {} (index {}, {:.3})",
        prediction.label, prediction.index, prediction.confidence
    );

    let attrs = ItemAttributes::from_json(request.attrs.as_ref());
    let decision = state
        .engine
        .decide(
            &prediction.label,
            prediction.confidence,
            &attrs,
            request.city.as_deref(),
        )
        .map_err(|e| ClassifyError::Internal(e.to_string()))?;

    record_decision(&state, user.as_deref(), &decision).await;

    Ok(Json(decision))
}

#[derive(Debug)]
pub enum ClassifyError {
    BadRequest(String),
    /// No classifier configured
    Unavailable,
    /// Classifier unreachable or returned an unusable prediction
    Classifier(String),
    Internal(String),
}

impl IntoResponse for ClassifyError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ClassifyError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ClassifyError::Unavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "No classifier configured".to_string(),
            ),
            ClassifyError::Classifier(msg) => (StatusCode::BAD_GATEWAY, msg),
            ClassifyError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
