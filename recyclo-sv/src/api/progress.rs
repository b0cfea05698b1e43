//! Per-user progress: summary, history listing and history deletion

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use recyclo_common::db::{clamp_limit, DecisionRecord};
use recyclo_common::summary::Summary;
use recyclo_common::time::{format_timestamp, today};
use recyclo_common::NormalizedCategory;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use super::user::RequiredUser;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub ok: bool,
    #[serde(flatten)]
    pub summary: Summary,
}

/// GET /api/progress/summary
pub async fn progress_summary(
    State(state): State<AppState>,
    RequiredUser(user): RequiredUser,
) -> Result<Json<SummaryResponse>, ProgressError> {
    let summary = state
        .logs
        .summary(&user, today())
        .await
        .map_err(|e| ProgressError::DatabaseError(e.to_string()))?;

    Ok(Json(SummaryResponse { ok: true, summary }))
}

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct LogEntry {
    pub id: i64,
    /// RFC 3339, null for rows without a readable timestamp
    pub ts: Option<String>,
    pub label: String,
    pub category: NormalizedCategory,
    pub confidence: Option<f64>,
    pub city: Option<String>,
}

impl From<DecisionRecord> for LogEntry {
    fn from(record: DecisionRecord) -> Self {
        Self {
            id: record.id,
            ts: record.created_at.as_ref().map(format_timestamp),
            label: record.label,
            category: record.category,
            confidence: record.confidence,
            city: record.locale,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LogsResponse {
    pub ok: bool,
    pub logs: Vec<LogEntry>,
}

/// GET /api/progress/logs?limit=N
///
/// Newest first; `limit` defaults to 200 and is clamped to 1..=1000.
pub async fn progress_logs(
    State(state): State<AppState>,
    RequiredUser(user): RequiredUser,
    query: Result<Query<LogsQuery>, QueryRejection>,
) -> Result<Json<LogsResponse>, ProgressError> {
    let Query(query) = query.map_err(|e| ProgressError::InvalidQuery(e.body_text()))?;

    let records = state
        .logs
        .recent(&user, clamp_limit(query.limit))
        .await
        .map_err(|e| ProgressError::DatabaseError(e.to_string()))?;

    Ok(Json(LogsResponse {
        ok: true,
        logs: records.into_iter().map(LogEntry::from).collect(),
    }))
}

/// DELETE /api/logs
pub async fn clear_logs(
    State(state): State<AppState>,
    RequiredUser(user): RequiredUser,
) -> Result<Json<serde_json::Value>, ProgressError> {
    let deleted = state
        .logs
        .delete_all(&user)
        .await
        .map_err(|e| ProgressError::DatabaseError(e.to_string()))?;

    info!("Deleted {} decision log rows for user {}", deleted, user);
    Ok(Json(json!({ "ok": true, "deleted": deleted })))
}

#[derive(Debug)]
pub enum ProgressError {
    InvalidQuery(String),
    DatabaseError(String),
}

impl IntoResponse for ProgressError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ProgressError::InvalidQuery(msg) => (StatusCode::BAD_REQUEST, msg),
            ProgressError::DatabaseError(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, format!("Database error: {}", msg))
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
