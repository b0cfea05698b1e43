//! recyclo-sv library - disposal advisor HTTP service
//!
//! Classification results in, disposal advice out; per-user history and
//! progress summaries for signed-in users.

use axum::extract::DefaultBodyLimit;
use axum::Router;
use recyclo_common::classifier::{Classifier, LabelSet};
use recyclo_common::db::LogStore;
use recyclo_common::DecisionEngine;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod services;

/// Request bodies carry base64 images
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Decision history
    pub logs: LogStore,
    /// Immutable policy, tips and gate
    pub engine: Arc<DecisionEngine>,
    /// Model class names
    pub labels: Arc<LabelSet>,
    /// `None` disables `/api/classify`
    pub classifier: Option<Arc<dyn Classifier>>,
}

impl AppState {
    pub fn new(db: SqlitePool, engine: DecisionEngine, labels: LabelSet) -> Self {
        Self {
            logs: LogStore::new(db),
            engine: Arc::new(engine),
            labels: Arc::new(labels),
            classifier: None,
        }
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn Classifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }
}

/// Build application router
///
/// Progress routes reject anonymous callers through the `RequiredUser`
/// extractor; decision routes log only when a user is present.
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{delete, get, post};

    let progress = Router::new()
        .route("/api/progress/summary", get(api::progress_summary))
        .route("/api/progress/logs", get(api::progress_logs))
        .route("/api/logs", delete(api::clear_logs));

    let decisions = Router::new()
        .route("/api/decide", post(api::decide))
        .route("/api/classify", post(api::classify))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES));

    Router::new()
        .merge(progress)
        .merge(decisions)
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
