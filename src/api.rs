// src/api.rs
//! Ops surface: health probe, Prometheus exposition, manual trigger.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;

use crate::error::PipelineError;
use crate::pipeline::IdeaPipeline;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<IdeaPipeline>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/trigger", post(trigger))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(serde::Serialize)]
struct TriggerError {
    error: String,
    stage: &'static str,
    kind: &'static str,
}

/// Run the pipeline once and return the validated result. 409 while a run
/// is in flight, 502 when the run fails (the chat got the failure notice
/// already; this is the operator's copy).
async fn trigger(State(state): State<AppState>) -> Response {
    match state.pipeline.trigger().await {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) => {
            let status = match e {
                PipelineError::ConcurrentRunRejected => StatusCode::CONFLICT,
                _ => StatusCode::BAD_GATEWAY,
            };
            let body = TriggerError {
                error: e.to_string(),
                stage: e.stage(),
                kind: e.kind(),
            };
            (status, Json(body)).into_response()
        }
    }
}
