//! Health, status, and model-switch endpoints

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use super::ApiState;
use crate::gemini;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_secs: u64,
    pub active_sessions: usize,
    pub timestamp: String,
}

/// System status response including model info
#[derive(Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub model: String,
    pub available_models: Vec<&'static str>,
    pub active_sessions: usize,
    pub timestamp: String,
}

/// Model-switch request body
#[derive(Deserialize)]
pub struct SwitchModelRequest {
    pub model: String,
}

/// Model-switch outcome
#[derive(Serialize)]
pub struct SwitchModelResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_model: Option<String>,
}

/// Liveness probe with uptime and session count
async fn health(State(state): State<Arc<ApiState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        uptime_secs: state.started_at.elapsed().as_secs(),
        active_sessions: state.store.len().await,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// Current model selection and the permitted model list
async fn status(State(state): State<Arc<ApiState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "running",
        model: state.gemini.current_model().await,
        available_models: gemini::AVAILABLE_MODELS.to_vec(),
        active_sessions: state.store.len().await,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// Switch the generation model; unknown models are rejected with 400 and
/// leave the selection untouched
async fn switch_model(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<SwitchModelRequest>,
) -> (StatusCode, Json<SwitchModelResponse>) {
    match state.gemini.set_model(&request.model).await {
        Ok(model) => (
            StatusCode::OK,
            Json(SwitchModelResponse {
                success: true,
                message: format!("Switched to model: {model}"),
                current_model: Some(model),
            }),
        ),
        Err(e) => {
            tracing::warn!(model = %request.model, error = %e, "model switch rejected");
            (
                StatusCode::BAD_REQUEST,
                Json(SwitchModelResponse {
                    success: false,
                    message: e.to_string(),
                    current_model: None,
                }),
            )
        }
    }
}

/// Build the health/status router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/status", get(status))
        .route("/api/switch-model", post(switch_model))
        .with_state(state)
}
