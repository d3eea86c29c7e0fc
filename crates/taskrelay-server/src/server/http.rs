//! HTTP control endpoints mirroring the WebSocket command set.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::warn;

use crate::agent::AgentError;

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct StartTaskRequest {
    pub task: String,
    #[serde(default)]
    pub images: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub message: String,
    #[serde(default)]
    pub images: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct CustomInstructionsRequest {
    #[serde(rename = "customInstructions")]
    pub custom_instructions: String,
}

#[derive(Debug, Serialize)]
pub struct ApiResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn ok() -> (StatusCode, Json<ApiResult>) {
    (
        StatusCode::OK,
        Json(ApiResult {
            success: true,
            error: None,
        }),
    )
}

fn failed(context: &str, error: &AgentError) -> (StatusCode, Json<ApiResult>) {
    warn!(context, %error, "HTTP operation failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiResult {
            success: false,
            error: Some(error.to_string()),
        }),
    )
}

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "taskrelay-server",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn api_info() -> Json<Value> {
    Json(json!({
        "name": "taskrelay",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            "GET /ws",
            "GET /health",
            "POST /api/start-task",
            "POST /api/send-message",
            "POST /api/press-primary-button",
            "POST /api/press-secondary-button",
            "GET /api/custom-instructions",
            "POST /api/custom-instructions",
        ],
    }))
}

pub async fn start_task(
    State(state): State<AppState>,
    Json(req): Json<StartTaskRequest>,
) -> (StatusCode, Json<ApiResult>) {
    match state.relay.start_task(&req.task, req.images).await {
        Ok(()) => ok(),
        Err(error) => failed("start_task", &error),
    }
}

pub async fn send_message(
    State(state): State<AppState>,
    Json(req): Json<SendMessageRequest>,
) -> (StatusCode, Json<ApiResult>) {
    match state.relay.send_message(&req.message, req.images).await {
        Ok(()) => ok(),
        Err(error) => failed("send_message", &error),
    }
}

pub async fn press_primary_button(State(state): State<AppState>) -> (StatusCode, Json<ApiResult>) {
    match state.relay.press_primary_button().await {
        Ok(()) => ok(),
        Err(error) => failed("press_primary_button", &error),
    }
}

pub async fn press_secondary_button(
    State(state): State<AppState>,
) -> (StatusCode, Json<ApiResult>) {
    match state.relay.press_secondary_button().await {
        Ok(()) => ok(),
        Err(error) => failed("press_secondary_button", &error),
    }
}

pub async fn get_custom_instructions(
    State(state): State<AppState>,
) -> (StatusCode, Json<Value>) {
    match state.relay.custom_instructions().await {
        Ok(text) => (
            StatusCode::OK,
            Json(json!({"success": true, "customInstructions": text})),
        ),
        Err(error) => {
            warn!(%error, "Failed to read custom instructions");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"success": false, "error": error.to_string()})),
            )
        }
    }
}

pub async fn set_custom_instructions(
    State(state): State<AppState>,
    Json(req): Json<CustomInstructionsRequest>,
) -> (StatusCode, Json<ApiResult>) {
    match state
        .relay
        .set_custom_instructions(&req.custom_instructions)
        .await
    {
        Ok(()) => ok(),
        Err(error) => failed("set_custom_instructions", &error),
    }
}
