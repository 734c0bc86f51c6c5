use super::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

/// Health check endpoint
///
/// Always 200; the flags report which optional integrations are active.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "openai_configured": state.llm.is_configured(),
            "langfuse_enabled": state.observability.is_enabled(),
        })),
    )
}
