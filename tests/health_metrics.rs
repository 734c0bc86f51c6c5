mod common;

use axum::http::StatusCode;
use common::{app_with, get, post_json, send, StubProvider};
use serde_json::{json, Value};

#[tokio::test]
async fn test_health_reports_flags_before_any_request() {
    let (status, body) = send(app_with(None), get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["openai_configured"], false);
    assert_eq!(json["langfuse_enabled"], false);
}

#[tokio::test]
async fn test_health_reports_configured_provider() {
    let (_, body) = send(app_with(Some(StubProvider::answering("hola", None))), get("/health")).await;

    let json: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["openai_configured"], true);
}

#[tokio::test]
async fn test_metrics_exposes_request_series_after_a_request() {
    let app = app_with(Some(StubProvider::answering("Hola, todo bien", Some(42))));

    let (status, _) = send(
        app.clone(),
        post_json("/ask", json!({"user_id": "u", "question": "¿Qué tal?"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(app, get("/metrics")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("app_requests_total"));
    assert!(body.contains("app_request_latency_seconds"));
    assert!(body.contains("app_llm_latency_seconds"));
    assert!(body.contains("app_llm_tokens_used"));
    assert!(body.contains("endpoint=\"/ask\""));
}
