#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use qa_gateway::{
    config::Settings,
    error::AppError,
    handlers::AppState,
    llm::LlmClient,
    metrics,
    models::openai::{
        ChatChoice, ChatCompletionRequest, ChatCompletionResponse, ResponseMessage, Usage,
    },
    observability::Observability,
    providers::ChatProvider,
    retry::RetryPolicy,
    server,
};
use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc,
};
use tower::ServiceExt;

/// Scripted provider: fails `failures` times, then answers `answer`
pub struct StubProvider {
    pub answer: String,
    pub total_tokens: Option<u64>,
    pub failures: u32,
    pub calls: AtomicU32,
}

impl StubProvider {
    pub fn answering(answer: &str, total_tokens: Option<u64>) -> Arc<Self> {
        Arc::new(Self {
            answer: answer.to_string(),
            total_tokens,
            failures: 0,
            calls: AtomicU32::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            answer: String::new(),
            total_tokens: None,
            failures: u32::MAX,
            calls: AtomicU32::new(0),
        })
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatProvider for StubProvider {
    async fn chat_completions(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, AppError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= self.failures {
            return Err(AppError::UpstreamError {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: "internal provider trace: quota sk-secret-123 exceeded".to_string(),
            });
        }

        Ok(ChatCompletionResponse {
            id: format!("chatcmpl-{}", call),
            model: request.model.clone(),
            choices: vec![ChatChoice {
                index: 0,
                message: ResponseMessage {
                    role: "assistant".to_string(),
                    content: Some(self.answer.clone()),
                },
                finish_reason: Some("stop".to_string()),
            }],
            usage: self.total_tokens.map(|total| Usage {
                prompt_tokens: Some(total / 2),
                completion_tokens: Some(total - total / 2),
                total_tokens: Some(total),
            }),
        })
    }
}

/// Router wired like production, with tracing disabled and no retry waits
pub fn app_with(provider: Option<Arc<StubProvider>>) -> Router {
    app_with_observability(provider, Observability::disabled())
}

/// Same as [`app_with`] but recording through the given tracing façade
pub fn app_with_observability(
    provider: Option<Arc<StubProvider>>,
    observability: Observability,
) -> Router {
    let provider = provider.map(|p| p as Arc<dyn ChatProvider>);
    let state = AppState {
        settings: Arc::new(Settings::default()),
        llm: LlmClient::new(provider, RetryPolicy::immediate(3)),
        observability,
        metrics_handle: Arc::new(metrics::init_metrics().unwrap()),
    };
    server::create_router(state)
}

pub fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

/// Send one request, returning status and body text
pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}
