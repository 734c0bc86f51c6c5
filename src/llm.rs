//! LLM invocation with bounded retry and latency measurement

use crate::{
    error::AppError,
    metrics,
    models::openai::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage},
    providers::ChatProvider,
    retry::RetryPolicy,
};
use std::sync::Arc;
use std::time::Instant;

/// Entry point for every model call made by the service
#[derive(Clone)]
pub struct LlmClient {
    provider: Option<Arc<dyn ChatProvider>>,
    retry: RetryPolicy,
}

impl LlmClient {
    /// `provider` is `None` when no credential is configured
    pub fn new(provider: Option<Arc<dyn ChatProvider>>, retry: RetryPolicy) -> Self {
        Self { provider, retry }
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_some()
    }

    /// Call the provider, retrying failed attempts per the retry policy
    ///
    /// A missing provider fails immediately with [`AppError::ConfigError`]
    /// and is never retried. Latency is recorded for the successful attempt
    /// only.
    pub async fn call_llm(
        &self,
        messages: Vec<ChatMessage>,
        temperature: f32,
        model: &str,
    ) -> Result<ChatCompletionResponse, AppError> {
        let provider = self
            .provider
            .as_ref()
            .ok_or_else(|| AppError::ConfigError("LLM not configured".to_string()))?;

        let request = ChatCompletionRequest {
            model: model.to_string(),
            messages,
            temperature: Some(temperature),
        };

        self.retry
            .execute(|attempt| {
                let request = &request;
                async move {
                    let start = Instant::now();
                    let completion = provider.chat_completions(request).await?;
                    let elapsed = start.elapsed();
                    metrics::record_llm_latency(model, elapsed);

                    tracing::debug!(
                        model = %model,
                        attempt = attempt,
                        duration_ms = elapsed.as_millis() as u64,
                        "LLM call succeeded"
                    );
                    Ok::<_, AppError>(completion)
                }
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::openai::{ChatChoice, ResponseMessage};
    use async_trait::async_trait;
    use axum::http::StatusCode;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails the first `failures` calls, then answers
    struct FlakyProvider {
        failures: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl ChatProvider for FlakyProvider {
        async fn chat_completions(
            &self,
            request: &ChatCompletionRequest,
        ) -> Result<ChatCompletionResponse, AppError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call <= self.failures {
                return Err(AppError::UpstreamError {
                    status: StatusCode::BAD_GATEWAY,
                    message: format!("failure {}", call),
                });
            }
            Ok(ChatCompletionResponse {
                id: "chatcmpl-test".to_string(),
                model: request.model.clone(),
                choices: vec![ChatChoice {
                    index: 0,
                    message: ResponseMessage {
                        role: "assistant".to_string(),
                        content: Some("ok".to_string()),
                    },
                    finish_reason: Some("stop".to_string()),
                }],
                usage: None,
            })
        }
    }

    fn client_with(failures: u32) -> (LlmClient, Arc<FlakyProvider>) {
        let provider = Arc::new(FlakyProvider {
            failures,
            calls: AtomicU32::new(0),
        });
        let client = LlmClient::new(Some(provider.clone()), RetryPolicy::immediate(3));
        (client, provider)
    }

    #[tokio::test]
    async fn test_missing_provider_is_config_error_without_retry() {
        let client = LlmClient::new(None, RetryPolicy::immediate(3));
        assert!(!client.is_configured());

        let result = client
            .call_llm(vec![ChatMessage::user("hola")], 0.2, "gpt-4o-mini")
            .await;
        assert!(matches!(result, Err(AppError::ConfigError(_))));
    }

    #[tokio::test]
    async fn test_recovers_from_transient_failures() {
        let (client, provider) = client_with(2);
        let completion = client
            .call_llm(vec![ChatMessage::user("hola")], 0.2, "gpt-4o-mini")
            .await
            .unwrap();

        assert_eq!(completion.first_choice_text(), Some("ok"));
        assert_eq!(completion.model, "gpt-4o-mini");
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_propagates_last_failure_after_three_attempts() {
        let (client, provider) = client_with(5);
        let result = client
            .call_llm(vec![ChatMessage::user("hola")], 0.2, "gpt-4o-mini")
            .await;

        match result {
            Err(AppError::UpstreamError { message, .. }) => assert_eq!(message, "failure 3"),
            other => panic!("expected upstream error, got {:?}", other.map(|c| c.id)),
        }
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_latency_recorded_once_per_successful_call() {
        let recorder = metrics::build_recorder().unwrap();
        let handle = recorder.handle();
        let (client, _provider) = client_with(2);

        ::metrics::with_local_recorder(&recorder, || {
            tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap()
                .block_on(async {
                    client
                        .call_llm(vec![ChatMessage::user("hola")], 0.2, "gpt-test")
                        .await
                        .unwrap();
                });
        });

        let rendered = handle.render();
        let count_line = rendered
            .lines()
            .find(|line| {
                line.starts_with(&format!("{}_count", metrics::LLM_LATENCY))
                    && line.contains("gpt-test")
            })
            .unwrap();
        assert!(count_line.ends_with(" 1"));
    }
}
