pub mod openai;

use crate::{
    error::AppError,
    models::openai::{ChatCompletionRequest, ChatCompletionResponse},
};
use async_trait::async_trait;

/// A chat-completion backend
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Perform one completion call, without retries
    async fn chat_completions(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, AppError>;
}
