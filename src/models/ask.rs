use crate::error::AppError;
use serde::{Deserialize, Serialize};

pub const QUESTION_MIN_CHARS: usize = 3;
pub const QUESTION_MAX_CHARS: usize = 2000;
pub const DEFAULT_MAX_WORDS: u32 = 150;

/// Input of `POST /ask`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    /// Caller identifier, used to segment traces
    pub user_id: String,
    /// Question sent to the model verbatim
    pub question: String,
    /// Soft cap on answer length in words; absent means 150, `null` means
    /// no cap
    #[serde(default = "default_max_words")]
    pub max_words: Option<u32>,
}

fn default_max_words() -> Option<u32> {
    Some(DEFAULT_MAX_WORDS)
}

impl AskRequest {
    /// Check the declared field constraints
    pub fn validate(&self) -> Result<(), AppError> {
        if self.user_id.is_empty() {
            return Err(AppError::Validation("user_id must not be empty".to_string()));
        }

        let length = self.question.chars().count();
        if !(QUESTION_MIN_CHARS..=QUESTION_MAX_CHARS).contains(&length) {
            return Err(AppError::Validation(format!(
                "question must be between {} and {} characters, got {}",
                QUESTION_MIN_CHARS, QUESTION_MAX_CHARS, length
            )));
        }

        if self.max_words == Some(0) {
            return Err(AppError::Validation(
                "max_words must be a positive integer".to_string(),
            ));
        }

        Ok(())
    }
}

/// Output of `POST /ask`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AskResponse {
    /// Model answer, possibly truncated
    pub answer: String,
    /// Trace identifier, `"null"` when tracing is disabled
    pub trace_id: String,
    /// Generation identifier, `"null"` when tracing is disabled
    pub generation_id: String,
    /// Correlation id of the request
    pub request_id: String,
}
