use super::AppState;
use crate::{
    error::AppError,
    guardrails, metrics,
    middleware::RequestContext,
    models::{
        ask::{AskRequest, AskResponse},
        openai::ChatMessage,
    },
    observability::{GenerationParams, GenerationUsage, ScoreParams, TraceParams},
};
use axum::{
    async_trait,
    extract::{FromRequest, Request, State},
    Extension, Json,
};
use serde_json::json;

pub const SYSTEM_PROMPT: &str = "Eres un asistente breve, preciso y en español.";
pub const PROMPT_VERSION: &str = "qa_enhanced_v1";
pub const TEMPERATURE: f32 = 0.2;

/// JSON body of `POST /ask` that passed field validation
///
/// Malformed JSON and constraint violations are both rejected with 422
/// before the handler runs.
pub struct ValidatedAsk(pub AskRequest);

#[async_trait]
impl<S> FromRequest<S> for ValidatedAsk
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(request) = Json::<AskRequest>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::Validation(rejection.body_text()))?;

        request.validate()?;
        Ok(Self(request))
    }
}

/// Handle `POST /ask`
///
/// Only the LLM call can fail the request. Tracing, token accounting and
/// scoring are best-effort.
pub async fn handle_ask(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    ValidatedAsk(request): ValidatedAsk,
) -> Result<Json<AskResponse>, AppError> {
    let observability = &state.observability;
    let model = state.settings.openai_model.as_str();
    let prompt_metadata = json!({ "prompt_version": PROMPT_VERSION });

    let trace = observability.trace(TraceParams {
        name: "qa_chat".to_string(),
        user_id: Some(request.user_id.clone()),
        input: Some(json!(request.question)),
        metadata: Some(prompt_metadata.clone()),
    });

    let messages = vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(request.question.as_str()),
    ];

    let completion = state
        .llm
        .call_llm(messages, TEMPERATURE, model)
        .await
        .map_err(|e| {
            tracing::error!(request_id = %ctx.request_id, error = %e, "LLM error");
            e
        })?;

    let raw_answer = completion.first_choice_text().unwrap_or_else(|| {
        tracing::warn!(
            request_id = %ctx.request_id,
            "LLM response has no answer text, returning empty answer"
        );
        ""
    });

    let answer = guardrails::truncate_words(
        raw_answer,
        request.max_words.map(|words| words as usize),
    );

    if let Some(total_tokens) = completion.usage.as_ref().and_then(|u| u.total_tokens) {
        metrics::record_tokens(total_tokens);
    }

    let trace_id = trace.observed_id().map(str::to_string);

    let generation = observability.generation(GenerationParams {
        trace_id: trace_id.clone(),
        name: "openai_chat_completion".to_string(),
        model: Some(model.to_string()),
        input: Some(json!(request.question)),
        output: Some(json!(answer)),
        usage: completion.usage.as_ref().map(GenerationUsage::from),
        metadata: Some(prompt_metadata),
    });

    observability.score(ScoreParams {
        trace_id: trace_id.clone(),
        name: "non_empty_answer".to_string(),
        value: guardrails::non_empty_score(&answer),
        comment: None,
    });
    observability.score(ScoreParams {
        trace_id,
        name: "toxicity_safe".to_string(),
        value: guardrails::lexical_safety_score(&answer),
        comment: None,
    });

    tracing::debug!(
        request_id = %ctx.request_id,
        trace_id = %trace.id(),
        words = answer.split_whitespace().count(),
        "Answer ready"
    );

    Ok(Json(AskResponse {
        trace_id: trace.id().to_string(),
        generation_id: generation.id().to_string(),
        request_id: ctx.request_id,
        answer,
    }))
}
