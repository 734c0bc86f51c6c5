//! Request tracing for qa-gateway
//!
//! [`Observability`] is either backed by a Langfuse ingestion client or
//! disabled. Both variants expose the same operations:
//! - **trace**: groups everything recorded for one request
//! - **span**: bounded sub-operation within a trace
//! - **generation**: one model invocation
//! - **score**: named numeric annotation on a trace
//!
//! The variant is chosen once at startup. When disabled every operation
//! returns a null [`Observation`] whose id reads `"null"`.

pub mod client;
pub mod observation;

pub use client::{IngestionEvent, LangfuseClient, WriterConfig};
pub use observation::{Observation, ObservationKind, NULL_ID};

use crate::{config::Settings, models::openai::Usage};
use client::now_rfc3339;
use observation::merge;
use serde::Serialize;
use serde_json::{json, Value};

/// Parameters of a new trace
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceParams {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

/// Parameters of a new span
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpanParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

/// Parameters of a completed model invocation
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<GenerationUsage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

/// Token counts in the shape the ingestion API reads
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationUsage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    pub unit: &'static str,
}

impl From<&Usage> for GenerationUsage {
    fn from(usage: &Usage) -> Self {
        Self {
            input: usage.prompt_tokens,
            output: usage.completion_tokens,
            total: usage.total_tokens,
            unit: "TOKENS",
        }
    }
}

/// Parameters of a score attached to a trace
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    pub name: String,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Tracing façade shared by every request
#[derive(Debug, Clone)]
pub enum Observability {
    Active(LangfuseClient),
    Disabled,
}

impl Observability {
    /// Active only when all Langfuse credentials are present and the client
    /// starts; otherwise disabled.
    pub fn from_settings(settings: &Settings) -> Self {
        let Some(credentials) = settings.langfuse_credentials() else {
            tracing::info!("Langfuse credentials not configured, tracing disabled");
            return Self::Disabled;
        };

        match LangfuseClient::spawn(&credentials, WriterConfig::default()) {
            Ok(client) => {
                tracing::info!(host = %credentials.host, "Langfuse tracing enabled");
                Self::Active(client)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to start Langfuse client, tracing disabled");
                Self::Disabled
            }
        }
    }

    pub fn disabled() -> Self {
        Self::Disabled
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Active(_))
    }

    pub fn trace(&self, params: TraceParams) -> Observation {
        let Self::Active(client) = self else {
            return Observation::null(ObservationKind::Trace);
        };

        let id = new_id();
        let mut body = to_body(&params);
        merge(&mut body, json!({ "id": id, "timestamp": now_rfc3339() }));
        client.enqueue(IngestionEvent::new("trace-create", body));

        Observation::recorded(ObservationKind::Trace, id.clone(), id, client.clone())
    }

    /// Open a span; it stays open until [`Observation::end`]
    pub fn span(&self, params: SpanParams) -> Observation {
        let Self::Active(client) = self else {
            return Observation::null(ObservationKind::Span);
        };
        let Some(trace_id) = params.trace_id.clone() else {
            tracing::debug!(name = %params.name, "Span without trace id, not recorded");
            return Observation::null(ObservationKind::Span);
        };

        let id = new_id();
        let mut body = to_body(&params);
        merge(&mut body, json!({ "id": id, "startTime": now_rfc3339() }));
        client.enqueue(IngestionEvent::new("span-create", body));

        Observation::recorded(ObservationKind::Span, id, trace_id, client.clone())
    }

    /// Record a model invocation that already finished
    pub fn generation(&self, params: GenerationParams) -> Observation {
        let Self::Active(client) = self else {
            return Observation::null(ObservationKind::Generation);
        };
        let Some(trace_id) = params.trace_id.clone() else {
            tracing::debug!(name = %params.name, "Generation without trace id, not recorded");
            return Observation::null(ObservationKind::Generation);
        };

        let id = new_id();
        let now = now_rfc3339();
        let mut body = to_body(&params);
        merge(
            &mut body,
            json!({ "id": id, "startTime": now, "endTime": now }),
        );
        client.enqueue(IngestionEvent::new("generation-create", body));

        Observation::recorded(ObservationKind::Generation, id, trace_id, client.clone())
    }

    pub fn score(&self, params: ScoreParams) {
        let Self::Active(client) = self else {
            return;
        };
        if params.trace_id.is_none() {
            tracing::debug!(name = %params.name, "Score without trace id, not recorded");
            return;
        }

        let mut body = to_body(&params);
        merge(&mut body, json!({ "id": new_id() }));
        client.enqueue(IngestionEvent::new("score-create", body));
    }

    /// Ship pending events
    pub async fn flush(&self) {
        if let Self::Active(client) = self {
            client.flush().await;
        }
    }

    pub async fn shutdown(&self) {
        if let Self::Active(_) = self {
            tracing::info!("Flushing pending Langfuse events");
            self.flush().await;
        }
    }
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn to_body<T: Serialize>(params: &T) -> Value {
    serde_json::to_value(params).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to serialize observation body");
        json!({})
    })
}
