pub mod ask;
pub mod health;
pub mod metrics_handler;

use crate::{config::Settings, llm::LlmClient, observability::Observability};
use axum::extract::FromRef;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

/// State shared by all route handlers
#[derive(Clone, FromRef)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub llm: LlmClient,
    pub observability: Observability,
    pub metrics_handle: Arc<PrometheusHandle>,
}
