pub mod config;
pub mod error;
pub mod guardrails;
pub mod handlers;
pub mod llm;
pub mod logging;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod providers;
pub mod retry;
pub mod server;
pub mod signals;

use tracing_subscriber::{prelude::*, EnvFilter};

/// Initialize tracing/logging
///
/// `RUST_LOG` wins over `log_level` when set. Every event is written to stdout
/// as one JSON object per line.
///
/// Note: This function can only be called once.
pub fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level.to_lowercase()))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(logging::JsonLogLayer::new(std::io::stdout))
        .init();
}
