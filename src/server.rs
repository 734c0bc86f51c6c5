use anyhow::Result;
use axum::{
    http::Method,
    middleware,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::{net::SocketAddr, sync::Arc};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::{
    config::Settings,
    handlers::{self, AppState},
    llm::LlmClient,
    logging::SensitiveApiKey,
    metrics,
    middleware::request_context,
    observability::Observability,
    providers::{
        openai::{OpenAiConfig, OpenAiProvider},
        ChatProvider,
    },
    retry::RetryPolicy,
    signals::shutdown_signal,
};

/// `(endpoint, method)` pairs served by [`create_router`]
pub const ROUTES: &[(&str, &str)] = &[("/health", "GET"), ("/metrics", "GET"), ("/ask", "POST")];

/// Start the QA gateway server
///
/// This function:
/// 1. Initializes metrics
/// 2. Builds the LLM client and the tracing façade from settings
/// 3. Binds to the configured address
/// 4. Serves requests until SIGINT/SIGTERM, then flushes pending traces
pub async fn start_server(settings: Settings) -> Result<()> {
    info!("Initializing Prometheus metrics...");
    let metrics_handle = Arc::new(metrics::init_metrics()?);

    let state = build_state(settings.clone(), metrics_handle)?;
    let observability = state.observability.clone();
    let app = create_router(state);

    let addr = SocketAddr::from((settings.host.parse::<std::net::IpAddr>()?, settings.port));

    info!("Starting QA gateway on {}", addr);
    info!(
        app_env = %settings.app_env,
        model = %settings.openai_model,
        openai_configured = settings.openai_configured(),
        langfuse_enabled = observability.is_enabled(),
        "Configuration loaded"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown_signal().await;
            info!("Shutdown signal received, draining connections...");
        })
        .await?;

    observability.shutdown().await;
    info!("Server stopped gracefully");

    Ok(())
}

/// Wire settings into the shared handler state
pub fn build_state(settings: Settings, metrics_handle: Arc<PrometheusHandle>) -> Result<AppState> {
    let provider: Option<Arc<dyn ChatProvider>> = match &settings.openai_api_key {
        Some(api_key) => {
            info!(
                api_key = %SensitiveApiKey::new(api_key),
                base_url = %settings.openai_base_url,
                "OpenAI provider configured"
            );
            let provider: Arc<dyn ChatProvider> = Arc::new(OpenAiProvider::new(
                reqwest::Client::builder().build()?,
                OpenAiConfig {
                    api_key: api_key.clone(),
                    base_url: settings.openai_base_url.clone(),
                    timeout: settings.openai_timeout(),
                },
            ));
            Some(provider)
        }
        None => {
            tracing::warn!("OPENAI_API_KEY not set, /ask will fail until it is configured");
            None
        }
    };

    let observability = Observability::from_settings(&settings);

    Ok(AppState {
        settings: Arc::new(settings),
        llm: LlmClient::new(provider, RetryPolicy::default()),
        observability,
        metrics_handle,
    })
}

/// Create the Axum router with all routes and middleware
///
/// The panic-catching layer sits inside the request middleware so a panicking
/// handler still produces a 500 the middleware can observe.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    metrics::register_series(ROUTES, &state.settings.openai_model);

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics_handler::metrics))
        .route("/ask", post(handlers::ask::handle_ask))
        .with_state(state)
        .layer(CatchPanicLayer::new())
        .layer(middleware::from_fn(request_context))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
