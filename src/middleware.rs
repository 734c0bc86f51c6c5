use crate::metrics;
use axum::{
    extract::{MatchedPath, Request},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::Instrument;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Endpoint label of requests that matched no route
pub const UNMATCHED_ENDPOINT: &str = "unmatched";

/// Correlation data attached to every request
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
    pub started_at: Instant,
}

/// Finalizes request metrics exactly once, whichever way the request ends
struct RequestGuard {
    request_id: String,
    endpoint: String,
    method: String,
    started_at: Instant,
    status: Option<u16>,
}

impl RequestGuard {
    fn start(request_id: String, endpoint: String, method: String, started_at: Instant) -> Self {
        metrics::increment_in_progress();
        Self {
            request_id,
            endpoint,
            method,
            started_at,
            status: None,
        }
    }
}

impl Drop for RequestGuard {
    fn drop(&mut self) {
        let elapsed = self.started_at.elapsed();
        // no response means the handler failed or the request was cancelled
        let status = self.status.unwrap_or(500);

        metrics::record_request(&self.endpoint, &self.method, status, elapsed);
        metrics::decrement_in_progress();

        tracing::info!(
            request_id = %self.request_id,
            endpoint = %self.endpoint,
            method = %self.method,
            status = status,
            "request completed in {:.3}s",
            elapsed.as_secs_f64()
        );
    }
}

/// Request middleware
///
/// Assigns a fresh request id, tracks the in-flight gauge, and records latency
/// and the request counter when the response is produced.
pub async fn request_context(mut req: Request, next: Next) -> Response {
    let request_id = uuid::Uuid::new_v4().to_string();
    let started_at = Instant::now();

    let endpoint = req
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_ENDPOINT.to_string());
    let method = req.method().to_string();

    req.extensions_mut().insert(RequestContext {
        request_id: request_id.clone(),
        started_at,
    });

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        endpoint = %endpoint
    );

    let mut guard = RequestGuard::start(request_id.clone(), endpoint, method, started_at);

    let mut response = next.run(req).instrument(span).await;
    guard.status = Some(response.status().as_u16());

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}
