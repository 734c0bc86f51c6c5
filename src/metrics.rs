use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle, PrometheusRecorder};
use std::sync::Mutex;
use std::time::Duration;

pub const REQUESTS_TOTAL: &str = "app_requests_total";
pub const REQUEST_LATENCY: &str = "app_request_latency_seconds";
pub const LLM_LATENCY: &str = "app_llm_latency_seconds";
pub const IN_PROGRESS: &str = "app_requests_in_progress";
pub const TOKENS_USED: &str = "app_llm_tokens_used";

/// Prometheus client default buckets, in seconds
const LATENCY_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.25, 0.5, 0.75, 1.0, 2.5, 5.0, 7.5, 10.0,
];

const TOKEN_BUCKETS: &[f64] = &[0.0, 50.0, 100.0, 200.0, 400.0, 800.0, 1600.0, 3200.0, 6400.0];

/// Handle of the process-wide recorder, set by the first successful init
static PROMETHEUS_HANDLE: Mutex<Option<PrometheusHandle>> = Mutex::new(None);

/// Build a recorder with the histogram buckets used by the service
pub fn build_recorder() -> anyhow::Result<PrometheusRecorder> {
    let recorder = PrometheusBuilder::new()
        .set_buckets_for_metric(Matcher::Full(REQUEST_LATENCY.to_string()), LATENCY_BUCKETS)?
        .set_buckets_for_metric(Matcher::Full(LLM_LATENCY.to_string()), LATENCY_BUCKETS)?
        .set_buckets_for_metric(Matcher::Full(TOKENS_USED.to_string()), TOKEN_BUCKETS)?
        .build_recorder();

    Ok(recorder)
}

/// Install the process-wide Prometheus recorder
///
/// Safe to call more than once: later calls return the handle installed by
/// the first one.
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let mut slot = PROMETHEUS_HANDLE
        .lock()
        .map_err(|_| anyhow::anyhow!("metrics handle lock poisoned"))?;

    if let Some(handle) = slot.as_ref() {
        return Ok(handle.clone());
    }

    let recorder = build_recorder()?;
    let handle = recorder.handle();
    metrics::set_global_recorder(recorder)
        .map_err(|_| anyhow::anyhow!("a global metrics recorder is already installed"))?;

    init_metric_descriptions();
    *slot = Some(handle.clone());

    Ok(handle)
}

/// Describe all metrics (can be called multiple times safely)
pub fn init_metric_descriptions() {
    describe_counter!(REQUESTS_TOTAL, "Total HTTP requests");
    describe_histogram!(REQUEST_LATENCY, "Latency of HTTP requests in seconds");
    describe_histogram!(LLM_LATENCY, "Latency of LLM calls in seconds");
    describe_gauge!(IN_PROGRESS, "In-progress HTTP requests");
    describe_histogram!(TOKENS_USED, "Tokens used per request");
}

/// Register every series with a zero value so a scrape lists them before
/// any traffic arrives
///
/// `routes` holds the `(endpoint, method)` pairs the router serves.
pub fn register_series(routes: &[(&str, &str)], model: &str) {
    for (endpoint, method) in routes {
        let _ = histogram!(
            REQUEST_LATENCY,
            "endpoint" => endpoint.to_string(),
            "method" => method.to_string(),
        );
        counter!(
            REQUESTS_TOTAL,
            "endpoint" => endpoint.to_string(),
            "method" => method.to_string(),
            "status" => "200",
        )
        .increment(0);
    }

    let _ = histogram!(LLM_LATENCY, "model" => model.to_string());
    let _ = histogram!(TOKENS_USED);
    gauge!(IN_PROGRESS).increment(0.0);
}

/// Mark a request as started
pub fn increment_in_progress() {
    gauge!(IN_PROGRESS).increment(1.0);
}

/// Mark a request as finished
pub fn decrement_in_progress() {
    gauge!(IN_PROGRESS).decrement(1.0);
}

/// Record a finished HTTP request
pub fn record_request(endpoint: &str, method: &str, status: u16, duration: Duration) {
    histogram!(
        REQUEST_LATENCY,
        "endpoint" => endpoint.to_string(),
        "method" => method.to_string(),
    )
    .record(duration.as_secs_f64());

    counter!(
        REQUESTS_TOTAL,
        "endpoint" => endpoint.to_string(),
        "method" => method.to_string(),
        "status" => status.to_string(),
    )
    .increment(1);
}

/// Record the duration of a successful LLM call
pub fn record_llm_latency(model: &str, duration: Duration) {
    histogram!(LLM_LATENCY, "model" => model.to_string()).record(duration.as_secs_f64());
}

/// Record total tokens consumed by one LLM request
pub fn record_tokens(total_tokens: u64) {
    histogram!(TOKENS_USED).record(total_tokens as f64);
}

/// Read an unlabeled gauge or counter value from rendered exposition text
pub fn sample_value(rendered: &str, name: &str) -> Option<f64> {
    rendered.lines().find_map(|line| {
        let value = line.strip_prefix(name)?.strip_prefix(' ')?;
        value.trim().parse().ok()
    })
}
