//! Runs in its own process so the scrape below is the first request the
//! global recorder sees.

mod common;

use axum::http::StatusCode;
use common::{app_with, get, send};
use qa_gateway::metrics;

#[tokio::test]
async fn test_first_scrape_lists_every_series() {
    let (status, body) = send(app_with(None), get("/metrics")).await;
    assert_eq!(status, StatusCode::OK);

    assert!(body.lines().any(|line| line.starts_with(metrics::REQUESTS_TOTAL)
        && line.contains("endpoint=\"/ask\"")
        && line.ends_with(" 0")));
    assert!(body.contains(&format!("{}_bucket", metrics::REQUEST_LATENCY)));
    assert!(body.contains(&format!("{}_count{{model=\"gpt-4o-mini\"}} 0", metrics::LLM_LATENCY)));
    assert!(body.contains(&format!("{}_count 0", metrics::TOKENS_USED)));
    // the scrape itself is in flight while the body renders
    assert_eq!(metrics::sample_value(&body, metrics::IN_PROGRESS), Some(1.0));
}
