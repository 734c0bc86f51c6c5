//! Langfuse ingestion client
//!
//! Events are queued without blocking the caller and shipped in batches by a
//! background task to `POST {host}/api/public/ingestion`:
//! - batch flushed when `batch_size` events are pending
//! - periodic flush every `flush_interval`
//! - explicit [`LangfuseClient::flush`] and a final flush when the last
//!   client handle is dropped
//!
//! Delivery is best-effort: failures are logged and the batch is dropped.

use crate::{config::LangfuseCredentials, error::AppError};
use serde::Serialize;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

/// One entry of an ingestion batch
#[derive(Debug, Clone, Serialize)]
pub struct IngestionEvent {
    pub id: String,
    pub timestamp: String,
    #[serde(rename = "type")]
    pub event_type: &'static str,
    pub body: serde_json::Value,
}

impl IngestionEvent {
    pub fn new(event_type: &'static str, body: serde_json::Value) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: now_rfc3339(),
            event_type,
            body,
        }
    }
}

#[derive(Serialize)]
struct IngestionBatch<'a> {
    batch: &'a [IngestionEvent],
}

/// RFC 3339 UTC timestamp with millisecond precision
pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Batching parameters of the background writer
#[derive(Debug, Clone)]
pub struct WriterConfig {
    pub batch_size: usize,
    pub flush_interval: Duration,
    pub request_timeout: Duration,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            flush_interval: Duration::from_secs(1),
            request_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug)]
enum WriterMessage {
    Event(IngestionEvent),
    Flush(oneshot::Sender<()>),
}

/// Destination of ingestion batches
struct IngestionSink {
    http: reqwest::Client,
    endpoint: reqwest::Url,
    public_key: String,
    secret_key: String,
}

/// Handle to the background ingestion writer
#[derive(Clone, Debug)]
pub struct LangfuseClient {
    sender: mpsc::UnboundedSender<WriterMessage>,
}

impl LangfuseClient {
    /// Validate the credentials and spawn the writer task
    ///
    /// Fails when the host is not an http(s) URL, the HTTP client cannot be
    /// built, or no tokio runtime is running.
    pub fn spawn(credentials: &LangfuseCredentials, config: WriterConfig) -> Result<Self, AppError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            AppError::ConfigError(format!("Langfuse writer needs a tokio runtime: {}", e))
        })?;

        let endpoint = ingestion_endpoint(&credentials.host)?;
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        let sink = IngestionSink {
            http,
            endpoint,
            public_key: credentials.public_key.clone(),
            secret_key: credentials.secret_key.clone(),
        };

        let (tx, rx) = mpsc::unbounded_channel();
        runtime.spawn(async move {
            writer_task(sink, rx, config).await;
        });

        Ok(Self { sender: tx })
    }

    /// Queue an event (non-blocking)
    pub fn enqueue(&self, event: IngestionEvent) {
        if self.sender.send(WriterMessage::Event(event)).is_err() {
            tracing::debug!("Langfuse writer stopped, dropping event");
        }
    }

    /// Ship everything queued so far and wait for the attempt to finish
    pub async fn flush(&self) {
        let (tx, rx) = oneshot::channel();
        if self.sender.send(WriterMessage::Flush(tx)).is_ok() {
            let _ = rx.await;
        }
    }
}

fn ingestion_endpoint(host: &str) -> Result<reqwest::Url, AppError> {
    let raw = format!("{}/api/public/ingestion", host.trim_end_matches('/'));
    let url = reqwest::Url::parse(&raw)
        .map_err(|e| AppError::ConfigError(format!("Invalid LANGFUSE_HOST '{}': {}", host, e)))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(AppError::ConfigError(format!(
            "Invalid LANGFUSE_HOST '{}': unsupported scheme {}",
            host, scheme
        ))),
    }
}

/// Background writer task
async fn writer_task(
    sink: IngestionSink,
    mut rx: mpsc::UnboundedReceiver<WriterMessage>,
    config: WriterConfig,
) {
    let batch_size = config.batch_size.max(1);
    let mut batch: Vec<IngestionEvent> = Vec::with_capacity(batch_size);

    let mut flush_timer = tokio::time::interval(config.flush_interval);
    flush_timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            msg = rx.recv() => match msg {
                Some(WriterMessage::Event(event)) => {
                    batch.push(event);
                    if batch.len() >= batch_size {
                        send_batch(&sink, &mut batch).await;
                    }
                }
                Some(WriterMessage::Flush(done)) => {
                    send_batch(&sink, &mut batch).await;
                    let _ = done.send(());
                }
                // Channel closed, flush remaining and exit
                None => {
                    send_batch(&sink, &mut batch).await;
                    break;
                }
            },

            _ = flush_timer.tick() => {
                send_batch(&sink, &mut batch).await;
            }
        }
    }

    tracing::debug!("Langfuse writer task shutting down");
}

async fn send_batch(sink: &IngestionSink, batch: &mut Vec<IngestionEvent>) {
    if batch.is_empty() {
        return;
    }

    let count = batch.len();
    let result = sink
        .http
        .post(sink.endpoint.clone())
        .basic_auth(&sink.public_key, Some(&sink.secret_key))
        .json(&IngestionBatch {
            batch: batch.as_slice(),
        })
        .send()
        .await
        .and_then(|response| response.error_for_status());

    match result {
        Ok(_) => tracing::debug!(count = count, "Flushed Langfuse batch"),
        Err(e) => tracing::warn!(error = %e, count = count, "Failed to deliver Langfuse batch"),
    }

    batch.clear();
}
