//! Structured JSON logging
//!
//! Every event is rendered as a single-line JSON object:
//!
//! ```text
//! {"level":"INFO","name":"qa_gateway::middleware","msg":"request completed in 0.012s","request_id":"..."}
//! ```
//!
//! `request_id` is taken from the event's own fields, or from the nearest
//! enclosing span that declared one. Other fields are not rendered.

use std::fmt;
use std::io::Write;
use tracing::{span, Event, Subscriber};
use tracing_subscriber::{fmt::MakeWriter, layer::Context, registry::LookupSpan, Layer};

/// Tracing layer that writes one JSON object per event
pub struct JsonLogLayer<W> {
    make_writer: W,
}

impl<W> JsonLogLayer<W>
where
    W: for<'w> MakeWriter<'w> + 'static,
{
    pub fn new(make_writer: W) -> Self {
        Self { make_writer }
    }
}

/// Span extension holding a request id declared on that span
struct SpanRequestId(String);

#[derive(Default)]
struct FieldVisitor {
    message: Option<String>,
    request_id: Option<String>,
}

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn fmt::Debug) {
        match field.name() {
            "message" => self.message = Some(format!("{:?}", value)),
            "request_id" => {
                self.request_id = Some(format!("{:?}", value).trim_matches('"').to_string())
            }
            _ => {}
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        match field.name() {
            "message" => self.message = Some(value.to_string()),
            "request_id" => self.request_id = Some(value.to_string()),
            _ => {}
        }
    }
}

impl<S, W> Layer<S> for JsonLogLayer<W>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + 'static,
{
    fn on_new_span(&self, attrs: &span::Attributes<'_>, id: &span::Id, ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        attrs.record(&mut visitor);

        if let (Some(request_id), Some(span)) = (visitor.request_id, ctx.span(id)) {
            span.extensions_mut().insert(SpanRequestId(request_id));
        }
    }

    fn on_record(&self, id: &span::Id, values: &span::Record<'_>, ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        values.record(&mut visitor);

        if let (Some(request_id), Some(span)) = (visitor.request_id, ctx.span(id)) {
            let mut extensions = span.extensions_mut();
            extensions.remove::<SpanRequestId>();
            extensions.insert(SpanRequestId(request_id));
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let metadata = event.metadata();

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let request_id = visitor.request_id.or_else(|| {
            ctx.event_scope(event)?.find_map(|span| {
                let extensions = span.extensions();
                extensions.get::<SpanRequestId>().map(|id| id.0.clone())
            })
        });

        let mut record = serde_json::Map::new();
        record.insert("level".to_string(), metadata.level().to_string().into());
        record.insert("name".to_string(), metadata.target().into());
        record.insert("msg".to_string(), visitor.message.unwrap_or_default().into());
        if let Some(request_id) = request_id {
            record.insert("request_id".to_string(), request_id.into());
        }

        let mut line = serde_json::Value::Object(record).to_string();
        line.push('\n');

        let mut writer = self.make_writer.make_writer();
        if let Err(e) = writer.write_all(line.as_bytes()) {
            eprintln!("Failed to write log record: {}", e);
        }
    }
}

/// Redacted secret for display
///
/// Shows the first 8 characters followed by `***`; shorter values are fully
/// hidden.
#[derive(Clone, Debug)]
pub struct SensitiveApiKey<'a> {
    inner: &'a str,
}

impl<'a> SensitiveApiKey<'a> {
    pub fn new(key: &'a str) -> Self {
        Self { inner: key }
    }
}

impl fmt::Display for SensitiveApiKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let visible_len = 8.min(self.inner.len());
        if self.inner.len() <= visible_len || !self.inner.is_char_boundary(visible_len) {
            write!(f, "***")
        } else {
            write!(f, "{}***", &self.inner[..visible_len])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::prelude::*;

    /// In-memory writer collecting everything the layer emits
    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Capture {
        type Writer = Capture;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    impl Capture {
        fn lines(&self) -> Vec<serde_json::Value> {
            let bytes = self.0.lock().unwrap().clone();
            String::from_utf8(bytes)
                .unwrap()
                .lines()
                .map(|line| serde_json::from_str(line).unwrap())
                .collect()
        }
    }

    #[test]
    fn test_event_renders_four_fields() {
        let capture = Capture::default();
        let subscriber =
            tracing_subscriber::registry().with(JsonLogLayer::new(capture.clone()));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(request_id = %"req-1", model = "gpt-4o-mini", "request completed in 0.010s");
        });

        let lines = capture.lines();
        assert_eq!(lines.len(), 1);
        let record = lines[0].as_object().unwrap();
        assert_eq!(record["level"], "INFO");
        assert_eq!(record["name"], module_path!());
        assert_eq!(record["msg"], "request completed in 0.010s");
        assert_eq!(record["request_id"], "req-1");
        assert_eq!(record.len(), 4);
    }

    #[test]
    fn test_request_id_is_omitted_when_unknown() {
        let capture = Capture::default();
        let subscriber =
            tracing_subscriber::registry().with(JsonLogLayer::new(capture.clone()));

        tracing::subscriber::with_default(subscriber, || {
            tracing::warn!("no correlation here");
        });

        let lines = capture.lines();
        assert_eq!(lines[0]["level"], "WARN");
        assert!(lines[0].get("request_id").is_none());
    }

    #[test]
    fn test_request_id_inherited_from_enclosing_span() {
        let capture = Capture::default();
        let subscriber =
            tracing_subscriber::registry().with(JsonLogLayer::new(capture.clone()));

        tracing::subscriber::with_default(subscriber, || {
            let span = tracing::info_span!("request", request_id = %"req-span");
            let _entered = span.enter();
            tracing::error!("LLM error");
        });

        let lines = capture.lines();
        assert_eq!(lines[0]["request_id"], "req-span");
        assert_eq!(lines[0]["msg"], "LLM error");
    }

    #[test]
    fn test_sensitive_api_key_display() {
        assert_eq!(SensitiveApiKey::new("sk-proj-abcdef123456").to_string(), "sk-proj-***");
        assert_eq!(SensitiveApiKey::new("sk-abc").to_string(), "***");
    }
}
