use super::client::{now_rfc3339, IngestionEvent, LangfuseClient};
use serde_json::{json, Value};

/// Identifier reported for observations that were never recorded
pub const NULL_ID: &str = "null";

/// Kind of observation a handle refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObservationKind {
    Trace,
    Span,
    Generation,
}

impl ObservationKind {
    fn update_event(&self) -> &'static str {
        match self {
            // traces are upserted by id
            ObservationKind::Trace => "trace-create",
            ObservationKind::Span => "span-update",
            ObservationKind::Generation => "generation-update",
        }
    }
}

#[derive(Debug, Clone)]
struct Recorded {
    id: String,
    trace_id: String,
    client: LangfuseClient,
}

/// Handle to a trace, span or generation
///
/// The null handle (tracing disabled) reports [`NULL_ID`] and ignores every
/// mutation, so callers never need to check whether tracing is on.
#[derive(Debug, Clone)]
pub struct Observation {
    kind: ObservationKind,
    recorded: Option<Recorded>,
}

impl Observation {
    pub(crate) fn null(kind: ObservationKind) -> Self {
        Self {
            kind,
            recorded: None,
        }
    }

    pub(crate) fn recorded(
        kind: ObservationKind,
        id: String,
        trace_id: String,
        client: LangfuseClient,
    ) -> Self {
        Self {
            kind,
            recorded: Some(Recorded {
                id,
                trace_id,
                client,
            }),
        }
    }

    pub fn kind(&self) -> ObservationKind {
        self.kind
    }

    /// Observation id, or `"null"` when nothing was recorded
    pub fn id(&self) -> &str {
        self.observed_id().unwrap_or(NULL_ID)
    }

    pub fn observed_id(&self) -> Option<&str> {
        self.recorded.as_ref().map(|r| r.id.as_str())
    }

    /// Id of the enclosing trace (the trace itself for trace handles)
    pub fn trace_id(&self) -> Option<&str> {
        self.recorded.as_ref().map(|r| r.trace_id.as_str())
    }

    pub fn is_null(&self) -> bool {
        self.recorded.is_none()
    }

    /// Merge extra fields (`metadata`, `output`, ...) into the observation
    pub fn update(&self, fields: Value) {
        let Some(recorded) = &self.recorded else {
            return;
        };

        let mut body = identity(self.kind, recorded);
        merge(&mut body, fields);
        recorded
            .client
            .enqueue(IngestionEvent::new(self.kind.update_event(), body));
    }

    /// Mark the observation finished, optionally attaching its output
    ///
    /// Traces carry no end marker; ending one only records the output.
    pub fn end(&self, output: Option<Value>) {
        let Some(recorded) = &self.recorded else {
            return;
        };

        let mut body = identity(self.kind, recorded);
        if self.kind != ObservationKind::Trace {
            body["endTime"] = json!(now_rfc3339());
        }
        if let Some(output) = output {
            body["output"] = output;
        }
        recorded
            .client
            .enqueue(IngestionEvent::new(self.kind.update_event(), body));
    }
}

fn identity(kind: ObservationKind, recorded: &Recorded) -> Value {
    match kind {
        ObservationKind::Trace => json!({ "id": recorded.id }),
        _ => json!({ "id": recorded.id, "traceId": recorded.trace_id }),
    }
}

/// Shallow merge of `extra` object fields into `body`
pub(crate) fn merge(body: &mut Value, extra: Value) {
    if let (Some(target), Value::Object(fields)) = (body.as_object_mut(), extra) {
        for (key, value) in fields {
            target.insert(key, value);
        }
    }
}
