//! Per-request lifecycle events and their sinks.
//!
//! Every forwarded request produces exactly one [`ProxyEvent`], delivered to
//! the injected [`EventSink`] after the outcome is known.

use axum::http::{HeaderMap, StatusCode};
use serde_json::{Map, Value};

/// Terminal event of one forwarding attempt.
#[derive(Debug, Clone)]
pub enum ProxyEvent {
    /// The target answered; `headers` is its full, unmodified header set.
    Response { status: StatusCode, headers: HeaderMap },
    /// The outbound call failed before a response head arrived.
    Error { detail: String },
}

impl ProxyEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyEvent::Response { .. } => "response",
            ProxyEvent::Error { .. } => "error",
        }
    }
}

/// Observer of forwarding events.
///
/// `emit` runs inline on the request path and has no way to fail it;
/// implementations should be quick and must not block.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &ProxyEvent);
}

/// Default sink: writes each event to the tracing subscriber.
#[derive(Debug, Clone)]
pub struct LogSink {
    log_headers: bool,
}

impl LogSink {
    pub fn new(log_headers: bool) -> Self {
        Self { log_headers }
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new(true)
    }
}

impl EventSink for LogSink {
    fn emit(&self, event: &ProxyEvent) {
        match event {
            ProxyEvent::Response { status, headers } if self.log_headers => {
                match serde_json::to_string_pretty(&headers_to_json(headers)) {
                    Ok(rendered) => tracing::info!(
                        status = status.as_u16(),
                        headers = %rendered,
                        "Raw response from the target"
                    ),
                    Err(e) => tracing::warn!(error = %e, "Could not render response headers"),
                }
            }
            ProxyEvent::Response { status, .. } => {
                tracing::info!(status = status.as_u16(), "Response from the target");
            }
            ProxyEvent::Error { detail } => {
                tracing::error!(detail = %detail, "Forwarding failed");
            }
        }
    }
}

/// Render a header map as a JSON object. Repeated names become arrays and
/// non-UTF-8 values are rendered lossily.
pub fn headers_to_json(headers: &HeaderMap) -> Value {
    let mut object = Map::new();
    for name in headers.keys() {
        let mut values: Vec<Value> = headers
            .get_all(name)
            .iter()
            .map(|v| Value::String(String::from_utf8_lossy(v.as_bytes()).into_owned()))
            .collect();
        let value = if values.len() == 1 {
            values.remove(0)
        } else {
            Value::Array(values)
        };
        object.insert(name.as_str().to_string(), value);
    }
    Value::Object(object)
}
