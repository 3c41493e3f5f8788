//! Executes a [`ForwardingDecision`] against the transport.
//!
//! # Data Flow
//! ```text
//! Idle ──forward()──▶ Forwarding ──transport ok──▶ Completed (relay response)
//!                          │
//!                          └────transport err───▶ Failed (fixed 500)
//! ```
//!
//! # Design Decisions
//! - One attempt per request; no retry, no backoff
//! - The inbound request is consumed, so header edits never leak back
//! - Exactly one event per request, emitted once the outcome is known
//! - The outcome is a single owned value turned into a single response;
//!   once a response head is relayed a later body error aborts the stream
//!   instead of producing a second status line

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::response::IntoResponse;

use crate::forwarding::event::{EventSink, ProxyEvent};
use crate::forwarding::transport::{Transport, TransportError};
use crate::http::response::fallback_error_response;
use crate::routing::headers::strip_hop_by_hop;
use crate::routing::ForwardingDecision;

/// Terminal state of one forwarding attempt.
#[derive(Debug)]
pub enum ForwardOutcome {
    /// The target answered; its response is relayed unchanged.
    Completed(Response<Body>),
    /// The outbound call failed; the caller gets the fixed error response.
    Failed(TransportError),
}

impl ForwardOutcome {
    /// Status the caller will see.
    pub fn status(&self) -> StatusCode {
        match self {
            ForwardOutcome::Completed(response) => response.status(),
            ForwardOutcome::Failed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, ForwardOutcome::Completed(_))
    }
}

impl IntoResponse for ForwardOutcome {
    fn into_response(self) -> axum::response::Response {
        match self {
            ForwardOutcome::Completed(response) => response,
            ForwardOutcome::Failed(_) => fallback_error_response(),
        }
    }
}

/// Forwards requests through an injected transport and reports to an
/// injected event sink. Holds no per-request state.
#[derive(Clone)]
pub struct ForwardingEngine {
    transport: Arc<dyn Transport>,
    events: Arc<dyn EventSink>,
}

impl ForwardingEngine {
    pub fn new(transport: Arc<dyn Transport>, events: Arc<dyn EventSink>) -> Self {
        Self { transport, events }
    }

    /// Forward `request` as described by `decision`.
    pub async fn forward(
        &self,
        decision: &ForwardingDecision,
        request: Request<Body>,
    ) -> ForwardOutcome {
        let outcome = match prepare_outbound(decision, request) {
            Ok(outbound) => {
                tracing::debug!(uri = %outbound.uri(), method = %outbound.method(), "Forwarding");
                match self.transport.send(outbound).await {
                    Ok(response) => ForwardOutcome::Completed(response),
                    Err(e) => ForwardOutcome::Failed(e),
                }
            }
            Err(e) => ForwardOutcome::Failed(e),
        };

        match outcome {
            ForwardOutcome::Completed(mut response) => {
                self.events.emit(&ProxyEvent::Response {
                    status: response.status(),
                    headers: response.headers().clone(),
                });
                strip_hop_by_hop(response.headers_mut());
                ForwardOutcome::Completed(response)
            }
            ForwardOutcome::Failed(e) => {
                self.events.emit(&ProxyEvent::Error {
                    detail: e.to_string(),
                });
                ForwardOutcome::Failed(e)
            }
        }
    }
}

/// Turn the inbound request into the outbound one: absolute target URI,
/// hop-by-hop and `Host` removed, overrides applied. Method, version,
/// remaining headers and body pass through.
fn prepare_outbound(
    decision: &ForwardingDecision,
    request: Request<Body>,
) -> Result<Request<Body>, TransportError> {
    let uri = decision
        .outbound_uri()
        .map_err(|e| TransportError::InvalidTarget(e.to_string()))?;

    let (mut parts, body) = request.into_parts();
    strip_hop_by_hop(&mut parts.headers);
    parts.headers.remove(header::HOST);
    decision.header_overrides().apply_to(&mut parts.headers);
    parts.uri = uri;

    Ok(Request::from_parts(parts, body))
}
