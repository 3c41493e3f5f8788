//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the proxy handler on every path
//! - Wire up middleware (request ID, tracing)
//! - Resolve each request and hand it to the forwarding engine
//! - Record per-request metrics
//! - Serve until the shutdown signal, draining in-flight requests

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{request_id::SetRequestIdLayer, trace::TraceLayer};

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::forwarding::{EventSink, ForwardingEngine, LogSink, ReqwestTransport};
use crate::http::request::{request_id, UuidRequestId};
use crate::observability::metrics;
use crate::routing::TargetResolver;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<TargetResolver>,
    pub engine: Arc<ForwardingEngine>,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a server that forwards with reqwest and logs events.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let sink = Arc::new(LogSink::new(config.observability.log_response_headers));
        Self::with_event_sink(config, sink)
    }

    /// Create a server that reports forwarding events to `sink`.
    pub fn with_event_sink(
        config: GatewayConfig,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self, GatewayError> {
        let transport = Arc::new(ReqwestTransport::new(&config.timeouts)?);
        Self::with_engine(config, ForwardingEngine::new(transport, sink))
    }

    /// Create a server around an already assembled engine.
    pub fn with_engine(
        config: GatewayConfig,
        engine: ForwardingEngine,
    ) -> Result<Self, GatewayError> {
        let state = AppState {
            resolver: Arc::new(TargetResolver::from_config(&config.routing)?),
            engine: Arc::new(engine),
        };

        tracing::debug!(
            endpoint_header = %config.routing.endpoint_header,
            credential_header = %config.routing.credential_header,
            fallback_origin = %state.resolver.fallback_origin(),
            "Routing configured"
        );

        Ok(Self {
            router: Self::build_router(state),
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/", any(proxy_handler))
            .route("/{*path}", any(proxy_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
                    .layer(TraceLayer::new_for_http().make_span_with(
                        |request: &Request<Body>| {
                            tracing::info_span!(
                                "request",
                                request_id = %request_id(request),
                                method = %request.method(),
                                uri = %request.uri(),
                            )
                        },
                    )),
            )
    }

    /// The router, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining requests");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Resolve the target and forward. Always produces exactly one response.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let method = request.method().clone();

    let decision = state.resolver.resolve(&request);
    tracing::debug!(
        method = %method,
        route = decision.route().as_str(),
        target = %decision.target_origin(),
        path = %decision.outbound_path(),
        overrides = decision.header_overrides().len(),
        "Proxying request"
    );

    let outcome = state.engine.forward(&decision, request).await;
    metrics::record_request(
        method.as_str(),
        outcome.status().as_u16(),
        decision.route(),
        start_time,
    );

    outcome.into_response()
}
