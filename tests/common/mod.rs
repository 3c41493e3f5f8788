//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    body::{to_bytes, Body},
    http::{HeaderMap, Request, Response, StatusCode},
    Router,
};
use endpoint_gateway::config::GatewayConfig;
use endpoint_gateway::forwarding::{EventSink, ProxyEvent};
use endpoint_gateway::http::HttpServer;
use endpoint_gateway::lifecycle::Shutdown;
use tokio::net::TcpListener;

/// What a mock target received.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct Received {
    pub method: String,
    pub path_and_query: String,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

/// Start a mock target on an ephemeral port. It records every request and
/// answers with `status`, an `x-target-name` header and `body`.
pub async fn start_mock_target(
    status: StatusCode,
    body: &'static [u8],
) -> (SocketAddr, Arc<Mutex<Vec<Received>>>) {
    let received = Arc::new(Mutex::new(Vec::new()));
    let log = received.clone();

    let app = Router::new().fallback(move |request: Request<Body>| {
        let log = log.clone();
        async move {
            let (parts, payload) = request.into_parts();
            let payload = to_bytes(payload, usize::MAX).await.unwrap_or_default();
            log.lock().unwrap().push(Received {
                method: parts.method.to_string(),
                path_and_query: parts
                    .uri
                    .path_and_query()
                    .map(|pq| pq.to_string())
                    .unwrap_or_default(),
                headers: parts.headers,
                body: payload.to_vec(),
            });

            Response::builder()
                .status(status)
                .header("x-target-name", "mock")
                .header("content-type", "application/octet-stream")
                .body(Body::from(body))
                .unwrap()
        }
    });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    (addr, received)
}

/// An address with nothing listening on it.
#[allow(dead_code)]
pub async fn unused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Sink that keeps every event for inspection.
#[derive(Default)]
pub struct RecordingSink(Mutex<Vec<ProxyEvent>>);

#[allow(dead_code)]
impl RecordingSink {
    pub fn events(&self) -> Vec<ProxyEvent> {
        self.0.lock().unwrap().clone()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &ProxyEvent) {
        self.0.lock().unwrap().push(event.clone());
    }
}

/// Start the gateway on an ephemeral port with `sink` receiving events.
pub async fn start_gateway(
    config: GatewayConfig,
    sink: Arc<RecordingSink>,
) -> (SocketAddr, Shutdown) {
    let server = HttpServer::with_event_sink(config, sink).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

/// Client that never goes through an environment proxy.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}
