//! Outbound HTTP transport.
//!
//! # Responsibilities
//! - Perform exactly one outbound call per request
//! - Stream the request body up and the response body down
//! - Classify failures (connect, timeout, other)
//!
//! # Design Decisions
//! - Pluggable behind [`Transport`]; any matching closure is a transport
//! - The timeout bounds the response head only, bodies stream unbounded
//! - Redirects are relayed to the caller, never followed
//! - Dropping the returned future aborts the call

use std::error::Error as StdError;
use std::time::Duration;

use axum::body::{Body, HttpBody};
use axum::http::{Request, Response};
use futures_util::future::BoxFuture;
use thiserror::Error;

use crate::config::TimeoutConfig;

/// Failure of the outbound call.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection to target failed: {0}")]
    Connect(String),

    #[error("target did not respond within {0:?}")]
    Timeout(Duration),

    #[error("outbound request failed: {0}")]
    Request(String),

    #[error("invalid outbound target: {0}")]
    InvalidTarget(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        let detail = error_chain(&e);
        if e.is_connect() {
            TransportError::Connect(detail)
        } else {
            TransportError::Request(detail)
        }
    }
}

fn error_chain(e: &dyn StdError) -> String {
    let mut detail = e.to_string();
    let mut source = e.source();
    while let Some(cause) = source {
        detail.push_str(": ");
        detail.push_str(&cause.to_string());
        source = cause.source();
    }
    detail
}

/// Future returned by [`Transport::send`].
pub type TransportFuture = BoxFuture<'static, Result<Response<Body>, TransportError>>;

/// The outbound call primitive. `request` carries an absolute URI.
pub trait Transport: Send + Sync {
    fn send(&self, request: Request<Body>) -> TransportFuture;
}

impl<F> Transport for F
where
    F: Fn(Request<Body>) -> TransportFuture + Send + Sync,
{
    fn send(&self, request: Request<Body>) -> TransportFuture {
        self(request)
    }
}

/// Transport backed by a pooled reqwest client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    upstream_timeout: Duration,
}

impl ReqwestTransport {
    pub fn new(config: &TimeoutConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_secs))
            .redirect(reqwest::redirect::Policy::none())
            .no_proxy()
            .build()?;

        Ok(Self {
            client,
            upstream_timeout: Duration::from_secs(config.upstream_secs),
        })
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: Request<Body>) -> TransportFuture {
        let client = self.client.clone();
        let timeout = self.upstream_timeout;

        Box::pin(async move {
            let (parts, body) = request.into_parts();

            let mut outbound = client
                .request(parts.method, parts.uri.to_string())
                .headers(parts.headers);
            if body.size_hint().exact() != Some(0) {
                outbound = outbound.body(reqwest::Body::wrap_stream(body.into_data_stream()));
            }

            let upstream = match tokio::time::timeout(timeout, outbound.send()).await {
                Ok(Ok(upstream)) => upstream,
                Ok(Err(e)) => return Err(TransportError::from(e)),
                Err(_) => return Err(TransportError::Timeout(timeout)),
            };

            let mut response = Response::builder()
                .status(upstream.status())
                .version(upstream.version());
            if let Some(headers) = response.headers_mut() {
                *headers = upstream.headers().clone();
            }

            response
                .body(Body::from_stream(upstream.bytes_stream()))
                .map_err(|e| TransportError::Request(e.to_string()))
        })
    }
}
