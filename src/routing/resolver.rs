//! Per-request target resolution.
//!
//! # Responsibilities
//! - Read the endpoint header and derive the target origin from it
//! - Keep the endpoint value verbatim as the outbound path
//! - Turn the credential header into an `Authorization` override
//! - Fall back to the configured origin when the endpoint is absent or unusable
//!
//! # Design Decisions
//! - Resolution never fails; a malformed endpoint degrades to the fallback
//! - Pure function of the request headers, no shared state

use axum::http::uri::InvalidUri;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Request, Uri};
use thiserror::Error;
use url::Url;

use crate::config::validation::{parse_origin, ValidationError};
use crate::config::RoutingConfig;
use crate::routing::headers::HeaderOverrides;

/// Why an endpoint header could not be used as a forwarding target.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedEndpointError {
    #[error("endpoint header is not valid UTF-8")]
    NotUtf8,

    #[error("endpoint {0:?} is not an absolute URL: {1}")]
    Unparseable(String, url::ParseError),

    #[error("endpoint {0:?} has unsupported scheme")]
    UnsupportedScheme(String),

    #[error("endpoint {0:?} has no host")]
    MissingHost(String),

    #[error("endpoint {0:?} is not a valid request target")]
    InvalidRequestTarget(String),
}

/// Which branch of resolution produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Target taken from the endpoint header.
    Endpoint,
    /// Endpoint absent or unusable; target is the fallback origin.
    Fallback,
}

impl Route {
    pub fn as_str(&self) -> &'static str {
        match self {
            Route::Endpoint => "endpoint",
            Route::Fallback => "fallback",
        }
    }
}

/// Where and how one inbound request is forwarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardingDecision {
    route: Route,
    target_origin: String,
    outbound_path: String,
    header_overrides: HeaderOverrides,
}

impl ForwardingDecision {
    /// Whether the endpoint header or the fallback chose the target.
    pub fn route(&self) -> Route {
        self.route
    }

    /// `scheme://host[:port]` of the target.
    pub fn target_origin(&self) -> &str {
        &self.target_origin
    }

    /// Request target sent upstream; either a path or a full URL.
    pub fn outbound_path(&self) -> &str {
        &self.outbound_path
    }

    /// Headers forced onto the outbound request.
    pub fn header_overrides(&self) -> &HeaderOverrides {
        &self.header_overrides
    }

    /// Absolute URI of the outbound request: the target origin followed by
    /// the path and query of `outbound_path`, byte for byte. The path is
    /// never resolved as a reference, so it cannot change the authority
    /// and dot segments are sent as written.
    pub fn outbound_uri(&self) -> Result<Uri, InvalidUri> {
        let path_and_query = if self.outbound_path.starts_with('/') {
            self.outbound_path.clone()
        } else {
            let absolute: Uri = self.outbound_path.parse()?;
            request_target(&absolute)
        };
        format!("{}{}", self.target_origin, path_and_query).parse()
    }
}

/// Origin-form request target of `uri`, always starting with `/`.
fn request_target(uri: &Uri) -> String {
    match uri.path_and_query().map(|pq| pq.as_str()) {
        Some(pq) if pq.starts_with('/') => pq.to_string(),
        Some(pq) => format!("/{pq}"),
        None => "/".to_string(),
    }
}

/// Resolves each request to a [`ForwardingDecision`].
#[derive(Debug, Clone)]
pub struct TargetResolver {
    endpoint_header: HeaderName,
    credential_header: HeaderName,
    fallback_origin: String,
}

impl TargetResolver {
    /// Create a resolver. `fallback_origin` must already be a canonical origin.
    pub fn new(
        endpoint_header: HeaderName,
        credential_header: HeaderName,
        fallback_origin: impl Into<String>,
    ) -> Self {
        Self {
            endpoint_header,
            credential_header,
            fallback_origin: fallback_origin.into(),
        }
    }

    /// Build a resolver from validated routing settings.
    pub fn from_config(config: &RoutingConfig) -> Result<Self, ValidationError> {
        let parse_name = |field: &'static str, value: &str| {
            HeaderName::from_bytes(value.as_bytes()).map_err(|_| {
                ValidationError::InvalidHeaderName {
                    field,
                    value: value.to_string(),
                }
            })
        };

        Ok(Self::new(
            parse_name("endpoint_header", &config.endpoint_header)?,
            parse_name("credential_header", &config.credential_header)?,
            parse_origin(&config.fallback_origin)?,
        ))
    }

    /// Origin used when no usable endpoint header is present.
    pub fn fallback_origin(&self) -> &str {
        &self.fallback_origin
    }

    /// Decide where `request` goes. Never fails.
    pub fn resolve<B>(&self, request: &Request<B>) -> ForwardingDecision {
        let headers = request.headers();

        let Some(endpoint) = headers
            .get(&self.endpoint_header)
            .filter(|v| !v.is_empty())
        else {
            return self.default_decision(request);
        };

        match parse_endpoint(endpoint) {
            Ok((target_origin, outbound_path)) => ForwardingDecision {
                route: Route::Endpoint,
                target_origin,
                outbound_path,
                header_overrides: self.credential_overrides(headers),
            },
            Err(e) => {
                tracing::warn!(
                    header = %self.endpoint_header,
                    error = %e,
                    fallback = %self.fallback_origin,
                    "Ignoring malformed endpoint header"
                );
                self.default_decision(request)
            }
        }
    }

    fn default_decision<B>(&self, request: &Request<B>) -> ForwardingDecision {
        ForwardingDecision {
            route: Route::Fallback,
            outbound_path: request_target(request.uri()),
            target_origin: self.fallback_origin.clone(),
            header_overrides: HeaderOverrides::new(),
        }
    }

    fn credential_overrides(&self, headers: &HeaderMap) -> HeaderOverrides {
        let mut overrides = HeaderOverrides::new();
        if let Some(credential) = headers.get(&self.credential_header) {
            overrides.set(header::AUTHORIZATION, credential.clone());
        }
        overrides
    }
}

fn parse_endpoint(value: &HeaderValue) -> Result<(String, String), MalformedEndpointError> {
    let raw = value.to_str().map_err(|_| MalformedEndpointError::NotUtf8)?;
    let url = Url::parse(raw)
        .map_err(|e| MalformedEndpointError::Unparseable(raw.to_string(), e))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(MalformedEndpointError::UnsupportedScheme(raw.to_string()));
    }
    if url.host_str().is_none() {
        return Err(MalformedEndpointError::MissingHost(raw.to_string()));
    }
    if raw.parse::<Uri>().is_err() {
        return Err(MalformedEndpointError::InvalidRequestTarget(raw.to_string()));
    }

    Ok((url.origin().ascii_serialization(), raw.to_string()))
}
