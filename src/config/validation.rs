//! Configuration validation.
//!
//! Serde handles syntax; this module checks semantics. Every problem is
//! reported, not just the first one.

use std::net::SocketAddr;

use axum::http::HeaderName;
use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("routing.{field}: invalid header name {value:?}")]
    InvalidHeaderName { field: &'static str, value: String },

    #[error("routing: endpoint_header and credential_header must differ (both {0:?})")]
    DuplicateHeader(String),

    #[error("routing.fallback_origin: {0}")]
    InvalidOrigin(String),

    #[error("timeouts.{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("observability.metrics_address: cannot parse {0:?} as a socket address")]
    InvalidMetricsAddress(String),
}

/// Validate a configuration, collecting every error found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let endpoint = check_header(
        "endpoint_header",
        &config.routing.endpoint_header,
        &mut errors,
    );
    let credential = check_header(
        "credential_header",
        &config.routing.credential_header,
        &mut errors,
    );
    if let (Some(endpoint), Some(credential)) = (endpoint, credential) {
        if endpoint == credential {
            errors.push(ValidationError::DuplicateHeader(endpoint.to_string()));
        }
    }

    if let Err(e) = parse_origin(&config.routing.fallback_origin) {
        errors.push(e);
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("connect_secs"));
    }
    if config.timeouts.upstream_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("upstream_secs"));
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_header(
    field: &'static str,
    value: &str,
    errors: &mut Vec<ValidationError>,
) -> Option<HeaderName> {
    match HeaderName::from_bytes(value.as_bytes()) {
        Ok(name) => Some(name),
        Err(_) => {
            errors.push(ValidationError::InvalidHeaderName {
                field,
                value: value.to_string(),
            });
            None
        }
    }
}

/// Parse a bare `scheme://host[:port]` origin, returning its canonical form.
pub fn parse_origin(value: &str) -> Result<String, ValidationError> {
    let url = Url::parse(value)
        .map_err(|e| ValidationError::InvalidOrigin(format!("{value:?}: {e}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ValidationError::InvalidOrigin(format!(
            "{value:?}: scheme must be http or https"
        )));
    }
    if url.host_str().is_none() {
        return Err(ValidationError::InvalidOrigin(format!("{value:?}: missing host")));
    }
    if url.path() != "/" || url.query().is_some() || url.fragment().is_some() {
        return Err(ValidationError::InvalidOrigin(format!(
            "{value:?}: must not carry a path, query or fragment"
        )));
    }

    Ok(url.origin().ascii_serialization())
}
