//! Crate-level error type for startup failures.
//!
//! Request-time failures never surface here: they are folded into the fixed
//! error response by the forwarding engine.

use thiserror::Error;

use crate::config::{ConfigError, ValidationError};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid configuration: {0}")]
    Validation(#[from] ValidationError),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("failed to start metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
