//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, status, route
//! - `gateway_request_duration_seconds` (histogram): time to response head
//!
//! Without an installed recorder the macros are no-ops, so recording is
//! unconditional and only the exporter is optional.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::routing::Route;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record one handled request.
///
/// Labels stay bounded: the target host comes from a caller header and is
/// never a label, only whether the endpoint or the fallback was used.
pub fn record_request(method: &str, status: u16, route: Route, start: Instant) {
    let method = method.to_string();
    let status = status.to_string();

    ::metrics::counter!(
        "gateway_requests_total",
        "method" => method.clone(),
        "status" => status.clone(),
        "route" => route.as_str()
    )
    .increment(1);

    ::metrics::histogram!(
        "gateway_request_duration_seconds",
        "method" => method,
        "status" => status,
        "route" => route.as_str()
    )
    .record(start.elapsed().as_secs_f64());
}
