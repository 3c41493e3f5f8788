//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Request path produces:
//!     → logging.rs (structured log events, request spans)
//!     → metrics.rs (counters, histograms)
//!     → forwarding::event (one ProxyEvent per request)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through spans and to the target
//! - Metrics are cheap and never fail a request

pub mod logging;
pub mod metrics;
