//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (uri, headers)
//!     → resolver.rs (endpoint header → origin + path, credential → override)
//!     → headers.rs (override set, hop-by-hop list)
//!     → Return: ForwardingDecision (always, fallback origin on miss)
//! ```
//!
//! # Design Decisions
//! - Header names come from config, compiled once at startup
//! - Deterministic: same headers always resolve to the same decision
//! - No explicit NoMatch: every request has a target

pub mod headers;
pub mod resolver;

pub use headers::HeaderOverrides;
pub use resolver::{ForwardingDecision, MalformedEndpointError, Route, TargetResolver};
