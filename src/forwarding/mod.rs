//! Forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! ForwardingDecision + inbound Request
//!     → engine.rs (rewrite URI, apply overrides, one outbound call)
//!     → transport.rs (reqwest client, or any injected Transport)
//!     → event.rs (exactly one ProxyEvent to the EventSink)
//!     → ForwardOutcome (relayed response or fixed 500)
//! ```

pub mod engine;
pub mod event;
pub mod transport;

pub use engine::{ForwardOutcome, ForwardingEngine};
pub use event::{EventSink, LogSink, ProxyEvent};
pub use transport::{ReqwestTransport, Transport, TransportError, TransportFuture};
