//! Header-routed HTTP forwarding gateway library.

pub mod config;
pub mod error;
pub mod forwarding;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::GatewayConfig;
pub use error::GatewayError;
pub use forwarding::{ForwardOutcome, ForwardingEngine, ProxyEvent};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::{ForwardingDecision, TargetResolver};
