//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, every method and path)
//!     → request.rs (assign request ID)
//!     → [routing layer resolves the target]
//!     → [forwarding engine performs the outbound call]
//!     → response.rs (fixed error response on failure)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{UuidRequestId, X_REQUEST_ID};
pub use response::{fallback_error_response, FALLBACK_ERROR_BODY};
pub use server::{AppState, HttpServer};
