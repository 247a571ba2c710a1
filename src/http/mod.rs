//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, one handler per configured route)
//!     → middleware.rs (request id, logging, metrics)
//!     → handler.rs (decode → transform → coerce → resolve → forward)
//!     → response.rs (200 empty, or {"error": …})
//! ```

pub mod handler;
pub mod middleware;
pub mod response;
pub mod server;

pub use handler::{RouteContext, MAX_BODY_SIZE};
pub use response::ErrorBody;
pub use server::HttpServer;
