//! HTTP transform adapter for a device bridge.
//!
//! Receives device-to-cloud messages over HTTP, reshapes each body with a
//! per-route jq query, resolves an API key and a device id from the request,
//! and forwards the result to the device bridge API.

pub mod bridge;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod transform;

pub use config::{load_config, LoadedConfig};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
