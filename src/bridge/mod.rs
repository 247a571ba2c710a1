//! Device bridge client subsystem.
//!
//! # Data Flow
//! ```text
//! Per request:
//!     factory() → fresh BridgeClient handle
//!     → set_authorization(resolved API key)
//!     → set_retry_policy(1)
//!     → send_message(device id, MessageBody)
//!     → BridgeResponse, or BridgeError with an optional carried status
//! ```
//!
//! # Design Decisions
//! - The pipeline depends only on the `BridgeClient` trait; the HTTP
//!   implementation is swapped out in tests via the factory
//! - Authorization is per-handle state, never cached across requests

pub mod client;
pub mod models;

pub use client::{BridgeClient, BridgeClientFactory, ClientSetupError, HttpBridgeClient};
pub use models::{ApiKey, BridgeError, BridgeResponse, MessageBody};
