//! Lifecycle management subsystem.
//!
//! # Design Decisions
//! - Ordered startup: config first, then route compilation, listener last
//! - Any startup error is fatal; the process does not start half-configured
//! - Shutdown drains in-flight requests via Axum's graceful shutdown

pub mod shutdown;

pub use shutdown::{wait_for_shutdown, Shutdown};
