//! Observability subsystem.
//!
//! # Design Decisions
//! - Structured logging via `tracing`; the per-request log line carries
//!   path, status, and elapsed time, never credential values
//! - Metrics are cheap (atomic updates) and exposed on a separate listener

pub mod logging;
pub mod metrics;
