//! Query transformation subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     route config (jq text)
//!         → engine.rs add() (parse, compile)
//!         → stored program keyed by TransformHandle
//!
//! Per request:
//!     decoded JSON body
//!         → engine.rs execute() (run compiled program)
//!         → single transformed value, or a typed failure
//! ```
//!
//! # Design Decisions
//! - Compile once at startup, execute many at runtime
//! - Compilation failures are configuration errors, not runtime conditions
//! - Entries live for the process lifetime; no eviction or reuse

pub mod engine;

pub use engine::{CompileError, ExecError, TransformCache, TransformHandle};
