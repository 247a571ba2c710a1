//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (at startup):
//!     validated Route[]
//!     → allocate transform handles, compile queries into the cache
//!     → reject duplicate paths
//!     → freeze as immutable RouteTable
//!
//! At runtime the HTTP layer matches requests to one augmented route and
//! runs the message pipeline against it.
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Mutually exclusive config options are sum types, checked once
//! - Explicit build failure rather than a partially usable table

pub mod route;
pub mod table;

pub use route::{AuthSource, DeviceIdSource, Route};
pub use table::{AugmentedRoute, BuildError, DeviceIdResolver, RouteTable};
