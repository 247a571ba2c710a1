//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize, resolve transform files)
//!     → validation.rs (semantic checks, raw → validated routes)
//!     → LoadedConfig (validated, immutable)
//!     → consumed once at startup by the route table and server
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no reload path
//! - All sections have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError, LoadedConfig};
pub use schema::{AdapterConfig, BridgeConfig, ListenerConfig, ObservabilityConfig, RouteConfigRaw};
pub use validation::ValidationError;
