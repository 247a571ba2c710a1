//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::{AdapterConfig, BridgeConfig, ListenerConfig, ObservabilityConfig};
use crate::config::validation::{build_route, validate_routes, ValidationError};
use crate::routing::Route;

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// A fully loaded and validated adapter configuration.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub listener: ListenerConfig,
    pub bridge: BridgeConfig,
    pub observability: ObservabilityConfig,
    pub routes: Vec<Route>,
}

/// Load and validate an adapter configuration from a TOML file.
///
/// `transform_file` references are read relative to the config file's
/// directory and replace the inline query text.
pub fn load_config(path: &Path) -> Result<LoadedConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: AdapterConfig = toml::from_str(&content).map_err(ConfigError::Parse)?;
    let config_dir = path.parent().unwrap_or_else(|| Path::new("."));

    validate_routes(&config.routes).map_err(ConfigError::Validation)?;

    let mut routes = Vec::with_capacity(config.routes.len());
    for raw in &config.routes {
        let transform = match &raw.transform_file {
            Some(file) if !file.is_empty() => {
                Some(fs::read_to_string(config_dir.join(file)).map_err(ConfigError::Io)?)
            }
            _ => raw.transform.clone(),
        };
        routes.push(build_route(raw, transform).map_err(|e| ConfigError::Validation(vec![e]))?);
    }

    Ok(LoadedConfig {
        listener: config.listener,
        bridge: config.bridge,
        observability: config.observability,
        routes,
    })
}
