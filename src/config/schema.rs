//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the adapter.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the transform adapter.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AdapterConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Device bridge endpoint configuration.
    pub bridge: BridgeConfig,

    /// D2C message route definitions.
    pub routes: Vec<RouteConfigRaw>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Device bridge endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Base URL of the device bridge API (e.g., "https://mybridge.example.com/api/v1/").
    pub base_url: String,

    /// Request timeout for bridge calls in seconds.
    pub request_timeout_secs: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            request_timeout_secs: 30,
        }
    }
}

/// Raw D2C message route definition, as it appears in the config file.
///
/// Exactly one of the device id fields and exactly one of the auth fields
/// must be set; this is checked by semantic validation, which converts the
/// raw entry into a `routing::Route`.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RouteConfigRaw {
    /// Path pattern for requests routed to this transform (e.g., "/{deviceId}/telemetry").
    pub path: String,

    /// jq query applied to the request body. Absent means pass-through.
    pub transform: Option<String>,

    /// File containing the jq query, relative to the config file directory.
    /// Mutually exclusive with `transform`.
    pub transform_file: Option<String>,

    /// Path parameter containing the device id.
    pub device_id_path_param: Option<String>,

    /// Body field containing the device id.
    pub device_id_body_field: Option<String>,

    /// jq query that picks the device id from the request body.
    pub device_id_body_query: Option<String>,

    /// Header containing the auth key.
    pub auth_header: Option<String>,

    /// Query parameter containing the auth key.
    pub auth_query_param: Option<String>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AdapterConfig::default();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert!(config.routes.is_empty());
        assert!(!config.observability.metrics_enabled);
    }

    #[test]
    fn test_parse_route_entry() {
        let config: AdapterConfig = toml::from_str(
            r#"
            [bridge]
            base_url = "https://bridge.example.com/api/v1/"

            [[routes]]
            path = "/{deviceId}/telemetry"
            transform = "{ data: .telemetry }"
            device_id_path_param = "deviceId"
            auth_header = "x-api-key"
            "#,
        )
        .unwrap();

        assert_eq!(config.routes.len(), 1);
        let route = &config.routes[0];
        assert_eq!(route.path, "/{deviceId}/telemetry");
        assert_eq!(route.transform.as_deref(), Some("{ data: .telemetry }"));
        assert_eq!(route.device_id_path_param.as_deref(), Some("deviceId"));
        assert!(route.auth_query_param.is_none());
    }
}
