//! Device bridge API types and error definitions.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// A D2C message in the shape the device bridge accepts.
///
/// Unknown fields in the transformed payload are ignored when decoding, so a
/// transform may carry extra keys without failing the structural check.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageBody {
    /// Telemetry payload forwarded to the device.
    #[serde(default)]
    pub data: Map<String, Value>,

    /// Message properties, all string-valued.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub properties: HashMap<String, String>,

    /// Target component name, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_name: Option<String>,

    /// Message creation time. Coerced from an RFC-3339 string by the pipeline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_time_utc: Option<DateTime<Utc>>,
}

/// An API key credential resolved from an inbound request.
///
/// The key is attached to a single outbound call and never cached. `Debug`
/// is redacted so the value cannot leak into logs.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The raw key value, for building the authorization header.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiKey(<redacted>)")
    }
}

impl From<&str> for ApiKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for ApiKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

/// Response of a successful bridge call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeResponse {
    /// HTTP status reported by the bridge.
    pub status: u16,
}

/// Errors that can occur when calling the device bridge.
#[derive(Debug, Clone, Error)]
pub enum BridgeError {
    /// The bridge answered with a non-success status.
    #[error("bridge returned status {status}: {message}")]
    Api { status: u16, message: String },

    /// The call never produced a bridge response.
    #[error("transport error: {0}")]
    Transport(String),
}

impl BridgeError {
    /// The bridge-reported status code, when the failure carries one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            BridgeError::Api { status, .. } => Some(*status),
            BridgeError::Transport(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_message_body_decode() {
        let body: MessageBody = serde_json::from_value(json!({
            "data": { "temperature": 21 },
            "properties": { "origin": "gateway-3" },
            "componentName": "thermostat",
            "creationTimeUtc": "2031-09-22T12:42:31Z"
        }))
        .unwrap();

        assert_eq!(body.data["temperature"], json!(21));
        assert_eq!(body.properties["origin"], "gateway-3");
        assert_eq!(body.component_name.as_deref(), Some("thermostat"));
        assert_eq!(
            body.creation_time_utc.unwrap().to_rfc3339(),
            "2031-09-22T12:42:31+00:00"
        );
    }

    #[test]
    fn test_message_body_ignores_unknown_fields() {
        let body: MessageBody = serde_json::from_value(json!({
            "data": { "t": 1 },
            "extra": "ignored"
        }))
        .unwrap();
        assert_eq!(body.data["t"], json!(1));
    }

    #[test]
    fn test_message_body_rejects_wrong_shapes() {
        assert!(serde_json::from_value::<MessageBody>(json!({ "data": "bad data" })).is_err());
        assert!(serde_json::from_value::<MessageBody>(json!("not an object")).is_err());
        assert!(
            serde_json::from_value::<MessageBody>(json!({ "properties": { "a": 1 } })).is_err()
        );
    }

    #[test]
    fn test_api_key_debug_is_redacted() {
        let key = ApiKey::new("super-secret");
        assert_eq!(format!("{:?}", key), "ApiKey(<redacted>)");
    }

    #[test]
    fn test_bridge_error_status_code() {
        let err = BridgeError::Api {
            status: 401,
            message: "bad request".to_string(),
        };
        assert_eq!(err.status_code(), Some(401));
        assert!(BridgeError::Transport("refused".to_string())
            .status_code()
            .is_none());
    }
}
