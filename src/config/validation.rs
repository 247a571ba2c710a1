//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Enforce exactly-one-of rules for device id and auth sources
//! - Convert raw route entries into validated `routing::Route` values
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function over the raw config
//! - Runs before any route is accepted into the system

use thiserror::Error;

use crate::config::schema::RouteConfigRaw;
use crate::routing::{AuthSource, DeviceIdSource, Route};

/// A semantic error in one route definition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The route has no path.
    #[error("path missing in route definition")]
    MissingPath,

    /// The route path does not start with a slash.
    #[error("path {path} must begin with '/'")]
    InvalidPath { path: String },

    /// Both an inline query and a query file were given.
    #[error("either transform or transform_file may be defined, not both, in route {path}")]
    ConflictingTransform { path: String },

    /// Zero or more than one auth source was given.
    #[error("exactly one of auth_header or auth_query_param must be defined in route {path}")]
    InvalidAuthSource { path: String },

    /// Zero or more than one device id source was given.
    #[error(
        "exactly one of device_id_path_param, device_id_body_field, or \
         device_id_body_query must be defined in route {path}"
    )]
    InvalidDeviceIdSource { path: String },
}

fn set(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|v| !v.is_empty())
}

/// Check every route entry, collecting all errors.
pub fn validate_routes(routes: &[RouteConfigRaw]) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    for route in routes {
        if route.path.is_empty() {
            errors.push(ValidationError::MissingPath);
            continue;
        }

        if !route.path.starts_with('/') {
            errors.push(ValidationError::InvalidPath {
                path: route.path.clone(),
            });
        }

        if set(&route.transform) && set(&route.transform_file) {
            errors.push(ValidationError::ConflictingTransform {
                path: route.path.clone(),
            });
        }

        let auth_sources = [&route.auth_header, &route.auth_query_param]
            .iter()
            .filter(|f| set(f))
            .count();
        if auth_sources != 1 {
            errors.push(ValidationError::InvalidAuthSource {
                path: route.path.clone(),
            });
        }

        let device_id_sources = [
            &route.device_id_path_param,
            &route.device_id_body_field,
            &route.device_id_body_query,
        ]
        .iter()
        .filter(|f| set(f))
        .count();
        if device_id_sources != 1 {
            errors.push(ValidationError::InvalidDeviceIdSource {
                path: route.path.clone(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Convert a raw entry that passed [`validate_routes`] into a [`Route`].
///
/// `transform` is the resolved query text (inline, or read from
/// `transform_file` by the loader).
pub fn build_route(
    raw: &RouteConfigRaw,
    transform: Option<String>,
) -> Result<Route, ValidationError> {
    let device_id = if set(&raw.device_id_path_param) {
        DeviceIdSource::PathParam(raw.device_id_path_param.clone().unwrap_or_default())
    } else if set(&raw.device_id_body_field) {
        DeviceIdSource::BodyField(raw.device_id_body_field.clone().unwrap_or_default())
    } else if set(&raw.device_id_body_query) {
        DeviceIdSource::BodyQuery(raw.device_id_body_query.clone().unwrap_or_default())
    } else {
        return Err(ValidationError::InvalidDeviceIdSource {
            path: raw.path.clone(),
        });
    };

    let auth = if set(&raw.auth_header) {
        AuthSource::Header(raw.auth_header.clone().unwrap_or_default())
    } else if set(&raw.auth_query_param) {
        AuthSource::QueryParam(raw.auth_query_param.clone().unwrap_or_default())
    } else {
        return Err(ValidationError::InvalidAuthSource {
            path: raw.path.clone(),
        });
    };

    Ok(Route {
        path: raw.path.clone(),
        transform: transform.filter(|t| !t.is_empty()),
        device_id,
        auth,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_route() -> RouteConfigRaw {
        RouteConfigRaw {
            path: "/{id}/message".to_string(),
            device_id_path_param: Some("id".to_string()),
            auth_header: Some("key".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_route() {
        assert_eq!(validate_routes(&[base_route()]), Ok(()));
    }

    #[test]
    fn test_path_missing() {
        let mut route = base_route();
        route.path = String::new();
        let errs = validate_routes(&[route]).unwrap_err();
        assert_eq!(errs, vec![ValidationError::MissingPath]);
    }

    #[test]
    fn test_path_without_leading_slash() {
        let mut route = base_route();
        route.path = "message".to_string();
        let errs = validate_routes(&[route]).unwrap_err();
        assert!(errs.contains(&ValidationError::InvalidPath {
            path: "message".to_string()
        }));
    }

    #[test]
    fn test_conflicting_transforms() {
        let mut route = base_route();
        route.transform = Some(".".to_string());
        route.transform_file = Some("transform.jq".to_string());
        let errs = validate_routes(&[route]).unwrap_err();
        assert!(errs.contains(&ValidationError::ConflictingTransform {
            path: "/{id}/message".to_string()
        }));
    }

    #[test]
    fn test_auth_missing() {
        let mut route = base_route();
        route.auth_header = None;
        let errs = validate_routes(&[route]).unwrap_err();
        assert_eq!(
            errs,
            vec![ValidationError::InvalidAuthSource {
                path: "/{id}/message".to_string()
            }]
        );
    }

    #[test]
    fn test_auth_both() {
        let mut route = base_route();
        route.auth_query_param = Some("key".to_string());
        let errs = validate_routes(&[route]).unwrap_err();
        assert_eq!(
            errs,
            vec![ValidationError::InvalidAuthSource {
                path: "/{id}/message".to_string()
            }]
        );
    }

    #[test]
    fn test_device_id_missing() {
        let mut route = base_route();
        route.device_id_path_param = None;
        let errs = validate_routes(&[route]).unwrap_err();
        assert_eq!(
            errs,
            vec![ValidationError::InvalidDeviceIdSource {
                path: "/{id}/message".to_string()
            }]
        );
    }

    #[test]
    fn test_device_id_both() {
        let mut route = base_route();
        route.device_id_body_query = Some(".device.id".to_string());
        let errs = validate_routes(&[route]).unwrap_err();
        assert_eq!(
            errs,
            vec![ValidationError::InvalidDeviceIdSource {
                path: "/{id}/message".to_string()
            }]
        );
    }

    #[test]
    fn test_all_errors_reported() {
        let mut bad_auth = base_route();
        bad_auth.auth_header = None;
        let mut bad_device = base_route();
        bad_device.device_id_path_param = None;
        let errs = validate_routes(&[bad_auth, bad_device]).unwrap_err();
        assert_eq!(errs.len(), 2);
    }

    #[test]
    fn test_build_route_sources() {
        let route = build_route(&base_route(), None).unwrap();
        assert_eq!(route.device_id, DeviceIdSource::PathParam("id".to_string()));
        assert_eq!(route.auth, AuthSource::Header("key".to_string()));
        assert!(route.transform.is_none());

        let mut raw = base_route();
        raw.device_id_path_param = None;
        raw.device_id_body_field = Some("device".to_string());
        raw.auth_header = None;
        raw.auth_query_param = Some("apikey".to_string());
        let route = build_route(&raw, Some("{ data: .telemetry }".to_string())).unwrap();
        assert_eq!(
            route.device_id,
            DeviceIdSource::BodyField("device".to_string())
        );
        assert_eq!(route.auth, AuthSource::QueryParam("apikey".to_string()));
        assert_eq!(route.transform.as_deref(), Some("{ data: .telemetry }"));
    }
}
