//! Per-route D2C message pipeline.
//!
//! # Data Flow
//! ```text
//! POST <route path>
//!     → decode JSON body (bounded to 1 MiB)
//!     → body transform (compiled query, or pass-through)
//!     → creationTimeUtc coercion
//!     → structural decode into MessageBody
//!     → resolve API key (header or query parameter)
//!     → resolve device id (path param, body field, or body query)
//!     → send to the device bridge, retries disabled
//! ```
//!
//! # Design Decisions
//! - Every failure is terminal for the request; there are no fallbacks and
//!   no internal retries
//! - The device id is always resolved from the original decoded body, not
//!   the transformed payload
//! - Bridge failures surface the bridge-reported status when one is carried

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Request};
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::bridge::{ApiKey, BridgeClientFactory, MessageBody};
use crate::http::response::error_response;
use crate::routing::{AugmentedRoute, AuthSource, DeviceIdResolver};
use crate::transform::TransformCache;

/// Maximum accepted request body size (1 MiB).
pub const MAX_BODY_SIZE: usize = 1024 * 1024;

/// Body field coerced into a structured timestamp before the shape check.
const CREATION_TIME_FIELD: &str = "creationTimeUtc";

/// Everything one route's handler needs, captured at startup.
///
/// Holds the augmented route plus shared read-only collaborators; no mutable
/// state is shared between requests.
pub struct RouteContext {
    pub route: AugmentedRoute,
    pub transforms: Arc<TransformCache>,
    pub new_bridge_client: BridgeClientFactory,
}

/// Handle one inbound D2C message for the context's route.
pub async fn handle_d2c_message(
    ctx: Arc<RouteContext>,
    Path(path_params): Path<HashMap<String, String>>,
    request: Request,
) -> Response {
    let (parts, body) = request.into_parts();

    // Bounded read: oversized bodies are rejected before full buffering.
    let bytes = match axum::body::to_bytes(body, MAX_BODY_SIZE).await {
        Ok(bytes) => bytes,
        Err(e) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("failed to decode JSON body: {}", e),
            )
        }
    };

    let json_body: Map<String, Value> = match serde_json::from_slice(&bytes) {
        Ok(body) => body,
        Err(e) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("failed to decode JSON body: {}", e),
            )
        }
    };

    // Execute the body transformation if one was provided. If not, the route
    // is pass-through.
    let mut payload = match ctx.route.transform {
        Some(handle) => {
            match ctx
                .transforms
                .execute(handle, Value::Object(json_body.clone()))
            {
                Ok(value) => value,
                Err(e) => {
                    return error_response(
                        StatusCode::BAD_REQUEST,
                        format!("payload transformation failed: {}", e),
                    )
                }
            }
        }
        None => Value::Object(json_body.clone()),
    };

    if let Err(reason) = coerce_timestamp_field(&mut payload, CREATION_TIME_FIELD) {
        return error_response(
            StatusCode::BAD_REQUEST,
            format!("failed to parse \"{}\": {}", CREATION_TIME_FIELD, reason),
        );
    }

    let message: MessageBody = match serde_json::from_value(payload) {
        Ok(message) => message,
        Err(e) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                format!(
                    "failed to convert payload to device bridge message format: {}",
                    e
                ),
            )
        }
    };

    let api_key = match resolve_api_key(&ctx.route.route.auth, &parts.uri, &parts.headers) {
        Ok(key) => key,
        Err(response) => return response,
    };

    let device_id = match resolve_device_id(&ctx, &json_body, &path_params) {
        Ok(device_id) => device_id,
        Err(response) => return response,
    };

    let mut client = (ctx.new_bridge_client)();
    client.set_authorization(api_key);
    client.set_retry_policy(1); // the bridge applies its own retries

    match client.send_message(&device_id, &message).await {
        Ok(_) => StatusCode::OK.into_response(),
        Err(e) => {
            // Surface the bridge status code if we have one.
            let status = e
                .status_code()
                .and_then(|code| StatusCode::from_u16(code).ok())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            error_response(status, format!("call to device bridge failed: {}", e))
        }
    }
}

/// Extract the API key according to the route's auth source.
fn resolve_api_key(auth: &AuthSource, uri: &Uri, headers: &HeaderMap) -> Result<ApiKey, Response> {
    match auth {
        AuthSource::QueryParam(name) => match first_query_value(uri, name) {
            Some(value) => Ok(ApiKey::new(value)),
            None => Err(error_response(
                StatusCode::BAD_REQUEST,
                format!("expected auth query parameter \"{}\" to be defined", name),
            )),
        },
        // An absent header resolves to an empty key, which is forwarded
        // as-is; the query parameter path above rejects absence instead.
        AuthSource::Header(name) => {
            let value = headers
                .get(name.as_str())
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default();
            Ok(ApiKey::new(value))
        }
    }
}

/// Extract the device id according to the route's resolution strategy.
///
/// Body strategies read the original decoded body.
fn resolve_device_id(
    ctx: &RouteContext,
    json_body: &Map<String, Value>,
    path_params: &HashMap<String, String>,
) -> Result<String, Response> {
    match &ctx.route.device_id {
        DeviceIdResolver::BodyQuery(handle) => {
            let result = ctx
                .transforms
                .execute(*handle, Value::Object(json_body.clone()))
                .map_err(|e| {
                    error_response(
                        StatusCode::BAD_REQUEST,
                        format!("device id body query failed: {}", e),
                    )
                })?;
            match result {
                Value::String(device_id) if !device_id.is_empty() => Ok(device_id),
                _ => Err(error_response(
                    StatusCode::BAD_REQUEST,
                    "expected result from device id body query to be a non-empty string",
                )),
            }
        }
        DeviceIdResolver::BodyField(name) => match json_body.get(name) {
            Some(Value::String(device_id)) if !device_id.is_empty() => Ok(device_id.clone()),
            Some(_) => Err(error_response(
                StatusCode::BAD_REQUEST,
                format!(
                    "expected device id in \"{}\" body field to be a non-empty string",
                    name
                ),
            )),
            None => Err(error_response(
                StatusCode::BAD_REQUEST,
                format!("expected device id in \"{}\" body field", name),
            )),
        },
        DeviceIdResolver::PathParam(name) => match path_params.get(name) {
            Some(device_id) => Ok(device_id.clone()),
            None => Err(error_response(
                StatusCode::BAD_REQUEST,
                format!(
                    "no device id specified: path parameter \"{}\" not present in request",
                    name
                ),
            )),
        },
    }
}

/// First value of a query parameter, if the parameter is present at all.
fn first_query_value(uri: &Uri, name: &str) -> Option<String> {
    let query = uri.query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

/// Coerce a string timestamp field of `payload` into its canonical UTC form,
/// in place. Absent or null fields are left alone; a present field must be an
/// RFC-3339 string.
fn coerce_timestamp_field(payload: &mut Value, field: &str) -> Result<(), String> {
    let object = match payload.as_object_mut() {
        Some(object) => object,
        None => return Ok(()),
    };

    let raw = match object.get(field) {
        Some(raw) if !raw.is_null() => raw,
        _ => return Ok(()),
    };

    let text = match raw.as_str() {
        Some(text) => text,
        None => {
            return Err(format!(
                "if provided, field \"{}\" must be a timestamp string",
                field
            ))
        }
    };

    let parsed = DateTime::parse_from_rfc3339(text).map_err(|e| e.to_string())?;
    let coerced =
        serde_json::to_value(parsed.with_timezone(&Utc)).map_err(|e| e.to_string())?;
    object.insert(field.to_string(), coerced);
    Ok(())
}
