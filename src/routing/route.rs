//! Validated route definitions.
//!
//! # Design Decisions
//! - Mutually exclusive config fields become sum types here, so "both set"
//!   and "neither set" are unrepresentable after validation
//! - Routes are immutable once built and owned by the route table

/// Where the device id of an inbound message comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceIdSource {
    /// A named path parameter of the route pattern.
    PathParam(String),

    /// A named top-level field of the request body.
    BodyField(String),

    /// A jq query evaluated against the original (untransformed) request body.
    BodyQuery(String),
}

/// Where the auth key of an inbound message comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthSource {
    /// A named request header. An absent header resolves to an empty key,
    /// which is forwarded as-is.
    Header(String),

    /// A named query parameter. Absence is rejected; the first value wins.
    QueryParam(String),
}

/// A validated description of one inbound D2C message route.
#[derive(Debug, Clone)]
pub struct Route {
    /// Path pattern this route is registered at (e.g., "/{deviceId}/telemetry").
    pub path: String,

    /// jq query applied to the request body. `None` means pass-through.
    pub transform: Option<String>,

    /// Device id resolution strategy.
    pub device_id: DeviceIdSource,

    /// Auth key resolution strategy.
    pub auth: AuthSource,
}
