//! Route table construction at startup.
//!
//! # Responsibilities
//! - Allocate transform handles and register configured queries
//! - Reject duplicate paths
//! - Freeze the augmented routes consumed by the HTTP layer
//!
//! # Design Decisions
//! - Any query compilation failure aborts the build; a malformed query is a
//!   configuration error, not a runtime condition
//! - The table is immutable after construction and shared read-only
//! - Device id queries are resolved to their cache handle at build time, so
//!   the request path never sees an unregistered query

use std::collections::HashSet;

use thiserror::Error;

use crate::routing::route::{DeviceIdSource, Route};
use crate::transform::{CompileError, TransformCache, TransformHandle};

/// Device id resolution with its body query already compiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceIdResolver {
    /// Read a named path parameter of the matched route.
    PathParam(String),

    /// Read a named top-level field of the original request body.
    BodyField(String),

    /// Execute the compiled query against the original request body.
    BodyQuery(TransformHandle),
}

/// A route definition augmented with the handles of its cached queries.
#[derive(Debug, Clone)]
pub struct AugmentedRoute {
    pub route: Route,

    /// Handle of the compiled body transform. `None` for pass-through routes.
    pub transform: Option<TransformHandle>,

    /// Device id resolution strategy, queries pre-compiled.
    pub device_id: DeviceIdResolver,
}

/// Fatal error while assembling the route table.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("route path {path} is registered more than once")]
    DuplicatePath { path: String },

    #[error("failed to add body transform for route {path}: {source}")]
    BadTransform { path: String, source: CompileError },

    #[error("failed to add device id query for route {path}: {source}")]
    BadDeviceIdQuery { path: String, source: CompileError },
}

/// Immutable set of augmented routes, one per configured path.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Vec<AugmentedRoute>,
}

impl RouteTable {
    /// Build the table, compiling every configured query into `cache`.
    pub fn build(routes: Vec<Route>, cache: &TransformCache) -> Result<Self, BuildError> {
        let mut seen_paths = HashSet::new();
        let mut augmented = Vec::with_capacity(routes.len());

        for route in routes {
            tracing::info!(path = %route.path, "Initializing route");

            if !seen_paths.insert(route.path.clone()) {
                return Err(BuildError::DuplicatePath { path: route.path });
            }

            let transform = match &route.transform {
                Some(query) => {
                    let handle = TransformHandle::new();
                    cache
                        .add(handle, query)
                        .map_err(|source| BuildError::BadTransform {
                            path: route.path.clone(),
                            source,
                        })?;
                    Some(handle)
                }
                None => {
                    tracing::warn!(
                        path = %route.path,
                        "No transform configured; route will pass the body through"
                    );
                    None
                }
            };

            let device_id = match &route.device_id {
                DeviceIdSource::PathParam(name) => DeviceIdResolver::PathParam(name.clone()),
                DeviceIdSource::BodyField(name) => DeviceIdResolver::BodyField(name.clone()),
                DeviceIdSource::BodyQuery(query) => {
                    let handle = TransformHandle::new();
                    cache
                        .add(handle, query)
                        .map_err(|source| BuildError::BadDeviceIdQuery {
                            path: route.path.clone(),
                            source,
                        })?;
                    DeviceIdResolver::BodyQuery(handle)
                }
            };

            augmented.push(AugmentedRoute {
                route,
                transform,
                device_id,
            });
        }

        Ok(Self { routes: augmented })
    }

    /// Iterate over the augmented routes.
    pub fn iter(&self) -> impl Iterator<Item = &AugmentedRoute> {
        self.routes.iter()
    }

    /// Number of registered routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether the table holds no routes.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
