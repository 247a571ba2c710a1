//! HTTP server setup.
//!
//! # Responsibilities
//! - Build the transform cache and route table from the loaded config
//! - Register one POST handler per route, capturing its context
//! - Wire up middleware (request logging, tracing)
//! - Serve with graceful shutdown
//!
//! # Design Decisions
//! - Handler closures capture an `Arc<RouteContext>` rather than shared
//!   mutable state; the bridge client factory is injected explicitly so
//!   tests can substitute a mock
//! - No request timeout layer here: timeout policy belongs to the bridge
//!   transport

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, Request};
use axum::routing::post;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::bridge::BridgeClientFactory;
use crate::config::LoadedConfig;
use crate::http::handler::{handle_d2c_message, RouteContext};
use crate::http::middleware::log_requests;
use crate::lifecycle::wait_for_shutdown;
use crate::routing::{BuildError, RouteTable};
use crate::transform::TransformCache;

/// HTTP server for the transform adapter.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Build the server from a loaded configuration.
    ///
    /// Compiles every configured query; a compilation failure is fatal and
    /// surfaces here, before the server ever accepts traffic.
    pub fn new(
        config: &LoadedConfig,
        new_bridge_client: BridgeClientFactory,
    ) -> Result<Self, BuildError> {
        let transforms = Arc::new(TransformCache::new());
        let table = RouteTable::build(config.routes.clone(), &transforms)?;

        tracing::info!(
            routes = table.len(),
            compiled_queries = transforms.len(),
            "Route table built"
        );

        let router = Self::build_router(&table, &transforms, new_bridge_client);
        Ok(Self { router })
    }

    /// Build the Axum router with one POST handler per route.
    fn build_router(
        table: &RouteTable,
        transforms: &Arc<TransformCache>,
        new_bridge_client: BridgeClientFactory,
    ) -> Router {
        let mut router = Router::new();

        for augmented in table.iter() {
            let ctx = Arc::new(RouteContext {
                route: augmented.clone(),
                transforms: Arc::clone(transforms),
                new_bridge_client: new_bridge_client.clone(),
            });
            let path = augmented.route.path.clone();

            router = router.route(
                &path,
                post(
                    move |path_params: Path<HashMap<String, String>>, request: Request| {
                        let ctx = Arc::clone(&ctx);
                        async move { handle_d2c_message(ctx, path_params, request).await }
                    },
                ),
            );
        }

        router
            .layer(axum::middleware::from_fn(log_requests))
            .layer(TraceLayer::new_for_http())
    }

    /// The assembled router, for driving the pipeline without a listener.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(wait_for_shutdown(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
