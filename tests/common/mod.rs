//! Shared utilities for integration testing.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use transform_adapter::bridge::{
    ApiKey, BridgeClient, BridgeClientFactory, BridgeError, BridgeResponse, MessageBody,
};
use transform_adapter::config::LoadedConfig;
use transform_adapter::routing::Route;
use transform_adapter::HttpServer;

/// What the mock bridge saw on the last `send_message` call.
#[derive(Debug, Clone, Default)]
pub struct RecordedCall {
    pub device_id: Option<String>,
    pub body: Option<MessageBody>,
    pub api_key: Option<String>,
    pub retry_attempts: Option<u32>,
}

/// A recording mock of the device bridge, shared across client handles.
#[derive(Clone, Default)]
pub struct MockBridge {
    recorded: Arc<Mutex<RecordedCall>>,
    failure: Arc<Mutex<Option<BridgeError>>>,
}

impl MockBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// A factory producing fresh handles bound to this mock.
    pub fn factory(&self) -> BridgeClientFactory {
        let mock = self.clone();
        Arc::new(move || {
            Box::new(MockBridgeClient {
                mock: mock.clone(),
                api_key: None,
                retry_attempts: None,
            })
        })
    }

    /// Make every subsequent `send_message` fail with `error`.
    pub fn fail_with(&self, error: BridgeError) {
        *self.failure.lock().unwrap() = Some(error);
    }

    /// Snapshot of the last recorded call.
    pub fn recorded(&self) -> RecordedCall {
        self.recorded.lock().unwrap().clone()
    }
}

struct MockBridgeClient {
    mock: MockBridge,
    api_key: Option<ApiKey>,
    retry_attempts: Option<u32>,
}

#[async_trait]
impl BridgeClient for MockBridgeClient {
    fn set_authorization(&mut self, key: ApiKey) {
        self.api_key = Some(key);
    }

    fn set_retry_policy(&mut self, attempts: u32) {
        self.retry_attempts = Some(attempts);
    }

    async fn send_message(
        &self,
        device_id: &str,
        body: &MessageBody,
    ) -> Result<BridgeResponse, BridgeError> {
        let mut recorded = self.mock.recorded.lock().unwrap();
        recorded.device_id = Some(device_id.to_string());
        recorded.body = Some(body.clone());
        recorded.api_key = self.api_key.as_ref().map(|k| k.expose().to_string());
        recorded.retry_attempts = self.retry_attempts;
        drop(recorded);

        if let Some(error) = self.mock.failure.lock().unwrap().clone() {
            return Err(error);
        }
        Ok(BridgeResponse { status: 200 })
    }

    fn base_address(&self) -> &str {
        "mock://bridge"
    }
}

/// Build a router over `routes` wired to the given mock bridge.
pub fn router_with_mock(routes: Vec<Route>, mock: &MockBridge) -> Router {
    let config = LoadedConfig {
        listener: Default::default(),
        bridge: Default::default(),
        observability: Default::default(),
        routes,
    };
    HttpServer::new(&config, mock.factory())
        .expect("route table build failed")
        .router()
}

/// POST `body` to `uri` on the router, returning status and response text.
pub async fn post_json(
    router: Router,
    uri: &str,
    headers: &[(&str, &str)],
    body: &str,
) -> (axum::http::StatusCode, String) {
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    let mut request = axum::http::Request::builder().method("POST").uri(uri);
    for (name, value) in headers {
        request = request.header(*name, *value);
    }
    let request = request
        .body(axum::body::Body::from(body.to_string()))
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8_lossy(&bytes).to_string())
}
