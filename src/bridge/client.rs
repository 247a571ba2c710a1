//! Device bridge client.
//!
//! # Responsibilities
//! - Expose the narrow capability the pipeline depends on (authorization,
//!   retry policy, send, base address)
//! - Map bridge responses and transport failures into `BridgeError`
//! - Apply the configured retry policy with exponential backoff
//!
//! # Design Decisions
//! - One client handle per request: authorization is per-request state and
//!   must not be shared across concurrent requests
//! - The underlying `reqwest::Client` is shared through the factory, so the
//!   connection pool is reused while handles stay cheap
//! - The pipeline sets a single attempt; the bridge owns its own retries

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use thiserror::Error;
use url::Url;

use crate::bridge::models::{ApiKey, BridgeError, BridgeResponse, MessageBody};
use crate::config::BridgeConfig;

/// Base delay for retry backoff in milliseconds.
const RETRY_BASE_DELAY_MS: u64 = 100;

/// Maximum delay for retry backoff in milliseconds.
const RETRY_MAX_DELAY_MS: u64 = 2000;

/// Default number of attempts when no policy was set.
const DEFAULT_RETRY_ATTEMPTS: u32 = 3;

/// Capability interface of the downstream device bridge.
#[async_trait]
pub trait BridgeClient: Send + Sync {
    /// Attach the API key used for subsequent calls from this handle.
    fn set_authorization(&mut self, key: ApiKey);

    /// Set the total number of send attempts (1 disables retries).
    fn set_retry_policy(&mut self, attempts: u32);

    /// Send a D2C message for `device_id`.
    async fn send_message(
        &self,
        device_id: &str,
        body: &MessageBody,
    ) -> Result<BridgeResponse, BridgeError>;

    /// The bridge base address this client talks to.
    fn base_address(&self) -> &str;
}

/// Factory producing a fresh client handle per request.
pub type BridgeClientFactory = Arc<dyn Fn() -> Box<dyn BridgeClient> + Send + Sync>;

/// Error constructing the bridge client factory at startup.
#[derive(Debug, Error)]
pub enum ClientSetupError {
    #[error("invalid bridge base URL {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// HTTP implementation of [`BridgeClient`] over the bridge REST API.
pub struct HttpBridgeClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: Option<ApiKey>,
    retry_attempts: u32,
}

impl HttpBridgeClient {
    /// Create a handle over a shared HTTP client and base URL.
    pub fn new(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            api_key: None,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
        }
    }

    /// Build a factory of per-request handles from the bridge configuration.
    pub fn factory(config: &BridgeConfig) -> Result<BridgeClientFactory, ClientSetupError> {
        if config.base_url.is_empty() {
            return Err(ClientSetupError::InvalidBaseUrl {
                url: config.base_url.clone(),
                reason: "missing bridge URL".to_string(),
            });
        }

        let base_url: Url =
            config
                .base_url
                .parse()
                .map_err(|e: url::ParseError| ClientSetupError::InvalidBaseUrl {
                    url: config.base_url.clone(),
                    reason: e.to_string(),
                })?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Arc::new(move || {
            Box::new(HttpBridgeClient::new(http.clone(), base_url.clone()))
        }))
    }

    fn message_url(&self, device_id: &str) -> Result<Url, BridgeError> {
        self.base_url
            .join(&format!("devices/{}/messages/events", device_id))
            .map_err(|e| BridgeError::Transport(format!("invalid message URL: {}", e)))
    }
}

#[async_trait]
impl BridgeClient for HttpBridgeClient {
    fn set_authorization(&mut self, key: ApiKey) {
        self.api_key = Some(key);
    }

    fn set_retry_policy(&mut self, attempts: u32) {
        self.retry_attempts = attempts.max(1);
    }

    async fn send_message(
        &self,
        device_id: &str,
        body: &MessageBody,
    ) -> Result<BridgeResponse, BridgeError> {
        let url = self.message_url(device_id)?;
        let attempts = self.retry_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;

            let mut request = self.http.post(url.clone()).json(body);
            if let Some(key) = &self.api_key {
                request = request.header("x-api-key", key.expose());
            }

            let error = match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(BridgeResponse {
                            status: status.as_u16(),
                        });
                    }

                    let message = response.text().await.unwrap_or_default();
                    let error = BridgeError::Api {
                        status: status.as_u16(),
                        message,
                    };
                    // Client-side errors won't improve on a resend.
                    if !status.is_server_error() {
                        return Err(error);
                    }
                    error
                }
                Err(e) => BridgeError::Transport(e.to_string()),
            };

            if attempt >= attempts {
                return Err(error);
            }

            let delay = backoff_delay(attempt);
            tracing::warn!(
                device_id = %device_id,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Bridge call failed, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }

    fn base_address(&self) -> &str {
        self.base_url.as_str()
    }
}

impl fmt::Debug for HttpBridgeClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpBridgeClient")
            .field("base_url", &self.base_url.as_str())
            .field("retry_attempts", &self.retry_attempts)
            .finish()
    }
}

/// Exponential backoff delay with jitter (0 to 10% of the delay).
fn backoff_delay(attempt: u32) -> Duration {
    let exponential_base = 2u64.saturating_pow(attempt.saturating_sub(1));
    let delay_ms = RETRY_BASE_DELAY_MS.saturating_mul(exponential_base);
    let capped_delay = delay_ms.min(RETRY_MAX_DELAY_MS);

    let jitter_range = capped_delay / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped_delay + jitter)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> HttpBridgeClient {
        HttpBridgeClient::new(
            reqwest::Client::new(),
            "https://bridge.example.com/api/v1/".parse().unwrap(),
        )
    }

    #[test]
    fn test_message_url() {
        let client = test_client();
        assert_eq!(
            client.message_url("dev1").unwrap().as_str(),
            "https://bridge.example.com/api/v1/devices/dev1/messages/events"
        );
    }

    #[test]
    fn test_base_address() {
        let client = test_client();
        assert_eq!(client.base_address(), "https://bridge.example.com/api/v1/");
    }

    #[test]
    fn test_factory_rejects_missing_url() {
        let err = HttpBridgeClient::factory(&BridgeConfig::default()).err().unwrap();
        assert!(matches!(err, ClientSetupError::InvalidBaseUrl { .. }));
    }

    #[test]
    fn test_factory_rejects_malformed_url() {
        let config = BridgeConfig {
            base_url: "not a url".to_string(),
            ..Default::default()
        };
        let err = HttpBridgeClient::factory(&config).err().unwrap();
        assert!(matches!(err, ClientSetupError::InvalidBaseUrl { .. }));
    }

    #[test]
    fn test_backoff_grows_and_caps() {
        let b1 = backoff_delay(1);
        assert!(b1.as_millis() >= 100);

        let b2 = backoff_delay(2);
        assert!(b2.as_millis() >= 200);

        let max = backoff_delay(10);
        assert!(max.as_millis() as u64 >= RETRY_MAX_DELAY_MS);
    }
}
