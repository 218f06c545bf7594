/// Bridge relay client
///
/// HTTP client used by the sovereign side (and tests) to hand batches to a
/// running relay. Supports the JSON endpoint and the binary endpoint.

use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::time::Duration;
use tracing::{info, warn};

use crate::models::{BridgeOperationsRequest, BridgeOperationsResponse};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Connection attempts before giving up
pub const DEFAULT_CONNECTION_RETRIES: u32 = 100;

/// Wait between connection attempts
pub const DEFAULT_CONNECTION_WAIT_SECS: u64 = 5;

/// Timeout for a single relay call
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Content type of the binary endpoint
pub const BINARY_CONTENT_TYPE: &str = "application/grpc+bincode";

// ============================================================================
// ERROR TYPES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// HTTP request failed
    RequestFailed(String),
    /// Relay answered with a non-success status
    Status { code: u16, body: String },
    /// Response body could not be decoded
    InvalidResponse(String),
    /// Request body could not be encoded
    Encode(String),
    /// Relay never became reachable
    Unreachable { attempts: u32 },
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::RequestFailed(msg) => write!(f, "Relay request failed: {}", msg),
            ClientError::Status { code, body } => write!(f, "Relay returned status {}: {}", code, body),
            ClientError::InvalidResponse(msg) => write!(f, "Invalid relay response: {}", msg),
            ClientError::Encode(msg) => write!(f, "Cannot encode request: {}", msg),
            ClientError::Unreachable { attempts } => {
                write!(f, "Relay unreachable after {} attempts", attempts)
            }
        }
    }
}

impl std::error::Error for ClientError {}

// ============================================================================
// BRIDGE CLIENT
// ============================================================================

#[derive(Debug, Clone)]
pub struct BridgeClient {
    base_url: String,
    client: Client,
}

impl BridgeClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| ClientError::RequestFailed(format!("Failed to create client: {}", e)))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Connect with the default retry budget
    pub async fn connect(base_url: &str) -> Result<Self, ClientError> {
        Self::connect_with_retries(
            base_url,
            DEFAULT_CONNECTION_RETRIES,
            Duration::from_secs(DEFAULT_CONNECTION_WAIT_SECS),
        )
        .await
    }

    /// Build a client and wait until the relay answers its health check
    pub async fn connect_with_retries(
        base_url: &str,
        max_attempts: u32,
        wait: Duration,
    ) -> Result<Self, ClientError> {
        let client = Self::new(base_url)?;

        for attempt in 1..=max_attempts {
            match client.health().await {
                Ok(()) => {
                    info!(url = %client.base_url, attempt, "connected to bridge relay");
                    return Ok(client);
                }
                Err(err) => {
                    warn!(url = %client.base_url, attempt, max_attempts, error = %err, "bridge relay not reachable");
                    if attempt < max_attempts {
                        tokio::time::sleep(wait).await;
                    }
                }
            }
        }

        Err(ClientError::Unreachable { attempts: max_attempts })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn health(&self) -> Result<(), ClientError> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .map_err(|e| ClientError::RequestFailed(e.to_string()))?;

        check_status(response).await.map(|_| ())
    }

    /// Send a batch through the JSON endpoint
    pub async fn send(&self, request: &BridgeOperationsRequest) -> Result<BridgeOperationsResponse, ClientError> {
        let response = self
            .client
            .post(format!("{}/bridge/send", self.base_url))
            .json(request)
            .send()
            .await
            .map_err(|e| ClientError::RequestFailed(e.to_string()))?;

        check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }

    /// Send a batch through the binary endpoint
    pub async fn send_binary(
        &self,
        request: &BridgeOperationsRequest,
    ) -> Result<BridgeOperationsResponse, ClientError> {
        let body = bincode::serialize(request).map_err(|e| ClientError::Encode(e.to_string()))?;

        let response = self
            .client
            .post(format!("{}/bridge/send", self.base_url))
            .header(CONTENT_TYPE, BINARY_CONTENT_TYPE)
            .body(body)
            .send()
            .await
            .map_err(|e| ClientError::RequestFailed(e.to_string()))?;

        let bytes = check_status(response)
            .await?
            .bytes()
            .await
            .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;

        bincode::deserialize(&bytes).map_err(|e| ClientError::InvalidResponse(e.to_string()))
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Status {
        code: status.as_u16(),
        body,
    })
}

// ============================================================================
// TESTS
// ============================================================================
