/// Destination chain gateway client
///
/// HTTP client for the chain's REST gateway: account lookups, network
/// configuration and transaction submission.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::{AccountInfo, NetworkConfig, Proxy, ProxyError, Transaction};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Default timeout for gateway calls
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Gateway response code for a successful call
const GATEWAY_SUCCESS_CODE: &str = "successful";

// ============================================================================
// RESPONSE ENVELOPES
// ============================================================================

/// Every gateway reply is wrapped as `{ data, error, code }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountData {
    pub account: AccountInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfigData {
    pub config: NetworkConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendTransactionData {
    pub tx_hash: String,
}

// ============================================================================
// GATEWAY PROXY
// ============================================================================

/// Client for one destination chain gateway
#[derive(Debug, Clone)]
pub struct GatewayProxy {
    /// Gateway base URL, without trailing slash
    base_url: String,

    /// HTTP client
    client: Client,
}

impl GatewayProxy {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ProxyError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProxyError::RequestFailed(format!("Failed to create client: {}", e)))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ProxyError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "gateway GET");

        let response = self.client.get(&url).send().await.map_err(map_reqwest_error)?;
        Self::unwrap_envelope(response).await
    }

    async fn post<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ProxyError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "gateway POST");

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        Self::unwrap_envelope(response).await
    }

    async fn unwrap_envelope<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ProxyError> {
        let status = response.status();
        let envelope: GatewayResponse<T> = match response.json().await {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                return Err(ProxyError::RequestFailed(format!("Gateway returned status {}", status)))
            }
            Err(e) => return Err(ProxyError::InvalidResponse(e.to_string())),
        };

        if status == StatusCode::BAD_REQUEST {
            return Err(ProxyError::Rejected(envelope.error));
        }
        if !status.is_success() || (!envelope.code.is_empty() && envelope.code != GATEWAY_SUCCESS_CODE) {
            return Err(ProxyError::RequestFailed(format!(
                "Gateway returned status {}: {}",
                status, envelope.error
            )));
        }

        envelope
            .data
            .ok_or_else(|| ProxyError::InvalidResponse("missing data field".into()))
    }
}

#[async_trait]
impl Proxy for GatewayProxy {
    async fn get_account(&self, address: &str) -> Result<AccountInfo, ProxyError> {
        let data: AccountData = self
            .get(&format!("/address/{}", address))
            .await
            .map_err(|e| match e {
                ProxyError::Rejected(_) => ProxyError::AccountNotFound(address.to_string()),
                other => other,
            })?;
        Ok(data.account)
    }

    async fn get_network_config(&self) -> Result<NetworkConfig, ProxyError> {
        let data: NetworkConfigData = self.get("/network/config").await?;
        Ok(data.config)
    }

    async fn send_transaction(&self, tx: &Transaction) -> Result<String, ProxyError> {
        let data: SendTransactionData = self.post("/transaction/send", tx).await?;
        Ok(data.tx_hash)
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ProxyError {
    if err.is_timeout() {
        ProxyError::Timeout
    } else {
        ProxyError::RequestFailed(err.to_string())
    }
}

// ============================================================================
// TESTS
// ============================================================================
