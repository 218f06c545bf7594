// ============================================================================
// RPC Module - Destination Chain Gateway Communication
// ============================================================================
//
// This module handles everything the relay needs from the destination chain:
// account state, network configuration, nonce assignment and submission.
//
// Components:
//   - transaction: transaction envelope and canonical signing bytes
//   - gateway: HTTP gateway proxy client
//   - nonce_handler: per-sender nonce tracking on top of the proxy
//
// ============================================================================

pub mod gateway;
pub mod nonce_handler;
pub mod transaction;

pub use gateway::*;
pub use nonce_handler::*;
pub use transaction::*;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

// ============================================================================
// ERROR TYPES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProxyError {
    /// HTTP request failed or the gateway returned a non-success status
    RequestFailed(String),
    /// Gateway did not answer in time
    Timeout,
    /// Response body could not be understood
    InvalidResponse(String),
    /// Account does not exist on chain
    AccountNotFound(String),
    /// Gateway refused the transaction
    Rejected(String),
}

impl ProxyError {
    /// Whether retrying the same call later can succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ProxyError::RequestFailed(_) | ProxyError::Timeout | ProxyError::InvalidResponse(_)
        )
    }
}

impl std::fmt::Display for ProxyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProxyError::RequestFailed(msg) => write!(f, "Gateway request failed: {}", msg),
            ProxyError::Timeout => write!(f, "Gateway timeout"),
            ProxyError::InvalidResponse(msg) => write!(f, "Invalid gateway response: {}", msg),
            ProxyError::AccountNotFound(addr) => write!(f, "Account not found: {}", addr),
            ProxyError::Rejected(msg) => write!(f, "Transaction rejected: {}", msg),
        }
    }
}

impl std::error::Error for ProxyError {}

// ============================================================================
// CHAIN STATE TYPES
// ============================================================================

/// On-chain account state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub address: String,
    pub nonce: u64,
    #[serde(default)]
    pub balance: String,
}

/// Network parameters every transaction must carry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(rename = "erd_chain_id")]
    pub chain_id: String,
    #[serde(rename = "erd_min_gas_price")]
    pub min_gas_price: u64,
    #[serde(rename = "erd_min_transaction_version")]
    pub min_tx_version: u32,
}

// ============================================================================
// COLLABORATOR TRAITS
// ============================================================================

/// Read and submit access to a destination chain
#[async_trait]
pub trait Proxy: Send + Sync {
    async fn get_account(&self, address: &str) -> Result<AccountInfo, ProxyError>;

    async fn get_network_config(&self) -> Result<NetworkConfig, ProxyError>;

    /// Submit a signed transaction, returning its hash
    async fn send_transaction(&self, tx: &Transaction) -> Result<String, ProxyError>;
}

/// Assigns nonces and gas prices and submits the resulting transactions
#[async_trait]
pub trait NonceHandler: Send + Sync {
    async fn apply_nonce_and_gas_price(&self, tx: &mut Transaction) -> Result<(), ProxyError>;

    async fn send_transaction(&self, tx: &Transaction) -> Result<String, ProxyError>;
}
