//! Relay configuration
//!
//! Everything is read from the environment (after `.env` is loaded). Per-chain
//! settings use the upper-case chain id as prefix, e.g. `MVX_PROXY_URL`.

use std::path::PathBuf;
use std::time::Duration;

use crate::models::ChainId;
use crate::payload_router::{GasLimits, RoutingError};
use crate::rpc::gateway::DEFAULT_TIMEOUT_SECS;
use crate::tx_sender::{DEFAULT_MAX_RETRIES_GET_ACCOUNT, DEFAULT_RETRY_BASE_MS};
use crate::wallet::WalletError;

// ============================================================================
// CONSTANTS
// ============================================================================

pub const DEFAULT_SERVER_PORT: u16 = 8085;
pub const DEFAULT_CHAINS: &str = "MVX";
pub const DEFAULT_HASHER: &str = "sha256";

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Required variable not set
    Missing(String),
    /// Variable set but not parseable
    Invalid { key: String, value: String },
    /// Wallet file could not be loaded
    Wallet(WalletError),
    /// Contract addresses do not form a valid routing table
    Routing(RoutingError),
    /// Gateway client could not be built
    Proxy(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} not set", key),
            ConfigError::Invalid { key, value } => write!(f, "Invalid value for {}: {}", key, value),
            ConfigError::Wallet(e) => write!(f, "{}", e),
            ConfigError::Routing(e) => write!(f, "Invalid routing: {}", e),
            ConfigError::Proxy(msg) => write!(f, "Cannot create gateway client: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<WalletError> for ConfigError {
    fn from(err: WalletError) -> Self {
        ConfigError::Wallet(err)
    }
}

impl From<RoutingError> for ConfigError {
    fn from(err: RoutingError) -> Self {
        ConfigError::Routing(err)
    }
}

// ============================================================================
// CONFIG TYPES
// ============================================================================

/// One destination chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainConfig {
    pub chain_id: ChainId,
    pub proxy_url: String,
    pub wallet_path: PathBuf,
    pub header_verifier_address: String,
    pub esdt_safe_address: String,
    pub gas_limits: GasLimits,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub server_port: u16,
    pub chains: Vec<ChainConfig>,
    pub max_retries_get_account: u32,
    pub retry_base: Duration,
    pub hasher: String,
    pub proxy_timeout: Duration,
}

impl RelayConfig {
    /// Load `.env` if present, then read the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Parse configuration from any key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server_port = parse_or(&lookup, "SERVER_PORT", DEFAULT_SERVER_PORT)?;
        let max_retries_get_account =
            parse_or(&lookup, "MAX_RETRIES_GET_ACCOUNT", DEFAULT_MAX_RETRIES_GET_ACCOUNT)?;
        let retry_base_ms = parse_or(&lookup, "RETRY_BASE_MS", DEFAULT_RETRY_BASE_MS)?;
        let proxy_timeout_secs = parse_or(&lookup, "PROXY_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;

        let hasher = lookup("HASHER")
            .map(|h| h.trim().to_lowercase())
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| DEFAULT_HASHER.to_string());

        let chain_list = lookup("RELAY_CHAINS").unwrap_or_else(|| DEFAULT_CHAINS.to_string());
        let chains = chain_list
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| ChainConfig::from_lookup(&lookup, ChainId::from(name)))
            .collect::<Result<Vec<_>, _>>()?;

        if chains.is_empty() {
            return Err(ConfigError::Invalid {
                key: "RELAY_CHAINS".into(),
                value: chain_list,
            });
        }

        Ok(Self {
            server_port,
            chains,
            max_retries_get_account,
            retry_base: Duration::from_millis(retry_base_ms),
            hasher,
            proxy_timeout: Duration::from_secs(proxy_timeout_secs),
        })
    }
}

impl ChainConfig {
    fn from_lookup<F>(lookup: &F, chain_id: ChainId) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let prefix = chain_id.as_str().to_uppercase();
        let key = |suffix: &str| format!("{}_{}", prefix, suffix);

        let required = |suffix: &str| -> Result<String, ConfigError> {
            let name = key(suffix);
            lookup(&name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let defaults = GasLimits::default();
        let gas_limits = GasLimits {
            register: parse_or(lookup, &key("GAS_LIMIT_REGISTER"), defaults.register)?,
            execute: parse_or(lookup, &key("GAS_LIMIT_EXECUTE"), defaults.execute)?,
            change_validator_set: parse_or(
                lookup,
                &key("GAS_LIMIT_CHANGE_VALIDATOR_SET"),
                defaults.change_validator_set,
            )?,
        };

        Ok(Self {
            proxy_url: required("PROXY_URL")?,
            wallet_path: PathBuf::from(required("WALLET_PATH")?),
            header_verifier_address: required("HEADER_VERIFIER_ADDRESS")?,
            esdt_safe_address: required("ESDT_SAFE_ADDRESS")?,
            gas_limits,
            chain_id,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => value.trim().parse().map_err(|_| ConfigError::Invalid {
            key: key.to_string(),
            value,
        }),
        _ => Ok(default),
    }
}

// ============================================================================
// TESTS
// ============================================================================
