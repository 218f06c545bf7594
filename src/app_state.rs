// Application state: the relay plus what the status endpoint reports

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::bridge_server::BridgeRelay;
use crate::config::{ChainConfig, ConfigError, RelayConfig};
use crate::encoder::EncoderRegistry;
use crate::hasher::{hasher_from_name, Hasher};
use crate::models::ChainId;
use crate::payload_router::PayloadRouter;
use crate::rpc::{AccountNonceHandler, GatewayProxy, Proxy};
use crate::tx_sender::{BatchSender, TxSender, TxSenderArgs};
use crate::wallet::{Ed25519Wallet, Wallet};

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub relay: BridgeRelay,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(relay: BridgeRelay) -> Self {
        Self {
            relay,
            started_at: Utc::now(),
        }
    }

    /// Wire one sequencer per configured chain
    pub fn from_config(config: &RelayConfig) -> Result<Self, ConfigError> {
        let hasher: Arc<dyn Hasher> = hasher_from_name(&config.hasher)
            .map(Arc::from)
            .ok_or_else(|| ConfigError::Invalid {
                key: "HASHER".into(),
                value: config.hasher.clone(),
            })?;
        let encoders = Arc::new(EncoderRegistry::new(hasher));

        let mut senders: HashMap<ChainId, Arc<dyn BatchSender>> = HashMap::new();
        for chain in &config.chains {
            let sender = build_sender(chain, config, Arc::clone(&encoders))?;
            println!("🔗 {}: {} (relayer {})", chain.chain_id, chain.proxy_url, sender.address());
            senders.insert(chain.chain_id.clone(), Arc::new(sender));
        }

        let relay = BridgeRelay::new(senders).map_err(|_| ConfigError::Missing("RELAY_CHAINS".into()))?;
        info!(chains = ?relay.chains(), hasher = %config.hasher, "bridge relay initialised");

        Ok(Self::new(relay))
    }

    pub fn chains(&self) -> Vec<ChainId> {
        self.relay.chains()
    }

    pub fn uptime_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}

fn build_sender(
    chain: &ChainConfig,
    config: &RelayConfig,
    encoders: Arc<EncoderRegistry>,
) -> Result<TxSender, ConfigError> {
    let wallet: Arc<dyn Wallet> = Arc::new(Ed25519Wallet::load(&chain.wallet_path)?);

    let gateway = GatewayProxy::new(&chain.proxy_url, config.proxy_timeout)
        .map_err(|e| ConfigError::Proxy(e.to_string()))?;
    let proxy: Arc<dyn Proxy> = Arc::new(gateway);

    let router = PayloadRouter::for_bridge_contracts(
        &chain.header_verifier_address,
        &chain.esdt_safe_address,
        chain.gas_limits,
    )?;

    TxSender::new(TxSenderArgs {
        chain_id: chain.chain_id.clone(),
        wallet,
        nonce_handler: Arc::new(AccountNonceHandler::new(Arc::clone(&proxy))),
        proxy,
        encoders,
        router,
        max_retries_get_account: config.max_retries_get_account,
        retry_base: config.retry_base,
    })
    .map_err(|_| ConfigError::Invalid {
        key: "MAX_RETRIES_GET_ACCOUNT".into(),
        value: config.max_retries_get_account.to_string(),
    })
}
