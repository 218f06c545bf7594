// Shared fixtures for the relay integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use sovereign_bridge_relay::rpc::{AccountInfo, NetworkConfig};
use sovereign_bridge_relay::{
    AccountNonceHandler, BatchSender, BridgeBatchItem, BridgeRelay, ChainId, Ed25519Wallet,
    EncoderRegistry, GasLimits, OperationType, OutgoingOperation, PayloadRouter, Proxy, ProxyError,
    Sha256Hasher, Transaction, TxSender, TxSenderArgs, Wallet,
};

pub const HEADER_VERIFIER: &str = "header-verifier";
pub const ESDT_SAFE: &str = "esdt-safe";

// ============================================================================
// IN-MEMORY GATEWAY
// ============================================================================

/// Gateway stand-in: accounts never advance on their own, every accepted
/// transaction is recorded and its hash is derived from chain, sender and nonce.
pub struct MockGateway {
    pub name: String,
    pub account_nonce: Mutex<u64>,
    pub sent: Mutex<Vec<Transaction>>,
    pub reject_all: bool,
    pub delay: Duration,
}

impl MockGateway {
    pub fn new(name: &str) -> Arc<Self> {
        Arc::new(Self::base(name))
    }

    pub fn rejecting(name: &str) -> Arc<Self> {
        Arc::new(Self {
            reject_all: true,
            ..Self::base(name)
        })
    }

    pub fn slow(name: &str, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            ..Self::base(name)
        })
    }

    fn base(name: &str) -> Self {
        Self {
            name: name.to_string(),
            account_nonce: Mutex::new(0),
            sent: Mutex::new(Vec::new()),
            reject_all: false,
            delay: Duration::ZERO,
        }
    }

    pub fn sent(&self) -> Vec<Transaction> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_nonces(&self) -> Vec<u64> {
        self.sent().iter().map(|tx| tx.nonce).collect()
    }

    pub fn sent_calls(&self) -> Vec<String> {
        self.sent()
            .iter()
            .map(|tx| String::from_utf8(tx.data.clone()).unwrap())
            .collect()
    }
}

#[async_trait]
impl Proxy for MockGateway {
    async fn get_account(&self, address: &str) -> Result<AccountInfo, ProxyError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(AccountInfo {
            address: address.to_string(),
            nonce: *self.account_nonce.lock().unwrap(),
            balance: "1000000000000000000".into(),
        })
    }

    async fn get_network_config(&self) -> Result<NetworkConfig, ProxyError> {
        Ok(NetworkConfig {
            chain_id: self.name.clone(),
            min_gas_price: 1_000_000_000,
            min_tx_version: 2,
        })
    }

    async fn send_transaction(&self, tx: &Transaction) -> Result<String, ProxyError> {
        if self.reject_all {
            return Err(ProxyError::Rejected("insufficient funds".into()));
        }
        self.sent.lock().unwrap().push(tx.clone());
        Ok(format!("{}-{}", self.name.to_lowercase(), tx.nonce))
    }
}

// ============================================================================
// BUILDERS
// ============================================================================

pub fn sender_for(chain: ChainId, gateway: Arc<MockGateway>) -> Arc<TxSender> {
    let proxy: Arc<dyn Proxy> = gateway;
    let wallet: Arc<dyn Wallet> = Arc::new(Ed25519Wallet::generate());

    Arc::new(
        TxSender::new(TxSenderArgs {
            chain_id: chain,
            wallet,
            nonce_handler: Arc::new(AccountNonceHandler::new(Arc::clone(&proxy))),
            proxy,
            encoders: Arc::new(EncoderRegistry::new(Arc::new(Sha256Hasher))),
            router: PayloadRouter::for_bridge_contracts(HEADER_VERIFIER, ESDT_SAFE, GasLimits::default())
                .unwrap(),
            max_retries_get_account: 3,
            retry_base: Duration::from_millis(1),
        })
        .unwrap(),
    )
}

pub fn relay_with(chains: Vec<(ChainId, Arc<MockGateway>)>) -> BridgeRelay {
    let senders: HashMap<ChainId, Arc<dyn BatchSender>> = chains
        .into_iter()
        .map(|(chain, gateway)| {
            let sender: Arc<dyn BatchSender> = sender_for(chain.clone(), gateway);
            (chain, sender)
        })
        .collect();
    BridgeRelay::new(senders).unwrap()
}

pub fn sha256(bytes: &[u8]) -> Vec<u8> {
    Sha256::digest(bytes).to_vec()
}

/// Deposit item whose hash-of-hashes matches its operation hashes
pub fn confirmed_deposit(chain: ChainId, op_hashes: &[&str]) -> BridgeBatchItem {
    let concatenated: Vec<u8> = op_hashes.iter().flat_map(|h| h.bytes()).collect();
    BridgeBatchItem {
        hash_of_hashes: sha256(&concatenated),
        ..deposit(chain, op_hashes)
    }
}

/// Deposit item that is not registered on this relay run
pub fn deposit(chain: ChainId, op_hashes: &[&str]) -> BridgeBatchItem {
    BridgeBatchItem {
        chain_id: chain,
        operation_type: OperationType::DepositTokens,
        hash_of_hashes: b"already-registered".to_vec(),
        operations: op_hashes
            .iter()
            .map(|h| OutgoingOperation::new(h.as_bytes(), format!("payload-{}", h).into_bytes()))
            .collect(),
        aggregated_signature: b"aggSig".to_vec(),
        leader_signature: b"leaderSig".to_vec(),
        pub_keys_bitmap: vec![0b0000_0111],
        epoch: 7,
    }
}
