//! Per-sender nonce tracking on top of a gateway proxy.
//!
//! The next nonce handed out is the larger of the on-chain account nonce and
//! the locally tracked next nonce, so back-to-back transactions do not wait
//! for the previous one to be executed. The tracked nonce only moves once a
//! submission succeeds; applying a nonce to a transaction that is never sent
//! leaves it untouched. A failed submission drops the local entry and the
//! next call resyncs from chain.
//!
//! Callers must serialize apply and send per sender.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::{NonceHandler, Proxy, ProxyError, Transaction};

pub struct AccountNonceHandler {
    proxy: Arc<dyn Proxy>,
    next_nonces: Mutex<HashMap<String, u64>>,
}

impl AccountNonceHandler {
    pub fn new(proxy: Arc<dyn Proxy>) -> Self {
        Self {
            proxy,
            next_nonces: Mutex::new(HashMap::new()),
        }
    }

    /// Locally tracked next nonce for `address`, if any
    pub async fn tracked_nonce(&self, address: &str) -> Option<u64> {
        self.next_nonces.lock().await.get(address).copied()
    }
}

#[async_trait]
impl NonceHandler for AccountNonceHandler {
    /// Gas price is left as set from the batch's network config
    async fn apply_nonce_and_gas_price(&self, tx: &mut Transaction) -> Result<(), ProxyError> {
        let account = self.proxy.get_account(&tx.sender).await?;

        let tracked = self
            .next_nonces
            .lock()
            .await
            .get(&tx.sender)
            .copied()
            .unwrap_or(0);
        let nonce = account.nonce.max(tracked);

        debug!(sender = %tx.sender, on_chain = account.nonce, tracked, nonce, "nonce applied");

        tx.nonce = nonce;
        Ok(())
    }

    async fn send_transaction(&self, tx: &Transaction) -> Result<String, ProxyError> {
        match self.proxy.send_transaction(tx).await {
            Ok(hash) => {
                let mut next_nonces = self.next_nonces.lock().await;
                let next = next_nonces.entry(tx.sender.clone()).or_insert(0);
                *next = (*next).max(tx.nonce + 1);
                Ok(hash)
            }
            Err(err) => {
                warn!(sender = %tx.sender, nonce = tx.nonce, error = %err, "submission failed, resetting tracked nonce");
                self.next_nonces.lock().await.remove(&tx.sender);
                Err(err)
            }
        }
    }
}
