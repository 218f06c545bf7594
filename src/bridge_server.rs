//! Relay Router
//!
//! Fans an inbound batch out to one sequencer per destination chain.
//!
//! Relay Flow:
//! 1. Partition the batch by chain id, keeping each chain's item order
//! 2. Drop partitions for chains without a sequencer
//! 3. Send every partition concurrently
//! 4. Merge the resulting hashes and sort them
//!
//! A failing chain only loses its own hashes; the call itself never fails.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::models::{BridgeBatchItem, BridgeOperationsRequest, BridgeOperationsResponse, ChainId};
use crate::tx_sender::BatchSender;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayError {
    /// No chain has a sequencer configured
    NoSenders,
}

impl std::fmt::Display for RelayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RelayError::NoSenders => write!(f, "No transaction senders configured"),
        }
    }
}

impl std::error::Error for RelayError {}

// ============================================================================
// BRIDGE RELAY
// ============================================================================

pub struct BridgeRelay {
    senders: HashMap<ChainId, Arc<dyn BatchSender>>,
}

impl BridgeRelay {
    pub fn new(senders: HashMap<ChainId, Arc<dyn BatchSender>>) -> Result<Self, RelayError> {
        if senders.is_empty() {
            return Err(RelayError::NoSenders);
        }
        Ok(Self { senders })
    }

    /// Configured chains, sorted
    pub fn chains(&self) -> Vec<ChainId> {
        let mut chains: Vec<ChainId> = self.senders.keys().cloned().collect();
        chains.sort();
        chains
    }

    /// Split items by chain, preserving order within each chain
    fn partition(items: Vec<BridgeBatchItem>) -> BTreeMap<ChainId, Vec<BridgeBatchItem>> {
        let mut partitions: BTreeMap<ChainId, Vec<BridgeBatchItem>> = BTreeMap::new();
        for item in items {
            partitions.entry(item.chain_id.clone()).or_default().push(item);
        }
        partitions
    }

    pub async fn relay(&self, request: BridgeOperationsRequest) -> BridgeOperationsResponse {
        let span = info_span!("relay", request_id = %Uuid::new_v4());
        self.relay_inner(request).instrument(span).await
    }

    async fn relay_inner(&self, request: BridgeOperationsRequest) -> BridgeOperationsResponse {
        info!(items = request.data.len(), "relaying bridge operations");

        let mut tasks = JoinSet::new();
        for (chain, items) in Self::partition(request.data) {
            let Some(sender) = self.senders.get(&chain) else {
                error!(%chain, items = items.len(), "no sender for chain, dropping items");
                continue;
            };

            let sender = Arc::clone(sender);
            let span = info_span!("chain", %chain);
            tasks.spawn(
                async move {
                    let result = sender.send_batch(items).await;
                    (chain, result)
                }
                .instrument(span),
            );
        }

        let mut tx_hashes = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((chain, Ok(hashes))) => {
                    info!(%chain, sent = hashes.len(), "chain batch sent");
                    tx_hashes.extend(hashes);
                }
                Ok((chain, Err(err))) => {
                    error!(%chain, error = %err, "chain batch failed");
                }
                Err(err) => {
                    warn!(error = %err, "chain task did not complete");
                }
            }
        }

        tx_hashes.sort();
        BridgeOperationsResponse { tx_hashes }
    }
}

// ============================================================================
// TESTS
// ============================================================================
