// Register + execute encoding for deposit-style bridge operations

use std::sync::Arc;

use tracing::debug;

use super::{EncodeError, OperationEncoder, REGISTER_BRIDGE_OPS_TAG};
use crate::hasher::Hasher;
use crate::models::{BridgeBatchItem, EncodedPayload};

/// Encodes an item as an optional `registerBridgeOps` call followed by one
/// execute call per operation.
///
/// The register call is only emitted when the digest of the concatenated
/// operation hashes equals the item's hash-of-hashes. A mismatch means the
/// batch is unconfirmed or already registered, so it is only re-executed.
pub struct ExecuteOperationsEncoder {
    hasher: Arc<dyn Hasher>,
    execute_tag: &'static str,
}

impl ExecuteOperationsEncoder {
    pub fn new(hasher: Arc<dyn Hasher>, execute_tag: &'static str) -> Self {
        Self { hasher, execute_tag }
    }

    /// `registerBridgeOps@aggSig@hashOfHashes@bitmap@epoch@opHash1@...@opHashN`
    fn register_payload(&self, item: &BridgeBatchItem) -> Option<EncodedPayload> {
        let concatenated: Vec<u8> = item
            .operations
            .iter()
            .flat_map(|op| op.hash.iter().copied())
            .collect();

        let computed = self.hasher.digest(&concatenated);
        if computed != item.hash_of_hashes {
            debug!(
                hash_of_hashes = %hex::encode(&item.hash_of_hashes),
                computed = %hex::encode(&computed),
                "hash of hashes mismatch, skipping register step"
            );
            return None;
        }

        let payload = EncodedPayload::builder(REGISTER_BRIDGE_OPS_TAG)
            .arg(&item.aggregated_signature)
            .arg(&item.hash_of_hashes)
            .arg(&item.pub_keys_bitmap)
            .arg_u32(item.epoch)
            .args(item.operations.iter().map(|op| op.hash.as_slice()))
            .build();

        Some(payload)
    }

    /// `<executeTag>@hashOfHashes@opPayload`, one per operation
    fn execute_payloads(&self, item: &BridgeBatchItem) -> Vec<EncodedPayload> {
        item.operations
            .iter()
            .map(|op| {
                EncodedPayload::builder(self.execute_tag)
                    .arg(&item.hash_of_hashes)
                    .arg(&op.payload)
                    .build()
            })
            .collect()
    }
}

impl OperationEncoder for ExecuteOperationsEncoder {
    fn encode(&self, item: &BridgeBatchItem) -> Result<Vec<EncodedPayload>, EncodeError> {
        let mut payloads = Vec::with_capacity(item.operations.len() + 1);
        payloads.extend(self.register_payload(item));
        payloads.extend(self.execute_payloads(item));
        Ok(payloads)
    }
}
