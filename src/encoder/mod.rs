//! Operation Encoders
//!
//! Turns one `BridgeBatchItem` into the ordered list of call payloads the
//! destination contracts expect. Each operation type has its own encoder,
//! registered in an `EncoderRegistry` at construction.
//!
//! Wire format: `TAG@hex(arg1)@hex(arg2)...@hex(argN)`

pub mod execute_operations;
pub mod validator_set;

use std::collections::HashMap;
use std::sync::Arc;

use crate::hasher::Hasher;
use crate::models::{BridgeBatchItem, EncodedPayload, OperationType};

pub use execute_operations::ExecuteOperationsEncoder;
pub use validator_set::{ChangeValidatorSetEncoder, ValidatorSetChange};

// ============================================================================
// CALL TAGS
// ============================================================================

pub const REGISTER_BRIDGE_OPS_TAG: &str = "registerBridgeOps";
pub const EXECUTE_BRIDGE_OPS_TAG: &str = "executeBridgeOps";
pub const CHANGE_VALIDATOR_SET_TAG: &str = "changeValidatorSet";
pub const REGISTER_TOKEN_TAG: &str = "registerToken";
pub const REGISTER_VALIDATOR_TAG: &str = "registerValidator";
pub const UNREGISTER_VALIDATOR_TAG: &str = "unRegisterValidator";

// ============================================================================
// ENCODE ERROR
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// No encoder registered for this operation type
    UnknownOperationType(String),
    /// Operation count does not fit the operation type
    InvalidOperationCount { expected: usize, got: usize },
    /// Nested operation data could not be decoded
    Decode(String),
}

impl std::fmt::Display for EncodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EncodeError::UnknownOperationType(op) => write!(f, "Unknown operation type: {}", op),
            EncodeError::InvalidOperationCount { expected, got } => {
                write!(f, "Invalid number of operations: expected {}, got {}", expected, got)
            }
            EncodeError::Decode(msg) => write!(f, "Cannot decode operation data: {}", msg),
        }
    }
}

impl std::error::Error for EncodeError {}

// ============================================================================
// ENCODER TRAIT & REGISTRY
// ============================================================================

pub trait OperationEncoder: Send + Sync {
    /// Payloads for one batch item, in submission order
    fn encode(&self, item: &BridgeBatchItem) -> Result<Vec<EncodedPayload>, EncodeError>;
}

/// Lookup table from operation type to its encoder
pub struct EncoderRegistry {
    encoders: HashMap<OperationType, Box<dyn OperationEncoder>>,
}

impl EncoderRegistry {
    /// Empty registry, every item is rejected until encoders are registered
    pub fn empty() -> Self {
        Self {
            encoders: HashMap::new(),
        }
    }

    /// Registry with every operation type this relay supports
    pub fn new(hasher: Arc<dyn Hasher>) -> Self {
        let mut registry = Self::empty();

        let execute_types = [
            (OperationType::DepositTokens, EXECUTE_BRIDGE_OPS_TAG),
            (OperationType::RegisterToken, REGISTER_TOKEN_TAG),
            (OperationType::RegisterValidator, REGISTER_VALIDATOR_TAG),
            (OperationType::UnRegisterValidator, UNREGISTER_VALIDATOR_TAG),
        ];
        for (operation_type, execute_tag) in execute_types {
            registry.register(
                operation_type,
                Box::new(ExecuteOperationsEncoder::new(hasher.clone(), execute_tag)),
            );
        }

        registry.register(
            OperationType::ChangeValidatorSet,
            Box::new(ChangeValidatorSetEncoder::new()),
        );

        registry
    }

    pub fn register(&mut self, operation_type: OperationType, encoder: Box<dyn OperationEncoder>) {
        self.encoders.insert(operation_type, encoder);
    }

    pub fn supports(&self, operation_type: &OperationType) -> bool {
        self.encoders.contains_key(operation_type)
    }

    pub fn encode(&self, item: &BridgeBatchItem) -> Result<Vec<EncodedPayload>, EncodeError> {
        let encoder = self
            .encoders
            .get(&item.operation_type)
            .ok_or_else(|| EncodeError::UnknownOperationType(item.operation_type.to_string()))?;

        encoder.encode(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hasher::Sha256Hasher;
    use crate::models::{ChainId, OutgoingOperation};

    fn item(operation_type: OperationType) -> BridgeBatchItem {
        BridgeBatchItem {
            chain_id: ChainId::Mvx,
            operation_type,
            hash_of_hashes: b"hashOfHashes".to_vec(),
            operations: vec![OutgoingOperation::new(b"opHash".to_vec(), b"opData".to_vec())],
            aggregated_signature: b"aggSig".to_vec(),
            leader_signature: Vec::new(),
            pub_keys_bitmap: b"bitmap".to_vec(),
            epoch: 1,
        }
    }

    #[test]
    fn test_unknown_operation_type_is_rejected() {
        let registry = EncoderRegistry::new(Arc::new(Sha256Hasher));
        let result = registry.encode(&item(OperationType::Unknown("MintNft".into())));

        assert_eq!(result, Err(EncodeError::UnknownOperationType("MintNft".into())));
    }

    #[test]
    fn test_execute_tag_follows_operation_type() {
        let registry = EncoderRegistry::new(Arc::new(Sha256Hasher));

        let cases = [
            (OperationType::DepositTokens, EXECUTE_BRIDGE_OPS_TAG),
            (OperationType::RegisterToken, REGISTER_TOKEN_TAG),
            (OperationType::RegisterValidator, REGISTER_VALIDATOR_TAG),
            (OperationType::UnRegisterValidator, UNREGISTER_VALIDATOR_TAG),
        ];
        for (operation_type, tag) in cases {
            let payloads = registry.encode(&item(operation_type)).unwrap();
            // digest mismatch, so only the execute step is emitted
            assert_eq!(payloads.len(), 1);
            assert_eq!(payloads[0].tag, tag);
        }
    }

    #[test]
    fn test_empty_registry_supports_nothing() {
        let registry = EncoderRegistry::empty();
        assert!(!registry.supports(&OperationType::DepositTokens));
        assert!(registry.encode(&item(OperationType::DepositTokens)).is_err());
    }
}
