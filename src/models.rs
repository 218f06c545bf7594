// Data models for bridge operations relayed from the sovereign chain

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// CHAIN ID
// ============================================================================

/// Destination chain a batch item targets.
///
/// Chains this relay does not know about are kept as `Unknown` so a request
/// carrying them still deserializes; the relay drops those partitions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ChainId {
    Mvx,
    Eth,
    Sui,
    Unknown(String),
}

impl ChainId {
    pub fn as_str(&self) -> &str {
        match self {
            ChainId::Mvx => "MVX",
            ChainId::Eth => "ETH",
            ChainId::Sui => "SUI",
            ChainId::Unknown(name) => name.as_str(),
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, ChainId::Unknown(_))
    }
}

impl From<&str> for ChainId {
    fn from(value: &str) -> Self {
        match value.trim().to_uppercase().as_str() {
            "MVX" => ChainId::Mvx,
            "ETH" => ChainId::Eth,
            "SUI" => ChainId::Sui,
            _ => ChainId::Unknown(value.trim().to_string()),
        }
    }
}

impl From<String> for ChainId {
    fn from(value: String) -> Self {
        ChainId::from(value.as_str())
    }
}

impl From<ChainId> for String {
    fn from(chain_id: ChainId) -> Self {
        chain_id.as_str().to_string()
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// OPERATION TYPE
// ============================================================================

/// Selects which encoder turns a batch item into transaction payloads
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OperationType {
    DepositTokens,
    ChangeValidatorSet,
    RegisterToken,
    RegisterValidator,
    UnRegisterValidator,
    Unknown(String),
}

impl OperationType {
    pub fn as_str(&self) -> &str {
        match self {
            OperationType::DepositTokens => "DepositTokens",
            OperationType::ChangeValidatorSet => "ChangeValidatorSet",
            OperationType::RegisterToken => "RegisterToken",
            OperationType::RegisterValidator => "RegisterValidator",
            OperationType::UnRegisterValidator => "UnRegisterValidator",
            OperationType::Unknown(name) => name.as_str(),
        }
    }
}

impl From<&str> for OperationType {
    fn from(value: &str) -> Self {
        match value {
            "DepositTokens" => OperationType::DepositTokens,
            "ChangeValidatorSet" => OperationType::ChangeValidatorSet,
            "RegisterToken" => OperationType::RegisterToken,
            "RegisterValidator" => OperationType::RegisterValidator,
            "UnRegisterValidator" => OperationType::UnRegisterValidator,
            other => OperationType::Unknown(other.to_string()),
        }
    }
}

impl From<String> for OperationType {
    fn from(value: String) -> Self {
        OperationType::from(value.as_str())
    }
}

impl From<OperationType> for String {
    fn from(operation_type: OperationType) -> Self {
        operation_type.as_str().to_string()
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// OPERATIONS
// ============================================================================

/// One atomic cross-chain instruction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingOperation {
    #[serde(with = "hex")]
    pub hash: Vec<u8>,
    #[serde(with = "hex")]
    pub payload: Vec<u8>,
}

impl OutgoingOperation {
    pub fn new(hash: impl Into<Vec<u8>>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            hash: hash.into(),
            payload: payload.into(),
        }
    }
}

/// A batch of operations sharing one aggregated attestation.
///
/// `operations` order is the order hashed for the hash-of-hashes check and
/// the order transactions are built in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeBatchItem {
    pub chain_id: ChainId,
    pub operation_type: OperationType,
    #[serde(with = "hex")]
    pub hash_of_hashes: Vec<u8>,
    pub operations: Vec<OutgoingOperation>,
    #[serde(with = "hex", default)]
    pub aggregated_signature: Vec<u8>,
    #[serde(with = "hex", default)]
    pub leader_signature: Vec<u8>,
    #[serde(with = "hex", default)]
    pub pub_keys_bitmap: Vec<u8>,
    #[serde(default)]
    pub epoch: u32,
}

/// Full RPC input, possibly spanning several destination chains
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeOperationsRequest {
    #[serde(default)]
    pub data: Vec<BridgeBatchItem>,
}

/// Sorted hashes of every transaction submitted for a request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeOperationsResponse {
    pub tx_hashes: Vec<String>,
}

// ============================================================================
// ENCODED PAYLOAD
// ============================================================================

/// One ready-to-sign transaction body: `tag@hex(arg1)@...@hex(argN)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPayload {
    pub tag: String,
    pub bytes: Vec<u8>,
}

impl EncodedPayload {
    /// Start a payload with the given call selector and no arguments
    pub fn builder(tag: &str) -> PayloadBuilder {
        PayloadBuilder {
            tag: tag.to_string(),
            bytes: tag.as_bytes().to_vec(),
        }
    }
}

/// Appends hex-encoded, `@`-separated arguments after a call tag
pub struct PayloadBuilder {
    tag: String,
    bytes: Vec<u8>,
}

impl PayloadBuilder {
    pub fn arg(mut self, value: &[u8]) -> Self {
        self.bytes.push(b'@');
        self.bytes.extend_from_slice(hex::encode(value).as_bytes());
        self
    }

    /// Fixed 4-byte big-endian integer argument
    pub fn arg_u32(self, value: u32) -> Self {
        self.arg(&value.to_be_bytes())
    }

    pub fn args<'a, I>(self, values: I) -> Self
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        values.into_iter().fold(self, |builder, value| builder.arg(value))
    }

    pub fn build(self) -> EncodedPayload {
        EncodedPayload {
            tag: self.tag,
            bytes: self.bytes,
        }
    }
}
