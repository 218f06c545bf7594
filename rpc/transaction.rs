//! Transaction envelope submitted to the destination chain gateway.
//!
//! The signature covers the canonical JSON form of the transaction with the
//! `signature` field omitted.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::NetworkConfig;

/// Value sent with every bridge call
pub const ZERO_VALUE: &str = "0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub nonce: u64,
    pub value: String,
    pub receiver: String,
    pub sender: String,
    pub gas_price: u64,
    pub gas_limit: u64,
    #[serde(
        serialize_with = "serialize_data",
        deserialize_with = "deserialize_data",
        skip_serializing_if = "Vec::is_empty",
        default
    )]
    pub data: Vec<u8>,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub signature: String,
    #[serde(rename = "chainID")]
    pub chain_id: String,
    pub version: u32,
}

impl Transaction {
    /// Zero-value contract call from `sender` with the network's minimum gas
    /// price. Nonce is left at 0 until the nonce handler assigns it.
    pub fn contract_call(
        sender: &str,
        receiver: &str,
        gas_limit: u64,
        data: Vec<u8>,
        network: &NetworkConfig,
    ) -> Self {
        Self {
            nonce: 0,
            value: ZERO_VALUE.to_string(),
            receiver: receiver.to_string(),
            sender: sender.to_string(),
            gas_price: network.min_gas_price,
            gas_limit,
            data,
            signature: String::new(),
            chain_id: network.chain_id.clone(),
            version: network.min_tx_version,
        }
    }

    /// Canonical bytes to sign
    pub fn signing_bytes(&self) -> Vec<u8> {
        let unsigned = Transaction {
            signature: String::new(),
            ..self.clone()
        };
        // plain struct of strings and integers, serialization cannot fail
        serde_json::to_vec(&unsigned).unwrap_or_default()
    }

    pub fn is_signed(&self) -> bool {
        !self.signature.is_empty()
    }
}

fn serialize_data<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&BASE64.encode(data))
}

fn deserialize_data<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
    let encoded = String::deserialize(deserializer)?;
    BASE64.decode(encoded).map_err(serde::de::Error::custom)
}
