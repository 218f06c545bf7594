/// Sovereign Bridge Relay
/// Exports all modules for use as a library crate

pub mod app_state;
pub mod bridge_server;
pub mod client;
pub mod config;
pub mod encoder;
pub mod handlers;
pub mod hasher;
pub mod logging;
pub mod models;
pub mod payload_router;
pub mod routes;
pub mod tx_sender;
pub mod wallet;

#[path = "../rpc/mod.rs"]
pub mod rpc;

// Re-export the relay pipeline
pub use bridge_server::{BridgeRelay, RelayError};
pub use encoder::{EncodeError, EncoderRegistry, OperationEncoder};
pub use payload_router::{GasLimits, PayloadRouter, RouteEntry, RoutingError};
pub use tx_sender::{BatchSender, TxSender, TxSenderArgs, TxSenderError};

// Re-export wire models
pub use models::{
    BridgeBatchItem, BridgeOperationsRequest, BridgeOperationsResponse, ChainId, EncodedPayload,
    OperationType, OutgoingOperation,
};

// Re-export collaborators
pub use client::{BridgeClient, ClientError};
pub use config::{ChainConfig, ConfigError, RelayConfig};
pub use hasher::{Hasher, Keccak256Hasher, Sha256Hasher};
pub use rpc::{AccountNonceHandler, GatewayProxy, NonceHandler, Proxy, ProxyError, Transaction};
pub use wallet::{Ed25519Wallet, Wallet, WalletError};
