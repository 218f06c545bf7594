//! Payload Router
//!
//! Maps an encoded payload's call tag to the contract that receives it and
//! the gas budget of the transaction.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::encoder::{
    CHANGE_VALIDATOR_SET_TAG, EXECUTE_BRIDGE_OPS_TAG, REGISTER_BRIDGE_OPS_TAG, REGISTER_TOKEN_TAG,
    REGISTER_VALIDATOR_TAG, UNREGISTER_VALIDATOR_TAG,
};

// ============================================================================
// CONSTANTS
// ============================================================================

pub const DEFAULT_GAS_LIMIT_REGISTER: u64 = 60_000_000;
pub const DEFAULT_GAS_LIMIT_EXECUTE: u64 = 600_000_000;
pub const DEFAULT_GAS_LIMIT_CHANGE_VALIDATOR_SET: u64 = 60_000_000;

/// Tags every bridge deployment must be able to route
pub const REQUIRED_TAGS: [&str; 3] = [
    REGISTER_BRIDGE_OPS_TAG,
    EXECUTE_BRIDGE_OPS_TAG,
    CHANGE_VALIDATOR_SET_TAG,
];

// ============================================================================
// ROUTING TYPES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteEntry {
    pub receiver: String,
    pub gas_limit: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingError {
    /// No route for this payload tag
    UnknownTag(String),
    /// A required tag has no route configured
    MissingRoute(String),
    /// A route points at an empty receiver address
    EmptyReceiver(String),
}

impl std::fmt::Display for RoutingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoutingError::UnknownTag(tag) => write!(f, "No route for payload tag: {}", tag),
            RoutingError::MissingRoute(tag) => write!(f, "Missing route for required tag: {}", tag),
            RoutingError::EmptyReceiver(tag) => write!(f, "Empty receiver address for tag: {}", tag),
        }
    }
}

impl std::error::Error for RoutingError {}

/// Gas budgets per call family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasLimits {
    pub register: u64,
    pub execute: u64,
    pub change_validator_set: u64,
}

impl Default for GasLimits {
    fn default() -> Self {
        Self {
            register: DEFAULT_GAS_LIMIT_REGISTER,
            execute: DEFAULT_GAS_LIMIT_EXECUTE,
            change_validator_set: DEFAULT_GAS_LIMIT_CHANGE_VALIDATOR_SET,
        }
    }
}

// ============================================================================
// PAYLOAD ROUTER
// ============================================================================

#[derive(Debug, Clone)]
pub struct PayloadRouter {
    routes: HashMap<String, RouteEntry>,
}

impl PayloadRouter {
    /// Router over an explicit routing table, checked for the required tags
    pub fn new(routes: HashMap<String, RouteEntry>) -> Result<Self, RoutingError> {
        for tag in REQUIRED_TAGS {
            if !routes.contains_key(tag) {
                return Err(RoutingError::MissingRoute(tag.to_string()));
            }
        }

        if let Some((tag, _)) = routes.iter().find(|(_, route)| route.receiver.trim().is_empty()) {
            return Err(RoutingError::EmptyReceiver(tag.clone()));
        }

        Ok(Self { routes })
    }

    /// Standard bridge layout: registration and validator changes go to the
    /// header verifier, every execute-style call goes to the ESDT safe.
    pub fn for_bridge_contracts(
        header_verifier_address: &str,
        esdt_safe_address: &str,
        gas: GasLimits,
    ) -> Result<Self, RoutingError> {
        let route = |receiver: &str, gas_limit: u64| RouteEntry {
            receiver: receiver.to_string(),
            gas_limit,
        };

        let mut routes = HashMap::new();
        routes.insert(
            REGISTER_BRIDGE_OPS_TAG.to_string(),
            route(header_verifier_address, gas.register),
        );
        routes.insert(
            CHANGE_VALIDATOR_SET_TAG.to_string(),
            route(header_verifier_address, gas.change_validator_set),
        );
        for tag in [
            EXECUTE_BRIDGE_OPS_TAG,
            REGISTER_TOKEN_TAG,
            REGISTER_VALIDATOR_TAG,
            UNREGISTER_VALIDATOR_TAG,
        ] {
            routes.insert(tag.to_string(), route(esdt_safe_address, gas.execute));
        }

        Self::new(routes)
    }

    pub fn route(&self, tag: &str) -> Result<&RouteEntry, RoutingError> {
        self.routes
            .get(tag)
            .ok_or_else(|| RoutingError::UnknownTag(tag.to_string()))
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }
}
