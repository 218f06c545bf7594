//! Digest functions used for the hash-of-hashes integrity check.

use sha2::{Digest, Sha256};
use sha3::Keccak256;

pub trait Hasher: Send + Sync {
    fn digest(&self, data: &[u8]) -> Vec<u8>;

    /// Hasher name as accepted by the `HASHER` setting
    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Hasher;

impl Hasher for Sha256Hasher {
    fn digest(&self, data: &[u8]) -> Vec<u8> {
        Sha256::digest(data).to_vec()
    }

    fn name(&self) -> &'static str {
        "sha256"
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Keccak256Hasher;

impl Hasher for Keccak256Hasher {
    fn digest(&self, data: &[u8]) -> Vec<u8> {
        Keccak256::digest(data).to_vec()
    }

    fn name(&self) -> &'static str {
        "keccak256"
    }
}

/// Resolve a configured hasher name
pub fn hasher_from_name(name: &str) -> Option<Box<dyn Hasher>> {
    match name.trim().to_lowercase().as_str() {
        "sha256" => Some(Box::new(Sha256Hasher)),
        "keccak256" | "keccak" => Some(Box::new(Keccak256Hasher)),
        _ => None,
    }
}
