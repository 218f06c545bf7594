/// Relayer Wallet
///
/// Ed25519 key material the relay signs destination chain transactions with.
/// Keys are loaded once at startup and shared read-only between chains.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand_core::OsRng;
use std::path::Path;

use crate::rpc::Transaction;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    /// Key file could not be read
    Io(String),
    /// Key file content is not a valid Ed25519 seed
    InvalidKey(String),
}

impl std::fmt::Display for WalletError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WalletError::Io(msg) => write!(f, "Cannot read wallet file: {}", msg),
            WalletError::InvalidKey(msg) => write!(f, "Invalid wallet key: {}", msg),
        }
    }
}

impl std::error::Error for WalletError {}

// ============================================================================
// WALLET TRAIT
// ============================================================================

pub trait Wallet: Send + Sync {
    /// Address transactions are sent from
    fn address(&self) -> &str;

    fn sign(&self, message: &[u8]) -> Vec<u8>;

    /// Hex signature over the transaction's canonical signing bytes
    fn sign_transaction(&self, tx: &Transaction) -> String {
        hex::encode(self.sign(&tx.signing_bytes()))
    }
}

// ============================================================================
// ED25519 WALLET
// ============================================================================

#[derive(Clone)]
pub struct Ed25519Wallet {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
    address: String,
}

impl Ed25519Wallet {
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(seed);
        let verifying_key = signing_key.verifying_key();
        // Address is the hex-encoded public key
        let address = hex::encode(verifying_key.as_bytes());

        Ed25519Wallet {
            signing_key,
            verifying_key,
            address,
        }
    }

    /// Fresh random key, for tooling and tests
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        Self::from_seed(&signing_key.to_bytes())
    }

    /// Parse a key file: a hex seed, optionally wrapped in PEM armor lines.
    ///
    /// A 64-byte value is read as `seed || public key` and only the seed is used.
    pub fn from_key_text(text: &str) -> Result<Self, WalletError> {
        let body: String = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with("-----"))
            .collect();

        let bytes = hex::decode(&body).map_err(|e| WalletError::InvalidKey(e.to_string()))?;
        if bytes.len() != 32 && bytes.len() != 64 {
            return Err(WalletError::InvalidKey(format!(
                "expected 32 or 64 bytes, got {}",
                bytes.len()
            )));
        }

        let mut seed = [0u8; 32];
        seed.copy_from_slice(&bytes[..32]);
        Ok(Self::from_seed(&seed))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, WalletError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| WalletError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_key_text(&text)
    }

    pub fn public_key_hex(&self) -> String {
        hex::encode(self.verifying_key.as_bytes())
    }

    /// Verify a hex-encoded signature against this wallet's public key
    pub fn verify_hex(&self, message: &[u8], signature_hex: &str) -> bool {
        let Ok(sig_bytes) = hex::decode(signature_hex) else {
            return false;
        };
        let Ok(sig_array) = <[u8; 64]>::try_from(sig_bytes.as_slice()) else {
            return false;
        };
        let signature = Signature::from_bytes(&sig_array);
        self.verifying_key.verify(message, &signature).is_ok()
    }
}

impl Wallet for Ed25519Wallet {
    fn address(&self) -> &str {
        &self.address
    }

    fn sign(&self, message: &[u8]) -> Vec<u8> {
        self.signing_key.sign(message).to_bytes().to_vec()
    }
}

impl std::fmt::Debug for Ed25519Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ed25519Wallet")
            .field("address", &self.address)
            .finish()
    }
}

// ============================================================================
// TESTS
// ============================================================================
