// src/utils/crypto.rs
//! Cryptographic utilities shared by issuers, subjects and verifiers.
//!
//! Uses Keccak-256 (Ethereum's standard hash function) for every digest, secp256k1
//! ECDSA for signatures, and an injected [`RandomSource`] for every byte of entropy
//! the protocol consumes (keys and nonces).

use ethers_core::utils::keccak256;
use k256::ecdsa::signature::hazmat::PrehashVerifier;
use k256::ecdsa::{Signature, VerifyingKey};
use k256::PublicKey;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use ring::rand::{SecureRandom, SystemRandom};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

/// Computes a Keccak-256 hash of the input data (Ethereum-compatible).
///
/// # Arguments
/// * `data` - Binary data to hash (as bytes slice)
///
/// # Returns
/// Fixed-size 32-byte array (`[u8; 32]`) containing the hash.
pub fn hash_data(data: &[u8]) -> [u8; 32] {
    keccak256(data)
}

/// Checks a compact (R || S) ECDSA signature over `keccak256(message)`.
///
/// Returns `false` for malformed signatures as well as for signatures that do not
/// verify; callers decide which failure kind to report.
pub fn verify_message(public_key: &PublicKey, message: &[u8], signature: &[u8]) -> bool {
    let signature = match Signature::from_slice(signature) {
        Ok(signature) => signature,
        Err(_) => return false,
    };
    let hash = hash_data(message);
    VerifyingKey::from(public_key)
        .verify_prehash(&hash, &signature)
        .is_ok()
}

/// The random source could not deliver bytes.
#[derive(Error, Debug)]
#[error("entropy unavailable: {0}")]
pub struct EntropyError(pub String);

/// Provider of cryptographically secure random bytes.
///
/// Passed explicitly to identity and nonce creation so that tests can substitute
/// deterministic or failing sources.
pub trait RandomSource: Send + Sync {
    /// Fills `dest` entirely with random bytes.
    fn fill(&self, dest: &mut [u8]) -> Result<(), EntropyError>;
}

/// Operating system randomness via `ring`.
pub struct SystemRandomSource {
    rng: SystemRandom,
}

impl SystemRandomSource {
    pub fn new() -> Self {
        Self {
            rng: SystemRandom::new(),
        }
    }
}

impl Default for SystemRandomSource {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for SystemRandomSource {
    fn fill(&self, dest: &mut [u8]) -> Result<(), EntropyError> {
        self.rng
            .fill(dest)
            .map_err(|_| EntropyError("system random source failed".to_string()))
    }
}

/// Deterministic source seeded from a `u64`.
///
/// Only for reproducible demos and tests: anyone who knows the seed knows every key.
pub struct SeededRandomSource {
    rng: Mutex<StdRng>,
}

impl SeededRandomSource {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandomSource {
    fn fill(&self, dest: &mut [u8]) -> Result<(), EntropyError> {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        rng.try_fill_bytes(dest)
            .map_err(|e| EntropyError(e.to_string()))
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use k256::ecdsa::signature::hazmat::PrehashSigner;
    use k256::ecdsa::SigningKey;
    use k256::SecretKey;

    #[test]
    fn test_hash_data_is_keccak() {
        // keccak256("") is a well known constant
        let hash = hash_data(b"");
        assert_eq!(hash[0], 0xc5);
        assert_eq!(hash[1], 0xd2);
        assert_eq!(hash[31], 0x70);
    }

    #[test]
    fn test_seeded_source_is_reproducible() {
        let a = SeededRandomSource::new(7);
        let b = SeededRandomSource::new(7);
        let mut left = [0u8; 32];
        let mut right = [0u8; 32];
        a.fill(&mut left).unwrap();
        b.fill(&mut right).unwrap();
        assert_eq!(left, right);

        a.fill(&mut left).unwrap();
        assert_ne!(left, right);
    }

    #[test]
    fn test_system_source_fills() {
        let source = SystemRandomSource::new();
        let mut first = [0u8; 32];
        let mut second = [0u8; 32];
        source.fill(&mut first).unwrap();
        source.fill(&mut second).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_verify_message() {
        let secret = SecretKey::from_slice(&[7u8; 32]).unwrap();
        let signing_key = SigningKey::from(&secret);
        let hash = hash_data(b"payload");
        let signature: Signature = signing_key.sign_prehash(&hash).unwrap();
        let bytes = signature.to_bytes().to_vec();

        assert!(verify_message(&secret.public_key(), b"payload", &bytes));
        assert!(!verify_message(&secret.public_key(), b"other payload", &bytes));
        assert!(!verify_message(&secret.public_key(), b"payload", &bytes[..10]));

        let other = SecretKey::from_slice(&[9u8; 32]).unwrap();
        assert!(!verify_message(&other.public_key(), b"payload", &bytes));
    }
}
