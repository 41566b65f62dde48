// src/wallet/key_management.rs
//! Cryptographic key management for protocol identities.
//!
//! Provides generation and usage of the keypair behind every issuer and subject:
//! - Key generation from an injected [`RandomSource`]
//! - Identifier derivation from the public key
//! - Signing of canonical payloads
//!
//! Uses the following cryptographic primitives:
//! - secp256k1 curve (via `k256` crate)
//! - Keccak-256 hashing and EIP-55 checksums (via `ethers-core`)

use crate::error::{CredentialError, Result};
use crate::models::did::DIDDocument;
use crate::utils::crypto::{hash_data, RandomSource};
use crate::utils::serialization::CanonicalBytes;
use ethers_core::types::Address;
use ethers_core::utils::to_checksum;
use k256::ecdsa::signature::hazmat::PrehashSigner; // for sign_prehash
use k256::ecdsa::{Signature, SigningKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::{PublicKey, SecretKey};
use std::fmt;

/// Method prefix of every identity ID.
pub const DID_PREFIX: &str = "did:ethr:";

/// Derives the identity ID of a public key.
///
/// `did:ethr:` followed by the EIP-55 checksummed Ethereum address of the key: the last
/// 20 bytes of Keccak-256 over the uncompressed point without its `0x04` tag.
pub fn derive_id(public_key: &PublicKey) -> String {
    let encoded = public_key.to_encoded_point(false);
    let hash = hash_data(&encoded.as_bytes()[1..]);
    let address = Address::from_slice(&hash[12..]);
    format!("{}{}", DID_PREFIX, to_checksum(&address, None))
}

/// A keypair plus the identifier derived from it.
///
/// # Security Notes
/// - The secret key is never exposed, serialized or printed
/// - Signatures are deterministic ECDSA (RFC 6979), so signing needs no randomness
#[derive(Clone)]
pub struct Identity {
    id: String,
    /// Securely stored private key (never exposed)
    secret_key: SecretKey,
    /// Derived public key for verification
    public_key: PublicKey,
}

impl Identity {
    /// Generates a fresh identity.
    ///
    /// # Errors
    /// `CredentialError::KeyGeneration` if the random source fails or its output is not a
    /// valid secp256k1 scalar (zero, or not below the curve order).
    pub fn generate(random: &dyn RandomSource) -> Result<Self> {
        let mut seed = [0u8; 32];
        random
            .fill(&mut seed)
            .map_err(|e| CredentialError::KeyGeneration(e.to_string()))?;
        let secret_key = SecretKey::from_slice(&seed).map_err(|_| {
            CredentialError::KeyGeneration("random bytes are not a valid secp256k1 scalar".to_string())
        })?;
        seed.iter_mut().for_each(|b| *b = 0);
        Ok(Self::from_secret_key(secret_key))
    }

    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let public_key = secret_key.public_key();
        Identity {
            id: derive_id(&public_key),
            secret_key,
            public_key,
        }
    }

    /// The identity ID. Stable for the lifetime of the keypair.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// The public document to publish in a key directory.
    pub fn document(&self, service_endpoint: Option<String>) -> DIDDocument {
        DIDDocument {
            id: self.id.clone(),
            public_key: self.public_key.to_sec1_bytes().to_vec(),
            service_endpoint,
        }
    }

    /// Signs canonical bytes using ECDSA (secp256k1) with Keccak-256 prehashing.
    ///
    /// # Returns
    /// 64-byte compact ECDSA signature (R || S values)
    ///
    /// # Errors
    /// `CredentialError::Signing` if the signing primitive rejects the key or digest.
    pub fn sign(&self, message: &CanonicalBytes) -> Result<Vec<u8>> {
        let hash = hash_data(message.as_bytes());
        let signing_key = SigningKey::from(&self.secret_key);
        let signature: Signature = signing_key
            .sign_prehash(&hash)
            .map_err(|e| CredentialError::Signing(format!("{} could not sign: {}", self.id, e)))?;
        Ok(signature.to_bytes().to_vec())
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("id", &self.id)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}
