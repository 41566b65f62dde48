// src/models/did.rs
//! Identity document data model.
//!
//! The public half of an identity, as published to the key directory.

use crate::error::{CredentialError, Result};
use crate::utils::serialization::base64_bytes;
use crate::wallet::key_management::derive_id;
use k256::PublicKey;
use serde::{Deserialize, Serialize};

/// A DID Document representing a published identity.
///
/// # Fields
/// - `id`: identity ID, `did:ethr:0x…` (see [`derive_id`])
/// - `public_key`: SEC1 compressed secp256k1 public key, base64 in JSON
/// - `service_endpoint`: optional URI for the identity, e.g. the issuer's URL
///
/// # Security Considerations
/// - A document is only trustworthy if `id` re-derives from `public_key`;
///   [`DIDDocument::public_key`] enforces that on every read.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DIDDocument {
    pub id: String,

    #[serde(with = "base64_bytes")]
    pub public_key: Vec<u8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_endpoint: Option<String>,
}

impl DIDDocument {
    /// Decodes the public key and checks that the ID was derived from it.
    pub fn public_key(&self) -> Result<PublicKey> {
        let key = PublicKey::from_sec1_bytes(&self.public_key).map_err(|e| {
            CredentialError::InvalidInput(format!("malformed public key for {}: {}", self.id, e))
        })?;
        let expected = derive_id(&key);
        if expected != self.id {
            return Err(CredentialError::InvalidInput(format!(
                "identifier {} does not match its public key (expected {})",
                self.id, expected
            )));
        }
        Ok(key)
    }
}
