// src/models/credential.rs
//! Credential data model.
//!
//! A credential is a [`Claim`] plus the issuer's signature binding it to one subject.

use crate::models::claim::Claim;
use crate::utils::serialization::base64_bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Descriptive metadata about the issuer, signed along with the claim.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct IssuerProfile {
    /// Example: "https://oxford.com/issuers/1"
    pub url: String,
    /// Example: "The Marvelous University of Oxford"
    pub name: String,
}

/// A signed claim about a subject.
///
/// # Fields
/// - `id`: `urn:vc:` followed by the Keccak-256 digest of the signed payload
/// - `claim`: the attested facts, bound to the subject via `claim.subject_id`
/// - `issuer_id`: identity ID of the issuer; the verifying key is resolved from it
/// - `issuer`: issuer metadata
/// - `issuance_date`: when the issuer signed
/// - `signature`: compact secp256k1 ECDSA signature (R || S), base64 in JSON
///
/// # Security Considerations
/// - Every field except `signature` is covered by the signature, directly or via `id`
/// - Credentials are only meaningful once checked against the issuer's published key
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub id: String,
    pub claim: Claim,
    pub issuer_id: String,
    pub issuer: IssuerProfile,
    pub issuance_date: DateTime<Utc>,
    #[serde(with = "base64_bytes")]
    pub signature: Vec<u8>,
}

impl Credential {
    /// ID of the subject this credential was issued to.
    pub fn subject_id(&self) -> &str {
        &self.claim.subject_id
    }
}
