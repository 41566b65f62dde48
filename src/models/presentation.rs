// src/models/presentation.rs
//! Nonce and presentation data model.

use crate::error::VerificationFailure;
use crate::models::credential::Credential;
use crate::utils::serialization::base64_bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Length in bytes of every verifier challenge.
pub const NONCE_LEN: usize = 32;

/// Single-use challenge issued by a verifier.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Nonce {
    #[serde(with = "base64_bytes")]
    pub value: Vec<u8>,
    pub issued_at: DateTime<Utc>,
}

impl Nonce {
    pub fn has_valid_length(&self) -> bool {
        self.value.len() == NONCE_LEN
    }
}

/// A credential re-signed by its subject together with a verifier nonce.
///
/// The subject's signature covers the whole credential (issuer signature included),
/// the nonce and the subject ID, so none of them can be swapped after signing.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Presentation {
    pub credential: Credential,
    pub nonce: Nonce,
    pub subject_id: String,
    #[serde(with = "base64_bytes")]
    pub signature: Vec<u8>,
}

/// Where a single credential exchange stands, as tracked per nonce by the verifier.
///
/// `Issued → Presented → Verified` or `Issued → Presented → Rejected`; no state is
/// skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeState {
    Issued,
    Presented,
    Verified,
    Rejected(VerificationFailure),
}
