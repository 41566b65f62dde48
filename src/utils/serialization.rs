// src/utils/serialization.rs
//! Serialization utilities for the credential lifecycle.
//!
//! Provides:
//! - Canonical encoding: the exact byte sequence that credential and presentation
//!   signatures cover
//! - JSON helpers for pretty-printing and round-tripping artefacts
//! - Base64 serde adapters for binary fields
//!
//! # Canonical form
//! Values are first converted to a JSON tree, then written compactly with every object's
//! keys sorted bytewise. Strings use serde_json's escaping, integers their decimal form.
//! Each signed payload carries a `type` tag so a credential signature can never be
//! replayed as a presentation signature or vice versa.

use crate::error::Result;
use crate::models::claim::Claim;
use crate::models::credential::{Credential, IssuerProfile};
use crate::models::presentation::Nonce;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const CREDENTIAL_PAYLOAD_TYPE: &str = "credential-lifecycle/credential";
const PRESENTATION_PAYLOAD_TYPE: &str = "credential-lifecycle/presentation";

/// Bytes produced by canonical encoding. The only way to get signing input.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Canonically encodes any serializable value.
    ///
    /// # Errors
    /// Returns `CredentialError::Canonicalization` if the value cannot be represented
    /// as JSON (for example a map with non-string keys).
    pub fn new(value: &impl Serialize) -> Result<Self> {
        let tree = serde_json::to_value(value)?;
        let mut out = Vec::new();
        write_canonical(&tree, &mut out)?;
        Ok(Self(out))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn write_canonical(value: &Value, out: &mut Vec<u8>) -> Result<()> {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
            out.push(b'{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                serde_json::to_writer(&mut *out, key)?;
                out.push(b':');
                write_canonical(item, out)?;
            }
            out.push(b'}');
        }
        Value::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_canonical(item, out)?;
            }
            out.push(b']');
        }
        scalar => serde_json::to_writer(&mut *out, scalar)?,
    }
    Ok(())
}

#[derive(Serialize)]
struct CredentialPayload<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    claim: &'a Claim,
    issuer_id: &'a str,
    issuer: &'a IssuerProfile,
    issuance_date: &'a DateTime<Utc>,
    subject_id: &'a str,
}

#[derive(Serialize)]
struct PresentationPayload<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    credential: &'a Credential,
    nonce: &'a Nonce,
    subject_id: &'a str,
}

/// Canonical encoding of (claim ‖ issuer ‖ subject), the input of an issuer signature.
pub fn credential_signing_input(
    claim: &Claim,
    issuer_id: &str,
    issuer: &IssuerProfile,
    issuance_date: &DateTime<Utc>,
    subject_id: &str,
) -> Result<CanonicalBytes> {
    CanonicalBytes::new(&CredentialPayload {
        kind: CREDENTIAL_PAYLOAD_TYPE,
        claim,
        issuer_id,
        issuer,
        issuance_date,
        subject_id,
    })
}

/// Re-derives the signing input of an existing credential from its own fields.
pub fn credential_signing_input_of(credential: &Credential) -> Result<CanonicalBytes> {
    credential_signing_input(
        &credential.claim,
        &credential.issuer_id,
        &credential.issuer,
        &credential.issuance_date,
        credential.subject_id(),
    )
}

/// Canonical encoding of (credential ‖ nonce ‖ subject), the input of a subject signature.
pub fn presentation_signing_input(
    credential: &Credential,
    nonce: &Nonce,
    subject_id: &str,
) -> Result<CanonicalBytes> {
    CanonicalBytes::new(&PresentationPayload {
        kind: PRESENTATION_PAYLOAD_TYPE,
        credential,
        nonce,
        subject_id,
    })
}

/// Serializes a value to a pretty-printed JSON string.
///
/// # Returns
/// - `Ok(String)` with the indented JSON representation on success
/// - `Err(serde_json::Error)` if serialization fails
pub fn to_pretty_json<T: Serialize>(data: &T) -> std::result::Result<String, serde_json::Error> {
    serde_json::to_string_pretty(data)
}

/// Deserializes a value from a JSON string.
///
/// # Note
/// The lifetime parameter lets the deserialized value borrow from the input string.
pub fn deserialize<'a, T: Deserialize<'a>>(data: &'a str) -> std::result::Result<T, serde_json::Error> {
    serde_json::from_str(data)
}

/// Serde adapter rendering `Vec<u8>` fields as standard base64 strings.
pub mod base64_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&base64::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        base64::decode(encoded.as_bytes())
            .map_err(|e| serde::de::Error::custom(format!("Base64 decoding failed: {}", e)))
    }
}
