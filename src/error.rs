// src/error.rs
//! Error taxonomy for the credential lifecycle.
//!
//! Every cryptographic and validation failure surfaces to the immediate caller as a
//! [`CredentialError`]. Nothing in the library retries or swallows a failure: a
//! signing or verification error may be the only trace of tampering.

use std::fmt;
use thiserror::Error;

/// Which verification check rejected a presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VerificationFailure {
    /// The presentation signature does not verify under the subject's key.
    SignatureInvalid,
    /// The embedded credential does not verify under the issuer's key, or is not
    /// bound to the presenting subject.
    CredentialInvalid,
    /// The nonce was never issued by this verifier.
    NonceMismatch,
    /// The nonce was already presented once.
    NonceReplayed,
    /// The nonce outlived the verifier's configured lifetime.
    NonceExpired,
}

impl VerificationFailure {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationFailure::SignatureInvalid => "signature-invalid",
            VerificationFailure::CredentialInvalid => "credential-invalid",
            VerificationFailure::NonceMismatch => "nonce-mismatch",
            VerificationFailure::NonceReplayed => "nonce-replayed",
            VerificationFailure::NonceExpired => "nonce-expired",
        }
    }
}

impl fmt::Display for VerificationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by identity creation, signing and verification.
#[derive(Error, Debug)]
pub enum CredentialError {
    /// Keypair generation failed (random source failure or invalid scalar).
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    /// The secure random source could not produce bytes.
    #[error("random source failed: {0}")]
    RandomSource(String),

    /// The signing operation itself failed.
    #[error("signing failed: {0}")]
    Signing(String),

    /// Malformed or missing claim, credential or nonce fields.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A presentation was rejected by the verifier.
    #[error("verification failed ({reason}): {detail}")]
    Verification {
        /// The check that failed.
        reason: VerificationFailure,
        /// Human readable context.
        detail: String,
    },

    /// Canonical encoding could not be produced.
    #[error("canonicalization failed: {0}")]
    Canonicalization(#[from] serde_json::Error),
}

impl CredentialError {
    pub(crate) fn verification(reason: VerificationFailure, detail: impl Into<String>) -> Self {
        CredentialError::Verification {
            reason,
            detail: detail.into(),
        }
    }

    /// The verification reason, if this is a [`CredentialError::Verification`].
    pub fn verification_reason(&self) -> Option<VerificationFailure> {
        match self {
            CredentialError::Verification { reason, .. } => Some(*reason),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CredentialError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_labels() {
        assert_eq!(VerificationFailure::SignatureInvalid.to_string(), "signature-invalid");
        assert_eq!(VerificationFailure::CredentialInvalid.to_string(), "credential-invalid");
        assert_eq!(VerificationFailure::NonceMismatch.to_string(), "nonce-mismatch");
        assert_eq!(VerificationFailure::NonceReplayed.to_string(), "nonce-replayed");
        assert_eq!(VerificationFailure::NonceExpired.to_string(), "nonce-expired");
    }

    #[test]
    fn test_verification_error_carries_reason() {
        let err = CredentialError::verification(VerificationFailure::NonceReplayed, "seen before");
        assert_eq!(err.verification_reason(), Some(VerificationFailure::NonceReplayed));
        assert_eq!(err.to_string(), "verification failed (nonce-replayed): seen before");

        let other = CredentialError::InvalidInput("empty".into());
        assert_eq!(other.verification_reason(), None);
    }
}
