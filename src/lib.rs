// src/lib.rs

//! # Credential Lifecycle
//!
//! Issuer, subject and verifier of a signed credential exchange.
//!
//! ## Flow
//! 1. [`Issuer::sign_credential`] binds a [`Claim`] to a subject ID → [`Credential`]
//! 2. [`Verifier::make_nonce`] issues a single-use challenge → [`Nonce`]
//! 3. [`Subject::sign_presentation`] signs credential + nonce → [`Presentation`]
//! 4. [`Verifier::verify_presentation`] checks both signatures and consumes the nonce
//!
//! Public keys travel through a shared [`KeyDirectory`]; randomness comes from an
//! injected [`RandomSource`].

pub mod config;
pub mod error;
pub mod models;     // Data structures
pub mod services;   // Issuer, verifier, key directory
pub mod utils;      // Hashing, randomness, canonical encoding
pub mod wallet;     // Key material and held credentials

use std::sync::Arc;

pub use crate::config::{Settings, VerifierSettings};
pub use crate::error::{CredentialError, Result, VerificationFailure};
pub use crate::models::claim::{AttributeValue, Claim};
pub use crate::models::credential::{Credential, IssuerProfile};
pub use crate::models::did::DIDDocument;
pub use crate::models::presentation::{ExchangeState, Nonce, Presentation, NONCE_LEN};
pub use crate::services::credential_issuer::Issuer;
pub use crate::services::directory::KeyDirectory;
pub use crate::services::verifier::Verifier;
pub use crate::utils::crypto::{RandomSource, SeededRandomSource, SystemRandomSource};
pub use crate::utils::serialization::{credential_signing_input, presentation_signing_input, CanonicalBytes};
pub use crate::wallet::key_management::Identity;
pub use crate::wallet::subject::Subject;

/// Creates an issuer and publishes it in `directory`.
pub fn create_issuer(
    url: &str,
    name: &str,
    random: &dyn RandomSource,
    directory: &KeyDirectory,
) -> Result<Issuer> {
    let issuer = Issuer::create(url, name, random)?;
    directory.register(issuer.document())?;
    Ok(issuer)
}

/// Creates a subject and publishes it in `directory`.
pub fn create_subject(random: &dyn RandomSource, directory: &KeyDirectory) -> Result<Subject> {
    let subject = Subject::create(random)?;
    directory.register(subject.document())?;
    Ok(subject)
}

/// Creates a verifier resolving keys through `directory`.
pub fn create_verifier(
    settings: &VerifierSettings,
    directory: Arc<KeyDirectory>,
    random: Arc<dyn RandomSource>,
) -> Verifier {
    Verifier::from_settings(settings, directory, random)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn degree_claim() -> Claim {
        Claim::new()
            .with("age", 24u32)
            .with("university_name", "Oxford")
            .with("degree", "Bachelor of Science")
    }

    #[test]
    fn test_oxford_scenario() {
        let random: Arc<dyn RandomSource> = Arc::new(SystemRandomSource::new());
        let directory = Arc::new(KeyDirectory::new());

        let issuer = create_issuer(
            "https://oxford.com/issuers/1",
            "The Marvelous University of Oxford",
            random.as_ref(),
            &directory,
        )
        .unwrap();
        let subject = create_subject(random.as_ref(), &directory).unwrap();
        let verifier = create_verifier(
            &VerifierSettings { nonce_ttl_secs: 300 },
            directory.clone(),
            random.clone(),
        );

        let credential = issuer.sign_credential(degree_claim(), subject.id()).unwrap();
        subject.accept_credential(credential.clone(), &directory).unwrap();

        let nonce = verifier.make_nonce().unwrap();
        let presentation = subject.sign_presentation(&credential, &nonce).unwrap();

        verifier.verify_presentation(&presentation).unwrap();
        let err = verifier.verify_presentation(&presentation).unwrap_err();
        assert_eq!(err.verification_reason(), Some(VerificationFailure::NonceReplayed));
    }

    #[test]
    fn test_presentation_survives_json_transport() {
        let random = SeededRandomSource::new(60);
        let directory = Arc::new(KeyDirectory::new());
        let issuer = create_issuer("https://oxford.com/issuers/1", "Oxford", &random, &directory).unwrap();
        let subject = create_subject(&random, &directory).unwrap();
        let verifier = create_verifier(
            &VerifierSettings { nonce_ttl_secs: 0 },
            directory.clone(),
            Arc::new(SeededRandomSource::new(61)),
        );

        let credential = issuer.sign_credential(degree_claim(), subject.id()).unwrap();
        let nonce = verifier.make_nonce().unwrap();
        let presentation = subject.sign_presentation(&credential, &nonce).unwrap();

        let json = serde_json::to_string(&presentation).unwrap();
        let received: Presentation = serde_json::from_str(&json).unwrap();
        assert_eq!(received, presentation);
        verifier.verify_presentation(&received).unwrap();
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let ids = |seed| {
            let random = SeededRandomSource::new(seed);
            let directory = KeyDirectory::new();
            let issuer = create_issuer("https://oxford.com/issuers/1", "Oxford", &random, &directory).unwrap();
            let subject = create_subject(&random, &directory).unwrap();
            (issuer.id().to_string(), subject.id().to_string())
        };
        assert_eq!(ids(62), ids(62));
        assert_ne!(ids(62), ids(63));
    }
}
