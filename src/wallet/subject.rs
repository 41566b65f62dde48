// src/wallet/subject.rs
//! The subject's wallet: an identity plus the credentials issued to it.
//!
//! The subject proves possession of a credential by signing it together with a
//! verifier's nonce. Because the nonce is inside the signed payload, a presentation
//! cannot be reused for any other challenge.

use crate::error::{CredentialError, Result};
use crate::models::credential::Credential;
use crate::models::did::DIDDocument;
use crate::models::presentation::{Nonce, Presentation, NONCE_LEN};
use crate::services::credential_issuer::verify_credential;
use crate::services::directory::KeyDirectory;
use crate::utils::crypto::RandomSource;
use crate::utils::serialization::presentation_signing_input;
use crate::wallet::credential_storage::CredentialStorage;
use crate::wallet::key_management::Identity;
use log::{debug, info};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// An identity capable of holding credentials and presenting them.
///
/// Cloning is cheap and clones share the same credential storage.
#[derive(Clone)]
pub struct Subject {
    identity: Identity,
    credential_storage: Arc<Mutex<CredentialStorage>>,
}

impl Subject {
    pub fn new(identity: Identity) -> Self {
        Subject {
            identity,
            credential_storage: Arc::new(Mutex::new(CredentialStorage::new())),
        }
    }

    /// Creates a subject with a freshly generated keypair.
    ///
    /// # Errors
    /// `CredentialError::KeyGeneration` if the keypair cannot be generated.
    pub fn create(random: &dyn RandomSource) -> Result<Self> {
        let identity = Identity::generate(random)?;
        info!("Created subject {}", identity.id());
        Ok(Self::new(identity))
    }

    pub fn id(&self) -> &str {
        self.identity.id()
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn document(&self) -> DIDDocument {
        self.identity.document(None)
    }

    /// Signs a presentation of `credential` bound to `nonce`.
    ///
    /// # Errors
    /// - `CredentialError::InvalidInput` if the credential is empty (no ID or signature),
    ///   was issued to a different subject, or the nonce is not `NONCE_LEN` bytes
    /// - `CredentialError::Signing` if the signature cannot be produced
    pub fn sign_presentation(&self, credential: &Credential, nonce: &Nonce) -> Result<Presentation> {
        if credential.id.is_empty() || credential.signature.is_empty() {
            return Err(CredentialError::InvalidInput(
                "cannot present an empty credential".to_string(),
            ));
        }
        if credential.subject_id() != self.id() {
            return Err(CredentialError::InvalidInput(format!(
                "credential {} was issued to {}, not {}",
                credential.id,
                credential.subject_id(),
                self.id()
            )));
        }
        if !nonce.has_valid_length() {
            return Err(CredentialError::InvalidInput(format!(
                "nonce must be {} bytes, got {}",
                NONCE_LEN,
                nonce.value.len()
            )));
        }

        let input = presentation_signing_input(credential, nonce, self.id())?;
        debug!("Signing {} bytes of presentation payload for {}", input.len(), credential.id);
        let signature = self.identity.sign(&input)?;

        info!("Subject {} presented {}", self.id(), credential.id);
        Ok(Presentation {
            credential: credential.clone(),
            nonce: nonce.clone(),
            subject_id: self.id().to_string(),
            signature,
        })
    }

    /// Checks a freshly issued credential against the issuer's published key and
    /// stores it.
    ///
    /// # Errors
    /// - `CredentialError::InvalidInput` if the credential is about another subject or
    ///   its issuer is not in the directory
    /// - `VerificationError{credential-invalid}` if the issuer signature does not verify
    pub fn accept_credential(&self, credential: Credential, directory: &KeyDirectory) -> Result<()> {
        if credential.subject_id() != self.id() {
            return Err(CredentialError::InvalidInput(format!(
                "credential {} is about {}, not {}",
                credential.id,
                credential.subject_id(),
                self.id()
            )));
        }
        let issuer_key = directory.public_key(&credential.issuer_id).ok_or_else(|| {
            CredentialError::InvalidInput(format!("issuer {} is not published", credential.issuer_id))
        })?;
        verify_credential(&credential, &issuer_key)?;
        self.store_credential(credential);
        Ok(())
    }

    fn storage(&self) -> MutexGuard<'_, CredentialStorage> {
        self.credential_storage
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores a credential without checking it. Overwrites one with the same ID.
    pub fn store_credential(&self, credential: Credential) {
        self.storage().store_credential(credential);
    }

    /// Returns a clone of the stored credential, if any.
    pub fn get_credential(&self, id: &str) -> Option<Credential> {
        self.storage().get_credential(id).cloned()
    }

    pub fn has_credential(&self, id: &str) -> bool {
        self.storage().contains_credential(id)
    }

    /// Returns true if a credential was removed.
    pub fn remove_credential(&self, id: &str) -> bool {
        self.storage().remove_credential(id)
    }

    pub fn credential_count(&self) -> usize {
        self.storage().count_credentials()
    }

    pub fn credential_ids(&self) -> Vec<String> {
        self.storage().credential_ids()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VerificationFailure;
    use crate::models::claim::Claim;
    use crate::services::credential_issuer::Issuer;
    use crate::utils::crypto::{verify_message, SeededRandomSource};
    use chrono::Utc;

    struct Fixture {
        issuer: Issuer,
        subject: Subject,
        directory: KeyDirectory,
        credential: Credential,
    }

    fn fixture(seed: u64) -> Fixture {
        let random = SeededRandomSource::new(seed);
        let issuer = Issuer::create("https://oxford.com/issuers/1", "Oxford", &random).unwrap();
        let subject = Subject::create(&random).unwrap();
        let directory = KeyDirectory::new();
        directory.register(issuer.document()).unwrap();
        let claim = Claim::new().with("age", 24u32).with("degree", "Bachelor of Science");
        let credential = issuer.sign_credential(claim, subject.id()).unwrap();
        Fixture {
            issuer,
            subject,
            directory,
            credential,
        }
    }

    fn nonce(byte: u8) -> Nonce {
        Nonce {
            value: vec![byte; NONCE_LEN],
            issued_at: Utc::now(),
        }
    }

    #[test]
    fn test_sign_presentation_covers_nonce() {
        let f = fixture(30);
        let challenge = nonce(1);
        let presentation = f.subject.sign_presentation(&f.credential, &challenge).unwrap();

        assert_eq!(presentation.subject_id, f.subject.id());
        assert_eq!(presentation.nonce, challenge);
        assert_eq!(presentation.credential, f.credential);

        let input = presentation_signing_input(&f.credential, &challenge, f.subject.id()).unwrap();
        let key = f.subject.identity().public_key();
        assert!(verify_message(key, input.as_bytes(), &presentation.signature));

        let other_input = presentation_signing_input(&f.credential, &nonce(2), f.subject.id()).unwrap();
        assert!(!verify_message(key, other_input.as_bytes(), &presentation.signature));
    }

    #[test]
    fn test_rejects_empty_credential() {
        let f = fixture(31);
        let mut empty = f.credential.clone();
        empty.signature.clear();
        let err = f.subject.sign_presentation(&empty, &nonce(1)).unwrap_err();
        assert!(matches!(err, CredentialError::InvalidInput(_)));
    }

    #[test]
    fn test_rejects_bad_nonce_length() {
        let f = fixture(32);
        let mut short = nonce(1);
        short.value.truncate(8);
        let err = f.subject.sign_presentation(&f.credential, &short).unwrap_err();
        assert!(matches!(err, CredentialError::InvalidInput(_)));

        let mut empty = nonce(1);
        empty.value.clear();
        assert!(f.subject.sign_presentation(&f.credential, &empty).is_err());
    }

    #[test]
    fn test_rejects_someone_elses_credential() {
        let f = fixture(33);
        let stranger = Subject::create(&SeededRandomSource::new(99)).unwrap();
        let err = stranger.sign_presentation(&f.credential, &nonce(1)).unwrap_err();
        assert!(matches!(err, CredentialError::InvalidInput(_)));
    }

    #[test]
    fn test_accept_credential_stores_verified_credential() {
        let f = fixture(34);
        f.subject.accept_credential(f.credential.clone(), &f.directory).unwrap();
        assert!(f.subject.has_credential(&f.credential.id));
        assert_eq!(f.subject.credential_count(), 1);
        assert_eq!(f.subject.get_credential(&f.credential.id), Some(f.credential.clone()));

        // clones share the wallet
        let clone = f.subject.clone();
        assert!(clone.remove_credential(&f.credential.id));
        assert_eq!(f.subject.credential_count(), 0);
    }

    #[test]
    fn test_accept_credential_rejects_forgery() {
        let f = fixture(35);
        let mut forged = f.credential.clone();
        forged.claim = forged.claim.with("degree", "Doctor of Philosophy");
        let err = f.subject.accept_credential(forged, &f.directory).unwrap_err();
        assert_eq!(err.verification_reason(), Some(VerificationFailure::CredentialInvalid));
        assert_eq!(f.subject.credential_count(), 0);
    }

    #[test]
    fn test_accept_credential_requires_published_issuer() {
        let f = fixture(36);
        let err = f.subject.accept_credential(f.credential.clone(), &KeyDirectory::new()).unwrap_err();
        assert!(matches!(err, CredentialError::InvalidInput(_)));
        assert_eq!(f.issuer.id(), f.credential.issuer_id);
    }
}
