// src/services/credential_issuer.rs
//! Credential Issuer Service
//!
//! An issuer is an [`Identity`] with a public profile. It binds a pre-negotiated
//! [`Claim`] to a subject ID and signs the canonical encoding of the result, producing a
//! [`Credential`]. Signing is a pure function of the claim and the issuer's fixed keypair.

use crate::error::{CredentialError, Result, VerificationFailure};
use crate::models::claim::Claim;
use crate::models::credential::{Credential, IssuerProfile};
use crate::models::did::DIDDocument;
use crate::utils::crypto::{hash_data, verify_message, RandomSource};
use crate::utils::serialization::{credential_signing_input, credential_signing_input_of, CanonicalBytes};
use crate::wallet::key_management::Identity;
use chrono::{SubsecRound, Utc};
use ethers_core::types::H256;
use k256::PublicKey;
use log::{debug, info};

/// Credential ID for a signing input: `urn:vc:` plus its Keccak-256 digest.
pub fn credential_id(signing_input: &CanonicalBytes) -> String {
    format!("urn:vc:{:#x}", H256::from(hash_data(signing_input.as_bytes())))
}

/// Checks a credential against its issuer's public key.
///
/// Recomputes the signing input from the credential's own fields, checks that the
/// credential ID is the digest of that input, then verifies the signature.
///
/// # Errors
/// `VerificationError{credential-invalid}` on any mismatch.
pub fn verify_credential(credential: &Credential, issuer_key: &PublicKey) -> Result<()> {
    if credential.subject_id().is_empty() {
        return Err(CredentialError::verification(
            VerificationFailure::CredentialInvalid,
            format!("credential {} is not bound to a subject", credential.id),
        ));
    }
    let input = credential_signing_input_of(credential)?;
    if credential_id(&input) != credential.id {
        return Err(CredentialError::verification(
            VerificationFailure::CredentialInvalid,
            format!("credential id {} does not match its content", credential.id),
        ));
    }
    if !verify_message(issuer_key, input.as_bytes(), &credential.signature) {
        return Err(CredentialError::verification(
            VerificationFailure::CredentialInvalid,
            format!("issuer signature on {} does not verify for {}", credential.id, credential.issuer_id),
        ));
    }
    Ok(())
}

/// An identity capable of signing claims into credentials.
#[derive(Debug, Clone)]
pub struct Issuer {
    identity: Identity,
    profile: IssuerProfile,
}

impl Issuer {
    pub fn new(identity: Identity, profile: IssuerProfile) -> Self {
        Self { identity, profile }
    }

    /// Creates an issuer with a freshly generated keypair.
    ///
    /// # Errors
    /// `CredentialError::KeyGeneration` if the keypair cannot be generated.
    pub fn create(url: &str, name: &str, random: &dyn RandomSource) -> Result<Self> {
        let identity = Identity::generate(random)?;
        info!("Created issuer {} ({})", identity.id(), name);
        Ok(Self::new(
            identity,
            IssuerProfile {
                url: url.to_string(),
                name: name.to_string(),
            },
        ))
    }

    pub fn id(&self) -> &str {
        self.identity.id()
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn profile(&self) -> &IssuerProfile {
        &self.profile
    }

    /// The issuer's directory entry, advertising its URL as service endpoint.
    pub fn document(&self) -> DIDDocument {
        self.identity.document(Some(self.profile.url.clone()))
    }

    /// Signs a claim about `subject_id`.
    ///
    /// # Errors
    /// - `CredentialError::InvalidInput` if `subject_id` is empty, the claim has no
    ///   attributes or an unnamed one, or the claim is already bound to another subject
    /// - `CredentialError::Signing` if the signature cannot be produced
    pub fn sign_credential(&self, claim: Claim, subject_id: &str) -> Result<Credential> {
        if subject_id.is_empty() {
            return Err(CredentialError::InvalidInput("subject id must not be empty".to_string()));
        }
        if claim.attributes.is_empty() {
            return Err(CredentialError::InvalidInput("claim has no attributes".to_string()));
        }
        if claim.attributes.keys().any(|name| name.is_empty()) {
            return Err(CredentialError::InvalidInput("claim attribute names must not be empty".to_string()));
        }
        if claim.is_bound() && claim.subject_id != subject_id {
            return Err(CredentialError::InvalidInput(format!(
                "claim is about {}, not {}",
                claim.subject_id, subject_id
            )));
        }

        let mut claim = claim;
        claim.subject_id = subject_id.to_string();
        let issuance_date = Utc::now().trunc_subsecs(0);

        let input = credential_signing_input(&claim, self.id(), &self.profile, &issuance_date, subject_id)?;
        debug!("Signing {} bytes of credential payload for {}", input.len(), subject_id);
        let signature = self
            .identity
            .sign(&input)
            .map_err(|e| CredentialError::Signing(format!("issuer could not sign credential: {}", e)))?;

        let credential = Credential {
            id: credential_id(&input),
            claim,
            issuer_id: self.id().to_string(),
            issuer: self.profile.clone(),
            issuance_date,
            signature,
        };
        info!("Issuer {} issued {} to {}", self.id(), credential.id, subject_id);
        Ok(credential)
    }
}
