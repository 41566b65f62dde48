// src/services/verifier.rs
//! Presentation verification service.
//!
//! The verifier issues single-use nonces and checks presentations against them. Every
//! nonce moves through `Issued → Presented → Verified | Rejected`; the move out of
//! `Issued` happens under the registry lock, so of several concurrent attempts with the
//! same nonce exactly one gets to run the cryptographic checks and the others observe
//! `nonce-replayed`.

use crate::config::VerifierSettings;
use crate::error::{CredentialError, Result, VerificationFailure};
use crate::models::presentation::{ExchangeState, Nonce, Presentation, NONCE_LEN};
use crate::services::credential_issuer::verify_credential;
use crate::services::directory::KeyDirectory;
use crate::utils::crypto::{verify_message, RandomSource};
use crate::utils::serialization::presentation_signing_input;
use chrono::{DateTime, Duration, Utc};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// `make_nonce` sweeps expired entries each time the registry grows by this many.
const PURGE_INTERVAL: usize = 256;

type Registry = HashMap<Vec<u8>, NonceRecord>;

struct NonceRecord {
    issued_at: DateTime<Utc>,
    state: ExchangeState,
}

/// Issues nonces and verifies presentations.
///
/// Shares the key directory with the other parties through `Arc`; the nonce registry is
/// owned and lives as long as the verifier.
pub struct Verifier {
    directory: Arc<KeyDirectory>,
    random: Arc<dyn RandomSource>,
    nonce_ttl: Option<Duration>,
    registry: Mutex<Registry>,
}

impl Verifier {
    /// Constructs a verifier.
    ///
    /// # Arguments
    /// * `directory` - where subject and issuer public keys are looked up
    /// * `random` - secure random source for nonces
    /// * `nonce_ttl` - how long an issued nonce stays presentable; `None` for no limit
    pub fn new(directory: Arc<KeyDirectory>, random: Arc<dyn RandomSource>, nonce_ttl: Option<Duration>) -> Self {
        Self {
            directory,
            random,
            nonce_ttl,
            registry: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_settings(
        settings: &VerifierSettings,
        directory: Arc<KeyDirectory>,
        random: Arc<dyn RandomSource>,
    ) -> Self {
        Self::new(directory, random, settings.nonce_ttl())
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Issues a fresh nonce for one verification session.
    ///
    /// Every `PURGE_INTERVAL` registry entries, expired nonces are swept first.
    ///
    /// # Errors
    /// `CredentialError::RandomSource` if the random source fails, or if it repeats a
    /// value that is still registered.
    pub fn make_nonce(&self) -> Result<Nonce> {
        let mut value = vec![0u8; NONCE_LEN];
        self.random
            .fill(&mut value)
            .map_err(|e| CredentialError::RandomSource(e.to_string()))?;
        let nonce = Nonce {
            value,
            issued_at: Utc::now(),
        };

        let mut registry = self.registry();
        if !registry.is_empty() && registry.len() % PURGE_INTERVAL == 0 {
            self.purge_locked(&mut registry, nonce.issued_at);
        }
        if registry.contains_key(&nonce.value) {
            return Err(CredentialError::RandomSource(
                "random source repeated a registered nonce".to_string(),
            ));
        }
        registry.insert(
            nonce.value.clone(),
            NonceRecord {
                issued_at: nonce.issued_at,
                state: ExchangeState::Issued,
            },
        );
        debug!("Issued nonce {}", base64::encode(&nonce.value));
        Ok(nonce)
    }

    /// Verifies a presentation against the nonce it carries.
    ///
    /// Runs, in order: the nonce check (issued here, not yet presented, not expired),
    /// the subject's signature over the presentation, and the issuer's signature over
    /// the embedded credential. The nonce is consumed by the first attempt that reaches
    /// the signature checks, whatever their outcome.
    ///
    /// The nonce goes first so that claiming it and racing replays are settled under
    /// one lock; a presentation failing several checks reports the nonce reason.
    ///
    /// # Errors
    /// `CredentialError::Verification` with the reason of the first failing check.
    pub fn verify_presentation(&self, presentation: &Presentation) -> Result<()> {
        self.claim_nonce(&presentation.nonce).map_err(|e| {
            warn!("Rejected presentation from {}: {}", presentation.subject_id, e);
            e
        })?;

        let outcome = self.check_signatures(presentation);
        let state = match &outcome {
            Ok(()) => ExchangeState::Verified,
            Err(e) => ExchangeState::Rejected(
                e.verification_reason()
                    .unwrap_or(VerificationFailure::SignatureInvalid),
            ),
        };
        if let Some(record) = self.registry().get_mut(&presentation.nonce.value) {
            record.state = state;
        }

        match &outcome {
            Ok(()) => info!(
                "Verified presentation of {} by {}",
                presentation.credential.id, presentation.subject_id
            ),
            Err(e) => warn!("Rejected presentation from {}: {}", presentation.subject_id, e),
        }
        outcome
    }

    fn claim_nonce(&self, nonce: &Nonce) -> Result<()> {
        let now = Utc::now();
        let mut registry = self.registry();
        let record = match registry.get_mut(&nonce.value) {
            Some(record) => record,
            // with a TTL set, an unknown nonce older than it was issued here and purged
            None if self.is_expired(nonce.issued_at, now) => {
                return Err(CredentialError::verification(
                    VerificationFailure::NonceReplayed,
                    "nonce was already presented and has since been purged",
                ))
            }
            None => {
                return Err(CredentialError::verification(
                    VerificationFailure::NonceMismatch,
                    "nonce was not issued by this verifier",
                ))
            }
        };
        if record.issued_at != nonce.issued_at {
            return Err(CredentialError::verification(
                VerificationFailure::NonceMismatch,
                "nonce timestamp does not match the issued nonce",
            ));
        }
        if record.state != ExchangeState::Issued {
            return Err(CredentialError::verification(
                VerificationFailure::NonceReplayed,
                "nonce was already presented",
            ));
        }
        if self.is_expired(record.issued_at, now) {
            record.state = ExchangeState::Rejected(VerificationFailure::NonceExpired);
            return Err(CredentialError::verification(
                VerificationFailure::NonceExpired,
                format!("nonce issued at {} has expired", record.issued_at),
            ));
        }
        record.state = ExchangeState::Presented;
        Ok(())
    }

    fn check_signatures(&self, presentation: &Presentation) -> Result<()> {
        let subject_id = presentation.subject_id.as_str();
        let input = presentation_signing_input(&presentation.credential, &presentation.nonce, subject_id)
            .map_err(|e| {
                CredentialError::verification(VerificationFailure::SignatureInvalid, e.to_string())
            })?;

        let subject_key = self.directory.public_key(subject_id).ok_or_else(|| {
            CredentialError::verification(
                VerificationFailure::SignatureInvalid,
                format!("subject {} is not published", subject_id),
            )
        })?;
        if !verify_message(&subject_key, input.as_bytes(), &presentation.signature) {
            return Err(CredentialError::verification(
                VerificationFailure::SignatureInvalid,
                format!("presentation signature does not verify for {}", subject_id),
            ));
        }
        debug!("Presentation signature by {} verified", subject_id);

        let credential = &presentation.credential;
        if credential.subject_id() != subject_id {
            return Err(CredentialError::verification(
                VerificationFailure::CredentialInvalid,
                format!("credential {} was not issued to {}", credential.id, subject_id),
            ));
        }
        let issuer_key = self.directory.public_key(&credential.issuer_id).ok_or_else(|| {
            CredentialError::verification(
                VerificationFailure::CredentialInvalid,
                format!("issuer {} is not published", credential.issuer_id),
            )
        })?;
        verify_credential(credential, &issuer_key)
    }

    fn is_expired(&self, issued_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        self.nonce_ttl.map_or(false, |ttl| now - issued_at >= ttl)
    }

    /// Where the exchange for `nonce` stands, if this verifier still tracks it.
    pub fn exchange_state(&self, nonce: &Nonce) -> Option<ExchangeState> {
        self.registry().get(&nonce.value).map(|record| record.state)
    }

    /// Number of nonces issued but not yet presented.
    pub fn outstanding_nonces(&self) -> usize {
        self.registry()
            .values()
            .filter(|record| record.state == ExchangeState::Issued)
            .count()
    }

    /// Forgets expired nonces, except those whose presentation is being checked.
    ///
    /// A purged nonce that is presented later is rejected as `nonce-replayed`.
    /// Returns the number of entries removed.
    pub fn purge_expired(&self) -> usize {
        let mut registry = self.registry();
        self.purge_locked(&mut registry, Utc::now())
    }

    fn purge_locked(&self, registry: &mut Registry, now: DateTime<Utc>) -> usize {
        if self.nonce_ttl.is_none() {
            return 0;
        }
        let before = registry.len();
        registry.retain(|_, record| {
            record.state == ExchangeState::Presented || !self.is_expired(record.issued_at, now)
        });
        let purged = before - registry.len();
        if purged > 0 {
            debug!("Purged {} expired nonces", purged);
        }
        purged
    }
}
