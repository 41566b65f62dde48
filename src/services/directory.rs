// src/services/directory.rs
//! Public key directory.
//!
//! Verifiers only ever see identity IDs inside credentials and presentations. The
//! directory maps those IDs to published [`DIDDocument`]s so the matching public keys
//! can be looked up. A document is accepted only if its ID re-derives from its key,
//! so an entry cannot claim someone else's identifier.

use crate::error::Result;
use crate::models::did::DIDDocument;
use crate::wallet::key_management::Identity;
use k256::PublicKey;
use log::{debug, info};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Thread-safe registry of identity documents, shared via `Arc`.
#[derive(Default)]
pub struct KeyDirectory {
    documents: RwLock<HashMap<String, DIDDocument>>,
}

impl KeyDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a document after checking that its ID matches its public key.
    ///
    /// Re-registering an ID replaces the service endpoint; the key cannot change
    /// because the ID is derived from it.
    ///
    /// # Errors
    /// `CredentialError::InvalidInput` for malformed keys or mismatched IDs.
    pub fn register(&self, document: DIDDocument) -> Result<()> {
        document.public_key()?;
        info!("Registered identity {} in key directory", document.id);
        let mut documents = self.documents.write().unwrap_or_else(PoisonError::into_inner);
        documents.insert(document.id.clone(), document);
        Ok(())
    }

    /// Publishes an identity's own document.
    pub fn publish(&self, identity: &Identity, service_endpoint: Option<String>) -> Result<()> {
        self.register(identity.document(service_endpoint))
    }

    pub fn resolve(&self, id: &str) -> Option<DIDDocument> {
        let documents = self.documents.read().unwrap_or_else(PoisonError::into_inner);
        documents.get(id).cloned()
    }

    /// Looks up the public key published for `id`.
    pub fn public_key(&self, id: &str) -> Option<PublicKey> {
        let key = self.resolve(id).and_then(|document| document.public_key().ok());
        if key.is_none() {
            debug!("No usable key published for {}", id);
        }
        key
    }

    pub fn contains(&self, id: &str) -> bool {
        let documents = self.documents.read().unwrap_or_else(PoisonError::into_inner);
        documents.contains_key(id)
    }

    pub fn len(&self) -> usize {
        let documents = self.documents.read().unwrap_or_else(PoisonError::into_inner);
        documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
