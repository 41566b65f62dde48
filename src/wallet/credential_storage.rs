// src/wallet/credential_storage.rs
//! Credential storage for the subject's wallet.
//!
//! An in-memory map of credentials keyed by credential ID. Nothing is persisted;
//! credentials live as long as the subject does.

use crate::models::credential::Credential;
use std::collections::HashMap;

/// In-memory storage for held credentials.
///
/// Not synchronized on its own; [`crate::wallet::subject::Subject`] wraps it in a mutex.
#[derive(Default)]
pub struct CredentialStorage {
    credentials: HashMap<String, Credential>,
}

impl CredentialStorage {
    pub fn new() -> Self {
        CredentialStorage {
            credentials: HashMap::new(),
        }
    }

    /// Stores a credential under its own ID.
    ///
    /// # Behavior
    /// - Overwrites an existing credential with the same ID
    /// - Does not validate the credential; callers check signatures first
    pub fn store_credential(&mut self, credential: Credential) {
        self.credentials.insert(credential.id.clone(), credential);
    }

    pub fn get_credential(&self, id: &str) -> Option<&Credential> {
        self.credentials.get(id)
    }

    pub fn count_credentials(&self) -> usize {
        self.credentials.len()
    }

    pub fn contains_credential(&self, id: &str) -> bool {
        self.credentials.contains_key(id)
    }

    /// Removes a credential by ID.
    ///
    /// # Returns
    /// `true` if the credential was present and removed, `false` otherwise.
    pub fn remove_credential(&mut self, id: &str) -> bool {
        self.credentials.remove(id).is_some()
    }

    /// IDs of all stored credentials, sorted.
    pub fn credential_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.credentials.keys().cloned().collect();
        ids.sort();
        ids
    }
}
