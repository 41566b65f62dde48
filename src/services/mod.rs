// src/services/mod.rs
//! Issuer, verifier and the key directory they share.

pub mod credential_issuer;
pub mod directory;
pub mod verifier;
