// src/wallet/mod.rs
//! Key material and the subject's credential wallet.

pub mod credential_storage;
pub mod key_management;
pub mod subject;
