// src/models/mod.rs
//! Data structures exchanged between issuer, subject and verifier.

pub mod claim;
pub mod credential;
pub mod did;
pub mod presentation;
