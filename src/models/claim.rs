// src/models/claim.rs
//! Claim data model.
//!
//! A claim is the set of attested facts about a subject that issuer and subject agreed
//! on before signing. Attributes live in a `BTreeMap` so their order is fixed by name,
//! and values are restricted to types with exactly one JSON rendering.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single attribute value.
///
/// Floats are deliberately absent: their textual form is not stable enough to sign.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Integer(i64),
    Text(String),
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Integer(value)
    }
}

impl From<u32> for AttributeValue {
    fn from(value: u32) -> Self {
        AttributeValue::Integer(i64::from(value))
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Text(value)
    }
}

/// Structured set of facts about a subject.
///
/// # Fields
/// - `subject_id`: ID of the subject the claim is about. Left empty while the claim is
///   being negotiated; the issuer fills it in when signing.
/// - `attributes`: named facts, e.g. `age`, `university_name`, `degree`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Claim {
    #[serde(default)]
    pub subject_id: String,
    pub attributes: BTreeMap<String, AttributeValue>,
}

impl Claim {
    /// Creates an empty claim not yet bound to a subject.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) an attribute, builder style.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    pub fn is_bound(&self) -> bool {
        !self.subject_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_orders_attributes_by_name() {
        let claim = Claim::new()
            .with("university_name", "Oxford")
            .with("age", 24u32)
            .with("degree", "Bachelor of Science");

        let names: Vec<&str> = claim.attributes.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["age", "degree", "university_name"]);
        assert_eq!(claim.get("age"), Some(&AttributeValue::Integer(24)));
        assert!(!claim.is_bound());
    }

    #[test]
    fn test_attribute_values_are_plain_json() {
        let claim = Claim::new().with("age", 24u32).with("graduated", true).with("degree", "BSc");
        let json = serde_json::to_value(&claim).unwrap();
        assert_eq!(json["attributes"]["age"], 24);
        assert_eq!(json["attributes"]["graduated"], true);
        assert_eq!(json["attributes"]["degree"], "BSc");

        let back: Claim = serde_json::from_value(json).unwrap();
        assert_eq!(back, claim);
    }
}
