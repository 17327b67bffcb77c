//! Decoded Token Claims
//!
//! Claims are the payload of a verified token: a mapping from claim name to a
//! JSON value. The closed `serde_json::Value` variant set (string, number,
//! bool, array, object) is the value type, so arbitrary issuer-defined claims
//! round-trip without an open-ended dynamic type.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Decoded claims of a verified token
///
/// A thin wrapper over a JSON object. Standard claims (`sub`, `aud`, `exp`)
/// get typed accessors; everything else is reachable through [`Claims::get`].
///
/// ## Design Notes
///
/// - Serializes transparently as a bare JSON object, which is exactly the
///   shape `jsonwebtoken` decodes a token payload into
/// - Cloneable so middleware can store claims per identity slot without
///   re-parsing the token
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claims(Map<String, Value>);

impl Claims {
    /// Create an empty claims object
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Insert a claim, returning the previous value if one existed
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(name.into(), value.into())
    }

    /// Look up a claim by name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// The `sub` claim, when present and a string
    pub fn subject(&self) -> Option<&str> {
        self.get("sub").and_then(Value::as_str)
    }

    /// The `aud` claim, when present and a string
    pub fn audience(&self) -> Option<&str> {
        self.get("aud").and_then(Value::as_str)
    }

    /// The `exp` claim as a Unix timestamp, when present
    pub fn expires_at(&self) -> Option<i64> {
        self.get("exp").and_then(Value::as_i64)
    }

    /// Check that a claim is present and equal to the expected value
    ///
    /// This is the predicate primitive the enforcer builds on: an absent
    /// claim never matches.
    pub fn matches(&self, name: &str, expected: &Value) -> bool {
        self.get(name) == Some(expected)
    }

    /// Number of claims
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the claims object is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Value)> for Claims {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
