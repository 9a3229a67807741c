//! Records: schemaless JSON objects stored in collections.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CoreError;

/// Field holding a keyed record's identifier.
pub const ID_FIELD: &str = "id";

/// Field used for credential and password-reset lookups.
pub const EMAIL_FIELD: &str = "email";

/// Field holding a member's secret. Never returned from credential checks.
pub const SECRET_FIELD: &str = "password";

/// A single record: a JSON object.
///
/// Keyed records carry a string [`ID_FIELD`]; singleton documents have none.
/// `Clone` is a full structural deep copy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Build a record from a JSON value, which must be an object.
    pub fn from_value(value: Value) -> Result<Self, CoreError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(CoreError::NotAnObject(kind_of(&other).to_string())),
        }
    }

    /// The record's id, if it has a string id.
    pub fn id(&self) -> Option<&str> {
        self.get_str(ID_FIELD)
    }

    /// Set the record's id.
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.0.insert(ID_FIELD.to_string(), Value::String(id.into()));
    }

    /// Look up a field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Look up a string field.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Set a field, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Remove a field.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Shallow merge: every top-level field of `patch` overwrites ours.
    pub fn merge(&mut self, patch: &Record) {
        for (key, value) in &patch.0 {
            self.0.insert(key.clone(), value.clone());
        }
    }

    /// Copy of this record without `key`.
    pub fn without(&self, key: &str) -> Record {
        let mut copy = self.clone();
        copy.0.remove(key);
        copy
    }

    /// Whether the record's email matches, ignoring ASCII case.
    pub fn email_matches(&self, email: &str) -> bool {
        self.get_str(EMAIL_FIELD)
            .map(|own| own.eq_ignore_ascii_case(email.trim()))
            .unwrap_or(false)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrow the underlying map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Convert into a JSON value.
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for Record {
    type Error = CoreError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        record.into_value()
    }
}

/// Generate a fresh record id with the given prefix, e.g. `news-3fa2c01b9d7e`.
pub fn generate_id(prefix: &str) -> String {
    let bytes: [u8; 6] = rand::random();
    format!("{}-{}", prefix, hex::encode(bytes))
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_rejects_non_objects() {
        assert!(Record::from_value(json!([1, 2])).is_err());
        assert!(Record::from_value(json!("x")).is_err());
        assert!(Record::from_value(json!({"a": 1})).is_ok());
    }

    #[test]
    fn test_merge_is_shallow() {
        let mut base = Record::from_value(json!({
            "id": "n1",
            "title": "Old",
            "meta": {"a": 1, "b": 2}
        }))
        .unwrap();
        let patch = Record::from_value(json!({"title": "New", "meta": {"a": 9}})).unwrap();

        base.merge(&patch);

        assert_eq!(base.get_str("title"), Some("New"));
        // Nested objects are replaced, not merged.
        assert_eq!(base.get("meta"), Some(&json!({"a": 9})));
        assert_eq!(base.id(), Some("n1"));
    }

    #[test]
    fn test_email_matches_ignores_case() {
        let record = Record::from_value(json!({"email": "a@test.com"})).unwrap();
        assert!(record.email_matches("A@Test.COM"));
        assert!(!record.email_matches("b@test.com"));
    }

    #[test]
    fn test_generate_id_unique() {
        let a = generate_id("m");
        let b = generate_id("m");
        assert!(a.starts_with("m-"));
        assert_ne!(a, b);
    }
}
