use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

use crate::error::{StoreError, StoreResult};

/// An ordered `key → value` map.
///
/// Used for a store's initial state, whole-state reads and writes, and the
/// contents of an [`Entity`](crate::Entity). Keys keep their first insertion
/// position; inserting an existing key replaces its value in place.
#[derive(Debug, Clone, PartialEq)]
pub struct Record<V> {
    fields: Vec<(String, V)>,
}

impl<V> Record<V> {
    /// Create an empty record.
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, key: impl Into<String>, value: V) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace a field, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: V) -> Option<V> {
        let key = key.into();
        match self.get_mut(&key) {
            Some(slot) => Some(std::mem::replace(slot, value)),
            None => {
                self.fields.push((key, value));
                None
            }
        }
    }

    /// Value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&V> {
        self.fields
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }

    /// Mutable value stored under `key`.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        self.fields
            .iter_mut()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }

    /// Remove a field, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<V> {
        let index = self.fields.iter().position(|(name, _)| name == key)?;
        Some(self.fields.remove(index).1)
    }

    /// Whether `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> + '_ {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True if the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Record<Value> {
    /// Build a record from the fields of a JSON object.
    pub fn from_json(value: Value) -> StoreResult<Self> {
        match value {
            Value::Object(map) => Ok(map.into_iter().collect()),
            other => Err(StoreError::NotAnObject {
                found: json_type(&other),
            }),
        }
    }

    /// Convert into a JSON object.
    pub fn into_json(self) -> Value {
        Value::Object(self.fields.into_iter().collect())
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl<V> Default for Record<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for Record<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (key, value) in iter {
            record.insert(key, value);
        }
        record
    }
}

impl<V> IntoIterator for Record<V> {
    type Item = (String, V);
    type IntoIter = std::vec::IntoIter<(String, V)>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl<V: Serialize> Serialize for Record<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn insert_replaces_in_place() {
        let mut record = Record::new().with("a", 1).with("b", 2);
        assert_eq!(record.insert("a", 10), Some(1));
        assert_eq!(record.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(record.get("a"), Some(&10));
        assert_eq!(record.remove("a"), Some(10));
        assert!(!record.contains_key("a"));
    }

    #[test]
    fn from_json_requires_object() {
        let record = Record::from_json(json!({ "count": 1, "name": "x" })).unwrap();
        assert_eq!(record.get("count"), Some(&json!(1)));

        let err = Record::from_json(json!([1, 2])).unwrap_err();
        assert_eq!(err, StoreError::NotAnObject { found: "array" });
    }

    #[test]
    fn serializes_as_map() {
        let record = Record::new().with("b", 2).with("a", 1);
        let text = serde_json::to_string(&record).unwrap();
        assert_eq!(text, r#"{"b":2,"a":1}"#);
    }
}
