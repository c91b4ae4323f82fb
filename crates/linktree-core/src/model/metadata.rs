use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metadata attached to a child record
///
/// Arbitrary key/value pairs (units, display hints, ranges) stored as JSON
/// values. Keys are kept sorted so encoded metadata is deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Metadata {
    data: BTreeMap<String, serde_json::Value>,
}

impl Metadata {
    /// Create a new empty Metadata instance
    pub fn new() -> Self {
        Self {
            data: BTreeMap::new(),
        }
    }

    /// Get a value by key
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }

    /// Set a value by key, returning the previous value
    pub fn set(
        &mut self,
        key: impl Into<String>,
        value: serde_json::Value,
    ) -> Option<serde_json::Value> {
        self.data.insert(key.into(), value)
    }

    /// Remove a value by key
    pub fn remove(&mut self, key: &str) -> Option<serde_json::Value> {
        self.data.remove(key)
    }

    /// Check if a key exists
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Get all keys in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.data.keys()
    }

    /// Get the number of metadata entries
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if metadata is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl From<BTreeMap<String, serde_json::Value>> for Metadata {
    fn from(data: BTreeMap<String, serde_json::Value>) -> Self {
        Self { data }
    }
}

impl<K: Into<String>> FromIterator<(K, serde_json::Value)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (K, serde_json::Value)>>(iter: I) -> Self {
        Self {
            data: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_returns_previous() {
        let mut meta = Metadata::new();
        assert!(meta.set("unit", json!("C")).is_none());
        assert_eq!(meta.set("unit", json!("F")), Some(json!("C")));
        assert_eq!(meta.len(), 1);
    }

    #[test]
    fn test_serializes_as_sorted_object() {
        let meta: Metadata = [("b", json!(2)), ("a", json!(1))].into_iter().collect();
        assert_eq!(serde_json::to_string(&meta).unwrap(), r#"{"a":1,"b":2}"#);
    }
}
