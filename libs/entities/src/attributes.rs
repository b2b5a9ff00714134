//! Attribute storage
//!
//! The minimal attribute bag the container API needs. Richer typed
//! attribute facades and type-tagged views live outside the kernel.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A single attribute value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Bool(value) => write!(f, "{value}"),
            AttributeValue::Int(value) => write!(f, "{value}"),
            AttributeValue::Float(value) => write!(f, "{value}"),
            AttributeValue::Text(value) => f.write_str(value),
        }
    }
}

/// Concurrent named attribute storage for one entity
#[derive(Debug, Default)]
pub struct AttributeBag {
    values: RwLock<HashMap<String, AttributeValue>>,
}

impl AttributeBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an attribute, returning the previous value if any
    pub fn set(&self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Option<AttributeValue> {
        self.values.write().insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<AttributeValue> {
        self.values.read().get(name).cloned()
    }

    pub fn remove(&self, name: &str) -> Option<AttributeValue> {
        self.values.write().remove(name)
    }

    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.values.read().keys().cloned().collect()
    }

    /// Point-in-time copy of every attribute
    pub fn snapshot(&self) -> HashMap<String, AttributeValue> {
        self.values.read().clone()
    }
}

impl From<HashMap<String, AttributeValue>> for AttributeBag {
    fn from(values: HashMap<String, AttributeValue>) -> Self {
        Self {
            values: RwLock::new(values),
        }
    }
}

impl FromIterator<(String, AttributeValue)> for AttributeBag {
    fn from_iter<I: IntoIterator<Item = (String, AttributeValue)>>(iter: I) -> Self {
        Self::from(iter.into_iter().collect::<HashMap<_, _>>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_remove() {
        let bag = AttributeBag::new();
        assert!(bag.is_empty());

        assert_eq!(bag.set("health", 100i64), None);
        assert_eq!(bag.set("health", 75i64), Some(AttributeValue::Int(100)));
        assert_eq!(bag.get("health"), Some(AttributeValue::Int(75)));
        assert_eq!(bag.len(), 1);

        assert_eq!(bag.remove("health"), Some(AttributeValue::Int(75)));
        assert_eq!(bag.get("health"), None);
    }

    #[test]
    fn values_serialize_transparently() {
        let value = AttributeValue::from("ready");
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, "\"ready\"");

        let back: AttributeValue = serde_json::from_str("42").unwrap();
        assert_eq!(back, AttributeValue::Int(42));
    }

    #[test]
    fn snapshot_is_detached() {
        let bag = AttributeBag::new();
        bag.set("name", "alpha");

        let snapshot = bag.snapshot();
        bag.set("name", "beta");

        assert_eq!(snapshot.get("name"), Some(&AttributeValue::Text("alpha".into())));
        assert_eq!(bag.get("name"), Some(AttributeValue::Text("beta".into())));
    }
}
