//! Resource - Representing resources, their attribute values and state

use std::collections::HashMap;

/// Unique identifier for a resource instance known to the host
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceId {
    /// Resource type (e.g., "socket", "policy_attachment")
    pub resource_type: String,
    /// Identifier assigned by the platform, if any
    pub identifier: Option<String>,
}

impl ResourceId {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            identifier: None,
        }
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.identifier {
            Some(identifier) => write!(f, "{}.{}", self.resource_type, identifier),
            None => write!(f, "{}", self.resource_type),
        }
    }
}

/// Attribute value of a resource
#[derive(Debug, Clone)]
pub enum Value {
    String(String),
    Int(i64),
    Bool(bool),
    List(Vec<Value>),
    /// Unordered collection; equality ignores element order and duplicates
    Set(Vec<Value>),
    Map(HashMap<String, Value>),
}

impl Value {
    /// Build a set of strings
    pub fn string_set<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Value::Set(items.into_iter().map(|s| Value::String(s.into())).collect())
    }

    /// Build a list of strings
    pub fn string_list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Value::List(items.into_iter().map(|s| Value::String(s.into())).collect())
    }

    /// Build a map of strings
    pub fn string_map<I, K, V>(items: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Value::Map(
            items
                .into_iter()
                .map(|(k, v)| (k.into(), Value::String(v.into())))
                .collect(),
        )
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Whether this value carries nothing worth storing
    /// (empty string, empty collection)
    pub fn is_empty(&self) -> bool {
        match self {
            Value::String(s) => s.is_empty(),
            Value::List(items) | Value::Set(items) => items.is_empty(),
            Value::Map(map) => map.is_empty(),
            Value::Int(_) | Value::Bool(_) => false,
        }
    }

    /// Copy with empty values dropped at every depth
    ///
    /// Map entries and collection items that carry nothing are removed;
    /// `None` when nothing is left at all.
    pub fn normalized(&self) -> Option<Value> {
        let value = match self {
            Value::List(items) => Value::List(items.iter().filter_map(Value::normalized).collect()),
            Value::Set(items) => Value::Set(items.iter().filter_map(Value::normalized).collect()),
            Value::Map(map) => Value::Map(
                map.iter()
                    .filter_map(|(k, v)| v.normalized().map(|v| (k.clone(), v)))
                    .collect(),
            ),
            other => other.clone(),
        };
        (!value.is_empty()).then_some(value)
    }

    pub(crate) fn type_name(&self) -> String {
        match self {
            Value::String(_) => "String".to_string(),
            Value::Int(_) => "Int".to_string(),
            Value::Bool(_) => "Bool".to_string(),
            Value::List(_) => "List".to_string(),
            Value::Set(_) => "Set".to_string(),
            Value::Map(_) => "Map".to_string(),
        }
    }

    /// Convert to a JSON value for the host boundary
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::List(items) | Value::Set(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Map(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            // duplicates collapse, as in any set
            (Value::Set(a), Value::Set(b)) => {
                a.iter().all(|x| b.contains(x)) && b.iter().all(|x| a.contains(x))
            }
            (Value::Map(a), Value::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::String(s.clone())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<u16> for Value {
    fn from(i: u16) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// Desired configuration declared by the host
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub resource_type: String,
    pub attributes: HashMap<String, Value>,
}

impl Resource {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            attributes: HashMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// State stored by the host for one resource
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    pub resource_type: String,
    /// Platform identifier (opaque id, name, or composite id)
    pub identifier: Option<String>,
    pub attributes: HashMap<String, Value>,
}

impl State {
    pub fn not_found(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            identifier: None,
            attributes: HashMap::new(),
        }
    }

    pub fn existing(resource_type: impl Into<String>, attributes: HashMap<String, Value>) -> Self {
        Self {
            resource_type: resource_type.into(),
            identifier: None,
            attributes,
        }
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    /// Whether this state refers to a live resource
    pub fn exists(&self) -> bool {
        self.identifier.as_deref().is_some_and(|id| !id.is_empty())
    }

    pub fn id(&self) -> ResourceId {
        let id = ResourceId::new(self.resource_type.clone());
        match &self.identifier {
            Some(identifier) => id.with_identifier(identifier.clone()),
            None => id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sets_compare_without_order() {
        let a = Value::string_set(["b", "a"]);
        let b = Value::string_set(["a", "b"]);
        assert_eq!(a, b);
        assert_ne!(a, Value::string_set(["a"]));
        assert_ne!(Value::string_list(["b", "a"]), Value::string_list(["a", "b"]));
    }

    #[test]
    fn set_duplicates_collapse() {
        let aab = Value::string_set(["a", "a", "b"]);
        assert_eq!(aab, Value::string_set(["a", "b"]));
        assert_eq!(aab, Value::string_set(["b", "b", "a"]));
        assert_ne!(aab, Value::string_set(["a", "c"]));
        assert_ne!(aab, Value::string_set(["a", "b", "c"]));
    }

    #[test]
    fn normalized_drops_nested_empties() {
        let mut block = HashMap::new();
        block.insert("hostname".to_string(), Value::from("h"));
        block.insert("tags".to_string(), Value::Set(vec![]));
        block.insert("description".to_string(), Value::from(""));
        let value = Value::List(vec![Value::Map(block)]);

        let mut expected = HashMap::new();
        expected.insert("hostname".to_string(), Value::from("h"));
        assert_eq!(
            value.normalized(),
            Some(Value::List(vec![Value::Map(expected)]))
        );

        let mut hollow = HashMap::new();
        hollow.insert("tags".to_string(), Value::List(vec![]));
        assert_eq!(Value::List(vec![Value::Map(hollow)]).normalized(), None);
        assert_eq!(Value::Bool(false).normalized(), Some(Value::Bool(false)));
    }

    #[test]
    fn state_existence_follows_identifier() {
        assert!(!State::not_found("connector").exists());
        assert!(State::not_found("connector").with_identifier("c1").exists());
        assert!(!State::not_found("connector").with_identifier("").exists());
    }

    #[test]
    fn value_to_json() {
        let mut map = HashMap::new();
        map.insert("port".to_string(), Value::Int(22));
        let json = Value::List(vec![Value::Map(map)]).to_json();
        assert_eq!(json, serde_json::json!([{"port": 22}]));
    }
}
