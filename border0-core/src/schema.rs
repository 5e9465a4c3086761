//! Schema - Define type schemas for resources and data sources
//!
//! Providers define schemas for each resource type, enabling type validation
//! before any API call, schema-guided decoding of host values, and planning
//! (ForceNew, computed values, defaults, diff suppression).

use std::collections::HashMap;
use std::fmt;

use crate::resource::Value;

/// Decides whether two values of an attribute are semantically equal
pub type DiffSuppressFn = fn(old: &Value, new: &Value) -> bool;

/// Attribute type
#[derive(Debug, Clone)]
pub enum AttributeType {
    /// String
    String,
    /// Integer
    Int,
    /// Boolean
    Bool,
    /// Enum (list of allowed values)
    Enum(Vec<String>),
    /// Custom type (with validation function)
    Custom {
        name: String,
        base: Box<AttributeType>,
        validate: fn(&Value) -> Result<(), String>,
    },
    /// Ordered list
    List(Box<AttributeType>),
    /// Unordered set
    Set(Box<AttributeType>),
    /// Map with string keys
    Map(Box<AttributeType>),
    /// Nested block, stored as a list of maps
    Block(Box<BlockSchema>),
}

impl AttributeType {
    /// Enum from a list of string literals
    pub fn enumeration(variants: &[&str]) -> Self {
        AttributeType::Enum(variants.iter().map(|v| v.to_string()).collect())
    }

    pub fn string_list() -> Self {
        AttributeType::List(Box::new(AttributeType::String))
    }

    pub fn string_set() -> Self {
        AttributeType::Set(Box::new(AttributeType::String))
    }

    pub fn string_map() -> Self {
        AttributeType::Map(Box::new(AttributeType::String))
    }

    /// Check if a value conforms to this type
    pub fn validate(&self, value: &Value) -> Result<(), TypeError> {
        match (self, value) {
            (AttributeType::String, Value::String(_)) => Ok(()),
            (AttributeType::Int, Value::Int(_)) => Ok(()),
            (AttributeType::Bool, Value::Bool(_)) => Ok(()),

            (AttributeType::Enum(variants), Value::String(s)) => {
                if variants.iter().any(|v| v == s) {
                    Ok(())
                } else {
                    Err(TypeError::InvalidEnumVariant {
                        value: s.clone(),
                        expected: variants.clone(),
                    })
                }
            }

            (AttributeType::Custom { validate, base, .. }, v) => {
                base.validate(v)?;
                validate(v).map_err(|msg| TypeError::ValidationFailed { message: msg })
            }

            (AttributeType::List(inner), Value::List(items))
            | (AttributeType::Set(inner), Value::Set(items)) => {
                for (i, item) in items.iter().enumerate() {
                    inner.validate(item).map_err(|e| TypeError::ListItemError {
                        index: i,
                        inner: Box::new(e),
                    })?;
                }
                Ok(())
            }

            (AttributeType::Map(inner), Value::Map(map)) => {
                for (k, v) in map {
                    inner.validate(v).map_err(|e| TypeError::MapValueError {
                        key: k.clone(),
                        inner: Box::new(e),
                    })?;
                }
                Ok(())
            }

            (AttributeType::Block(block), Value::List(items)) => {
                if let Some(max) = block.max_items
                    && items.len() > max
                {
                    return Err(TypeError::TooManyBlocks {
                        max,
                        got: items.len(),
                    });
                }
                for (i, item) in items.iter().enumerate() {
                    let Value::Map(attributes) = item else {
                        return Err(TypeError::ListItemError {
                            index: i,
                            inner: Box::new(TypeError::TypeMismatch {
                                expected: "Map".to_string(),
                                got: item.type_name(),
                            }),
                        });
                    };
                    let errors = validate_attributes(&block.attributes, attributes);
                    if let Some(first) = errors.into_iter().next() {
                        return Err(TypeError::ListItemError {
                            index: i,
                            inner: Box::new(first),
                        });
                    }
                }
                Ok(())
            }

            _ => Err(TypeError::TypeMismatch {
                expected: self.type_name(),
                got: value.type_name(),
            }),
        }
    }

    /// Decode a host JSON value into a typed Value
    ///
    /// Arrays become sets or lists depending on the schema, numbers become
    /// integers. Returns `Ok(None)` for JSON null.
    pub fn decode(&self, json: &serde_json::Value) -> Result<Option<Value>, TypeError> {
        use serde_json::Value as Json;

        if json.is_null() {
            return Ok(None);
        }

        let value = match (self, json) {
            (AttributeType::Custom { base, .. }, _) => return base.decode(json),
            (AttributeType::String | AttributeType::Enum(_), Json::String(s)) => {
                Value::String(s.clone())
            }
            (AttributeType::Int, Json::Number(n)) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => {
                    return Err(TypeError::TypeMismatch {
                        expected: "Int".to_string(),
                        got: n.to_string(),
                    });
                }
            },
            (AttributeType::Bool, Json::Bool(b)) => Value::Bool(*b),
            (AttributeType::List(inner), Json::Array(items)) => {
                Value::List(decode_items(inner, items)?)
            }
            (AttributeType::Set(inner), Json::Array(items)) => {
                Value::Set(decode_items(inner, items)?)
            }
            (AttributeType::Map(inner), Json::Object(map)) => {
                let mut decoded = HashMap::new();
                for (k, v) in map {
                    if let Some(v) = inner.decode(v).map_err(|e| TypeError::MapValueError {
                        key: k.clone(),
                        inner: Box::new(e),
                    })? {
                        decoded.insert(k.clone(), v);
                    }
                }
                Value::Map(decoded)
            }
            (AttributeType::Block(block), Json::Array(items)) => {
                let mut decoded = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    let map = decode_attributes(&block.attributes, item).map_err(|e| {
                        TypeError::ListItemError {
                            index: i,
                            inner: Box::new(e),
                        }
                    })?;
                    decoded.push(Value::Map(map));
                }
                Value::List(decoded)
            }
            // A single object is accepted for a block
            (AttributeType::Block(block), Json::Object(_)) => {
                Value::List(vec![Value::Map(decode_attributes(&block.attributes, json)?)])
            }
            _ => {
                return Err(TypeError::TypeMismatch {
                    expected: self.type_name(),
                    got: json_type_name(json).to_string(),
                });
            }
        };
        Ok(Some(value))
    }

    fn type_name(&self) -> String {
        match self {
            AttributeType::String => "String".to_string(),
            AttributeType::Int => "Int".to_string(),
            AttributeType::Bool => "Bool".to_string(),
            AttributeType::Enum(variants) => format!("Enum({})", variants.join(" | ")),
            AttributeType::Custom { name, .. } => name.clone(),
            AttributeType::List(inner) => format!("List<{}>", inner.type_name()),
            AttributeType::Set(inner) => format!("Set<{}>", inner.type_name()),
            AttributeType::Map(inner) => format!("Map<{}>", inner.type_name()),
            AttributeType::Block(_) => "Block".to_string(),
        }
    }

    /// Describe this type for the host schema
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::json;

        match self {
            AttributeType::String => json!("string"),
            AttributeType::Int => json!("number"),
            AttributeType::Bool => json!("bool"),
            AttributeType::Enum(variants) => json!({ "enum": variants }),
            AttributeType::Custom { base, .. } => base.to_json(),
            AttributeType::List(inner) => json!({ "list": inner.to_json() }),
            AttributeType::Set(inner) => json!({ "set": inner.to_json() }),
            AttributeType::Map(inner) => json!({ "map": inner.to_json() }),
            AttributeType::Block(block) => json!({ "block": block.to_json() }),
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

fn decode_items(
    inner: &AttributeType,
    items: &[serde_json::Value],
) -> Result<Vec<Value>, TypeError> {
    let mut decoded = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let value = inner.decode(item).map_err(|e| TypeError::ListItemError {
            index: i,
            inner: Box::new(e),
        })?;
        if let Some(value) = value {
            decoded.push(value);
        }
    }
    Ok(decoded)
}

fn json_type_name(json: &serde_json::Value) -> &'static str {
    match json {
        serde_json::Value::Null => "Null",
        serde_json::Value::Bool(_) => "Bool",
        serde_json::Value::Number(_) => "Number",
        serde_json::Value::String(_) => "String",
        serde_json::Value::Array(_) => "Array",
        serde_json::Value::Object(_) => "Object",
    }
}

/// Decode a JSON object into attributes using the given attribute schemas
pub fn decode_attributes(
    schemas: &HashMap<String, AttributeSchema>,
    json: &serde_json::Value,
) -> Result<HashMap<String, Value>, TypeError> {
    let object = json.as_object().ok_or_else(|| TypeError::TypeMismatch {
        expected: "Object".to_string(),
        got: json_type_name(json).to_string(),
    })?;

    let mut attributes = HashMap::new();
    for (name, raw) in object {
        let schema = schemas
            .get(name)
            .ok_or_else(|| TypeError::UnknownAttribute { name: name.clone() })?;
        let value = schema
            .attr_type
            .decode(raw)
            .map_err(|e| TypeError::AttributeError {
                name: name.clone(),
                inner: Box::new(e),
            })?;
        if let Some(value) = value {
            attributes.insert(name.clone(), value);
        }
    }
    Ok(attributes)
}

/// Encode attributes as a JSON object
pub fn encode_attributes(attributes: &HashMap<String, Value>) -> serde_json::Value {
    serde_json::Value::Object(
        attributes
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect(),
    )
}

/// Type error
#[derive(Debug, Clone, thiserror::Error)]
pub enum TypeError {
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    #[error("Invalid enum variant '{value}', expected one of: {}", expected.join(", "))]
    InvalidEnumVariant {
        value: String,
        expected: Vec<String>,
    },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Required attribute '{name}' is missing")]
    MissingRequired { name: String },

    #[error("Unknown attribute '{name}'")]
    UnknownAttribute { name: String },

    #[error("Attribute '{name}' is computed and cannot be set")]
    ComputedOnly { name: String },

    #[error("At most {max} block(s) allowed, got {got}")]
    TooManyBlocks { max: usize, got: usize },

    #[error("List item at index {index}: {inner}")]
    ListItemError { index: usize, inner: Box<TypeError> },

    #[error("Map value for key '{key}': {inner}")]
    MapValueError { key: String, inner: Box<TypeError> },

    #[error("Attribute '{name}': {inner}")]
    AttributeError { name: String, inner: Box<TypeError> },
}

/// Attribute schema
#[derive(Debug, Clone)]
pub struct AttributeSchema {
    pub name: String,
    pub attr_type: AttributeType,
    pub required: bool,
    pub optional: bool,
    /// Value may be filled by the provider when the configuration omits it
    pub computed: bool,
    /// A change requires destroy-then-create
    pub force_new: bool,
    pub sensitive: bool,
    pub default: Option<Value>,
    pub description: Option<String>,
    pub diff_suppress: Option<DiffSuppressFn>,
}

impl AttributeSchema {
    pub fn new(name: impl Into<String>, attr_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            attr_type,
            required: false,
            optional: false,
            computed: false,
            force_new: false,
            sensitive: false,
            default: None,
            description: None,
            diff_suppress: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.optional = true;
        self.default = Some(value.into());
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn with_diff_suppress(mut self, suppress: DiffSuppressFn) -> Self {
        self.diff_suppress = Some(suppress);
        self
    }

    /// Computed and never accepted from configuration
    pub fn is_read_only(&self) -> bool {
        self.computed && !self.required && !self.optional
    }

    fn to_json(&self) -> serde_json::Value {
        let mut json = serde_json::json!({
            "type": self.attr_type.to_json(),
            "required": self.required,
            "optional": self.optional,
            "computed": self.computed,
            "force_new": self.force_new,
            "sensitive": self.sensitive,
        });
        if let Some(description) = &self.description {
            json["description"] = serde_json::Value::String(description.clone());
        }
        if let Some(default) = &self.default {
            json["default"] = default.to_json();
        }
        json
    }
}

/// Schema of a nested block
#[derive(Debug, Clone, Default)]
pub struct BlockSchema {
    pub attributes: HashMap<String, AttributeSchema>,
    pub max_items: Option<usize>,
}

impl BlockSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// A block that may appear at most once
    pub fn single() -> Self {
        Self {
            attributes: HashMap::new(),
            max_items: Some(1),
        }
    }

    pub fn attribute(mut self, schema: AttributeSchema) -> Self {
        self.attributes.insert(schema.name.clone(), schema);
        self
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "attributes": attributes_to_json(&self.attributes),
            "max_items": self.max_items,
        })
    }
}

impl From<BlockSchema> for AttributeType {
    fn from(block: BlockSchema) -> Self {
        AttributeType::Block(Box::new(block))
    }
}

fn attributes_to_json(attributes: &HashMap<String, AttributeSchema>) -> serde_json::Value {
    serde_json::Value::Object(
        attributes
            .iter()
            .map(|(name, schema)| (name.clone(), schema.to_json()))
            .collect(),
    )
}

/// Validate attribute values against a set of attribute schemas
fn validate_attributes(
    schemas: &HashMap<String, AttributeSchema>,
    attributes: &HashMap<String, Value>,
) -> Vec<TypeError> {
    let mut errors = Vec::new();

    for (name, schema) in schemas {
        if schema.required && !attributes.contains_key(name) && schema.default.is_none() {
            errors.push(TypeError::MissingRequired { name: name.clone() });
        }
    }

    for (name, value) in attributes {
        match schemas.get(name) {
            Some(schema) => {
                if let Err(e) = schema.attr_type.validate(value) {
                    errors.push(TypeError::AttributeError {
                        name: name.clone(),
                        inner: Box::new(e),
                    });
                }
            }
            None => errors.push(TypeError::UnknownAttribute { name: name.clone() }),
        }
    }

    errors
}

/// Resource schema
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    pub resource_type: String,
    pub attributes: HashMap<String, AttributeSchema>,
    pub description: Option<String>,
}

impl ResourceSchema {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            attributes: HashMap::new(),
            description: None,
        }
    }

    pub fn attribute(mut self, schema: AttributeSchema) -> Self {
        self.attributes.insert(schema.name.clone(), schema);
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Validate configured attributes
    ///
    /// Rejects unknown attributes, computed-only attributes, missing required
    /// attributes and type errors, reporting all of them.
    pub fn validate(&self, attributes: &HashMap<String, Value>) -> Result<(), Vec<TypeError>> {
        let mut errors = validate_attributes(&self.attributes, attributes);

        for name in attributes.keys() {
            if let Some(schema) = self.attributes.get(name)
                && schema.is_read_only()
            {
                errors.push(TypeError::ComputedOnly { name: name.clone() });
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Decode a host JSON object into attributes
    pub fn decode(&self, json: &serde_json::Value) -> Result<HashMap<String, Value>, TypeError> {
        decode_attributes(&self.attributes, json)
    }

    /// Describe this schema for the host
    pub fn to_json(&self) -> serde_json::Value {
        let mut json = serde_json::json!({
            "attributes": attributes_to_json(&self.attributes),
        });
        if let Some(description) = &self.description {
            json["description"] = serde_json::Value::String(description.clone());
        }
        json
    }
}

/// Helper functions for common types
pub mod types {
    use super::*;

    /// Positive integer type
    pub fn positive_int() -> AttributeType {
        AttributeType::Custom {
            name: "PositiveInt".to_string(),
            base: Box::new(AttributeType::Int),
            validate: |value| {
                if let Value::Int(n) = value {
                    if *n > 0 {
                        Ok(())
                    } else {
                        Err("Value must be positive".to_string())
                    }
                } else {
                    Err("Expected integer".to_string())
                }
            },
        }
    }

    /// TCP/UDP port number
    pub fn port() -> AttributeType {
        AttributeType::Custom {
            name: "Port".to_string(),
            base: Box::new(AttributeType::Int),
            validate: |value| match value {
                Value::Int(n) if (1..=65535).contains(n) => Ok(()),
                Value::Int(n) => Err(format!("Port {} is out of range 1-65535", n)),
                _ => Err("Expected integer".to_string()),
            },
        }
    }

    /// UUID string
    pub fn uuid() -> AttributeType {
        AttributeType::Custom {
            name: "Uuid".to_string(),
            base: Box::new(AttributeType::String),
            validate: |value| match value {
                Value::String(s) => validate_uuid(s),
                _ => Err("Expected string".to_string()),
            },
        }
    }

    /// RFC 3339 timestamp string
    pub fn timestamp() -> AttributeType {
        AttributeType::Custom {
            name: "Timestamp".to_string(),
            base: Box::new(AttributeType::String),
            validate: |value| match value {
                Value::String(s) => chrono::DateTime::parse_from_rfc3339(s)
                    .map(|_| ())
                    .map_err(|e| format!("Invalid RFC 3339 timestamp '{}': {}", s, e)),
                _ => Err("Expected string".to_string()),
            },
        }
    }

    /// String holding a JSON document
    pub fn json_string() -> AttributeType {
        AttributeType::Custom {
            name: "Json".to_string(),
            base: Box::new(AttributeType::String),
            validate: |value| match value {
                Value::String(s) => serde_json::from_str::<serde_json::Value>(s)
                    .map(|_| ())
                    .map_err(|e| format!("Invalid JSON: {}", e)),
                _ => Err("Expected string".to_string()),
            },
        }
    }

    /// CIDR block type (e.g., "10.0.0.0/16")
    pub fn cidr() -> AttributeType {
        AttributeType::Custom {
            name: "Cidr".to_string(),
            base: Box::new(AttributeType::String),
            validate: |value| {
                if let Value::String(s) = value {
                    validate_cidr(s)
                } else {
                    Err("Expected string".to_string())
                }
            },
        }
    }
}

/// Validate a UUID in its hyphenated or simple form
pub fn validate_uuid(s: &str) -> Result<(), String> {
    uuid::Uuid::parse_str(s)
        .map(|_| ())
        .map_err(|e| format!("Invalid UUID '{}': {}", s, e))
}

/// Validate CIDR block format (e.g., "10.0.0.0/16" or "fd00::/8")
pub fn validate_cidr(cidr: &str) -> Result<(), String> {
    let Some((ip, prefix)) = cidr.split_once('/') else {
        return Err(format!(
            "Invalid CIDR format '{}': expected IP/prefix",
            cidr
        ));
    };

    let max_prefix = match ip.parse::<std::net::IpAddr>() {
        Ok(std::net::IpAddr::V4(_)) => 32,
        Ok(std::net::IpAddr::V6(_)) => 128,
        Err(_) => return Err(format!("Invalid IP address '{}'", ip)),
    };

    match prefix.parse::<u8>() {
        Ok(p) if p <= max_prefix => Ok(()),
        Ok(p) => Err(format!(
            "Invalid prefix length '{}': must be 0-{}",
            p, max_prefix
        )),
        Err(_) => Err(format!(
            "Invalid prefix length '{}': must be a number",
            prefix
        )),
    }
}
