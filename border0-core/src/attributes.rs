//! Attributes - Typed access to resource and block attribute values
//!
//! All reads of host-provided values go through the [`Attributes`] trait,
//! whether the values belong to a whole resource ([`ResourceData`]) or to a
//! nested single block ([`Block`]). [`BlockBuilder`] is the write-side
//! counterpart used when inflating platform objects into blocks.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::diagnostics::Diagnostic;
use crate::provider::{ProviderError, ProviderResult, ReadOutcome};
use crate::resource::{ResourceId, State, Value};
use crate::schema::{ResourceSchema, TypeError};

/// Read access to a set of attribute values
pub trait Attributes {
    fn attribute(&self, key: &str) -> Option<&Value>;

    /// Non-empty string value
    fn get_str(&self, key: &str) -> Option<&str> {
        match self.attribute(key) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.as_str()),
            _ => None,
        }
    }

    fn get_string(&self, key: &str) -> Option<String> {
        self.get_str(key).map(str::to_string)
    }

    fn get_int(&self, key: &str) -> Option<i64> {
        match self.attribute(key) {
            Some(Value::Int(i)) => Some(*i),
            _ => None,
        }
    }

    fn get_bool(&self, key: &str) -> Option<bool> {
        match self.attribute(key) {
            Some(Value::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    fn get_bool_or(&self, key: &str, default: bool) -> bool {
        self.get_bool(key).unwrap_or(default)
    }

    /// Strings of a list or set attribute, in stored order
    fn get_strings(&self, key: &str) -> Vec<String> {
        match self.attribute(key) {
            Some(Value::List(items) | Value::Set(items)) => items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        }
    }

    fn get_string_map(&self, key: &str) -> HashMap<String, String> {
        match self.attribute(key) {
            Some(Value::Map(map)) => map
                .iter()
                .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                .collect(),
            _ => HashMap::new(),
        }
    }

    /// All instances of a nested block
    fn get_blocks(&self, key: &str) -> Vec<Block<'_>> {
        match self.attribute(key) {
            Some(Value::List(items)) => items
                .iter()
                .filter_map(|item| match item {
                    Value::Map(attributes) => Some(Block { attributes }),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// The first instance of a nested block
    fn get_block(&self, key: &str) -> Option<Block<'_>> {
        self.get_blocks(key).into_iter().next()
    }
}

/// Borrowed view of one nested block instance
#[derive(Debug, Clone, Copy)]
pub struct Block<'a> {
    attributes: &'a HashMap<String, Value>,
}

impl<'a> Block<'a> {
    pub fn new(attributes: &'a HashMap<String, Value>) -> Self {
        Self { attributes }
    }

    pub fn attributes(&self) -> &'a HashMap<String, Value> {
        self.attributes
    }
}

impl Attributes for Block<'_> {
    fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }
}

impl Attributes for HashMap<String, Value> {
    fn attribute(&self, key: &str) -> Option<&Value> {
        self.get(key)
    }
}

/// Builds a nested block, leaving out absent and empty values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockBuilder {
    attributes: HashMap<String, Value>,
}

impl BlockBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: &str, value: impl Into<Value>) -> Self {
        let value = value.into();
        if !value.is_empty() {
            self.attributes.insert(key.to_string(), value);
        }
        self
    }

    pub fn opt<V: Into<Value>>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.set(key, value),
            None => self,
        }
    }

    pub fn strings(self, key: &str, values: &[String]) -> Self {
        self.set(key, Value::string_list(values.iter().cloned()))
    }

    pub fn string_set(self, key: &str, values: &[String]) -> Self {
        self.set(key, Value::string_set(values.iter().cloned()))
    }

    pub fn block(self, key: &str, block: Option<BlockBuilder>) -> Self {
        match block {
            Some(block) => self.set(key, block.into_value()),
            None => self,
        }
    }

    pub fn build(self) -> HashMap<String, Value> {
        self.attributes
    }

    /// Wrap as a single-element block list
    pub fn into_value(self) -> Value {
        Value::List(vec![Value::Map(self.attributes)])
    }
}

/// Several attribute errors collected from one operation
#[derive(Debug, Clone, Error)]
#[error("{}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
pub struct AttributeErrors(pub Vec<TypeError>);

/// Host state of one resource during a single operation
///
/// Holds the working attributes (planned on Create/Update, stored on Read),
/// the prior attributes for change detection, the identifier, and the
/// warnings raised along the way.
#[derive(Debug, Clone)]
pub struct ResourceData {
    schema: Arc<ResourceSchema>,
    id: Option<String>,
    attributes: HashMap<String, Value>,
    prior: HashMap<String, Value>,
    is_new: bool,
    warnings: Vec<Diagnostic>,
}

impl ResourceData {
    /// Data for a resource about to be created
    pub fn for_create(schema: Arc<ResourceSchema>, planned: HashMap<String, Value>) -> Self {
        Self {
            schema,
            id: None,
            attributes: planned,
            prior: HashMap::new(),
            is_new: true,
            warnings: Vec::new(),
        }
    }

    /// Data for an in-place update from `prior` to `planned`
    pub fn for_update(
        schema: Arc<ResourceSchema>,
        id: impl Into<String>,
        prior: HashMap<String, Value>,
        planned: HashMap<String, Value>,
    ) -> Self {
        Self {
            schema,
            id: Some(id.into()),
            attributes: planned,
            prior,
            is_new: false,
            warnings: Vec::new(),
        }
    }

    /// Data for a stored resource (read, delete)
    pub fn from_state(schema: Arc<ResourceSchema>, state: &State) -> Self {
        Self {
            schema,
            id: state.identifier.clone().filter(|id| !id.is_empty()),
            attributes: state.attributes.clone(),
            prior: state.attributes.clone(),
            is_new: false,
            warnings: Vec::new(),
        }
    }

    /// Data for a data source evaluation
    pub fn for_data_source(schema: Arc<ResourceSchema>, config: HashMap<String, Value>) -> Self {
        Self::for_create(schema, config)
    }

    pub fn resource_type(&self) -> &str {
        &self.schema.resource_type
    }

    pub fn schema(&self) -> &ResourceSchema {
        &self.schema
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Identifier, or an error naming the operation that needs it
    pub fn require_id(&self) -> ProviderResult<&str> {
        self.id().ok_or_else(|| {
            ProviderError::new(format!("{} has no id", self.resource_type()))
                .for_resource(self.resource_id())
        })
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = Some(id.into());
    }

    /// Drop the identifier; the host treats the resource as absent
    pub fn clear_id(&mut self) {
        self.id = None;
    }

    pub fn resource_id(&self) -> ResourceId {
        let id = ResourceId::new(self.resource_type());
        match &self.id {
            Some(identifier) => id.with_identifier(identifier.clone()),
            None => id,
        }
    }

    /// Whether this operation belongs to a Create that has not completed
    pub fn is_new_resource(&self) -> bool {
        self.is_new
    }

    /// Old value of an attribute before this operation
    pub fn prior(&self, key: &str) -> Option<&Value> {
        self.prior.get(key)
    }

    /// Whether an attribute differs between prior and working values
    pub fn has_change(&self, key: &str) -> bool {
        !crate::differ::values_equal(self.prior.get(key), self.attributes.get(key))
    }

    pub fn has_changes(&self, keys: &[&str]) -> bool {
        keys.iter().any(|key| self.has_change(key))
    }

    /// Set one attribute, validating it against the schema
    ///
    /// Empty values are removed instead of stored.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> ProviderResult<()> {
        self.set_values([(key, value.into())])
    }

    /// Set several attributes, reporting every invalid one together
    pub fn set_values<'k, I>(&mut self, values: I) -> ProviderResult<()>
    where
        I: IntoIterator<Item = (&'k str, Value)>,
    {
        let mut errors = Vec::new();
        for (key, value) in values {
            let Some(schema) = self.schema.attributes.get(key) else {
                errors.push(TypeError::UnknownAttribute {
                    name: key.to_string(),
                });
                continue;
            };
            if value.is_empty() {
                self.attributes.remove(key);
                continue;
            }
            if let Err(e) = schema.attr_type.validate(&value) {
                errors.push(TypeError::AttributeError {
                    name: key.to_string(),
                    inner: Box::new(e),
                });
                continue;
            }
            self.attributes.insert(key.to_string(), value);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ProviderError::new(format!(
                "Failed to set {} attributes",
                self.resource_type()
            ))
            .for_resource(self.resource_id())
            .with_cause(AttributeErrors(errors)))
        }
    }

    pub fn remove(&mut self, key: &str) {
        self.attributes.remove(key);
    }

    pub fn warn(&mut self, warning: Diagnostic) {
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    /// Handle a resource that vanished from the platform
    ///
    /// Clears the identifier and records the drift-removal warning.
    pub fn remove_from_state(&mut self) {
        let summary = match &self.id {
            Some(id) => format!(
                "{} \"{}\" not found, removing from state",
                self.resource_type(),
                id
            ),
            None => format!("{} not found, removing from state", self.resource_type()),
        };
        log::warn!("{}", summary);
        self.warnings.push(Diagnostic::warning(summary));
        self.id = None;
        self.attributes.clear();
    }

    pub fn into_state(self) -> State {
        let state = State::existing(self.schema.resource_type.clone(), self.attributes);
        match self.id {
            Some(id) => state.with_identifier(id),
            None => state,
        }
    }

    pub fn into_outcome(self) -> ReadOutcome {
        let warnings = self.warnings.clone();
        ReadOutcome {
            state: self.into_state(),
            warnings,
        }
    }
}

impl Attributes for ResourceData {
    fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }
}
