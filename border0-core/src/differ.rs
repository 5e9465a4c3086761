//! Differ - Compare desired configuration with stored state to plan a change
//!
//! The planned state is the configuration completed with schema defaults and
//! with computed values carried over from the prior state. Comparing it with
//! the prior state attribute by attribute (honoring diff suppression) yields
//! the action the host has to take.

use std::collections::HashMap;

use crate::resource::{State, Value};
use crate::schema::{AttributeSchema, AttributeType, ResourceSchema};

/// Result of a diff operation
#[derive(Debug, Clone, PartialEq)]
pub enum Diff {
    /// Resource does not exist -> needs creation
    Create { planned: HashMap<String, Value> },
    /// Resource exists with differences -> needs update
    Update {
        planned: HashMap<String, Value>,
        changed_attributes: Vec<String>,
    },
    /// A ForceNew attribute changed -> needs destroy-then-create
    Replace {
        planned: HashMap<String, Value>,
        changed_attributes: Vec<String>,
        requires_replace: Vec<String>,
    },
    /// Resource exists with no differences -> no action needed
    NoChange { planned: HashMap<String, Value> },
    /// Resource exists but is no longer configured -> needs deletion
    Delete,
}

impl Diff {
    /// Returns whether this Diff involves a change
    pub fn is_change(&self) -> bool {
        !matches!(self, Diff::NoChange { .. })
    }

    /// Name of the planned action
    pub fn action(&self) -> &'static str {
        match self {
            Diff::Create { .. } => "create",
            Diff::Update { .. } => "update",
            Diff::Replace { .. } => "replace",
            Diff::NoChange { .. } => "noop",
            Diff::Delete => "delete",
        }
    }

    pub fn planned(&self) -> Option<&HashMap<String, Value>> {
        match self {
            Diff::Create { planned }
            | Diff::Update { planned, .. }
            | Diff::Replace { planned, .. }
            | Diff::NoChange { planned } => Some(planned),
            Diff::Delete => None,
        }
    }
}

/// Compare the desired configuration with the stored state
///
/// `current` is `None` (or has no identifier) when the resource does not
/// exist yet; `desired` is `None` when the configuration was removed.
pub fn diff(
    schema: &ResourceSchema,
    desired: Option<&HashMap<String, Value>>,
    current: Option<&State>,
) -> Diff {
    let current = current.filter(|state| state.exists());

    let (desired, current) = match (desired, current) {
        (None, None) => return Diff::NoChange {
            planned: HashMap::new(),
        },
        (None, Some(_)) => return Diff::Delete,
        (Some(desired), None) => {
            return Diff::Create {
                planned: planned_attributes(&schema.attributes, desired, None),
            };
        }
        (Some(desired), Some(current)) => (desired, current),
    };

    let planned = planned_attributes(&schema.attributes, desired, Some(&current.attributes));
    let changed = find_changed_attributes(schema, &planned, &current.attributes);

    if changed.is_empty() {
        return Diff::NoChange { planned };
    }

    let requires_replace: Vec<String> = changed
        .iter()
        .filter(|name| schema.attributes.get(*name).is_some_and(|s| s.force_new))
        .cloned()
        .collect();

    if requires_replace.is_empty() {
        Diff::Update {
            planned,
            changed_attributes: changed,
        }
    } else {
        // A replacement starts from scratch: nothing computed is carried over
        Diff::Replace {
            planned: planned_attributes(&schema.attributes, desired, None),
            changed_attributes: changed,
            requires_replace,
        }
    }
}

/// Complete configured attributes into planned attributes
pub fn planned_attributes(
    schemas: &HashMap<String, AttributeSchema>,
    config: &HashMap<String, Value>,
    prior: Option<&HashMap<String, Value>>,
) -> HashMap<String, Value> {
    let mut planned = HashMap::new();

    for (name, schema) in schemas {
        let prior_value = prior.and_then(|p| p.get(name));
        let value = match config.get(name).filter(|v| !v.is_empty()) {
            Some(configured) => Some(plan_value(schema, configured, prior_value)),
            None => match (&schema.default, prior_value) {
                (Some(default), _) => Some(default.clone()),
                (None, Some(prior_value)) if schema.computed => Some(prior_value.clone()),
                _ => None,
            },
        };
        if let Some(value) = value {
            planned.insert(name.clone(), value);
        }
    }

    planned
}

fn plan_value(schema: &AttributeSchema, configured: &Value, prior: Option<&Value>) -> Value {
    // Semantically equal values keep their stored form
    if let (Some(suppress), Some(prior)) = (schema.diff_suppress, prior)
        && suppress(prior, configured)
    {
        return prior.clone();
    }

    match (&schema.attr_type, configured) {
        (AttributeType::Block(block), Value::List(items)) => {
            let prior_items = match prior {
                Some(Value::List(prior_items)) => prior_items.as_slice(),
                _ => &[],
            };
            Value::List(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| match item {
                        Value::Map(config) => {
                            let prior = match prior_items.get(i) {
                                Some(Value::Map(prior)) => Some(prior),
                                _ => None,
                            };
                            Value::Map(planned_attributes(&block.attributes, config, prior))
                        }
                        other => other.clone(),
                    })
                    .collect(),
            )
        }
        _ => configured.clone(),
    }
}

/// Find changed attributes between planned and current state
fn find_changed_attributes(
    schema: &ResourceSchema,
    planned: &HashMap<String, Value>,
    current: &HashMap<String, Value>,
) -> Vec<String> {
    let mut changed: Vec<String> = schema
        .attributes
        .iter()
        .filter(|(name, attr)| {
            let old = current.get(*name);
            let new = planned.get(*name);
            if let (Some(suppress), Some(old), Some(new)) = (attr.diff_suppress, old, new)
                && suppress(old, new)
            {
                return false;
            }
            !values_equal(old, new)
        })
        .map(|(name, _)| name.clone())
        .collect();

    changed.sort();
    changed
}

/// Compare two optional values, treating absent and empty as equal
/// at any depth
pub fn values_equal(a: Option<&Value>, b: Option<&Value>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a == b || a.normalized() == b.normalized(),
        (Some(v), None) | (None, Some(v)) => v.normalized().is_none(),
        (None, None) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::BlockBuilder;
    use crate::schema::BlockSchema;

    fn json_equal(old: &Value, new: &Value) -> bool {
        match (old.as_str(), new.as_str()) {
            (Some(a), Some(b)) => {
                serde_json::from_str::<serde_json::Value>(a).ok()
                    == serde_json::from_str::<serde_json::Value>(b).ok()
            }
            _ => false,
        }
    }

    fn schema() -> ResourceSchema {
        ResourceSchema::new("socket")
            .attribute(AttributeSchema::new("name", AttributeType::String).required())
            .attribute(
                AttributeSchema::new("socket_type", AttributeType::String)
                    .required()
                    .force_new(),
            )
            .attribute(
                AttributeSchema::new("description", AttributeType::String)
                    .optional()
                    .computed(),
            )
            .attribute(AttributeSchema::new("token", AttributeType::String).computed())
            .attribute(AttributeSchema::new("members", AttributeType::string_set()).optional())
            .attribute(
                AttributeSchema::new("data", AttributeType::String)
                    .optional()
                    .with_diff_suppress(json_equal),
            )
            .attribute(
                AttributeSchema::new(
                    "ssh_configuration",
                    BlockSchema::single()
                        .attribute(
                            AttributeSchema::new("service_type", AttributeType::String)
                                .with_default("standard"),
                        )
                        .attribute(
                            AttributeSchema::new("username_provider", AttributeType::String)
                                .optional()
                                .computed(),
                        )
                        .attribute(
                            AttributeSchema::new("hostname", AttributeType::String).optional(),
                        )
                        .into(),
                )
                .optional(),
            )
    }

    fn attrs(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn diff_create_when_not_exists() {
        let desired = attrs(&[("name", Value::from("a"))]);
        let result = diff(&schema(), Some(&desired), None);
        assert!(matches!(result, Diff::Create { .. }));

        let gone = State::not_found("socket");
        let result = diff(&schema(), Some(&desired), Some(&gone));
        assert!(matches!(result, Diff::Create { .. }));
    }

    #[test]
    fn diff_delete_when_not_configured() {
        let current = State::existing("socket", HashMap::new()).with_identifier("s1");
        assert_eq!(diff(&schema(), None, Some(&current)), Diff::Delete);
    }

    #[test]
    fn computed_values_are_carried_over() {
        let current = State::existing(
            "socket",
            attrs(&[
                ("name", Value::from("a")),
                ("socket_type", Value::from("ssh")),
                ("token", Value::from("secret")),
                ("description", Value::from("server side")),
            ]),
        )
        .with_identifier("s1");
        let desired = attrs(&[("name", Value::from("a")), ("socket_type", Value::from("ssh"))]);

        let result = diff(&schema(), Some(&desired), Some(&current));
        let Diff::NoChange { planned } = result else {
            panic!("expected no change, got {:?}", result);
        };
        assert_eq!(planned["token"], Value::from("secret"));
    }

    #[test]
    fn nested_defaults_and_computed_values() {
        let current = State::existing(
            "socket",
            attrs(&[
                ("name", Value::from("a")),
                ("socket_type", Value::from("ssh")),
                (
                    "ssh_configuration",
                    BlockBuilder::new()
                        .set("service_type", "standard")
                        .set("username_provider", "prompt_client")
                        .set("hostname", "h")
                        .into_value(),
                ),
            ]),
        )
        .with_identifier("s1");
        let desired = attrs(&[
            ("name", Value::from("a")),
            ("socket_type", Value::from("ssh")),
            (
                "ssh_configuration",
                BlockBuilder::new().set("hostname", "h").into_value(),
            ),
        ]);

        let result = diff(&schema(), Some(&desired), Some(&current));
        assert!(!result.is_change(), "unexpected diff: {:?}", result);
    }

    #[test]
    fn diff_update_when_different() {
        let current = State::existing(
            "socket",
            attrs(&[("name", Value::from("a")), ("socket_type", Value::from("ssh"))]),
        )
        .with_identifier("s1");
        let desired = attrs(&[("name", Value::from("b")), ("socket_type", Value::from("ssh"))]);

        match diff(&schema(), Some(&desired), Some(&current)) {
            Diff::Update {
                changed_attributes, ..
            } => assert_eq!(changed_attributes, vec!["name".to_string()]),
            other => panic!("Expected Update, got {:?}", other),
        }
    }

    #[test]
    fn force_new_change_requires_replace() {
        let current = State::existing(
            "socket",
            attrs(&[
                ("name", Value::from("a")),
                ("socket_type", Value::from("ssh")),
                ("token", Value::from("secret")),
            ]),
        )
        .with_identifier("s1");
        let desired = attrs(&[("name", Value::from("a")), ("socket_type", Value::from("http"))]);

        match diff(&schema(), Some(&desired), Some(&current)) {
            Diff::Replace {
                planned,
                requires_replace,
                ..
            } => {
                assert_eq!(requires_replace, vec!["socket_type".to_string()]);
                assert!(!planned.contains_key("token"));
            }
            other => panic!("Expected Replace, got {:?}", other),
        }
    }

    #[test]
    fn suppressed_diff_keeps_stored_form() {
        let current = State::existing(
            "socket",
            attrs(&[
                ("name", Value::from("a")),
                ("socket_type", Value::from("ssh")),
                ("data", Value::from(r#"{"version":"v1","action":["ssh"]}"#)),
            ]),
        )
        .with_identifier("s1");
        let desired = attrs(&[
            ("name", Value::from("a")),
            ("socket_type", Value::from("ssh")),
            ("data", Value::from(r#"{"action":["ssh"],"version":"v1"}"#)),
        ]);

        let Diff::NoChange { planned } = diff(&schema(), Some(&desired), Some(&current)) else {
            panic!("expected no change");
        };
        assert_eq!(
            planned["data"],
            Value::from(r#"{"version":"v1","action":["ssh"]}"#)
        );
    }

    #[test]
    fn empty_set_equals_absent() {
        let current = State::existing(
            "socket",
            attrs(&[("name", Value::from("a")), ("socket_type", Value::from("ssh"))]),
        )
        .with_identifier("s1");
        let desired = attrs(&[
            ("name", Value::from("a")),
            ("socket_type", Value::from("ssh")),
            ("members", Value::Set(vec![])),
        ]);
        assert!(!diff(&schema(), Some(&desired), Some(&current)).is_change());
    }

    #[test]
    fn empty_values_inside_blocks_equal_absent() {
        let mut stored = HashMap::new();
        stored.insert("service_type".to_string(), Value::from("standard"));
        stored.insert("hostname".to_string(), Value::from("h"));
        stored.insert("members".to_string(), Value::Set(vec![]));
        stored.insert("username_provider".to_string(), Value::from(""));
        let current = State::existing(
            "socket",
            attrs(&[
                ("name", Value::from("a")),
                ("socket_type", Value::from("ssh")),
                ("ssh_configuration", Value::List(vec![Value::Map(stored)])),
            ]),
        )
        .with_identifier("s1");
        let desired = attrs(&[
            ("name", Value::from("a")),
            ("socket_type", Value::from("ssh")),
            (
                "ssh_configuration",
                BlockBuilder::new().set("hostname", "h").into_value(),
            ),
        ]);

        let result = diff(&schema(), Some(&desired), Some(&current));
        assert!(!result.is_change(), "unexpected diff: {:?}", result);
        assert!(!values_equal(
            Some(&BlockBuilder::new().set("hostname", "h").into_value()),
            Some(&BlockBuilder::new().set("hostname", "g").into_value()),
        ));
    }
}
