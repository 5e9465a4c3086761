use async_trait::async_trait;
use border0_client::types::Policy;
use border0_core::attributes::{Attributes, ResourceData};
use border0_core::provider::ProviderResult;
use border0_core::resource::Value;
use border0_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

use super::{ResourceController, api_error, deleted, found, invalid, slug};
use crate::config::ProviderMeta;

pub const POLICY_VERSIONS: [&str; 2] = ["v1", "v2"];

pub struct PolicyController;

/// Whether two policy documents are the same policy
///
/// Both empty, or structurally equal once parsed. Key order and
/// whitespace do not matter.
pub fn equivalent_policy_data(old: &Value, new: &Value) -> bool {
    let (Some(old), Some(new)) = (old.as_str(), new.as_str()) else {
        return false;
    };
    if old.trim().is_empty() && new.trim().is_empty() {
        return true;
    }
    match (
        serde_json::from_str::<serde_json::Value>(old),
        serde_json::from_str::<serde_json::Value>(new),
    ) {
        (Ok(old), Ok(new)) => old == new,
        _ => false,
    }
}

fn policy_from(data: &ResourceData) -> ProviderResult<Policy> {
    let text = data.get_str("policy_data").unwrap_or("{}");
    let policy_data = serde_json::from_str(text).map_err(|e| invalid(data, e))?;
    Ok(Policy {
        id: data.id().unwrap_or_default().to_string(),
        name: data.get_string("name").unwrap_or_default(),
        description: data.get_string("description").unwrap_or_default(),
        org_wide: data.get_bool_or("org_wide", false),
        version: data
            .get_string("version")
            .unwrap_or_else(|| POLICY_VERSIONS[0].to_string()),
        policy_data,
    })
}

#[async_trait]
impl ResourceController for PolicyController {
    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new("policy")
            .with_description("An access policy attached to sockets")
            .attribute(AttributeSchema::new("name", slug()).required())
            .attribute(AttributeSchema::new("description", AttributeType::String).optional())
            .attribute(
                AttributeSchema::new("version", AttributeType::enumeration(&POLICY_VERSIONS))
                    .with_default(POLICY_VERSIONS[0]),
            )
            .attribute(
                AttributeSchema::new("org_wide", AttributeType::Bool)
                    .with_default(false)
                    .with_description("Apply the policy to every socket of the organization"),
            )
            .attribute(
                AttributeSchema::new("policy_data", types::json_string())
                    .required()
                    .with_diff_suppress(equivalent_policy_data)
                    .with_description("Policy document as JSON"),
            )
    }

    async fn read(&self, meta: &ProviderMeta, data: &mut ResourceData) -> ProviderResult<()> {
        let id = data.require_id()?.to_string();
        let result = meta.requester().policy(&id).await;
        let Some(policy) = found(data, result, "read policy")? else {
            return Ok(());
        };

        let fetched = Value::from(policy.policy_data.to_string());
        let policy_data = match data.attribute("policy_data") {
            Some(existing) if equivalent_policy_data(existing, &fetched) => existing.clone(),
            _ => fetched,
        };

        data.set_values([
            ("name", Value::from(policy.name)),
            ("description", Value::from(policy.description)),
            ("version", Value::from(policy.version)),
            ("org_wide", Value::Bool(policy.org_wide)),
            ("policy_data", policy_data),
        ])
    }

    async fn create(&self, meta: &ProviderMeta, data: &mut ResourceData) -> ProviderResult<()> {
        let policy = policy_from(data)?;
        let created = meta
            .requester()
            .create_policy(&policy)
            .await
            .map_err(|e| api_error(data, "create policy", e))?;
        log::debug!("Created policy {}", created.id);

        data.set_id(created.id);
        self.read(meta, data).await
    }

    async fn update(&self, meta: &ProviderMeta, data: &mut ResourceData) -> ProviderResult<()> {
        let document_changed = match (data.prior("policy_data"), data.attribute("policy_data")) {
            (Some(old), Some(new)) => !equivalent_policy_data(old, new),
            (old, new) => old.is_some() != new.is_some(),
        };

        if document_changed || data.has_changes(&["name", "description", "version", "org_wide"]) {
            let policy = policy_from(data)?;
            meta.requester()
                .update_policy(&policy)
                .await
                .map_err(|e| api_error(data, "update policy", e))?;
        }
        self.read(meta, data).await
    }

    async fn delete(&self, meta: &ProviderMeta, data: &mut ResourceData) -> ProviderResult<()> {
        let id = data.require_id()?.to_string();
        let result = meta.requester().delete_policy(&id).await;
        deleted(data, result, "delete policy")
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use super::*;
    use crate::testing::MockRequester;
    use border0_core::differ::{Diff, diff};
    use border0_core::resource::State;

    fn config(policy_data: &str) -> HashMap<String, Value> {
        HashMap::from([
            ("name".to_string(), Value::from("ssh-access")),
            ("policy_data".to_string(), Value::from(policy_data)),
        ])
    }

    #[test]
    fn policy_data_equivalence() {
        let eq = |a: &str, b: &str| equivalent_policy_data(&Value::from(a), &Value::from(b));
        assert!(eq("", ""));
        assert!(eq("{}", "{ }"));
        assert!(eq(
            r#"{"version":"v1","action":["ssh"]}"#,
            r#"{"action":["ssh"],"version":"v1"}"#
        ));
        assert!(!eq(r#"{"action":["ssh"]}"#, r#"{"action":["tls"]}"#));
        assert!(!eq(r#"{"action":["ssh","tls"]}"#, r#"{"action":["tls","ssh"]}"#));
        assert!(!eq("{}", ""));
        assert!(!eq("not json", "not json "));
    }

    #[test]
    fn names_are_validated() {
        let schema = PolicyController.schema();
        assert!(schema.validate(&config("{}")).is_ok());

        let named = |name: &str| {
            let mut config = config("{}");
            config.insert("name".to_string(), Value::from(name));
            schema.validate(&config)
        };
        for name in ["a--b", "team-", "-team", "ssh-access-2"] {
            assert!(named(name).is_ok(), "{name} should be accepted");
        }
        for name in ["SSH_Access", "ssh access", "ssh.access", ""] {
            assert!(named(name).is_err(), "{name:?} should be rejected");
        }
    }

    #[tokio::test]
    async fn reordered_document_plans_no_change() {
        let mock = MockRequester::new();
        let meta = mock.meta();
        let schema = Arc::new(PolicyController.schema());

        let mut data = ResourceData::for_create(
            schema.clone(),
            diff(&schema, Some(&config(r#"{"version":"v1","action":["ssh"]}"#)), None)
                .planned()
                .cloned()
                .unwrap(),
        );
        PolicyController.create(&meta, &mut data).await.unwrap();
        let state = data.into_state();
        assert_eq!(
            state.attributes["policy_data"],
            Value::from(r#"{"version":"v1","action":["ssh"]}"#)
        );

        let reordered = config(r#"{"action":["ssh"],"version":"v1"}"#);
        let plan = diff(&schema, Some(&reordered), Some(&state));
        assert!(matches!(plan, Diff::NoChange { .. }), "{plan:?}");

        // the controller compares documents itself, even without the planned form
        let mut planned = plan.planned().cloned().unwrap();
        planned.insert("policy_data".to_string(), reordered["policy_data"].clone());

        mock.clear_calls();
        let mut data = ResourceData::for_update(
            schema,
            state.identifier.clone().unwrap(),
            state.attributes.clone(),
            planned,
        );
        PolicyController.update(&meta, &mut data).await.unwrap();
        assert!(mock.writes().is_empty());
    }

    #[tokio::test]
    async fn changed_document_is_sent() {
        let mock = MockRequester::new();
        let meta = mock.meta();
        let schema = Arc::new(PolicyController.schema());
        let mut data = ResourceData::for_create(schema.clone(), config(r#"{"action":["ssh"]}"#));
        PolicyController.create(&meta, &mut data).await.unwrap();
        let state = data.into_state();

        mock.clear_calls();
        let mut data = ResourceData::for_update(
            schema.clone(),
            "id1",
            state.attributes,
            config(r#"{"action":["ssh","tls"]}"#),
        );
        PolicyController.update(&meta, &mut data).await.unwrap();
        let writes = mock.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].body["policy_data"]["action"][1], "tls");

        let stored = State::existing("policy", HashMap::new()).with_identifier("id1");
        let mut data = ResourceData::from_state(schema, &stored);
        PolicyController.read(&meta, &mut data).await.unwrap();
        assert_eq!(data.get_str("version"), Some("v1"));
        assert_eq!(data.get_bool("org_wide"), Some(false));
    }
}
