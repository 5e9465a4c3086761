use async_trait::async_trait;
use border0_client::types::Connector;
use border0_core::attributes::{Attributes, ResourceData};
use border0_core::provider::ProviderResult;
use border0_core::resource::Value;
use border0_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

use super::{ResourceController, api_error, deleted, found};
use crate::config::ProviderMeta;

pub struct ConnectorController;

fn connector_from(data: &ResourceData) -> Connector {
    Connector {
        connector_id: data.id().unwrap_or_default().to_string(),
        name: data.get_string("name").unwrap_or_default(),
        description: data.get_string("description").unwrap_or_default(),
    }
}

#[async_trait]
impl ResourceController for ConnectorController {
    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new("connector")
            .with_description("A connector brokering traffic to upstream services")
            .attribute(AttributeSchema::new("name", AttributeType::String).required())
            .attribute(AttributeSchema::new("description", AttributeType::String).optional())
    }

    async fn read(&self, meta: &ProviderMeta, data: &mut ResourceData) -> ProviderResult<()> {
        let id = data.require_id()?.to_string();
        let result = meta.requester().connector(&id).await;
        let Some(connector) = found(data, result, "read connector")? else {
            return Ok(());
        };

        data.set_values([
            ("name", Value::from(connector.name)),
            ("description", Value::from(connector.description)),
        ])
    }

    async fn create(&self, meta: &ProviderMeta, data: &mut ResourceData) -> ProviderResult<()> {
        let created = meta
            .requester()
            .create_connector(&connector_from(data))
            .await
            .map_err(|e| api_error(data, "create connector", e))?;
        log::debug!("Created connector {}", created.connector_id);

        data.set_id(created.connector_id);
        self.read(meta, data).await
    }

    async fn update(&self, meta: &ProviderMeta, data: &mut ResourceData) -> ProviderResult<()> {
        if data.has_changes(&["name", "description"]) {
            meta.requester()
                .update_connector(&connector_from(data))
                .await
                .map_err(|e| api_error(data, "update connector", e))?;
        }
        self.read(meta, data).await
    }

    async fn delete(&self, meta: &ProviderMeta, data: &mut ResourceData) -> ProviderResult<()> {
        let id = data.require_id()?.to_string();
        let result = meta.requester().delete_connector(&id).await;
        deleted(data, result, "delete connector")
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use super::*;
    use crate::testing::MockRequester;
    use border0_core::resource::State;
    use serde_json::json;

    fn config(name: &str, description: &str) -> HashMap<String, Value> {
        HashMap::from([
            ("name".to_string(), Value::from(name)),
            ("description".to_string(), Value::from(description)),
        ])
    }

    #[tokio::test]
    async fn connector_lifecycle() {
        let mock = MockRequester::new();
        let meta = mock.meta();
        let schema = Arc::new(ConnectorController.schema());

        let mut data = ResourceData::for_create(schema.clone(), config("c1", "d"));
        ConnectorController.create(&meta, &mut data).await.unwrap();
        assert_eq!(data.id(), Some("id1"));
        let state = data.into_state();
        assert_eq!(state.attributes, config("c1", "d"));

        mock.clear_calls();
        let mut data =
            ResourceData::for_update(schema.clone(), "id1", state.attributes, config("c1", "d2"));
        ConnectorController.update(&meta, &mut data).await.unwrap();
        let writes = mock.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].method, "update_connector");
        assert_eq!(
            writes[0].body,
            json!({"connector_id": "id1", "name": "c1", "description": "d2"})
        );

        mock.clear_calls();
        let state = data.into_state();
        let mut data = ResourceData::from_state(schema, &state);
        ConnectorController.delete(&meta, &mut data).await.unwrap();
        assert_eq!(mock.methods(), vec!["delete_connector"]);
        assert_eq!(mock.calls()[0].body, json!({"id": "id1"}));
        assert!(data.id().is_none());
    }

    #[tokio::test]
    async fn unchanged_update_makes_no_writes() {
        let mock = MockRequester::new();
        let meta = mock.meta();
        let schema = Arc::new(ConnectorController.schema());
        let mut data = ResourceData::for_create(schema.clone(), config("c1", "d"));
        ConnectorController.create(&meta, &mut data).await.unwrap();
        mock.clear_calls();

        let mut data =
            ResourceData::for_update(schema, "id1", config("c1", "d"), config("c1", "d"));
        ConnectorController.update(&meta, &mut data).await.unwrap();
        assert!(mock.writes().is_empty());
        assert_eq!(mock.methods(), vec!["connector"]);
    }

    #[tokio::test]
    async fn delete_twice_is_idempotent() {
        let mock = MockRequester::new();
        let meta = mock.meta();
        let schema = Arc::new(ConnectorController.schema());
        let state = State::existing("connector", config("c1", "d")).with_identifier("missing");
        let mut data = ResourceData::from_state(schema, &state);
        ConnectorController.delete(&meta, &mut data).await.unwrap();
        assert!(data.id().is_none());
    }

    #[tokio::test]
    async fn out_of_band_deletion_clears_state() {
        let mock = MockRequester::new();
        let meta = mock.meta();
        let schema = Arc::new(ConnectorController.schema());
        let state = State::existing("connector", config("c1", "d")).with_identifier("id9");
        let mut data = ResourceData::from_state(schema, &state);
        ConnectorController.read(&meta, &mut data).await.unwrap();

        let outcome = data.into_outcome();
        assert!(!outcome.state.exists());
        assert_eq!(
            outcome.warnings[0].summary,
            "connector \"id9\" not found, removing from state"
        );
    }

    #[tokio::test]
    async fn auth_failure_surfaces() {
        let mock = MockRequester::new();
        mock.fail("create_connector", 401, r#"{"error_message":"invalid token"}"#);
        let meta = mock.meta();
        let schema = Arc::new(ConnectorController.schema());
        let mut data = ResourceData::for_create(schema, config("c1", "d"));
        let err = ConnectorController.create(&meta, &mut data).await.unwrap_err();

        let diagnostics = err.diagnostics();
        assert_eq!(diagnostics[0].summary, "[connector] Failed to create connector");
        assert_eq!(diagnostics[0].detail.as_deref(), Some("unauthorized: invalid token"));
    }
}
