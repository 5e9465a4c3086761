use async_trait::async_trait;
use border0_client::types::ConnectorToken;
use border0_core::attributes::{Attributes, ResourceData};
use border0_core::provider::{ProviderError, ProviderResult};
use border0_core::resource::Value;
use border0_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

use super::{ResourceController, api_error, deleted, expires_at, expires_at_value, found};
use crate::config::ProviderMeta;

pub struct ConnectorTokenController;

#[async_trait]
impl ResourceController for ConnectorTokenController {
    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new("connector_token")
            .with_description("A token a connector authenticates with")
            .attribute(
                AttributeSchema::new("connector_id", AttributeType::String)
                    .required()
                    .force_new(),
            )
            .attribute(
                AttributeSchema::new("name", AttributeType::String)
                    .required()
                    .force_new(),
            )
            .attribute(
                AttributeSchema::new("expires_at", types::timestamp())
                    .optional()
                    .force_new()
                    .with_description("RFC 3339 expiry; the token never expires when omitted"),
            )
            .attribute(
                AttributeSchema::new("token", AttributeType::String)
                    .computed()
                    .sensitive()
                    .with_description("Token value, only available after creation"),
            )
    }

    async fn read(&self, meta: &ProviderMeta, data: &mut ResourceData) -> ProviderResult<()> {
        let id = data.require_id()?.to_string();
        let connector_id = data.get_string("connector_id").unwrap_or_default();
        let result = meta.requester().connector_tokens(&connector_id).await;
        let Some(tokens) = found(data, result, "read connector tokens")? else {
            return Ok(());
        };

        let Some(token) = tokens.into_iter().find(|t| t.id == id) else {
            if data.is_new_resource() {
                return Err(ProviderError::new(format!(
                    "Connector token {id} not found after creation"
                ))
                .for_resource(data.resource_id()));
            }
            data.remove_from_state();
            return Ok(());
        };

        let expires = expires_at_value(data, token.expires_at.as_ref());
        data.set_values([
            ("connector_id", Value::from(token.connector_id)),
            ("name", Value::from(token.name)),
            ("expires_at", expires),
        ])
    }

    async fn create(&self, meta: &ProviderMeta, data: &mut ResourceData) -> ProviderResult<()> {
        let request = ConnectorToken {
            connector_id: data.get_string("connector_id").unwrap_or_default(),
            name: data.get_string("name").unwrap_or_default(),
            expires_at: expires_at(data)?,
            ..Default::default()
        };
        let created = meta
            .requester()
            .create_connector_token(&request)
            .await
            .map_err(|e| api_error(data, "create connector token", e))?;
        log::debug!("Created connector token {}", created.id);

        data.set_id(created.id);
        data.set("token", created.token.unwrap_or_default())?;
        self.read(meta, data).await
    }

    async fn update(&self, meta: &ProviderMeta, data: &mut ResourceData) -> ProviderResult<()> {
        // every input forces replacement
        self.read(meta, data).await
    }

    async fn delete(&self, meta: &ProviderMeta, data: &mut ResourceData) -> ProviderResult<()> {
        let id = data.require_id()?.to_string();
        let connector_id = data.get_string("connector_id").unwrap_or_default();
        let result = meta
            .requester()
            .delete_connector_token(&connector_id, &id)
            .await;
        deleted(data, result, "delete connector token")
    }

    async fn import(&self, _meta: &ProviderMeta, data: &mut ResourceData) -> ProviderResult<()> {
        Err(ProviderError::new(
            "Connector tokens cannot be imported: the token value is only returned on creation",
        )
        .for_resource(data.resource_id()))
    }
}
