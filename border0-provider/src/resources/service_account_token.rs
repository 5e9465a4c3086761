//! API token of a service account, identified as `token_id:service_account_name`

use async_trait::async_trait;
use border0_client::types::ServiceAccountToken;
use border0_core::attributes::{Attributes, ResourceData};
use border0_core::ids;
use border0_core::provider::{ProviderError, ProviderResult};
use border0_core::resource::Value;
use border0_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

use super::{ResourceController, api_error, deleted, expires_at, expires_at_value, found};
use crate::config::ProviderMeta;

pub struct ServiceAccountTokenController;

fn parts(data: &ResourceData) -> ProviderResult<[String; 2]> {
    let id = data.require_id()?;
    ids::decode::<2>(id).map_err(|e| {
        ProviderError::new("Invalid service account token id")
            .for_resource(data.resource_id())
            .with_cause(e)
    })
}

#[async_trait]
impl ResourceController for ServiceAccountTokenController {
    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new("service_account_token")
            .with_description("An API token of a service account")
            .attribute(
                AttributeSchema::new("service_account_name", AttributeType::String)
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
                    .force_new(),
            )
            .attribute(
                AttributeSchema::new("token", AttributeType::String)
                    .computed()
                    .sensitive(),
            )
    }

    async fn read(&self, meta: &ProviderMeta, data: &mut ResourceData) -> ProviderResult<()> {
        let [token_id, account] = parts(data)?;
        let result = meta.requester().service_account_tokens(&account).await;
        let Some(tokens) = found(data, result, "read service account tokens")? else {
            return Ok(());
        };

        let Some(token) = tokens.into_iter().find(|t| t.id == token_id) else {
            if data.is_new_resource() {
                return Err(ProviderError::new(format!(
                    "Service account token {token_id} not found after creation"
                ))
                .for_resource(data.resource_id()));
            }
            data.remove_from_state();
            return Ok(());
        };

        let expires = expires_at_value(data, token.expires_at.as_ref());
        data.set_values([
            ("service_account_name", Value::from(account)),
            ("name", Value::from(token.name)),
            ("expires_at", expires),
        ])
    }

    async fn create(&self, meta: &ProviderMeta, data: &mut ResourceData) -> ProviderResult<()> {
        let account = data.get_string("service_account_name").unwrap_or_default();
        let request = ServiceAccountToken {
            name: data.get_string("name").unwrap_or_default(),
            expires_at: expires_at(data)?,
            ..Default::default()
        };
        let created = meta
            .requester()
            .create_service_account_token(&account, &request)
            .await
            .map_err(|e| api_error(data, "create service account token", e))?;
        log::debug!("Created token {} for service account {account}", created.id);

        data.set_id(ids::encode([created.id.as_str(), account.as_str()]));
        data.set("token", created.token.unwrap_or_default())?;

        // the token list lags behind creation
        tokio::time::sleep(meta.read_after_write_delay).await;
        self.read(meta, data).await
    }

    async fn update(&self, meta: &ProviderMeta, data: &mut ResourceData) -> ProviderResult<()> {
        self.read(meta, data).await
    }

    async fn delete(&self, meta: &ProviderMeta, data: &mut ResourceData) -> ProviderResult<()> {
        let [token_id, account] = parts(data)?;
        let result = meta
            .requester()
            .delete_service_account_token(&account, &token_id)
            .await;
        deleted(data, result, "delete service account token")
    }
}
