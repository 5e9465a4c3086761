use async_trait::async_trait;
use border0_client::types::ServiceAccount;
use border0_core::attributes::{Attributes, ResourceData};
use border0_core::provider::ProviderResult;
use border0_core::resource::Value;
use border0_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

use super::user::USER_ROLES;
use super::{ResourceController, api_error, deleted, found, slug};
use crate::config::ProviderMeta;

/// Service accounts are addressed by name, which is also their id
pub struct ServiceAccountController;

fn account_from(data: &ResourceData) -> ServiceAccount {
    ServiceAccount {
        name: data.get_string("name").unwrap_or_default(),
        description: data.get_string("description").unwrap_or_default(),
        role: data.get_string("role").unwrap_or_default(),
        active: data.get_bool_or("active", true),
    }
}

#[async_trait]
impl ResourceController for ServiceAccountController {
    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new("service_account")
            .with_description("A non-human identity holding API tokens")
            .attribute(
                AttributeSchema::new("name", slug())
                    .required()
                    .force_new(),
            )
            .attribute(AttributeSchema::new("description", AttributeType::String).optional())
            .attribute(
                AttributeSchema::new("role", AttributeType::enumeration(&USER_ROLES)).required(),
            )
            .attribute(AttributeSchema::new("active", AttributeType::Bool).with_default(true))
    }

    async fn read(&self, meta: &ProviderMeta, data: &mut ResourceData) -> ProviderResult<()> {
        let name = data.require_id()?.to_string();
        let result = meta.requester().service_account(&name).await;
        let Some(account) = found(data, result, "read service account")? else {
            return Ok(());
        };

        data.set_values([
            ("name", Value::from(account.name)),
            ("description", Value::from(account.description)),
            ("role", Value::from(account.role)),
            ("active", Value::Bool(account.active)),
        ])
    }

    async fn create(&self, meta: &ProviderMeta, data: &mut ResourceData) -> ProviderResult<()> {
        let created = meta
            .requester()
            .create_service_account(&account_from(data))
            .await
            .map_err(|e| api_error(data, "create service account", e))?;
        log::debug!("Created service account {}", created.name);

        data.set_id(created.name);
        self.read(meta, data).await
    }

    async fn update(&self, meta: &ProviderMeta, data: &mut ResourceData) -> ProviderResult<()> {
        if data.has_changes(&["description", "role", "active"]) {
            meta.requester()
                .update_service_account(&account_from(data))
                .await
                .map_err(|e| api_error(data, "update service account", e))?;
        }
        self.read(meta, data).await
    }

    async fn delete(&self, meta: &ProviderMeta, data: &mut ResourceData) -> ProviderResult<()> {
        let name = data.require_id()?.to_string();
        let result = meta.requester().delete_service_account(&name).await;
        deleted(data, result, "delete service account")
    }
}
