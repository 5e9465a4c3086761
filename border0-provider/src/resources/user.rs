use async_trait::async_trait;
use border0_client::types::User;
use border0_core::attributes::{Attributes, ResourceData};
use border0_core::provider::ProviderResult;
use border0_core::resource::Value;
use border0_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

use super::{ResourceController, api_error, deleted, found};
use crate::config::ProviderMeta;

pub const USER_ROLES: [&str; 4] = ["admin", "member", "read only", "client"];
const DEFAULT_ROLE: &str = "member";

pub struct UserController;

fn user_from(data: &ResourceData) -> User {
    User {
        id: data.id().unwrap_or_default().to_string(),
        display_name: data.get_string("display_name").unwrap_or_default(),
        email: data.get_string("email").unwrap_or_default(),
        role: data
            .get_string("role")
            .unwrap_or_else(|| DEFAULT_ROLE.to_string()),
    }
}

#[async_trait]
impl ResourceController for UserController {
    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new("user")
            .with_description("A member of the organization")
            .attribute(
                AttributeSchema::new("display_name", AttributeType::String)
                    .optional()
                    .computed(),
            )
            .attribute(
                AttributeSchema::new("email", AttributeType::String)
                    .required()
                    .force_new(),
            )
            .attribute(
                AttributeSchema::new("role", AttributeType::enumeration(&USER_ROLES))
                    .with_default(DEFAULT_ROLE),
            )
            .attribute(
                AttributeSchema::new("notify_by_email", AttributeType::Bool)
                    .with_default(true)
                    .with_description("Send an invitation email when the user is created"),
            )
    }

    async fn read(&self, meta: &ProviderMeta, data: &mut ResourceData) -> ProviderResult<()> {
        let id = data.require_id()?.to_string();
        let result = meta.requester().user(&id).await;
        let Some(user) = found(data, result, "read user")? else {
            return Ok(());
        };

        // the platform does not store it; an import starts from the default
        let notify_by_email = data.get_bool_or("notify_by_email", true);
        data.set_values([
            ("display_name", Value::from(user.display_name)),
            ("email", Value::from(user.email)),
            ("role", Value::from(user.role)),
            ("notify_by_email", Value::Bool(notify_by_email)),
        ])
    }

    async fn create(&self, meta: &ProviderMeta, data: &mut ResourceData) -> ProviderResult<()> {
        let notify_by_email = data.get_bool_or("notify_by_email", true);
        let created = meta
            .requester()
            .create_user(&user_from(data), notify_by_email)
            .await
            .map_err(|e| api_error(data, "create user", e))?;
        log::debug!("Created user {}", created.id);

        data.set_id(created.id);
        self.read(meta, data).await
    }

    async fn update(&self, meta: &ProviderMeta, data: &mut ResourceData) -> ProviderResult<()> {
        if data.has_changes(&["display_name", "role"]) {
            meta.requester()
                .update_user(&user_from(data))
                .await
                .map_err(|e| api_error(data, "update user", e))?;
        }
        self.read(meta, data).await
    }

    async fn delete(&self, meta: &ProviderMeta, data: &mut ResourceData) -> ProviderResult<()> {
        let id = data.require_id()?.to_string();
        let result = meta.requester().delete_user(&id).await;
        deleted(data, result, "delete user")
    }
}
