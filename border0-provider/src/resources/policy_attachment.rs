//! Binding of a policy to a socket, identified as `policy_id:socket_id`

use async_trait::async_trait;
use border0_core::attributes::{Attributes, ResourceData};
use border0_core::ids;
use border0_core::provider::{ProviderError, ProviderResult};
use border0_core::resource::Value;
use border0_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

use super::{ResourceController, api_error, deleted, found};
use crate::config::ProviderMeta;

pub struct PolicyAttachmentController;

fn parts(data: &ResourceData) -> ProviderResult<[String; 2]> {
    let id = data.require_id()?;
    ids::decode::<2>(id).map_err(|e| {
        ProviderError::new("Invalid policy attachment id")
            .for_resource(data.resource_id())
            .with_cause(e)
    })
}

#[async_trait]
impl ResourceController for PolicyAttachmentController {
    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new("policy_attachment")
            .with_description("Attaches a policy to a socket")
            .attribute(
                AttributeSchema::new("policy_id", AttributeType::String)
                    .required()
                    .force_new(),
            )
            .attribute(
                AttributeSchema::new("socket_id", AttributeType::String)
                    .required()
                    .force_new(),
            )
    }

    async fn read(&self, meta: &ProviderMeta, data: &mut ResourceData) -> ProviderResult<()> {
        let [policy_id, socket_id] = parts(data)?;
        let result = meta.requester().socket_policy_ids(&socket_id).await;
        let Some(attached) = found(data, result, "read socket policies")? else {
            return Ok(());
        };

        if !attached.contains(&policy_id) {
            if data.is_new_resource() {
                return Err(ProviderError::new(format!(
                    "Policy {policy_id} is not attached to socket {socket_id}"
                ))
                .for_resource(data.resource_id()));
            }
            data.remove_from_state();
            return Ok(());
        }

        data.set_values([
            ("policy_id", Value::from(policy_id)),
            ("socket_id", Value::from(socket_id)),
        ])
    }

    async fn create(&self, meta: &ProviderMeta, data: &mut ResourceData) -> ProviderResult<()> {
        let policy_id = data.get_string("policy_id").unwrap_or_default();
        let socket_id = data.get_string("socket_id").unwrap_or_default();
        meta.requester()
            .attach_policy_to_socket(&policy_id, &socket_id)
            .await
            .map_err(|e| api_error(data, "attach policy to socket", e))?;
        log::debug!("Attached policy {policy_id} to socket {socket_id}");

        data.set_id(ids::encode([policy_id.as_str(), socket_id.as_str()]));
        self.read(meta, data).await
    }

    async fn update(&self, meta: &ProviderMeta, data: &mut ResourceData) -> ProviderResult<()> {
        // both inputs force replacement
        self.read(meta, data).await
    }

    async fn delete(&self, meta: &ProviderMeta, data: &mut ResourceData) -> ProviderResult<()> {
        let [policy_id, socket_id] = parts(data)?;
        let result = meta
            .requester()
            .remove_policy_from_socket(&policy_id, &socket_id)
            .await;
        deleted(data, result, "remove policy from socket")
    }
}
