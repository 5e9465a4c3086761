//! Sockets and their service configuration blocks
//!
//! A socket declares at most one `<type>_configuration` block, the one
//! matching its `socket_type`. The block is translated to and from the
//! platform's upstream configuration by [`crate::translators`].

use async_trait::async_trait;
use border0_client::types::{Socket, SocketType};
use border0_core::attributes::{Attributes, ResourceData};
use border0_core::provider::{ProviderError, ProviderResult};
use border0_core::resource::Value;
use border0_core::schema::{AttributeSchema, AttributeType, ResourceSchema};
use thiserror::Error;

use super::{ResourceController, api_error, deleted, found, invalid};
use crate::config::ProviderMeta;
use crate::translators::{self, BLOCK_NAMES};

/// Attributes sent with every socket create or update
const SOCKET_FIELDS: [&str; 6] = [
    "name",
    "description",
    "recording_enabled",
    "connector_authentication_enabled",
    "tags",
    "connector_id",
];

#[derive(Debug, Error)]
enum SocketConfigError {
    #[error("{block} cannot be used with socket type {socket_type}")]
    UnexpectedBlock {
        block: &'static str,
        socket_type: SocketType,
    },

    #[error("{block} is required when connector_id is set")]
    MissingBlock { block: &'static str },
}

pub struct SocketController;

fn socket_type(data: &ResourceData) -> ProviderResult<SocketType> {
    data.get_str("socket_type")
        .unwrap_or_default()
        .parse()
        .map_err(|e| invalid(data, e))
}

fn socket_from(data: &ResourceData) -> ProviderResult<Socket> {
    let socket_type = socket_type(data)?;
    let upstream_configuration =
        translators::flatten(socket_type, data).map_err(|e| invalid(data, e))?;
    Ok(Socket {
        socket_id: data.id().unwrap_or_default().to_string(),
        name: data.get_string("name").unwrap_or_default(),
        socket_type,
        description: data.get_string("description").unwrap_or_default(),
        recording_enabled: data.get_bool_or("recording_enabled", false),
        connector_authentication_enabled: data
            .get_bool_or("connector_authentication_enabled", false),
        tags: data.get_string_map("tags"),
        connector_id: data.get_string("connector_id"),
        upstream_configuration,
    })
}

#[async_trait]
impl ResourceController for SocketController {
    fn schema(&self) -> ResourceSchema {
        let schema = ResourceSchema::new("socket")
            .with_description("An access endpoint to an upstream service")
            .attribute(AttributeSchema::new("name", AttributeType::String).required())
            .attribute(
                AttributeSchema::new("socket_type", AttributeType::enumeration(SocketType::ALL))
                    .required()
                    .force_new(),
            )
            .attribute(AttributeSchema::new("description", AttributeType::String).optional())
            .attribute(
                AttributeSchema::new("recording_enabled", AttributeType::Bool).with_default(false),
            )
            .attribute(
                AttributeSchema::new("connector_authentication_enabled", AttributeType::Bool)
                    .with_default(false),
            )
            .attribute(AttributeSchema::new("tags", AttributeType::string_map()).optional())
            .attribute(
                AttributeSchema::new("connector_id", AttributeType::String)
                    .optional()
                    .with_description("Connector serving this socket"),
            );

        translators::block_attributes()
            .into_iter()
            .fold(schema, ResourceSchema::attribute)
    }

    fn validate(&self, data: &ResourceData) -> ProviderResult<()> {
        let socket_type = socket_type(data)?;
        let expected = translators::block_name(socket_type);

        for &block in BLOCK_NAMES {
            if Some(block) != expected && data.get_block(block).is_some() {
                return Err(invalid(
                    data,
                    SocketConfigError::UnexpectedBlock { block, socket_type },
                ));
            }
        }

        if let Some(block) = expected
            && data.get_str("connector_id").is_some()
            && data.get_block(block).is_none()
        {
            return Err(invalid(data, SocketConfigError::MissingBlock { block }));
        }

        translators::flatten(socket_type, data).map_err(|e| invalid(data, e))?;
        Ok(())
    }

    async fn read(&self, meta: &ProviderMeta, data: &mut ResourceData) -> ProviderResult<()> {
        let id = data.require_id()?.to_string();
        let result = meta.requester().socket(&id).await;
        let Some(socket) = found(data, result, "read socket")? else {
            return Ok(());
        };

        let blocks = translators::inflate(socket.upstream_configuration.as_ref(), &*data)
            .map_err(|e| {
                ProviderError::new("Failed to read socket configuration")
                    .for_resource(data.resource_id())
                    .with_cause(e)
            })?;

        data.set_values(
            [
                ("name", Value::from(socket.name)),
                ("socket_type", Value::from(socket.socket_type.as_str())),
                ("description", Value::from(socket.description)),
                ("recording_enabled", Value::Bool(socket.recording_enabled)),
                (
                    "connector_authentication_enabled",
                    Value::Bool(socket.connector_authentication_enabled),
                ),
                ("tags", Value::string_map(socket.tags)),
                ("connector_id", Value::from(socket.connector_id.unwrap_or_default())),
            ]
            .into_iter()
            .chain(blocks),
        )
    }

    async fn create(&self, meta: &ProviderMeta, data: &mut ResourceData) -> ProviderResult<()> {
        let socket = socket_from(data)?;
        let created = meta
            .requester()
            .create_socket(&socket)
            .await
            .map_err(|e| api_error(data, "create socket", e))?;
        log::debug!("Created {} socket {}", created.socket_type, created.socket_id);

        data.set_id(created.socket_id);
        self.read(meta, data).await
    }

    async fn update(&self, meta: &ProviderMeta, data: &mut ResourceData) -> ProviderResult<()> {
        if data.has_changes(&SOCKET_FIELDS) || data.has_changes(BLOCK_NAMES) {
            let socket = socket_from(data)?;
            meta.requester()
                .update_socket(&socket)
                .await
                .map_err(|e| api_error(data, "update socket", e))?;
        }
        self.read(meta, data).await
    }

    async fn delete(&self, meta: &ProviderMeta, data: &mut ResourceData) -> ProviderResult<()> {
        let id = data.require_id()?.to_string();
        let result = meta.requester().delete_socket(&id).await;
        deleted(data, result, "delete socket")
    }
}
