use async_trait::async_trait;
use border0_core::attributes::{Attributes, Block, ResourceData};
use border0_core::provider::{ProviderError, ProviderResult};
use border0_core::schema::{AttributeSchema, AttributeType, BlockSchema, ResourceSchema, types};
use serde::Serialize;
use serde_json::{Map, Value as Json, json};

use super::{Condition, DataSource, checksum, condition, condition_schema, json_output};
use crate::config::ProviderMeta;

/// Version 2 policy document: per-service permissions plus conditions
pub struct PolicyV2Document;

/// Service kinds that take a permissions block
const SERVICES: [&str; 8] = ["ssh", "database", "http", "kubernetes", "tls", "vnc", "rdp", "vpn"];

/// SSH capabilities, each rendered as an empty object when granted
const SSH_CAPABILITIES: [&str; 5] = [
    "shell",
    "sftp",
    "tcp_forwarding",
    "kubectl_exec",
    "docker_exec",
];

#[derive(Debug, Serialize)]
struct PolicyData {
    permissions: Map<String, Json>,
    condition: Condition,
}

fn flag(name: &str) -> AttributeSchema {
    AttributeSchema::new(name, AttributeType::Bool).with_default(false)
}

fn permissions_block(service: &str) -> BlockSchema {
    let block = BlockSchema::single().attribute(
        AttributeSchema::new("max_session_duration_seconds", types::positive_int()).optional(),
    );
    match service {
        "ssh" => SSH_CAPABILITIES
            .iter()
            .fold(block, |block, name| block.attribute(flag(name)))
            .attribute(flag("exec"))
            .attribute(
                AttributeSchema::new("exec_commands", AttributeType::string_list()).optional(),
            )
            .attribute(
                AttributeSchema::new("allowed_usernames", AttributeType::string_list()).optional(),
            ),
        "database" => {
            let allowed = BlockSchema::new()
                .attribute(AttributeSchema::new("database", AttributeType::String).required())
                .attribute(
                    AttributeSchema::new("allowed_query_types", AttributeType::string_list())
                        .optional(),
                );
            block
                .attribute(AttributeSchema::new("allowed_databases", allowed.into()).optional())
                .attribute(
                    AttributeSchema::new("max_rows_returned", types::positive_int()).optional(),
                )
        }
        _ => block,
    }
}

fn service_permissions(service: &str, block: &Block<'_>) -> Json {
    let mut out = Map::new();
    if let Some(seconds) = block.get_int("max_session_duration_seconds") {
        out.insert("max_session_duration_seconds".to_string(), json!(seconds));
    }

    match service {
        "ssh" => {
            for capability in SSH_CAPABILITIES {
                if block.get_bool_or(capability, false) {
                    out.insert(capability.to_string(), json!({}));
                }
            }
            if block.get_bool_or("exec", false) {
                let commands = block.get_strings("exec_commands");
                let exec = if commands.is_empty() {
                    json!({})
                } else {
                    json!({ "commands": commands })
                };
                out.insert("exec".to_string(), exec);
            }
            let usernames = block.get_strings("allowed_usernames");
            if !usernames.is_empty() {
                out.insert("allowed_usernames".to_string(), json!(usernames));
            }
        }
        "database" => {
            let databases: Vec<Json> = block
                .get_blocks("allowed_databases")
                .iter()
                .map(|db| {
                    json!({
                        "database": db.get_string("database").unwrap_or_default(),
                        "allowed_query_types": db.get_strings("allowed_query_types"),
                    })
                })
                .collect();
            if !databases.is_empty() {
                out.insert("allowed_databases".to_string(), Json::Array(databases));
            }
            if let Some(rows) = block.get_int("max_rows_returned") {
                out.insert("max_rows_returned".to_string(), json!(rows));
            }
        }
        _ => {}
    }

    Json::Object(out)
}

fn render(data: &ResourceData) -> ProviderResult<String> {
    let mut permissions = Map::new();
    if let Some(granted) = data.get_block("permissions") {
        for service in SERVICES {
            if let Some(block) = granted.get_block(service) {
                permissions.insert(service.to_string(), service_permissions(service, &block));
            }
        }
    }

    let document = PolicyData {
        permissions,
        condition: condition(data),
    };
    serde_json::to_string_pretty(&document).map_err(|e| {
        ProviderError::new("Failed to render policy document")
            .for_resource(data.resource_id())
            .with_cause(e)
    })
}

#[async_trait]
impl DataSource for PolicyV2Document {
    fn schema(&self) -> ResourceSchema {
        let permissions = SERVICES.iter().fold(BlockSchema::single(), |block, service| {
            block.attribute(
                AttributeSchema::new(*service, permissions_block(service).into()).optional(),
            )
        });

        ResourceSchema::new("policy_v2_document")
            .with_description("Generates a v2 policy document")
            .attribute(AttributeSchema::new("permissions", permissions.into()).required())
            .attribute(condition_schema())
            .attribute(json_output())
    }

    async fn read(&self, _meta: &ProviderMeta, data: &mut ResourceData) -> ProviderResult<()> {
        let json = render(data)?;
        data.set_id(checksum(&json));
        data.set("json", json)
    }
}
