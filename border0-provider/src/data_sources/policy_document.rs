use async_trait::async_trait;
use border0_core::attributes::{Attributes, ResourceData};
use border0_core::provider::{ProviderError, ProviderResult};
use border0_core::schema::{AttributeSchema, AttributeType, ResourceSchema};
use serde::Serialize;

use super::{
    Condition, DataSource, checksum, condition, condition_schema, json_output, sorted_desc,
};
use crate::config::ProviderMeta;

/// Version 1 policy document built from action and condition blocks
pub struct PolicyDocument;

#[derive(Debug, Serialize)]
struct PolicyData {
    version: String,
    action: Vec<String>,
    condition: Condition,
}

fn render(data: &ResourceData) -> ProviderResult<String> {
    let document = PolicyData {
        version: data.get_string("version").unwrap_or_else(|| "v1".to_string()),
        action: sorted_desc(data.get_strings("action")),
        condition: condition(data),
    };
    serde_json::to_string_pretty(&document).map_err(|e| {
        ProviderError::new("Failed to render policy document")
            .for_resource(data.resource_id())
            .with_cause(e)
    })
}

#[async_trait]
impl DataSource for PolicyDocument {
    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new("policy_document")
            .with_description("Generates a v1 policy document")
            .attribute(AttributeSchema::new("version", AttributeType::String).with_default("v1"))
            .attribute(
                AttributeSchema::new("action", AttributeType::string_list())
                    .required()
                    .with_description("Allowed actions, e.g. ssh, database, http, tls"),
            )
            .attribute(condition_schema())
            .attribute(json_output())
    }

    async fn read(&self, _meta: &ProviderMeta, data: &mut ResourceData) -> ProviderResult<()> {
        let json = render(data)?;
        data.set_id(checksum(&json));
        data.set("json", json)
    }
}
