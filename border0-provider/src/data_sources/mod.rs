//! Data sources
//!
//! Read-only evaluations: policy document generators, which are pure, and
//! name to id lookups against the platform. Each result gets a stable id
//! derived from a checksum of its content.

mod lookup;
mod policy_document;
mod policy_v2_document;

use async_trait::async_trait;
use border0_core::attributes::{Attributes, Block, ResourceData};
use border0_core::provider::ProviderResult;
use border0_core::schema::{AttributeSchema, AttributeType, BlockSchema, ResourceSchema};
use serde::Serialize;

use crate::config::ProviderMeta;

pub use lookup::{GroupNamesToIds, UserEmailsToIds};
pub use policy_document::PolicyDocument;
pub use policy_v2_document::PolicyV2Document;

#[async_trait]
pub trait DataSource: Send + Sync {
    fn schema(&self) -> ResourceSchema;

    /// Compute the outputs and the id from the configuration in `data`
    async fn read(&self, meta: &ProviderMeta, data: &mut ResourceData) -> ProviderResult<()>;
}

/// All data sources
pub fn data_sources() -> Vec<Box<dyn DataSource>> {
    vec![
        Box::new(PolicyDocument),
        Box::new(PolicyV2Document),
        Box::new(GroupNamesToIds),
        Box::new(UserEmailsToIds),
    ]
}

/// Stable non-negative id of a text
///
/// IEEE CRC32 read as a signed 32-bit integer and made non-negative;
/// `i32::MIN` has no absolute value and maps to 0.
pub fn checksum(text: &str) -> String {
    fold(crc32fast::hash(text.as_bytes())).to_string()
}

fn fold(sum: u32) -> i32 {
    (sum as i32).checked_abs().unwrap_or(0)
}

// =============================================================================
// Policy conditions, shared by both document versions
// =============================================================================

#[derive(Debug, Default, Serialize)]
pub(crate) struct Who {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub email: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub group: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub service_account: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub domain: Vec<String>,
}

#[derive(Debug, Default, Serialize)]
pub(crate) struct Where {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub allowed_ip: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub country: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub country_not: Vec<String>,
}

#[derive(Debug, Default, Serialize)]
pub(crate) struct When {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub after: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub before: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub time_of_day_after: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub time_of_day_before: String,
}

#[derive(Debug, Default, Serialize)]
pub(crate) struct Condition {
    pub who: Who,
    #[serde(rename = "where")]
    pub where_: Where,
    pub when: When,
}

/// Sort reverse-lexicographically
pub(crate) fn sorted_desc(mut values: Vec<String>) -> Vec<String> {
    values.sort_by(|a, b| b.cmp(a));
    values
}

fn strings(name: &str) -> AttributeSchema {
    AttributeSchema::new(name, AttributeType::string_list()).optional()
}

fn text(name: &str) -> AttributeSchema {
    AttributeSchema::new(name, AttributeType::String).optional()
}

/// The `condition` block with its `who`, `where` and `when` axes
pub(crate) fn condition_schema() -> AttributeSchema {
    let who = BlockSchema::single()
        .attribute(strings("email"))
        .attribute(strings("group"))
        .attribute(strings("service_account"))
        .attribute(strings("domain"));
    let r#where = BlockSchema::single()
        .attribute(strings("allowed_ip"))
        .attribute(strings("country"))
        .attribute(strings("country_not"));
    let when = BlockSchema::single()
        .attribute(text("after"))
        .attribute(text("before"))
        .attribute(text("time_of_day_after"))
        .attribute(text("time_of_day_before"));

    let condition = BlockSchema::single()
        .attribute(AttributeSchema::new("who", who.into()).optional())
        .attribute(AttributeSchema::new("where", r#where.into()).optional())
        .attribute(AttributeSchema::new("when", when.into()).optional());
    AttributeSchema::new("condition", condition.into()).optional()
}

/// Read the `condition` block; country lists come out sorted
pub(crate) fn condition<A: Attributes + ?Sized>(attrs: &A) -> Condition {
    let Some(condition) = attrs.get_block("condition") else {
        return Condition::default();
    };
    let axis = |name: &str| condition.get_block(name);

    let who = axis("who").map_or_else(Who::default, |b: Block<'_>| Who {
        email: b.get_strings("email"),
        group: b.get_strings("group"),
        service_account: b.get_strings("service_account"),
        domain: b.get_strings("domain"),
    });
    let where_ = axis("where").map_or_else(Where::default, |b| Where {
        allowed_ip: b.get_strings("allowed_ip"),
        country: sorted_desc(b.get_strings("country")),
        country_not: sorted_desc(b.get_strings("country_not")),
    });
    let when = axis("when").map_or_else(When::default, |b| When {
        after: b.get_string("after").unwrap_or_default(),
        before: b.get_string("before").unwrap_or_default(),
        time_of_day_after: b.get_string("time_of_day_after").unwrap_or_default(),
        time_of_day_before: b.get_string("time_of_day_before").unwrap_or_default(),
    });

    Condition { who, where_, when }
}

/// The computed `json` output
pub(crate) fn json_output() -> AttributeSchema {
    AttributeSchema::new("json", AttributeType::String)
        .computed()
        .with_description("The policy document, to be used as policy_data")
}
