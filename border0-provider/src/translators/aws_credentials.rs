//! Nested `aws_credentials` block shared by the AWS-backed services

use border0_client::types::AwsCredentials;
use border0_core::attributes::{Attributes, Block, BlockBuilder};
use border0_core::schema::{AttributeSchema, AttributeType, BlockSchema};

use super::secret;

pub const BLOCK: &str = "aws_credentials";

const FIELDS: [&str; 4] = ["access_key_id", "secret_access_key", "session_token", "profile"];

pub fn schema() -> AttributeSchema {
    let block = FIELDS.iter().fold(BlockSchema::single(), |block, field| {
        block.attribute(
            AttributeSchema::new(*field, AttributeType::String)
                .optional()
                .sensitive(),
        )
    });
    AttributeSchema::new(BLOCK, block.into())
        .optional()
        .sensitive()
        .with_description("AWS credentials; the connector's own credentials are used when omitted")
}

/// Credentials declared inside `parent`, if any field is set
pub fn flatten(parent: &Block<'_>) -> Option<AwsCredentials> {
    let block = parent.get_block(BLOCK)?;
    let credentials = AwsCredentials {
        access_key_id: block.get_string("access_key_id"),
        secret_access_key: block.get_string("secret_access_key"),
        session_token: block.get_string("session_token"),
        profile: block.get_string("profile"),
    };
    (credentials != AwsCredentials::default()).then_some(credentials)
}

/// Block for upstream credentials
///
/// Secrets the platform leaves out are taken from the existing block.
pub fn inflate(
    credentials: Option<&AwsCredentials>,
    existing: Option<&Block<'_>>,
) -> Option<BlockBuilder> {
    let credentials = credentials?;
    let existing = existing.and_then(|b| b.get_block(BLOCK));
    let existing = existing.as_ref();

    let block = BlockBuilder::new()
        .opt("access_key_id", credentials.access_key_id.clone())
        .opt(
            "secret_access_key",
            secret(credentials.secret_access_key.as_deref(), existing, "secret_access_key"),
        )
        .opt(
            "session_token",
            secret(credentials.session_token.as_deref(), existing, "session_token"),
        )
        .opt("profile", credentials.profile.clone());
    (block != BlockBuilder::new()).then_some(block)
}
