//! Resource controllers
//!
//! One controller per managed entity. A controller turns the host's view of
//! a resource ([`ResourceData`]) into API calls and writes what the platform
//! returns back into it.

mod connector;
mod connector_token;
mod group;
mod policy;
mod policy_attachment;
mod service_account;
mod service_account_token;
mod socket;
mod user;

use std::sync::LazyLock;

use async_trait::async_trait;
use border0_client::{ClientError, ClientResult};
use border0_core::attributes::{Attributes, ResourceData};
use border0_core::provider::{ProviderError, ProviderResult};
use border0_core::resource::Value;
use border0_core::schema::{AttributeType, ResourceSchema};
use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;

use crate::config::ProviderMeta;

pub use connector::ConnectorController;
pub use connector_token::ConnectorTokenController;
pub use group::GroupController;
pub use policy::PolicyController;
pub use policy_attachment::PolicyAttachmentController;
pub use service_account::ServiceAccountController;
pub use service_account_token::ServiceAccountTokenController;
pub use socket::SocketController;
pub use user::UserController;

/// Lifecycle of one resource kind
#[async_trait]
pub trait ResourceController: Send + Sync {
    fn schema(&self) -> ResourceSchema;

    /// Checks beyond the schema, run before any API call
    fn validate(&self, _data: &ResourceData) -> ProviderResult<()> {
        Ok(())
    }

    /// Refresh `data` from the platform
    ///
    /// An entity that is gone is removed from state with a warning, unless
    /// it was created within the same operation.
    async fn read(&self, meta: &ProviderMeta, data: &mut ResourceData) -> ProviderResult<()>;

    async fn create(&self, meta: &ProviderMeta, data: &mut ResourceData) -> ProviderResult<()>;

    async fn update(&self, meta: &ProviderMeta, data: &mut ResourceData) -> ProviderResult<()>;

    /// Delete the entity; an entity that is already gone counts as deleted
    async fn delete(&self, meta: &ProviderMeta, data: &mut ResourceData) -> ProviderResult<()>;

    /// Adopt an existing entity whose identifier is already set on `data`
    async fn import(&self, meta: &ProviderMeta, data: &mut ResourceData) -> ProviderResult<()> {
        self.read(meta, data).await
    }
}

/// All resource controllers
pub fn controllers() -> Vec<Box<dyn ResourceController>> {
    vec![
        Box::new(SocketController),
        Box::new(PolicyController),
        Box::new(PolicyAttachmentController),
        Box::new(ConnectorController),
        Box::new(ConnectorTokenController),
        Box::new(UserController),
        Box::new(GroupController),
        Box::new(ServiceAccountController),
        Box::new(ServiceAccountTokenController),
    ]
}

// =============================================================================
// Shared helpers
// =============================================================================

/// "Failed to {action}" error for the resource, with the client error as cause
pub(crate) fn api_error(data: &ResourceData, action: &str, err: ClientError) -> ProviderError {
    ProviderError::new(format!("Failed to {action}"))
        .for_resource(data.resource_id())
        .with_cause(err)
}

/// Result of a lookup, treating a missing entity as drift
///
/// `Ok(None)` means the entity is gone and `data` has been cleared. Not
/// found while the resource is being created is an error.
pub(crate) fn found<T>(
    data: &mut ResourceData,
    result: ClientResult<T>,
    action: &str,
) -> ProviderResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.is_not_found() && !data.is_new_resource() => {
            data.remove_from_state();
            Ok(None)
        }
        Err(err) => Err(api_error(data, action, err)),
    }
}

static SLUG: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"^[a-z0-9-]+$").ok());

/// Name made of lowercase letters, digits and dashes
pub(crate) fn slug() -> AttributeType {
    AttributeType::Custom {
        name: "Slug".to_string(),
        base: Box::new(AttributeType::String),
        validate: |value| {
            let Value::String(s) = value else {
                return Err("Expected string".to_string());
            };
            if SLUG.as_ref().is_some_and(|pattern| pattern.is_match(s)) {
                Ok(())
            } else {
                Err(format!(
                    "'{s}' must contain only lowercase letters, digits and dashes"
                ))
            }
        },
    }
}

/// Delete result where a missing entity counts as success
pub(crate) fn deleted(
    data: &mut ResourceData,
    result: ClientResult<()>,
    action: &str,
) -> ProviderResult<()> {
    match result {
        Ok(()) => {}
        Err(err) if err.is_not_found() => {
            log::debug!("{} already gone: {}", data.resource_id(), err);
        }
        Err(err) => return Err(api_error(data, action, err)),
    }
    data.clear_id();
    Ok(())
}

/// Configuration error detected before any API call
pub(crate) fn invalid(
    data: &ResourceData,
    cause: impl std::error::Error + Send + Sync + 'static,
) -> ProviderError {
    ProviderError::new(format!("Invalid {} configuration", data.resource_type()))
        .for_resource(data.resource_id())
        .with_cause(cause)
}

/// Parse the configured `expires_at`, if any
pub(crate) fn expires_at(data: &ResourceData) -> ProviderResult<Option<DateTime<Utc>>> {
    data.get_str("expires_at")
        .map(|s| {
            DateTime::parse_from_rfc3339(s)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| invalid(data, e))
        })
        .transpose()
}

/// State value of an expiry returned by the platform
///
/// The configured text is kept when it names the same instant, so an
/// expiry written with an offset does not show up as a change.
pub(crate) fn expires_at_value(data: &ResourceData, upstream: Option<&DateTime<Utc>>) -> Value {
    let Some(upstream) = upstream else {
        return Value::from("");
    };
    match data.get_str("expires_at") {
        Some(text) if DateTime::parse_from_rfc3339(text).is_ok_and(|t| t == *upstream) => {
            Value::from(text)
        }
        _ => Value::from(upstream.to_rfc3339_opts(SecondsFormat::Secs, true)),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use super::*;
    use border0_core::resource::State;
    use border0_core::schema::{AttributeSchema, types};

    fn schema() -> Arc<ResourceSchema> {
        Arc::new(
            ResourceSchema::new("connector_token")
                .attribute(AttributeSchema::new("expires_at", types::timestamp()).optional()),
        )
    }

    fn with_expiry(text: &str) -> ResourceData {
        let mut planned = HashMap::new();
        planned.insert("expires_at".to_string(), Value::from(text));
        ResourceData::for_create(schema(), planned)
    }

    #[test]
    fn expiry_text_kept_for_same_instant() {
        let data = with_expiry("2030-01-01T02:00:00+02:00");
        let upstream = expires_at(&data).unwrap().unwrap();
        assert_eq!(
            upstream.to_rfc3339_opts(SecondsFormat::Secs, true),
            "2030-01-01T00:00:00Z"
        );
        assert_eq!(
            expires_at_value(&data, Some(&upstream)),
            Value::from("2030-01-01T02:00:00+02:00")
        );

        let later = upstream + chrono::Duration::hours(1);
        assert_eq!(
            expires_at_value(&data, Some(&later)),
            Value::from("2030-01-01T01:00:00Z")
        );
    }

    #[test]
    fn not_found_on_new_resource_is_an_error() {
        let mut data = ResourceData::for_create(schema(), HashMap::new());
        data.set_id("t1");
        let err = found::<()>(
            &mut data,
            Err(ClientError::NotFound("gone".to_string())),
            "read connector token",
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "[connector_token.t1] Failed to read connector token: not found: gone"
        );
    }

    #[test]
    fn not_found_on_refresh_is_drift() {
        let state = State::existing("connector_token", HashMap::new()).with_identifier("t1");
        let mut data = ResourceData::from_state(schema(), &state);
        let value = found::<()>(
            &mut data,
            Err(ClientError::NotFound("gone".to_string())),
            "read connector token",
        )
        .unwrap();
        assert!(value.is_none());
        assert!(data.id().is_none());
        assert_eq!(data.warnings().len(), 1);
    }

    #[test]
    fn delete_ignores_not_found() {
        let state = State::existing("connector_token", HashMap::new()).with_identifier("t1");
        let mut data = ResourceData::from_state(schema(), &state);
        deleted(
            &mut data,
            Err(ClientError::NotFound("gone".to_string())),
            "delete connector token",
        )
        .unwrap();
        assert!(data.id().is_none());

        let mut data = ResourceData::from_state(schema(), &state);
        let err = deleted(
            &mut data,
            Err(ClientError::Api {
                status: 500,
                message: "boom".to_string(),
            }),
            "delete connector token",
        )
        .unwrap_err();
        assert!(err.to_string().contains("Failed to delete connector token"));
        assert_eq!(data.id(), Some("t1"));
    }
}
