//! Border0 provider implementation
//!
//! The [`Registry`] maps resource and data source kinds to their
//! controllers; [`Border0Provider`] pairs it with the configured API access
//! and implements the host-facing [`Provider`] trait.

use std::collections::HashMap;
use std::sync::Arc;

use border0_core::attributes::ResourceData;
use border0_core::diagnostics::Diagnostic;
use border0_core::differ::{Diff, diff};
use border0_core::provider::{BoxFuture, Provider, ProviderError, ProviderResult, ReadOutcome};
use border0_core::resource::{Resource, ResourceId, State, Value};
use border0_core::schema::ResourceSchema;

use crate::config::{ConfigError, ProviderConfig, ProviderMeta};
use crate::data_sources::{DataSource, data_sources};
use crate::resources::{ResourceController, controllers};

/// Prefix of every kind name at the host boundary
pub const NAME_PREFIX: &str = "border0_";

/// Host-facing name of a kind (`socket` -> `border0_socket`)
pub fn host_name(kind: &str) -> String {
    format!("{NAME_PREFIX}{kind}")
}

/// Kind named by a host-facing name; unprefixed names are accepted as is
pub fn kind_name(name: &str) -> &str {
    name.strip_prefix(NAME_PREFIX).unwrap_or(name)
}

// =============================================================================
// Registry
// =============================================================================

struct ResourceEntry {
    controller: Box<dyn ResourceController>,
    schema: Arc<ResourceSchema>,
}

struct DataSourceEntry {
    source: Box<dyn DataSource>,
    schema: Arc<ResourceSchema>,
}

/// Closed set of resource and data source kinds
pub struct Registry {
    resources: HashMap<String, ResourceEntry>,
    data_sources: HashMap<String, DataSourceEntry>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        let resources = controllers()
            .into_iter()
            .map(|controller| {
                let schema = Arc::new(controller.schema());
                (
                    schema.resource_type.clone(),
                    ResourceEntry { controller, schema },
                )
            })
            .collect();
        let data_sources = data_sources()
            .into_iter()
            .map(|source| {
                let schema = Arc::new(source.schema());
                (
                    schema.resource_type.clone(),
                    DataSourceEntry { source, schema },
                )
            })
            .collect();
        Self {
            resources,
            data_sources,
        }
    }

    fn resource(&self, resource_type: &str) -> ProviderResult<&ResourceEntry> {
        self.resources.get(kind_name(resource_type)).ok_or_else(|| {
            ProviderError::new(format!("Unsupported resource type: {resource_type}"))
        })
    }

    fn data_source(&self, kind: &str) -> ProviderResult<&DataSourceEntry> {
        self.data_sources
            .get(kind_name(kind))
            .ok_or_else(|| ProviderError::new(format!("Unsupported data source: {kind}")))
    }

    /// Schema of a resource kind
    pub fn resource_schema(&self, resource_type: &str) -> ProviderResult<Arc<ResourceSchema>> {
        self.resource(resource_type).map(|entry| entry.schema.clone())
    }

    /// Schema of a data source kind
    pub fn data_source_schema(&self, kind: &str) -> ProviderResult<Arc<ResourceSchema>> {
        self.data_source(kind).map(|entry| entry.schema.clone())
    }

    /// Resource schemas, sorted by kind
    pub fn resource_schemas(&self) -> Vec<ResourceSchema> {
        sorted_schemas(self.resources.values().map(|e| e.schema.as_ref()))
    }

    /// Data source schemas, sorted by kind
    pub fn data_source_schemas(&self) -> Vec<ResourceSchema> {
        sorted_schemas(self.data_sources.values().map(|e| e.schema.as_ref()))
    }

    /// Check a configuration without touching the platform
    ///
    /// Schema errors are reported all at once; the controller's own checks
    /// run only on a configuration that passes the schema.
    pub fn validate_resource(
        &self,
        resource_type: &str,
        config: &HashMap<String, Value>,
    ) -> Vec<Diagnostic> {
        let entry = match self.resource(resource_type) {
            Ok(entry) => entry,
            Err(e) => return e.diagnostics(),
        };

        let id = ResourceId::new(entry.schema.resource_type.clone());
        if let Err(errors) = entry.schema.validate(config) {
            return errors
                .iter()
                .map(|e| {
                    Diagnostic::error(format!("[{id}] Invalid configuration"))
                        .with_detail(e.to_string())
                })
                .collect();
        }

        let data = ResourceData::for_create(entry.schema.clone(), config.clone());
        match entry.controller.validate(&data) {
            Ok(()) => Vec::new(),
            Err(e) => e.diagnostics(),
        }
    }

    /// Plan the change from `current` to `desired`
    pub fn plan_resource(
        &self,
        resource_type: &str,
        desired: Option<&HashMap<String, Value>>,
        current: Option<&State>,
    ) -> ProviderResult<Diff> {
        let entry = self.resource(resource_type)?;
        Ok(diff(&entry.schema, desired, current))
    }
}

fn sorted_schemas<'a>(schemas: impl Iterator<Item = &'a ResourceSchema>) -> Vec<ResourceSchema> {
    let mut schemas: Vec<ResourceSchema> = schemas.cloned().collect();
    schemas.sort_by(|a, b| a.resource_type.cmp(&b.resource_type));
    schemas
}

// =============================================================================
// Provider
// =============================================================================

/// Border0 provider bound to one API client
pub struct Border0Provider {
    registry: Registry,
    meta: ProviderMeta,
}

impl Border0Provider {
    pub fn new(meta: ProviderMeta) -> Self {
        Self {
            registry: Registry::new(),
            meta,
        }
    }

    /// Resolve the provider block against the environment and connect
    pub fn configure(config: ProviderConfig) -> Result<Self, ConfigError> {
        let meta = config.resolve()?.connect()?;
        Ok(Self::new(meta))
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl Provider for Border0Provider {
    fn name(&self) -> &'static str {
        "border0"
    }

    fn resource_schemas(&self) -> Vec<ResourceSchema> {
        self.registry.resource_schemas()
    }

    fn data_source_schemas(&self) -> Vec<ResourceSchema> {
        self.registry.data_source_schemas()
    }

    fn read(&self, state: &State) -> BoxFuture<'_, ProviderResult<ReadOutcome>> {
        let state = state.clone();
        Box::pin(async move {
            let entry = self.registry.resource(&state.resource_type)?;
            if !state.exists() {
                return Ok(ReadOutcome {
                    state,
                    warnings: Vec::new(),
                });
            }

            let mut data = ResourceData::from_state(entry.schema.clone(), &state);
            log::debug!("Reading {}", data.resource_id());
            entry.controller.read(&self.meta, &mut data).await?;
            Ok(data.into_outcome())
        })
    }

    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let resource = resource.clone();
        Box::pin(async move {
            let entry = self.registry.resource(&resource.resource_type)?;
            let mut data = ResourceData::for_create(entry.schema.clone(), resource.attributes);
            entry.controller.validate(&data)?;

            log::debug!("Creating {}", data.resource_id());
            entry.controller.create(&self.meta, &mut data).await?;
            Ok(data.into_state())
        })
    }

    fn update(&self, from: &State, to: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let from = from.clone();
        let to = to.clone();
        Box::pin(async move {
            let entry = self.registry.resource(&to.resource_type)?;
            let id = from
                .identifier
                .clone()
                .filter(|id| !id.is_empty())
                .ok_or_else(|| {
                    ProviderError::new("Cannot update a resource without identifier")
                        .for_resource(from.id())
                })?;
            let mut data =
                ResourceData::for_update(entry.schema.clone(), id, from.attributes, to.attributes);
            entry.controller.validate(&data)?;

            log::debug!("Updating {}", data.resource_id());
            entry.controller.update(&self.meta, &mut data).await?;
            Ok(data.into_state())
        })
    }

    fn delete(&self, state: &State) -> BoxFuture<'_, ProviderResult<()>> {
        let state = state.clone();
        Box::pin(async move {
            let entry = self.registry.resource(&state.resource_type)?;
            if !state.exists() {
                return Ok(());
            }

            let mut data = ResourceData::from_state(entry.schema.clone(), &state);
            log::debug!("Deleting {}", data.resource_id());
            entry.controller.delete(&self.meta, &mut data).await
        })
    }

    fn import(
        &self,
        resource_type: &str,
        identifier: &str,
    ) -> BoxFuture<'_, ProviderResult<ReadOutcome>> {
        let resource_type = kind_name(resource_type).to_string();
        let identifier = identifier.to_string();
        Box::pin(async move {
            let entry = self.registry.resource(&resource_type)?;
            let state = State::not_found(resource_type.clone()).with_identifier(identifier.clone());
            let mut data = ResourceData::from_state(entry.schema.clone(), &state);

            log::debug!("Importing {}", data.resource_id());
            entry.controller.import(&self.meta, &mut data).await?;
            let outcome = data.into_outcome();
            if !outcome.state.exists() {
                return Err(ProviderError::new(format!(
                    "Cannot import non-existent remote object {identifier}"
                ))
                .for_resource(state.id()));
            }
            Ok(outcome)
        })
    }

    fn read_data_source(&self, config: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let config = config.clone();
        Box::pin(async move {
            let entry = self.registry.data_source(&config.resource_type)?;
            let mut data = ResourceData::for_data_source(entry.schema.clone(), config.attributes);
            entry.source.read(&self.meta, &mut data).await?;
            Ok(data.into_state())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockRequester;
    use border0_core::attributes::Attributes;

    fn provider() -> (Arc<MockRequester>, Border0Provider) {
        let mock = MockRequester::new();
        let provider = Border0Provider::new(mock.meta());
        (mock, provider)
    }

    #[test]
    fn registry_is_closed() {
        let registry = Registry::new();
        let kinds: Vec<String> = registry
            .resource_schemas()
            .into_iter()
            .map(|s| s.resource_type)
            .collect();
        assert_eq!(
            kinds,
            vec![
                "connector",
                "connector_token",
                "group",
                "policy",
                "policy_attachment",
                "service_account",
                "service_account_token",
                "socket",
                "user",
            ]
        );
        let sources: Vec<String> = registry
            .data_source_schemas()
            .into_iter()
            .map(|s| s.resource_type)
            .collect();
        assert_eq!(
            sources,
            vec![
                "group_names_to_ids",
                "policy_document",
                "policy_v2_document",
                "user_emails_to_ids",
            ]
        );

        assert!(registry.resource_schema("border0_socket").is_ok());
        assert!(registry.resource_schema("socket").is_ok());
        let err = registry.resource_schema("border0_vpc").unwrap_err();
        assert_eq!(err.to_string(), "Unsupported resource type: border0_vpc");
    }

    #[test]
    fn host_names_are_prefixed() {
        assert_eq!(host_name("socket"), "border0_socket");
        assert_eq!(kind_name("border0_socket"), "socket");
        assert_eq!(kind_name("socket"), "socket");
    }

    #[test]
    fn validation_reports_schema_then_controller_errors() {
        let registry = Registry::new();
        let config = HashMap::from([("socket_type".to_string(), Value::from("ssh"))]);
        let diagnostics = registry.validate_resource("border0_socket", &config);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].summary, "[socket] Invalid configuration");

        let config = HashMap::from([
            ("name".to_string(), Value::from("db")),
            ("socket_type".to_string(), Value::from("database")),
            ("connector_id".to_string(), Value::from("c1")),
        ]);
        let diagnostics = registry.validate_resource("border0_socket", &config);
        assert_eq!(diagnostics[0].summary, "[socket] Invalid socket configuration");
        assert_eq!(
            diagnostics[0].detail.as_deref(),
            Some("database_configuration is required when connector_id is set")
        );
    }

    #[tokio::test]
    async fn lifecycle_through_provider() {
        let (mock, provider) = provider();
        let resource = Resource::new("border0_connector")
            .with_attribute("name", "edge")
            .with_attribute("description", "d");

        let state = provider.create(&resource).await.unwrap();
        assert_eq!(state.resource_type, "connector");
        assert_eq!(state.identifier.as_deref(), Some("id1"));

        let outcome = provider.read(&state).await.unwrap();
        assert_eq!(outcome.state, state);
        assert!(outcome.warnings.is_empty());

        provider.delete(&state).await.unwrap();
        let outcome = provider.read(&state).await.unwrap();
        assert!(!outcome.state.exists());
        assert_eq!(outcome.warnings.len(), 1);
        assert!(mock.state().connectors.is_empty());
    }

    #[tokio::test]
    async fn invalid_members_never_reach_the_platform() {
        let (mock, provider) = provider();
        let resource = Resource::new("border0_group")
            .with_attribute("display_name", "G")
            .with_attribute("members", Value::string_set(["not-a-uuid"]));
        let err = provider.create(&resource).await.unwrap_err();
        assert!(err.to_string().contains("Invalid group member"), "{err}");
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn import_of_missing_object_fails() {
        let (_mock, provider) = provider();
        let err = provider.import("border0_connector", "nope").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "[connector.nope] Cannot import non-existent remote object nope"
        );
    }

    #[tokio::test]
    async fn data_source_through_provider() {
        let (mock, provider) = provider();
        mock.insert_group("admins");
        let config = Resource::new("border0_group_names_to_ids")
            .with_attribute("names", Value::string_set(["admins"]));
        let state = provider.read_data_source(&config).await.unwrap();
        assert!(state.exists());
        assert_eq!(state.attributes.get_strings("ids"), vec!["id1"]);
    }
}
