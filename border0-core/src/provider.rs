//! Provider - Trait abstracting resource operations
//!
//! A Provider exposes a remote platform's entities as declarative resources.
//! The host drives it through Read/Create/Update/Delete/Import and data
//! source reads; planning is done by the differ against the provider's
//! schemas.

use std::future::Future;
use std::pin::Pin;

use crate::diagnostics::Diagnostic;
use crate::resource::{Resource, ResourceId, State};
use crate::schema::ResourceSchema;

/// Error type for Provider operations
#[derive(Debug)]
pub struct ProviderError {
    pub message: String,
    pub resource_id: Option<ResourceId>,
    pub cause: Option<Box<dyn std::error::Error + Send + Sync>>,
    /// Further errors raised while handling this one (e.g., failed cleanup)
    pub related: Vec<ProviderError>,
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref id) = self.resource_id {
            write!(f, "[{}] {}", id, self.message)?;
        } else {
            write!(f, "{}", self.message)?;
        }
        if let Some(ref cause) = self.cause {
            write!(f, ": {}", cause)?;
        }
        for related in &self.related {
            write!(f, "; {}", related)?;
        }
        Ok(())
    }
}

impl std::error::Error for ProviderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|e| e.as_ref() as &dyn std::error::Error)
    }
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            resource_id: None,
            cause: None,
            related: Vec::new(),
        }
    }

    pub fn for_resource(mut self, id: ResourceId) -> Self {
        self.resource_id = Some(id);
        self
    }

    pub fn with_cause(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    pub fn with_related(mut self, related: ProviderError) -> Self {
        self.related.push(related);
        self
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Return type for async operations
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Result of refreshing a resource
#[derive(Debug, Clone, PartialEq)]
pub struct ReadOutcome {
    /// Refreshed state; without identifier when the resource is gone
    pub state: State,
    pub warnings: Vec<Diagnostic>,
}

/// Main Provider trait
///
/// All operations are async and involve side effects against the platform.
pub trait Provider: Send + Sync {
    /// Name of this Provider (e.g., "border0")
    fn name(&self) -> &'static str;

    /// Schemas of the managed resource types
    fn resource_schemas(&self) -> Vec<ResourceSchema>;

    /// Schemas of the data sources
    fn data_source_schemas(&self) -> Vec<ResourceSchema>;

    /// Refresh a stored resource
    ///
    /// A resource deleted out-of-band comes back without identifier and a
    /// warning instead of an error.
    fn read(&self, state: &State) -> BoxFuture<'_, ProviderResult<ReadOutcome>>;

    /// Create a resource from its planned attributes
    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>>;

    /// Update a resource in place
    fn update(&self, from: &State, to: &Resource) -> BoxFuture<'_, ProviderResult<State>>;

    /// Delete a resource; deleting an absent resource succeeds
    fn delete(&self, state: &State) -> BoxFuture<'_, ProviderResult<()>>;

    /// Import an existing resource by its identifier
    fn import(
        &self,
        resource_type: &str,
        identifier: &str,
    ) -> BoxFuture<'_, ProviderResult<ReadOutcome>>;

    /// Evaluate a data source
    fn read_data_source(&self, config: &Resource) -> BoxFuture<'_, ProviderResult<State>>;
}

/// Provider implementation for Box<dyn Provider>
/// This enables dynamic dispatch for Providers
impl Provider for Box<dyn Provider> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn resource_schemas(&self) -> Vec<ResourceSchema> {
        (**self).resource_schemas()
    }

    fn data_source_schemas(&self) -> Vec<ResourceSchema> {
        (**self).data_source_schemas()
    }

    fn read(&self, state: &State) -> BoxFuture<'_, ProviderResult<ReadOutcome>> {
        (**self).read(state)
    }

    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        (**self).create(resource)
    }

    fn update(&self, from: &State, to: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        (**self).update(from, to)
    }

    fn delete(&self, state: &State) -> BoxFuture<'_, ProviderResult<()>> {
        (**self).delete(state)
    }

    fn import(
        &self,
        resource_type: &str,
        identifier: &str,
    ) -> BoxFuture<'_, ProviderResult<ReadOutcome>> {
        (**self).import(resource_type, identifier)
    }

    fn read_data_source(&self, config: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        (**self).read_data_source(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Mock Provider for testing
    struct MockProvider;

    impl Provider for MockProvider {
        fn name(&self) -> &'static str {
            "mock"
        }

        fn resource_schemas(&self) -> Vec<ResourceSchema> {
            vec![]
        }

        fn data_source_schemas(&self) -> Vec<ResourceSchema> {
            vec![]
        }

        fn read(&self, state: &State) -> BoxFuture<'_, ProviderResult<ReadOutcome>> {
            let resource_type = state.resource_type.clone();
            Box::pin(async move {
                Ok(ReadOutcome {
                    state: State::not_found(resource_type),
                    warnings: vec![Diagnostic::warning("gone")],
                })
            })
        }

        fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
            let resource = resource.clone();
            Box::pin(async move {
                Ok(State::existing(resource.resource_type, resource.attributes)
                    .with_identifier("mock-id-123"))
            })
        }

        fn update(&self, from: &State, to: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
            let from = from.clone();
            let attrs = to.attributes.clone();
            Box::pin(async move { Ok(State { attributes: attrs, ..from }) })
        }

        fn delete(&self, _state: &State) -> BoxFuture<'_, ProviderResult<()>> {
            Box::pin(async { Ok(()) })
        }

        fn import(
            &self,
            resource_type: &str,
            identifier: &str,
        ) -> BoxFuture<'_, ProviderResult<ReadOutcome>> {
            let state = State::not_found(resource_type).with_identifier(identifier);
            Box::pin(async move {
                Ok(ReadOutcome {
                    state,
                    warnings: vec![],
                })
            })
        }

        fn read_data_source(&self, config: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
            let config = config.clone();
            Box::pin(async move {
                Err(ProviderError::new("unsupported")
                    .for_resource(ResourceId::new(config.resource_type)))
            })
        }
    }

    #[tokio::test]
    async fn mock_provider_read_returns_not_found() {
        let provider: Box<dyn Provider> = Box::new(MockProvider);
        let state = State::not_found("test").with_identifier("x");
        let outcome = provider.read(&state).await.unwrap();
        assert!(!outcome.state.exists());
        assert_eq!(outcome.warnings.len(), 1);
    }

    #[tokio::test]
    async fn mock_provider_create_returns_existing() {
        let provider = MockProvider;
        let resource = Resource::new("test").with_attribute("name", "example");
        let state = provider.create(&resource).await.unwrap();
        assert!(state.exists());
        assert_eq!(state.identifier, Some("mock-id-123".to_string()));
    }

    #[test]
    fn error_display_includes_resource_and_cause() {
        let err = ProviderError::new("Failed to delete connector")
            .for_resource(ResourceId::new("connector").with_identifier("c1"))
            .with_cause(std::io::Error::other("timeout"));
        assert_eq!(
            err.to_string(),
            "[connector.c1] Failed to delete connector: timeout"
        );
    }
}
