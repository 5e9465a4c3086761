//! Request dispatch for one plugin session
//!
//! Schema, validation and planning work before `configure`; everything that
//! talks to the platform needs a configured provider.

use std::collections::HashMap;
use std::sync::Arc;

use border0_core::diagnostics::Diagnostic;
use border0_core::differ::Diff;
use border0_core::provider::{Provider, ProviderError, ReadOutcome};
use border0_core::resource::{Resource, ResourceId, State, Value};
use border0_core::schema::{ResourceSchema, TypeError, encode_attributes};
use border0_provider::{Border0Provider, ProviderConfig, Registry, config, host_name, kind_name};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value as Json, json};

use crate::protocol::{Request, Response, WireState, decode_object};

type Handled = Result<Response, Vec<Diagnostic>>;

#[derive(Deserialize)]
struct ConfigureParams {
    #[serde(default)]
    config: Json,
}

#[derive(Deserialize)]
struct ConfigParams {
    type_name: String,
    #[serde(default)]
    config: Json,
}

#[derive(Deserialize)]
struct PlanParams {
    type_name: String,
    #[serde(default)]
    config: Option<Json>,
    #[serde(default)]
    prior: Option<WireState>,
}

#[derive(Deserialize)]
struct ApplyParams {
    type_name: String,
    #[serde(default)]
    prior: Option<WireState>,
    #[serde(default)]
    planned: Option<Json>,
}

#[derive(Deserialize)]
struct StateParams {
    type_name: String,
    state: WireState,
}

#[derive(Deserialize)]
struct ImportParams {
    type_name: String,
    id: String,
}

pub struct Session {
    registry: Registry,
    provider: Option<Border0Provider>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            provider: None,
        }
    }

    /// Answer one request line; never fails, errors become diagnostics
    pub async fn handle_line(&mut self, line: &str) -> Response {
        let request: Request = match serde_json::from_str(line) {
            Ok(request) => request,
            Err(e) => {
                return Response::failed(vec![
                    Diagnostic::error("Malformed request").with_detail(e.to_string()),
                ]);
            }
        };

        let id = request.id.clone();
        log::debug!("Handling {}", request.method);
        let mut response = self.handle(request).await.unwrap_or_else(Response::failed);
        response.id = id;
        response
    }

    async fn handle(&mut self, request: Request) -> Handled {
        match request.method.as_str() {
            "get_schema" => Ok(self.get_schema()),
            "configure" => self.configure(params(request.params)?),
            "validate_resource" => self.validate_resource(params(request.params)?),
            "plan_resource" => self.plan_resource(params(request.params)?),
            "apply_resource" => self.apply_resource(params(request.params)?).await,
            "read_resource" => self.read_resource(params(request.params)?).await,
            "import_resource" => self.import_resource(params(request.params)?).await,
            "read_data_source" => self.read_data_source(params(request.params)?).await,
            other => Err(vec![Diagnostic::error(format!("Unknown method: {other}"))]),
        }
    }

    fn provider(&self) -> Result<&Border0Provider, Vec<Diagnostic>> {
        self.provider
            .as_ref()
            .ok_or_else(|| vec![Diagnostic::error("Provider is not configured")])
    }

    fn resource_schema(&self, type_name: &str) -> Result<Arc<ResourceSchema>, Vec<Diagnostic>> {
        self.registry
            .resource_schema(kind_name(type_name))
            .map_err(|e| e.diagnostics())
    }

    // =========================================================================
    // Methods
    // =========================================================================

    /// Provider block, resource and data source schemas keyed by host name
    pub fn schema(&self) -> Json {
        json!({
            "provider": config::schema().to_json(),
            "resources": schemas_json(self.registry.resource_schemas()),
            "data_sources": schemas_json(self.registry.data_source_schemas()),
        })
    }

    fn get_schema(&self) -> Response {
        let Json::Object(payload) = self.schema() else {
            return Response::default();
        };
        Response {
            payload,
            ..Response::default()
        }
    }

    fn configure(&mut self, params: ConfigureParams) -> Handled {
        let attributes =
            decode_object(&config::schema(), &params.config).map_err(invalid("provider"))?;
        let provider = Border0Provider::configure(ProviderConfig::from_attributes(&attributes))
            .map_err(|e| {
                vec![Diagnostic::error("Failed to configure provider").with_detail(e.to_string())]
            })?;
        self.provider = Some(provider);
        Ok(Response::default())
    }

    fn validate_resource(&self, params: ConfigParams) -> Handled {
        let schema = self.resource_schema(&params.type_name)?;
        let attributes =
            decode_object(&schema, &params.config).map_err(invalid(&schema.resource_type))?;
        Ok(Response::default()
            .with_diagnostics(self.registry.validate_resource(&schema.resource_type, &attributes)))
    }

    fn plan_resource(&self, params: PlanParams) -> Handled {
        let schema = self.resource_schema(&params.type_name)?;
        let desired = params
            .config
            .filter(|config| !config.is_null())
            .map(|config| decode_object(&schema, &config))
            .transpose()
            .map_err(invalid(&schema.resource_type))?;
        let prior = params
            .prior
            .map(|prior| prior.into_state(&schema))
            .transpose()
            .map_err(invalid(&schema.resource_type))?;

        let plan = self
            .registry
            .plan_resource(&schema.resource_type, desired.as_ref(), prior.as_ref())
            .map_err(|e| e.diagnostics())?;
        Ok(plan_response(&plan))
    }

    async fn apply_resource(&self, params: ApplyParams) -> Handled {
        let provider = self.provider()?;
        let schema = self.resource_schema(&params.type_name)?;
        let prior = params
            .prior
            .map(|prior| prior.into_state(&schema))
            .transpose()
            .map_err(invalid(&schema.resource_type))?
            .filter(State::exists);
        let planned = params
            .planned
            .filter(|planned| !planned.is_null())
            .map(|planned| decode_object(&schema, &planned))
            .transpose()
            .map_err(invalid(&schema.resource_type))?
            .map(|attributes| Resource {
                resource_type: schema.resource_type.clone(),
                attributes,
            });

        let state = match (prior, planned) {
            (None, Some(planned)) => provider.create(&planned).await,
            (Some(prior), Some(planned)) => provider.update(&prior, &planned).await,
            (Some(prior), None) => provider
                .delete(&prior)
                .await
                .map(|()| State::not_found(schema.resource_type.clone())),
            (None, None) => Ok(State::not_found(schema.resource_type.clone())),
        }
        .map_err(|e| e.diagnostics())?;

        Ok(state_response(&state))
    }

    async fn read_resource(&self, params: StateParams) -> Handled {
        let provider = self.provider()?;
        let schema = self.resource_schema(&params.type_name)?;
        let state = params
            .state
            .into_state(&schema)
            .map_err(invalid(&schema.resource_type))?;
        outcome_response(provider.read(&state).await)
    }

    async fn import_resource(&self, params: ImportParams) -> Handled {
        let provider = self.provider()?;
        outcome_response(provider.import(&params.type_name, &params.id).await)
    }

    async fn read_data_source(&self, params: ConfigParams) -> Handled {
        let provider = self.provider()?;
        let schema = self
            .registry
            .data_source_schema(kind_name(&params.type_name))
            .map_err(|e| e.diagnostics())?;
        let attributes =
            decode_object(&schema, &params.config).map_err(invalid(&schema.resource_type))?;

        let config = Resource {
            resource_type: schema.resource_type.clone(),
            attributes,
        };
        let state = provider
            .read_data_source(&config)
            .await
            .map_err(|e| e.diagnostics())?;
        Ok(state_response(&state))
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn params<T: DeserializeOwned>(params: Json) -> Result<T, Vec<Diagnostic>> {
    serde_json::from_value(params).map_err(|e| {
        vec![Diagnostic::error("Invalid request parameters").with_detail(e.to_string())]
    })
}

fn invalid(kind: &str) -> impl Fn(TypeError) -> Vec<Diagnostic> + '_ {
    move |e| {
        vec![
            Diagnostic::error(format!("[{}] Invalid configuration", ResourceId::new(kind)))
                .with_detail(e.to_string()),
        ]
    }
}

fn schemas_json(schemas: Vec<ResourceSchema>) -> Json {
    Json::Object(
        schemas
            .into_iter()
            .map(|schema| (host_name(&schema.resource_type), schema.to_json()))
            .collect(),
    )
}

fn attributes_json(attributes: Option<&HashMap<String, Value>>) -> Json {
    attributes.map_or(Json::Null, encode_attributes)
}

fn plan_response(plan: &Diff) -> Response {
    let (changed, replace) = match plan {
        Diff::Update {
            changed_attributes, ..
        } => (changed_attributes.clone(), Vec::new()),
        Diff::Replace {
            changed_attributes,
            requires_replace,
            ..
        } => (changed_attributes.clone(), requires_replace.clone()),
        _ => (Vec::new(), Vec::new()),
    };
    Response::default()
        .with("action", plan.action())
        .with("planned", attributes_json(plan.planned()))
        .with("changed_attributes", changed)
        .with("requires_replace", replace)
}

fn state_json(state: &State) -> Json {
    let wire = WireState::from_state(state);
    json!({ "id": wire.id, "attributes": wire.attributes })
}

fn state_response(state: &State) -> Response {
    Response::default().with("state", state_json(state))
}

fn outcome_response(outcome: Result<ReadOutcome, ProviderError>) -> Handled {
    let outcome = outcome.map_err(|e| e.diagnostics())?;
    Ok(state_response(&outcome.state).with_diagnostics(outcome.warnings))
}
