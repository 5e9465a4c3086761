//! Wire format of the plugin protocol
//!
//! One JSON object per line in each direction. A request names a `method`
//! and carries its `params`; the response echoes the request `id`, carries
//! the method's payload fields and always a `diagnostics` array.

use std::collections::HashMap;

use border0_core::diagnostics::Diagnostic;
use border0_core::resource::{State, Value};
use border0_core::schema::{ResourceSchema, TypeError, encode_attributes};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};

/// First line written on stdout once the plugin is ready
pub const HANDSHAKE: &str = "BORDER0_PROVIDER|1|stdio";

#[derive(Debug, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub id: Option<Json>,
    pub method: String,
    #[serde(default)]
    pub params: Json,
}

#[derive(Debug, Default, Serialize)]
pub struct Response {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Json>,
    #[serde(flatten)]
    pub payload: Map<String, Json>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Response {
    pub fn failed(diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            diagnostics,
            ..Self::default()
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<Json>) -> Self {
        self.payload.insert(key.to_string(), value.into());
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: Vec<Diagnostic>) -> Self {
        self.diagnostics.extend(diagnostics);
        self
    }
}

/// Stored state as the host sends and receives it
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct WireState {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default = "empty_object")]
    pub attributes: Json,
}

fn empty_object() -> Json {
    Json::Object(Map::new())
}

impl WireState {
    pub fn from_state(state: &State) -> Self {
        Self {
            id: state.identifier.clone().filter(|id| !id.is_empty()),
            attributes: encode_attributes(&state.attributes),
        }
    }

    pub fn into_state(self, schema: &ResourceSchema) -> Result<State, TypeError> {
        let attributes = decode_object(schema, &self.attributes)?;
        let state = State::existing(schema.resource_type.clone(), attributes);
        Ok(match self.id {
            Some(id) if !id.is_empty() => state.with_identifier(id),
            _ => state,
        })
    }
}

/// Decode a host object, treating `null` as an empty configuration
pub fn decode_object(
    schema: &ResourceSchema,
    json: &Json,
) -> Result<HashMap<String, Value>, TypeError> {
    if json.is_null() {
        return Ok(HashMap::new());
    }
    schema.decode(json)
}
