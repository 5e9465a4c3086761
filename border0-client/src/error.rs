//! Client error types

use thiserror::Error;

/// Errors returned by a [`Requester`](crate::Requester)
#[derive(Debug, Error)]
pub enum ClientError {
    /// The entity does not exist (HTTP 404)
    #[error("not found: {0}")]
    NotFound(String),

    /// The token was rejected (HTTP 401/403)
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Any other non-success response
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Network or timeout error
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Response body could not be decoded
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The client could not be built from its configuration
    #[error("invalid client configuration: {0}")]
    Configuration(String),
}

impl ClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound(_))
    }

    /// Map a non-success HTTP status and its body to an error
    ///
    /// The platform reports failures as `{"error_message": "..."}`; any
    /// other body is used verbatim.
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| {
                v.get("error_message")
                    .and_then(|m| m.as_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| body.trim().to_string());

        match status {
            404 => ClientError::NotFound(message),
            401 | 403 => ClientError::Unauthorized(message),
            _ => ClientError::Api { status, message },
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
