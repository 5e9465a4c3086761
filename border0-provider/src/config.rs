//! Provider configuration
//!
//! Each setting is resolved from the provider block first, then from the
//! environment, then from its default.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use border0_client::{ApiClient, ClientError, DEFAULT_API_URL, Requester};
use border0_core::attributes::Attributes;
use border0_core::resource::Value;
use border0_core::schema::{AttributeSchema, AttributeType, ResourceSchema};
use thiserror::Error;

pub const TOKEN_ENV: &str = "BORDER0_TOKEN";
pub const API_URL_ENV: &str = "BORDER0_API";

/// Pause between creating an eventually-consistent entity and reading it back
pub const DEFAULT_READ_AFTER_WRITE_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no API token configured: set `token` in the provider block or {TOKEN_ENV}")]
    MissingToken,

    #[error("read_after_write_delay must not be negative, got {0}")]
    NegativeDelay(i64),

    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Provider block as declared by the user
#[derive(Clone, Default, PartialEq)]
pub struct ProviderConfig {
    pub token: Option<String>,
    pub api_url: Option<String>,
    /// Seconds
    pub read_after_write_delay: Option<i64>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("api_url", &self.api_url)
            .field("read_after_write_delay", &self.read_after_write_delay)
            .finish()
    }
}

/// Schema of the provider block
pub fn schema() -> ResourceSchema {
    ResourceSchema::new("border0")
        .with_description("Border0 provider settings")
        .attribute(
            AttributeSchema::new("token", AttributeType::String)
                .optional()
                .sensitive()
                .with_description(format!(
                    "API token; defaults to the {TOKEN_ENV} environment variable"
                )),
        )
        .attribute(
            AttributeSchema::new("api_url", AttributeType::String)
                .optional()
                .with_description(format!(
                    "API base URL; defaults to {API_URL_ENV}, then {DEFAULT_API_URL}"
                )),
        )
        .attribute(
            AttributeSchema::new("read_after_write_delay", AttributeType::Int)
                .optional()
                .with_description("Seconds to wait before reading back a freshly created token"),
        )
}

impl ProviderConfig {
    pub fn from_attributes(attributes: &HashMap<String, Value>) -> Self {
        Self {
            token: attributes.get_string("token"),
            api_url: attributes.get_string("api_url"),
            read_after_write_delay: attributes.get_int("read_after_write_delay"),
        }
    }

    /// Resolve against the process environment
    pub fn resolve(self) -> Result<ResolvedConfig, ConfigError> {
        self.resolve_with(|name| std::env::var(name).ok())
    }

    pub fn resolve_with<F>(self, env: F) -> Result<ResolvedConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let from_env = |name: &str| env(name).filter(|v| !v.is_empty());

        let token = self
            .token
            .filter(|t| !t.is_empty())
            .or_else(|| from_env(TOKEN_ENV))
            .ok_or(ConfigError::MissingToken)?;
        let api_url = self
            .api_url
            .filter(|u| !u.is_empty())
            .or_else(|| from_env(API_URL_ENV))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let read_after_write_delay = match self.read_after_write_delay {
            Some(secs) if secs < 0 => return Err(ConfigError::NegativeDelay(secs)),
            Some(secs) => Duration::from_secs(secs.unsigned_abs()),
            None => DEFAULT_READ_AFTER_WRITE_DELAY,
        };

        Ok(ResolvedConfig {
            token,
            api_url,
            read_after_write_delay,
        })
    }
}

/// Fully resolved settings
#[derive(Clone, PartialEq)]
pub struct ResolvedConfig {
    pub token: String,
    pub api_url: String,
    pub read_after_write_delay: Duration,
}

impl std::fmt::Debug for ResolvedConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedConfig")
            .field("token", &"<redacted>")
            .field("api_url", &self.api_url)
            .field("read_after_write_delay", &self.read_after_write_delay)
            .finish()
    }
}

impl ResolvedConfig {
    /// Build the API client and the metadata shared by every operation
    pub fn connect(self) -> Result<ProviderMeta, ConfigError> {
        let client = ApiClient::new(&self.api_url, &self.token)?;
        log::info!("Configured Border0 API client for {}", client.base_url());
        Ok(ProviderMeta::new(Arc::new(client), self.read_after_write_delay))
    }
}

/// Configured API access, passed explicitly to every controller
#[derive(Clone)]
pub struct ProviderMeta {
    pub requester: Arc<dyn Requester>,
    pub read_after_write_delay: Duration,
}

impl ProviderMeta {
    pub fn new(requester: Arc<dyn Requester>, read_after_write_delay: Duration) -> Self {
        Self {
            requester,
            read_after_write_delay,
        }
    }

    pub fn requester(&self) -> &dyn Requester {
        self.requester.as_ref()
    }
}

impl std::fmt::Debug for ProviderMeta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderMeta")
            .field("read_after_write_delay", &self.read_after_write_delay)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(vars: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |name| {
            vars.iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn block_wins_over_environment() {
        let config = ProviderConfig {
            token: Some("from-block".to_string()),
            api_url: None,
            read_after_write_delay: Some(0),
        };
        let resolved = config
            .resolve_with(env(&[
                (TOKEN_ENV, "from-env"),
                (API_URL_ENV, "http://localhost:8080/api/v1"),
            ]))
            .unwrap();
        assert_eq!(resolved.token, "from-block");
        assert_eq!(resolved.api_url, "http://localhost:8080/api/v1");
        assert_eq!(resolved.read_after_write_delay, Duration::ZERO);
    }

    #[test]
    fn defaults_apply() {
        let resolved = ProviderConfig::default()
            .resolve_with(env(&[(TOKEN_ENV, "t")]))
            .unwrap();
        assert_eq!(resolved.api_url, DEFAULT_API_URL);
        assert_eq!(resolved.read_after_write_delay, DEFAULT_READ_AFTER_WRITE_DELAY);
    }

    #[test]
    fn missing_token_is_an_error() {
        let err = ProviderConfig::default()
            .resolve_with(env(&[(TOKEN_ENV, "")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingToken));
    }

    #[test]
    fn negative_delay_is_rejected() {
        let config = ProviderConfig {
            token: Some("t".to_string()),
            read_after_write_delay: Some(-1),
            ..Default::default()
        };
        assert!(matches!(
            config.resolve_with(env(&[])),
            Err(ConfigError::NegativeDelay(-1))
        ));
    }

    #[test]
    fn debug_hides_token() {
        let config = ProviderConfig {
            token: Some("secret-token".to_string()),
            ..Default::default()
        };
        assert!(!format!("{config:?}").contains("secret-token"));
        let resolved = config.resolve_with(env(&[])).unwrap();
        assert!(!format!("{resolved:?}").contains("secret-token"));
    }

    #[test]
    fn connect_rejects_bad_url() {
        let resolved = ProviderConfig {
            token: Some("t".to_string()),
            api_url: Some("ftp://example.com".to_string()),
            read_after_write_delay: None,
        }
        .resolve_with(env(&[]))
        .unwrap();
        assert!(matches!(resolved.connect(), Err(ConfigError::Client(_))));
    }
}
