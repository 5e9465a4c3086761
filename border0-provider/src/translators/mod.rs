//! Translation between socket configuration blocks and upstream service
//! configuration
//!
//! Every service family has a [`Translator`]: `flatten` turns the declared
//! `<type>_configuration` block into the platform's nested object and
//! `inflate` goes the other way. Both are pure; the socket controller does
//! the I/O around them.

mod aws_credentials;
mod database;
mod http;
mod kubernetes;
mod leaf;
mod ssh;
mod tls;

use std::collections::HashMap;
use std::str::FromStr;

use border0_client::types::{ServiceConfiguration, SocketType, UnknownVariant};
use border0_core::attributes::{Attributes, Block, BlockBuilder};
use border0_core::differ::values_equal;
use border0_core::resource::Value;
use border0_core::schema::{AttributeSchema, BlockSchema};
use thiserror::Error;

pub use database::Database;
pub use http::Http;
pub use kubernetes::Kubernetes;
pub use leaf::{AwsS3, Elasticsearch, Rdp, Snowflake, SubnetRouter, Vnc, Vpn};
pub use ssh::Ssh;
pub use tls::Tls;

/// Errors raised while translating a configuration block
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslateError {
    #[error("got service type {0} but {0} config was not present")]
    MissingConfig(String),

    #[error("attribute \"{attribute}\" is required for {context}")]
    MissingAttribute {
        attribute: &'static str,
        context: String,
    },

    #[error("invalid {attribute}: {message}")]
    Invalid {
        attribute: &'static str,
        message: String,
    },

    #[error("{context} does not support authentication type {authentication_type}")]
    UnsupportedAuthentication {
        context: String,
        authentication_type: String,
    },

    #[error("{attribute} is not valid for {context}")]
    NotApplicable { attribute: String, context: String },

    #[error(transparent)]
    UnknownVariant(#[from] UnknownVariant),
}

pub type TranslateResult<T> = Result<T, TranslateError>;

/// Conversion between one configuration block and its upstream object
pub trait Translator {
    /// Upstream object of this service family
    type Upstream;

    /// Name of the socket attribute holding the block
    const BLOCK: &'static str;

    /// Attributes of the block
    fn schema() -> Vec<AttributeSchema>;

    /// Declarative block to upstream object
    fn flatten(block: &Block<'_>) -> TranslateResult<Self::Upstream>;

    /// Upstream object to declarative block
    ///
    /// `existing` is the block currently held in state, used to keep values
    /// the platform does not echo back or renders differently.
    fn inflate(upstream: &Self::Upstream, existing: Option<&Block<'_>>)
    -> TranslateResult<BlockBuilder>;
}

/// Block attributes naming the selected variant, in reporting order
const VARIANT_ATTRIBUTES: [&str; 4] = [
    "service_type",
    "authentication_type",
    "ssm_target_type",
    "kubectl_exec_target_type",
];

/// Configuration block attribute for a socket type (`None` for exit nodes)
pub fn block_name(socket_type: SocketType) -> Option<&'static str> {
    match socket_type {
        SocketType::Ssh => Some(Ssh::BLOCK),
        SocketType::Database => Some(Database::BLOCK),
        SocketType::Http => Some(Http::BLOCK),
        SocketType::Tls => Some(Tls::BLOCK),
        SocketType::Kubernetes => Some(Kubernetes::BLOCK),
        SocketType::Rdp => Some(Rdp::BLOCK),
        SocketType::Vnc => Some(Vnc::BLOCK),
        SocketType::Vpn => Some(Vpn::BLOCK),
        SocketType::SubnetRouter => Some(SubnetRouter::BLOCK),
        SocketType::AwsS3 => Some(AwsS3::BLOCK),
        SocketType::Snowflake => Some(Snowflake::BLOCK),
        SocketType::Elasticsearch => Some(Elasticsearch::BLOCK),
        SocketType::ExitNode => None,
    }
}

/// All configuration block attribute names, in a fixed order
pub const BLOCK_NAMES: &[&str] = &[
    Ssh::BLOCK,
    Database::BLOCK,
    Http::BLOCK,
    Tls::BLOCK,
    Kubernetes::BLOCK,
    Rdp::BLOCK,
    Vnc::BLOCK,
    Vpn::BLOCK,
    SubnetRouter::BLOCK,
    AwsS3::BLOCK,
    Snowflake::BLOCK,
    Elasticsearch::BLOCK,
];

/// Socket attribute holding the block of translator `T`
pub fn block_attribute<T: Translator>() -> AttributeSchema {
    let block = T::schema()
        .into_iter()
        .fold(BlockSchema::single(), BlockSchema::attribute);
    AttributeSchema::new(T::BLOCK, block.into()).optional()
}

/// Socket attributes of every configuration block
pub fn block_attributes() -> Vec<AttributeSchema> {
    vec![
        block_attribute::<Ssh>(),
        block_attribute::<Database>(),
        block_attribute::<Http>(),
        block_attribute::<Tls>(),
        block_attribute::<Kubernetes>(),
        block_attribute::<Rdp>(),
        block_attribute::<Vnc>(),
        block_attribute::<Vpn>(),
        block_attribute::<SubnetRouter>(),
        block_attribute::<AwsS3>(),
        block_attribute::<Snowflake>(),
        block_attribute::<Elasticsearch>(),
    ]
}

/// Build the upstream configuration of a socket
///
/// Returns `None` when the socket declares no configuration block; the
/// field is then left out of the request.
pub fn flatten<A>(
    socket_type: SocketType,
    attrs: &A,
) -> TranslateResult<Option<ServiceConfiguration>>
where
    A: Attributes + ?Sized,
{
    let mut config = ServiceConfiguration::new(socket_type);
    let present = match socket_type {
        SocketType::Ssh => {
            config.ssh_service_configuration = flatten_block::<Ssh, _>(attrs)?;
            config.ssh_service_configuration.is_some()
        }
        SocketType::Database => {
            config.database_service_configuration = flatten_block::<Database, _>(attrs)?;
            config.database_service_configuration.is_some()
        }
        SocketType::Http => {
            config.http_service_configuration = flatten_block::<Http, _>(attrs)?;
            config.http_service_configuration.is_some()
        }
        SocketType::Tls => {
            config.tls_service_configuration = flatten_block::<Tls, _>(attrs)?;
            config.tls_service_configuration.is_some()
        }
        SocketType::Kubernetes => {
            config.kubernetes_service_configuration = flatten_block::<Kubernetes, _>(attrs)?;
            config.kubernetes_service_configuration.is_some()
        }
        SocketType::Rdp => {
            config.rdp_service_configuration = flatten_block::<Rdp, _>(attrs)?;
            config.rdp_service_configuration.is_some()
        }
        SocketType::Vnc => {
            config.vnc_service_configuration = flatten_block::<Vnc, _>(attrs)?;
            config.vnc_service_configuration.is_some()
        }
        SocketType::Vpn => {
            config.vpn_service_configuration = flatten_block::<Vpn, _>(attrs)?;
            config.vpn_service_configuration.is_some()
        }
        SocketType::SubnetRouter => {
            config.subnet_router_service_configuration =
                flatten_block::<SubnetRouter, _>(attrs)?;
            config.subnet_router_service_configuration.is_some()
        }
        SocketType::AwsS3 => {
            config.aws_s3_service_configuration = flatten_block::<AwsS3, _>(attrs)?;
            config.aws_s3_service_configuration.is_some()
        }
        SocketType::Snowflake => {
            config.snowflake_service_configuration = flatten_block::<Snowflake, _>(attrs)?;
            config.snowflake_service_configuration.is_some()
        }
        SocketType::Elasticsearch => {
            config.elasticsearch_service_configuration =
                flatten_block::<Elasticsearch, _>(attrs)?;
            config.elasticsearch_service_configuration.is_some()
        }
        SocketType::ExitNode => false,
    };

    Ok(present.then_some(config))
}

/// Turn an upstream configuration back into socket block attributes
///
/// The matching block is set; every other block is returned empty so that
/// stale blocks drop out of state.
pub fn inflate<A>(
    config: Option<&ServiceConfiguration>,
    existing: &A,
) -> TranslateResult<Vec<(&'static str, Value)>>
where
    A: Attributes + ?Sized,
{
    let mut values: Vec<(&'static str, Value)> = BLOCK_NAMES
        .iter()
        .map(|name| (*name, Value::List(Vec::new())))
        .collect();

    let Some(config) = config else {
        return Ok(values);
    };

    let service_type = config.service_type.as_str();
    let inflated = match config.service_type {
        SocketType::Ssh => inflate_block::<Ssh, _>(
            config.ssh_service_configuration.as_ref(),
            service_type,
            existing,
        )?,
        SocketType::Database => inflate_block::<Database, _>(
            config.database_service_configuration.as_ref(),
            service_type,
            existing,
        )?,
        SocketType::Http => inflate_block::<Http, _>(
            config.http_service_configuration.as_ref(),
            service_type,
            existing,
        )?,
        SocketType::Tls => inflate_block::<Tls, _>(
            config.tls_service_configuration.as_ref(),
            service_type,
            existing,
        )?,
        SocketType::Kubernetes => inflate_block::<Kubernetes, _>(
            config.kubernetes_service_configuration.as_ref(),
            service_type,
            existing,
        )?,
        SocketType::Rdp => inflate_block::<Rdp, _>(
            config.rdp_service_configuration.as_ref(),
            service_type,
            existing,
        )?,
        SocketType::Vnc => inflate_block::<Vnc, _>(
            config.vnc_service_configuration.as_ref(),
            service_type,
            existing,
        )?,
        SocketType::Vpn => inflate_block::<Vpn, _>(
            config.vpn_service_configuration.as_ref(),
            service_type,
            existing,
        )?,
        SocketType::SubnetRouter => inflate_block::<SubnetRouter, _>(
            config.subnet_router_service_configuration.as_ref(),
            service_type,
            existing,
        )?,
        SocketType::AwsS3 => inflate_block::<AwsS3, _>(
            config.aws_s3_service_configuration.as_ref(),
            service_type,
            existing,
        )?,
        SocketType::Snowflake => inflate_block::<Snowflake, _>(
            config.snowflake_service_configuration.as_ref(),
            service_type,
            existing,
        )?,
        SocketType::Elasticsearch => inflate_block::<Elasticsearch, _>(
            config.elasticsearch_service_configuration.as_ref(),
            service_type,
            existing,
        )?,
        SocketType::ExitNode => return Ok(values),
    };

    if let Some(slot) = values.iter_mut().find(|(name, _)| *name == inflated.0) {
        slot.1 = inflated.1;
    }
    Ok(values)
}

fn flatten_block<T, A>(attrs: &A) -> TranslateResult<Option<T::Upstream>>
where
    T: Translator,
    A: Attributes + ?Sized,
{
    let Some(block) = attrs.get_block(T::BLOCK) else {
        return Ok(None);
    };
    let upstream = T::flatten(&block)?;
    let echoed = T::inflate(&upstream, Some(&block))?.build();
    let computed: Vec<String> = T::schema()
        .into_iter()
        .filter(|attribute| attribute.computed)
        .map(|attribute| attribute.name)
        .collect();
    check_applicable(T::BLOCK, &block, &echoed, &computed)?;
    Ok(Some(upstream))
}

/// Reject declared attributes the selected variant does not carry
///
/// A valid block reads back unchanged; anything the upstream object has no
/// room for would otherwise be dropped on every read. Computed attributes
/// are skipped: a plan may carry them over from a previous variant.
fn check_applicable(
    block_name: &str,
    block: &Block<'_>,
    echoed: &HashMap<String, Value>,
    computed: &[String],
) -> TranslateResult<()> {
    let declared = block.attributes();
    let mut names: Vec<&String> = declared
        .keys()
        .filter(|name| !computed.contains(name))
        .collect();
    names.sort();

    let Some(attribute) = names
        .into_iter()
        .find(|name| !values_equal(declared.get(*name), echoed.get(*name)))
    else {
        return Ok(());
    };

    let variant: Vec<String> = VARIANT_ATTRIBUTES
        .iter()
        .filter(|name| **name != attribute.as_str())
        .filter_map(|name| {
            let value = echoed.get(*name)?.as_str()?;
            Some(format!("{name} {value}"))
        })
        .collect();
    let context = if variant.is_empty() {
        block_name.to_string()
    } else {
        variant.join(" with ")
    };

    Err(TranslateError::NotApplicable {
        attribute: attribute.clone(),
        context,
    })
}

fn inflate_block<T, A>(
    upstream: Option<&T::Upstream>,
    service_type: &str,
    existing: &A,
) -> TranslateResult<(&'static str, Value)>
where
    T: Translator,
    A: Attributes + ?Sized,
{
    let upstream = upstream.ok_or_else(|| TranslateError::MissingConfig(service_type.to_string()))?;
    let existing = existing.get_block(T::BLOCK);
    let block = T::inflate(upstream, existing.as_ref())?;
    Ok((T::BLOCK, block.into_value()))
}

// Block readers shared by the translators

/// Non-empty string attribute that must be present
pub(crate) fn required(
    block: &Block<'_>,
    attribute: &'static str,
    context: &str,
) -> TranslateResult<String> {
    block
        .get_string(attribute)
        .ok_or_else(|| TranslateError::MissingAttribute {
            attribute,
            context: context.to_string(),
        })
}

/// Port attribute that must be present
pub(crate) fn required_port(
    block: &Block<'_>,
    attribute: &'static str,
    context: &str,
) -> TranslateResult<u16> {
    let port = block
        .get_int(attribute)
        .ok_or_else(|| TranslateError::MissingAttribute {
            attribute,
            context: context.to_string(),
        })?;
    u16::try_from(port)
        .ok()
        .filter(|p| *p > 0)
        .ok_or_else(|| TranslateError::Invalid {
            attribute,
            message: format!("port {port} is out of range 1-65535"),
        })
}

/// Discriminator attribute, falling back to `default` when absent
pub(crate) fn discriminator<T>(block: &Block<'_>, attribute: &str, default: T) -> TranslateResult<T>
where
    T: FromStr<Err = UnknownVariant>,
{
    match block.get_str(attribute) {
        Some(value) => Ok(value.parse()?),
        None => Ok(default),
    }
}

/// Secret echoed by the platform, or the one already held in state
pub(crate) fn secret(
    upstream: Option<&str>,
    existing: Option<&Block<'_>>,
    attribute: &str,
) -> Option<String> {
    upstream
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .or_else(|| existing.and_then(|b| b.get_string(attribute)))
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;

    use super::*;
    use border0_client::types::{HostPort, SshServiceType};

    /// Build a socket attribute map holding one configuration block
    pub(crate) fn with_block(name: &str, block: BlockBuilder) -> HashMap<String, Value> {
        let mut attrs = HashMap::new();
        attrs.insert(name.to_string(), block.into_value());
        attrs
    }

    #[test]
    fn flatten_without_block_omits_configuration() {
        let attrs: HashMap<String, Value> = HashMap::new();
        assert_eq!(flatten(SocketType::Http, &attrs).unwrap(), None);
        assert_eq!(flatten(SocketType::ExitNode, &attrs).unwrap(), None);
    }

    #[test]
    fn flatten_dispatches_on_socket_type() {
        let attrs = with_block(
            "rdp_configuration",
            BlockBuilder::new().set("hostname", "10.0.0.5").set("port", 3389i64),
        );
        let config = flatten(SocketType::Rdp, &attrs).unwrap().unwrap();
        assert_eq!(config.service_type, SocketType::Rdp);
        assert_eq!(
            config.rdp_service_configuration,
            Some(HostPort {
                hostname: "10.0.0.5".to_string(),
                port: 3389
            })
        );
        assert!(config.ssh_service_configuration.is_none());
    }

    #[test]
    fn inflate_missing_sub_config_is_an_error() {
        let config = ServiceConfiguration::new(SocketType::Ssh);
        let err = inflate(Some(&config), &HashMap::new()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "got service type ssh but ssh config was not present"
        );
    }

    #[test]
    fn inflate_clears_other_blocks() {
        let mut config = ServiceConfiguration::new(SocketType::Vnc);
        config.vnc_service_configuration = Some(HostPort {
            hostname: "vnc.internal".to_string(),
            port: 5900,
        });
        let values = inflate(Some(&config), &HashMap::new()).unwrap();
        assert_eq!(values.len(), BLOCK_NAMES.len());
        for (name, value) in values {
            if name == "vnc_configuration" {
                assert!(!value.is_empty());
            } else {
                assert!(value.is_empty(), "{name} should be empty");
            }
        }
    }

    #[test]
    fn inflate_without_configuration_clears_everything() {
        let values = inflate(None, &HashMap::new()).unwrap();
        assert!(values.iter().all(|(_, v)| v.is_empty()));
    }

    #[test]
    fn attribute_of_another_variant_is_rejected() {
        let attrs = with_block(
            "ssh_configuration",
            BlockBuilder::new()
                .set("service_type", "standard")
                .set("hostname", "h")
                .set("port", 22i64)
                .set("ec2_instance_id", "i-1"),
        );
        let err = flatten(SocketType::Ssh, &attrs).unwrap_err();
        assert_eq!(
            err,
            TranslateError::NotApplicable {
                attribute: "ec2_instance_id".to_string(),
                context: "service_type standard with authentication_type border0_certificate"
                    .to_string(),
            }
        );
    }

    #[test]
    fn empty_foreign_attribute_is_ignored() {
        let attrs = with_block(
            "ssh_configuration",
            BlockBuilder::new()
                .set("hostname", "h")
                .set("port", 22i64)
                .set("ec2_instance_id", ""),
        );
        assert!(flatten(SocketType::Ssh, &attrs).unwrap().is_some());
    }

    #[test]
    fn connector_flag_needs_cloudsql() {
        let attrs = with_block(
            "database_configuration",
            BlockBuilder::new()
                .set("protocol", "postgres")
                .set("hostname", "db.internal")
                .set("port", 5432i64)
                .set("username", "app")
                .set("password", "s3cret")
                .set("cloudsql_connector_enabled", true),
        );
        let err = flatten(SocketType::Database, &attrs).unwrap_err();
        assert_eq!(
            err.to_string(),
            "cloudsql_connector_enabled is not valid for service_type standard \
             with authentication_type username_and_password"
        );
    }

    #[test]
    fn carried_computed_value_is_tolerated() {
        // planned after switching from aws_ssm to standard
        let attrs = with_block(
            "ssh_configuration",
            BlockBuilder::new()
                .set("service_type", "standard")
                .set("hostname", "h")
                .set("port", 22i64)
                .set("ssm_target_type", "ec2"),
        );
        assert!(flatten(SocketType::Ssh, &attrs).unwrap().is_some());
    }

    #[test]
    fn leaf_block_rejects_unknown_attribute() {
        let attrs = with_block(
            "vnc_configuration",
            BlockBuilder::new()
                .set("hostname", "vnc.internal")
                .set("port", 5900i64)
                .set("username", "admin"),
        );
        let err = flatten(SocketType::Vnc, &attrs).unwrap_err();
        assert_eq!(err.to_string(), "username is not valid for vnc_configuration");
    }

    #[test]
    fn block_names_cover_every_socket_type() {
        for name in SocketType::ALL {
            let socket_type: SocketType = name.parse().unwrap();
            match block_name(socket_type) {
                Some(block) => assert!(BLOCK_NAMES.contains(&block)),
                None => assert_eq!(socket_type, SocketType::ExitNode),
            }
        }
        // nested discriminators share the same parsing rules
        assert!("docker_exec".parse::<SshServiceType>().is_ok());
    }
}
