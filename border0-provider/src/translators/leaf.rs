//! Services whose block maps one-to-one onto the upstream object

use border0_client::types::{
    AwsS3ServiceConfiguration, ElasticsearchServiceConfiguration, HostPort,
    SnowflakeServiceConfiguration, SubnetRouterServiceConfiguration, VpnServiceConfiguration,
};
use border0_core::attributes::{Attributes, Block, BlockBuilder};
use border0_core::schema::{AttributeSchema, AttributeType, types};

use super::{
    TranslateError, TranslateResult, Translator, aws_credentials, required, required_port, secret,
};

fn host_port_schema() -> Vec<AttributeSchema> {
    vec![
        AttributeSchema::new("hostname", AttributeType::String).required(),
        AttributeSchema::new("port", types::port()).required(),
    ]
}

fn flatten_host_port(block: &Block<'_>, context: &str) -> TranslateResult<HostPort> {
    Ok(HostPort {
        hostname: required(block, "hostname", context)?,
        port: required_port(block, "port", context)?,
    })
}

fn inflate_host_port(upstream: &HostPort) -> BlockBuilder {
    BlockBuilder::new()
        .set("hostname", &upstream.hostname)
        .set("port", upstream.port)
}

pub struct Rdp;

impl Translator for Rdp {
    type Upstream = HostPort;

    const BLOCK: &'static str = "rdp_configuration";

    fn schema() -> Vec<AttributeSchema> {
        host_port_schema()
    }

    fn flatten(block: &Block<'_>) -> TranslateResult<HostPort> {
        flatten_host_port(block, "rdp service")
    }

    fn inflate(
        upstream: &HostPort,
        _existing: Option<&Block<'_>>,
    ) -> TranslateResult<BlockBuilder> {
        Ok(inflate_host_port(upstream))
    }
}

pub struct Vnc;

impl Translator for Vnc {
    type Upstream = HostPort;

    const BLOCK: &'static str = "vnc_configuration";

    fn schema() -> Vec<AttributeSchema> {
        host_port_schema()
    }

    fn flatten(block: &Block<'_>) -> TranslateResult<HostPort> {
        flatten_host_port(block, "vnc service")
    }

    fn inflate(
        upstream: &HostPort,
        _existing: Option<&Block<'_>>,
    ) -> TranslateResult<BlockBuilder> {
        Ok(inflate_host_port(upstream))
    }
}

pub struct Vpn;

impl Translator for Vpn {
    type Upstream = VpnServiceConfiguration;

    const BLOCK: &'static str = "vpn_configuration";

    fn schema() -> Vec<AttributeSchema> {
        vec![
            AttributeSchema::new("dhcp_pool_subnet", types::cidr())
                .required()
                .with_description("Subnet client addresses are handed out from"),
            AttributeSchema::new("advertised_routes", AttributeType::Set(Box::new(types::cidr())))
                .optional(),
        ]
    }

    fn flatten(block: &Block<'_>) -> TranslateResult<VpnServiceConfiguration> {
        Ok(VpnServiceConfiguration {
            dhcp_pool_subnet: required(block, "dhcp_pool_subnet", "vpn service")?,
            advertised_routes: block.get_strings("advertised_routes"),
        })
    }

    fn inflate(
        upstream: &VpnServiceConfiguration,
        _existing: Option<&Block<'_>>,
    ) -> TranslateResult<BlockBuilder> {
        Ok(BlockBuilder::new()
            .set("dhcp_pool_subnet", &upstream.dhcp_pool_subnet)
            .string_set("advertised_routes", &upstream.advertised_routes))
    }
}

pub struct SubnetRouter;

impl Translator for SubnetRouter {
    type Upstream = SubnetRouterServiceConfiguration;

    const BLOCK: &'static str = "subnet_router_configuration";

    fn schema() -> Vec<AttributeSchema> {
        vec![
            AttributeSchema::new("ipv4_cidr_ranges", AttributeType::Set(Box::new(types::cidr())))
                .optional(),
            AttributeSchema::new("ipv6_cidr_ranges", AttributeType::Set(Box::new(types::cidr())))
                .optional(),
        ]
    }

    fn flatten(block: &Block<'_>) -> TranslateResult<SubnetRouterServiceConfiguration> {
        let config = SubnetRouterServiceConfiguration {
            ipv4_cidr_ranges: block.get_strings("ipv4_cidr_ranges"),
            ipv6_cidr_ranges: block.get_strings("ipv6_cidr_ranges"),
        };
        if config.ipv4_cidr_ranges.is_empty() && config.ipv6_cidr_ranges.is_empty() {
            return Err(TranslateError::Invalid {
                attribute: "ipv4_cidr_ranges",
                message: "at least one IPv4 or IPv6 range is required".to_string(),
            });
        }
        Ok(config)
    }

    fn inflate(
        upstream: &SubnetRouterServiceConfiguration,
        _existing: Option<&Block<'_>>,
    ) -> TranslateResult<BlockBuilder> {
        Ok(BlockBuilder::new()
            .string_set("ipv4_cidr_ranges", &upstream.ipv4_cidr_ranges)
            .string_set("ipv6_cidr_ranges", &upstream.ipv6_cidr_ranges))
    }
}

pub struct AwsS3;

impl Translator for AwsS3 {
    type Upstream = AwsS3ServiceConfiguration;

    const BLOCK: &'static str = "aws_s3_configuration";

    fn schema() -> Vec<AttributeSchema> {
        vec![
            AttributeSchema::new("bucket", AttributeType::String).required(),
            aws_credentials::schema(),
        ]
    }

    fn flatten(block: &Block<'_>) -> TranslateResult<AwsS3ServiceConfiguration> {
        Ok(AwsS3ServiceConfiguration {
            bucket: required(block, "bucket", "aws_s3 service")?,
            aws_credentials: aws_credentials::flatten(block),
        })
    }

    fn inflate(
        upstream: &AwsS3ServiceConfiguration,
        existing: Option<&Block<'_>>,
    ) -> TranslateResult<BlockBuilder> {
        Ok(BlockBuilder::new().set("bucket", &upstream.bucket).block(
            aws_credentials::BLOCK,
            aws_credentials::inflate(upstream.aws_credentials.as_ref(), existing),
        ))
    }
}

pub struct Snowflake;

impl Translator for Snowflake {
    type Upstream = SnowflakeServiceConfiguration;

    const BLOCK: &'static str = "snowflake_configuration";

    fn schema() -> Vec<AttributeSchema> {
        vec![
            AttributeSchema::new("account", AttributeType::String).required(),
            AttributeSchema::new("username", AttributeType::String).required(),
            AttributeSchema::new("password", AttributeType::String)
                .optional()
                .sensitive(),
        ]
    }

    fn flatten(block: &Block<'_>) -> TranslateResult<SnowflakeServiceConfiguration> {
        Ok(SnowflakeServiceConfiguration {
            account: required(block, "account", "snowflake service")?,
            username: required(block, "username", "snowflake service")?,
            password: block.get_string("password").unwrap_or_default(),
        })
    }

    fn inflate(
        upstream: &SnowflakeServiceConfiguration,
        existing: Option<&Block<'_>>,
    ) -> TranslateResult<BlockBuilder> {
        Ok(BlockBuilder::new()
            .set("account", &upstream.account)
            .set("username", &upstream.username)
            .opt("password", secret(Some(upstream.password.as_str()), existing, "password")))
    }
}

pub struct Elasticsearch;

const ELASTICSEARCH_PROTOCOLS: [&str; 2] = ["http", "https"];
const ELASTICSEARCH_DEFAULT_PROTOCOL: &str = "https";
const ELASTICSEARCH_BASIC_AUTH: &str = "basic";

impl Translator for Elasticsearch {
    type Upstream = ElasticsearchServiceConfiguration;

    const BLOCK: &'static str = "elasticsearch_configuration";

    fn schema() -> Vec<AttributeSchema> {
        vec![
            AttributeSchema::new("protocol", AttributeType::enumeration(&ELASTICSEARCH_PROTOCOLS))
                .with_default(ELASTICSEARCH_DEFAULT_PROTOCOL),
            AttributeSchema::new("hostname", AttributeType::String).required(),
            AttributeSchema::new("port", types::port()).required(),
            AttributeSchema::new(
                "authentication_type",
                AttributeType::enumeration(&[ELASTICSEARCH_BASIC_AUTH]),
            )
            .with_default(ELASTICSEARCH_BASIC_AUTH),
            AttributeSchema::new("username", AttributeType::String).optional(),
            AttributeSchema::new("password", AttributeType::String)
                .optional()
                .sensitive(),
        ]
    }

    fn flatten(block: &Block<'_>) -> TranslateResult<ElasticsearchServiceConfiguration> {
        let context = "elasticsearch service";
        let protocol = block
            .get_str("protocol")
            .unwrap_or(ELASTICSEARCH_DEFAULT_PROTOCOL);
        if !ELASTICSEARCH_PROTOCOLS.contains(&protocol) {
            return Err(TranslateError::Invalid {
                attribute: "protocol",
                message: format!("must be http or https, got {protocol}"),
            });
        }
        let authentication_type = block
            .get_str("authentication_type")
            .unwrap_or(ELASTICSEARCH_BASIC_AUTH);
        if authentication_type != ELASTICSEARCH_BASIC_AUTH {
            return Err(TranslateError::UnsupportedAuthentication {
                context: context.to_string(),
                authentication_type: authentication_type.to_string(),
            });
        }

        Ok(ElasticsearchServiceConfiguration {
            protocol: protocol.to_string(),
            hostname: required(block, "hostname", context)?,
            port: required_port(block, "port", context)?,
            authentication_type: authentication_type.to_string(),
            username: block.get_string("username"),
            password: block.get_string("password"),
        })
    }

    fn inflate(
        upstream: &ElasticsearchServiceConfiguration,
        existing: Option<&Block<'_>>,
    ) -> TranslateResult<BlockBuilder> {
        let protocol = if upstream.protocol.is_empty() {
            ELASTICSEARCH_DEFAULT_PROTOCOL
        } else {
            upstream.protocol.as_str()
        };
        let authentication_type = if upstream.authentication_type.is_empty() {
            ELASTICSEARCH_BASIC_AUTH
        } else {
            upstream.authentication_type.as_str()
        };

        Ok(BlockBuilder::new()
            .set("protocol", protocol)
            .set("hostname", &upstream.hostname)
            .set("port", upstream.port)
            .set("authentication_type", authentication_type)
            .opt("username", upstream.username.as_ref())
            .opt("password", secret(upstream.password.as_deref(), existing, "password")))
    }
}
