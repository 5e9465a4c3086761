//! TLS sockets

use border0_client::types::{
    HostPort, HttpProxyTlsServiceConfiguration, TlsServiceConfiguration, TlsServiceType,
    VpnTlsServiceConfiguration,
};
use border0_core::attributes::{Attributes, Block, BlockBuilder};
use border0_core::schema::{AttributeSchema, AttributeType, types};

use super::{TranslateError, TranslateResult, Translator, discriminator, required, required_port};

pub struct Tls;

impl Translator for Tls {
    type Upstream = TlsServiceConfiguration;

    const BLOCK: &'static str = "tls_configuration";

    fn schema() -> Vec<AttributeSchema> {
        vec![
            AttributeSchema::new("service_type", AttributeType::enumeration(TlsServiceType::ALL))
                .with_default(TlsServiceType::Standard.as_str()),
            AttributeSchema::new("hostname", AttributeType::String).optional(),
            AttributeSchema::new("port", types::port()).optional(),
            AttributeSchema::new("vpn_subnet", types::cidr()).optional(),
            AttributeSchema::new("routes", AttributeType::Set(Box::new(types::cidr()))).optional(),
            AttributeSchema::new("host_allowlist", AttributeType::string_set()).optional(),
        ]
    }

    fn flatten(block: &Block<'_>) -> TranslateResult<TlsServiceConfiguration> {
        let service_type = discriminator(block, "service_type", TlsServiceType::Standard)?;
        let context = format!("tls service type {service_type}");
        let mut config = TlsServiceConfiguration {
            tls_service_type: service_type,
            standard_tls_service_configuration: None,
            vpn_tls_service_configuration: None,
            http_proxy_tls_service_configuration: None,
        };

        match service_type {
            TlsServiceType::Standard => {
                config.standard_tls_service_configuration = Some(HostPort {
                    hostname: required(block, "hostname", &context)?,
                    port: required_port(block, "port", &context)?,
                });
            }
            TlsServiceType::Vpn => {
                config.vpn_tls_service_configuration = Some(VpnTlsServiceConfiguration {
                    vpn_subnet: required(block, "vpn_subnet", &context)?,
                    routes: block.get_strings("routes"),
                });
            }
            TlsServiceType::HttpProxy => {
                config.http_proxy_tls_service_configuration =
                    Some(HttpProxyTlsServiceConfiguration {
                        host_allowlist: block.get_strings("host_allowlist"),
                    });
            }
        }

        Ok(config)
    }

    fn inflate(
        upstream: &TlsServiceConfiguration,
        _existing: Option<&Block<'_>>,
    ) -> TranslateResult<BlockBuilder> {
        let service_type = upstream.tls_service_type;
        let missing = || TranslateError::MissingConfig(service_type.to_string());
        let block = BlockBuilder::new().set("service_type", service_type.as_str());

        let block = match service_type {
            TlsServiceType::Standard => {
                let standard = upstream
                    .standard_tls_service_configuration
                    .as_ref()
                    .ok_or_else(missing)?;
                block
                    .set("hostname", &standard.hostname)
                    .set("port", standard.port)
            }
            TlsServiceType::Vpn => {
                let vpn = upstream
                    .vpn_tls_service_configuration
                    .as_ref()
                    .ok_or_else(missing)?;
                block
                    .set("vpn_subnet", &vpn.vpn_subnet)
                    .string_set("routes", &vpn.routes)
            }
            TlsServiceType::HttpProxy => {
                let proxy = upstream
                    .http_proxy_tls_service_configuration
                    .as_ref()
                    .ok_or_else(missing)?;
                block.string_set("host_allowlist", &proxy.host_allowlist)
            }
        };

        Ok(block)
    }
}
