//! HTTP sockets
//!
//! The standard service is declared as a single `upstream_url`; the
//! platform stores hostname and port.

use border0_client::types::{
    FileServerHttpServiceConfiguration, HttpServiceConfiguration, HttpServiceType,
    StandardHttpServiceConfiguration,
};
use border0_core::attributes::{Attributes, Block, BlockBuilder};
use border0_core::schema::{AttributeSchema, AttributeType};
use url::Url;

use super::{TranslateError, TranslateResult, Translator, discriminator, required};

pub struct Http;

/// Hostname and port an upstream URL points to
fn resolve(upstream_url: &str) -> TranslateResult<(String, u16)> {
    let invalid = |message: String| TranslateError::Invalid {
        attribute: "upstream_url",
        message,
    };

    let url = Url::parse(upstream_url).map_err(|e| invalid(format!("{upstream_url}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!(
            "{upstream_url}: scheme must be http or https, got {}",
            url.scheme()
        )));
    }
    let host = url
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| invalid(format!("{upstream_url}: missing host")))?;
    let port = url
        .port_or_known_default()
        .ok_or_else(|| invalid(format!("{upstream_url}: missing port")))?;

    let host = host.trim_start_matches('[').trim_end_matches(']');
    Ok((host.to_string(), port))
}

/// URL for a hostname and port, omitting the scheme's default port
fn render(hostname: &str, port: u16) -> String {
    let scheme = if port == 443 { "https" } else { "http" };
    let host = if hostname.contains(':') {
        format!("[{hostname}]")
    } else {
        hostname.to_string()
    };
    match (scheme, port) {
        ("https", 443) | ("http", 80) => format!("{scheme}://{host}"),
        _ => format!("{scheme}://{host}:{port}"),
    }
}

impl Translator for Http {
    type Upstream = HttpServiceConfiguration;

    const BLOCK: &'static str = "http_configuration";

    fn schema() -> Vec<AttributeSchema> {
        vec![
            AttributeSchema::new("service_type", AttributeType::enumeration(HttpServiceType::ALL))
                .with_default(HttpServiceType::Standard.as_str()),
            AttributeSchema::new("upstream_url", AttributeType::String)
                .optional()
                .with_description("URL of the upstream service, e.g. https://app.internal:8443"),
            AttributeSchema::new("host_header", AttributeType::String).optional(),
            AttributeSchema::new("file_server_directory", AttributeType::String)
                .optional()
                .with_description("Directory served by the connector file server"),
        ]
    }

    fn flatten(block: &Block<'_>) -> TranslateResult<HttpServiceConfiguration> {
        let service_type = discriminator(block, "service_type", HttpServiceType::Standard)?;
        let mut config = HttpServiceConfiguration {
            http_service_type: service_type,
            standard_http_service_configuration: None,
            file_server_http_service_configuration: None,
        };

        match service_type {
            HttpServiceType::Standard => {
                let upstream_url = required(block, "upstream_url", "http service type standard")?;
                let (hostname, port) = resolve(&upstream_url)?;
                config.standard_http_service_configuration = Some(StandardHttpServiceConfiguration {
                    hostname,
                    port,
                    host_header: block.get_string("host_header"),
                });
            }
            HttpServiceType::ConnectorFileServer => {
                config.file_server_http_service_configuration =
                    Some(FileServerHttpServiceConfiguration {
                        top_level_directory: block
                            .get_string("file_server_directory")
                            .unwrap_or_default(),
                    });
            }
        }

        Ok(config)
    }

    fn inflate(
        upstream: &HttpServiceConfiguration,
        existing: Option<&Block<'_>>,
    ) -> TranslateResult<BlockBuilder> {
        let service_type = upstream.http_service_type;
        let missing = || TranslateError::MissingConfig(service_type.to_string());
        let block = BlockBuilder::new().set("service_type", service_type.as_str());

        let block = match service_type {
            HttpServiceType::Standard => {
                let standard = upstream
                    .standard_http_service_configuration
                    .as_ref()
                    .ok_or_else(missing)?;
                let same_target = |url: &&str| {
                    resolve(url).is_ok_and(|(host, port)| {
                        host.eq_ignore_ascii_case(&standard.hostname) && port == standard.port
                    })
                };
                let upstream_url = existing
                    .and_then(|b| b.get_str("upstream_url"))
                    .filter(same_target)
                    .map(str::to_string)
                    .unwrap_or_else(|| render(&standard.hostname, standard.port));
                block
                    .set("upstream_url", upstream_url)
                    .opt("host_header", standard.host_header.as_ref())
            }
            HttpServiceType::ConnectorFileServer => {
                let file_server = upstream
                    .file_server_http_service_configuration
                    .as_ref()
                    .ok_or_else(missing)?;
                block.set("file_server_directory", &file_server.top_level_directory)
            }
        };

        Ok(block)
    }
}
