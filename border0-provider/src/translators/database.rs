//! Database sockets

use border0_client::types::{
    AwsRdsDatabaseServiceConfiguration, AwsRdsIamAuth, DatabaseAuthenticationType,
    DatabaseProtocol, DatabaseServiceConfiguration, DatabaseServiceType, DatabaseTlsAuth,
    DatabaseUsernameAndPasswordAuth, GcpCloudSqlConnectorConfiguration,
    GcpCloudSqlDatabaseServiceConfiguration, GcpCloudSqlStandardConfiguration,
    StandardDatabaseServiceConfiguration,
};
use border0_core::attributes::{Attributes, Block, BlockBuilder};
use border0_core::schema::{AttributeSchema, AttributeType, types};

use super::{
    TranslateError, TranslateResult, Translator, aws_credentials, discriminator, required,
    required_port, secret,
};

pub struct Database;

fn string(name: &str) -> AttributeSchema {
    AttributeSchema::new(name, AttributeType::String).optional()
}

fn unsupported(context: &str, authentication_type: DatabaseAuthenticationType) -> TranslateError {
    TranslateError::UnsupportedAuthentication {
        context: context.to_string(),
        authentication_type: authentication_type.to_string(),
    }
}

fn username_and_password(block: &Block<'_>) -> DatabaseUsernameAndPasswordAuth {
    DatabaseUsernameAndPasswordAuth {
        username: block.get_string("username").unwrap_or_default(),
        password: block.get_string("password").unwrap_or_default(),
    }
}

fn tls(block: &Block<'_>) -> DatabaseTlsAuth {
    DatabaseTlsAuth {
        username: block.get_string("username").unwrap_or_default(),
        password: block.get_string("password").unwrap_or_default(),
        certificate: block.get_string("certificate").unwrap_or_default(),
        key: block.get_string("key").unwrap_or_default(),
        ca_certificate: block.get_string("ca_certificate").unwrap_or_default(),
    }
}

fn set_username_and_password(
    block: BlockBuilder,
    auth: Option<&DatabaseUsernameAndPasswordAuth>,
    existing: Option<&Block<'_>>,
) -> BlockBuilder {
    let Some(auth) = auth else {
        return block;
    };
    block
        .set("username", &auth.username)
        .opt("password", secret(Some(auth.password.as_str()), existing, "password"))
}

fn set_tls(
    block: BlockBuilder,
    auth: Option<&DatabaseTlsAuth>,
    existing: Option<&Block<'_>>,
) -> BlockBuilder {
    let Some(auth) = auth else {
        return block;
    };
    block
        .set("username", &auth.username)
        .opt("password", secret(Some(auth.password.as_str()), existing, "password"))
        .set("certificate", &auth.certificate)
        .opt("key", secret(Some(auth.key.as_str()), existing, "key"))
        .set("ca_certificate", &auth.ca_certificate)
}

impl Translator for Database {
    type Upstream = DatabaseServiceConfiguration;

    const BLOCK: &'static str = "database_configuration";

    fn schema() -> Vec<AttributeSchema> {
        vec![
            AttributeSchema::new(
                "service_type",
                AttributeType::enumeration(DatabaseServiceType::ALL),
            )
            .with_default(DatabaseServiceType::Standard.as_str()),
            AttributeSchema::new("protocol", AttributeType::enumeration(DatabaseProtocol::ALL))
                .required(),
            string("hostname"),
            AttributeSchema::new("port", types::port()).optional(),
            AttributeSchema::new(
                "authentication_type",
                AttributeType::enumeration(DatabaseAuthenticationType::ALL),
            )
            .optional()
            .computed()
            .with_description("Defaults to username_and_password"),
            string("username"),
            string("password").sensitive(),
            string("certificate"),
            string("key").sensitive(),
            string("ca_certificate"),
            AttributeSchema::new("cloudsql_connector_enabled", AttributeType::Bool)
                .with_default(false),
            string("cloudsql_instance_id"),
            string("gcp_credentials_json").sensitive(),
            aws_credentials::schema(),
        ]
    }

    fn flatten(block: &Block<'_>) -> TranslateResult<DatabaseServiceConfiguration> {
        let service_type = discriminator(block, "service_type", DatabaseServiceType::Standard)?;
        let context = format!("database service type {service_type}");
        let protocol: DatabaseProtocol = required(block, "protocol", &context)?.parse()?;
        let authentication_type = discriminator(
            block,
            "authentication_type",
            DatabaseAuthenticationType::UsernameAndPassword,
        )?;

        let mut config = DatabaseServiceConfiguration {
            database_service_type: service_type,
            standard: None,
            aws_rds: None,
            gcp_cloudsql: None,
        };

        match service_type {
            DatabaseServiceType::Standard => {
                let mut standard = StandardDatabaseServiceConfiguration {
                    hostname: required(block, "hostname", &context)?,
                    port: required_port(block, "port", &context)?,
                    protocol,
                    authentication_type,
                    username_and_password_auth_configuration: None,
                    tls_auth_configuration: None,
                };
                match authentication_type {
                    DatabaseAuthenticationType::UsernameAndPassword => {
                        standard.username_and_password_auth_configuration =
                            Some(username_and_password(block));
                    }
                    DatabaseAuthenticationType::Tls => {
                        standard.tls_auth_configuration = Some(tls(block));
                    }
                    DatabaseAuthenticationType::Iam => {
                        return Err(unsupported(&context, authentication_type));
                    }
                }
                config.standard = Some(standard);
            }
            DatabaseServiceType::AwsRds => {
                let mut rds = AwsRdsDatabaseServiceConfiguration {
                    hostname: required(block, "hostname", &context)?,
                    port: required_port(block, "port", &context)?,
                    protocol,
                    authentication_type,
                    username_and_password_auth_configuration: None,
                    iam_auth_configuration: None,
                };
                match authentication_type {
                    DatabaseAuthenticationType::UsernameAndPassword => {
                        rds.username_and_password_auth_configuration =
                            Some(username_and_password(block));
                    }
                    DatabaseAuthenticationType::Iam => {
                        rds.iam_auth_configuration = Some(AwsRdsIamAuth {
                            username: block.get_string("username").unwrap_or_default(),
                            aws_credentials: aws_credentials::flatten(block),
                        });
                    }
                    DatabaseAuthenticationType::Tls => {
                        return Err(unsupported(&context, authentication_type));
                    }
                }
                config.aws_rds = Some(rds);
            }
            DatabaseServiceType::GcpCloudSql => {
                let connector_enabled = block.get_bool_or("cloudsql_connector_enabled", false);
                let mut gcp = GcpCloudSqlDatabaseServiceConfiguration {
                    cloudsql_connector_enabled: connector_enabled,
                    standard: None,
                    connector: None,
                };
                if connector_enabled {
                    let context = format!("{context} with the cloudsql connector");
                    if authentication_type != DatabaseAuthenticationType::UsernameAndPassword {
                        return Err(unsupported(&context, authentication_type));
                    }
                    gcp.connector = Some(GcpCloudSqlConnectorConfiguration {
                        instance_id: required(block, "cloudsql_instance_id", &context)?,
                        protocol,
                        authentication_type,
                        gcp_credentials_json: block.get_string("gcp_credentials_json"),
                        username_and_password_auth_configuration: Some(username_and_password(
                            block,
                        )),
                    });
                } else {
                    let mut standard = GcpCloudSqlStandardConfiguration {
                        hostname: required(block, "hostname", &context)?,
                        port: required_port(block, "port", &context)?,
                        protocol,
                        authentication_type,
                        username_and_password_auth_configuration: None,
                        tls_auth_configuration: None,
                    };
                    match authentication_type {
                        DatabaseAuthenticationType::UsernameAndPassword => {
                            standard.username_and_password_auth_configuration =
                                Some(username_and_password(block));
                        }
                        DatabaseAuthenticationType::Tls => {
                            standard.tls_auth_configuration = Some(tls(block));
                        }
                        DatabaseAuthenticationType::Iam => {
                            return Err(unsupported(&context, authentication_type));
                        }
                    }
                    gcp.standard = Some(standard);
                }
                config.gcp_cloudsql = Some(gcp);
            }
        }

        Ok(config)
    }

    fn inflate(
        upstream: &DatabaseServiceConfiguration,
        existing: Option<&Block<'_>>,
    ) -> TranslateResult<BlockBuilder> {
        let service_type = upstream.database_service_type;
        let missing = || TranslateError::MissingConfig(service_type.to_string());
        let block = BlockBuilder::new()
            .set("service_type", service_type.as_str())
            .set("cloudsql_connector_enabled", false);

        let block = match service_type {
            DatabaseServiceType::Standard => {
                let standard = upstream.standard.as_ref().ok_or_else(missing)?;
                let block = block
                    .set("protocol", standard.protocol.as_str())
                    .set("hostname", &standard.hostname)
                    .set("port", standard.port)
                    .set("authentication_type", standard.authentication_type.as_str());
                let block = set_username_and_password(
                    block,
                    standard.username_and_password_auth_configuration.as_ref(),
                    existing,
                );
                set_tls(block, standard.tls_auth_configuration.as_ref(), existing)
            }
            DatabaseServiceType::AwsRds => {
                let rds = upstream.aws_rds.as_ref().ok_or_else(missing)?;
                let block = block
                    .set("protocol", rds.protocol.as_str())
                    .set("hostname", &rds.hostname)
                    .set("port", rds.port)
                    .set("authentication_type", rds.authentication_type.as_str());
                let block = set_username_and_password(
                    block,
                    rds.username_and_password_auth_configuration.as_ref(),
                    existing,
                );
                match &rds.iam_auth_configuration {
                    Some(iam) => block.set("username", &iam.username).block(
                        aws_credentials::BLOCK,
                        aws_credentials::inflate(iam.aws_credentials.as_ref(), existing),
                    ),
                    None => block,
                }
            }
            DatabaseServiceType::GcpCloudSql => {
                let gcp = upstream.gcp_cloudsql.as_ref().ok_or_else(missing)?;
                let block = block.set("cloudsql_connector_enabled", gcp.cloudsql_connector_enabled);
                if gcp.cloudsql_connector_enabled {
                    let connector = gcp
                        .connector
                        .as_ref()
                        .ok_or_else(|| TranslateError::MissingConfig("connector".to_string()))?;
                    let block = block
                        .set("protocol", connector.protocol.as_str())
                        .set("authentication_type", connector.authentication_type.as_str())
                        .set("cloudsql_instance_id", &connector.instance_id)
                        .opt(
                            "gcp_credentials_json",
                            secret(
                                connector.gcp_credentials_json.as_deref(),
                                existing,
                                "gcp_credentials_json",
                            ),
                        );
                    set_username_and_password(
                        block,
                        connector.username_and_password_auth_configuration.as_ref(),
                        existing,
                    )
                } else {
                    let standard = gcp
                        .standard
                        .as_ref()
                        .ok_or_else(|| TranslateError::MissingConfig("standard".to_string()))?;
                    let block = block
                        .set("protocol", standard.protocol.as_str())
                        .set("hostname", &standard.hostname)
                        .set("port", standard.port)
                        .set("authentication_type", standard.authentication_type.as_str());
                    let block = set_username_and_password(
                        block,
                        standard.username_and_password_auth_configuration.as_ref(),
                        existing,
                    );
                    set_tls(block, standard.tls_auth_configuration.as_ref(), existing)
                }
            }
        };

        Ok(block)
    }
}
