//! SSH sockets
//!
//! Six service types. The standard one nests a second discriminator,
//! `authentication_type`, that selects the credential object; all of them
//! share the `username_provider` convention.

use border0_client::types::{
    AwsEc2InstanceConnectSshServiceConfiguration, AwsEksKubectlExecTarget, AwsSsmEc2Target,
    AwsSsmEcsTarget, AwsSsmSshServiceConfiguration, Border0CertificateAuth,
    BuiltInSshServiceConfiguration, DockerExecSshServiceConfiguration, KubectlExecTargetType,
    KubectlExecSshServiceConfiguration, PrivateKeyAuth, SshAuthenticationType,
    SshServiceConfiguration, SshServiceType, SsmTargetType, StandardKubectlExecTarget,
    StandardSshServiceConfiguration, UsernameAndPasswordAuth, UsernameProvider,
};
use border0_core::attributes::{Attributes, Block, BlockBuilder};
use border0_core::schema::{AttributeSchema, AttributeType, types};

use super::{
    TranslateError, TranslateResult, Translator, aws_credentials, discriminator, required,
    required_port, secret,
};

pub struct Ssh;

fn string(name: &str) -> AttributeSchema {
    AttributeSchema::new(name, AttributeType::String).optional()
}

fn username(
    block: &Block<'_>,
    context: &str,
) -> TranslateResult<(UsernameProvider, Option<String>)> {
    let provider = discriminator(block, "username_provider", UsernameProvider::PromptClient)?;
    let username = block.get_string("username");
    if provider == UsernameProvider::Defined && username.is_none() {
        return Err(TranslateError::MissingAttribute {
            attribute: "username",
            context: format!("{context} with username_provider defined"),
        });
    }
    Ok((provider, username))
}

fn set_username(
    block: BlockBuilder,
    provider: UsernameProvider,
    username: Option<&String>,
) -> BlockBuilder {
    block
        .set("username_provider", provider.as_str())
        .opt("username", username)
}

impl Translator for Ssh {
    type Upstream = SshServiceConfiguration;

    const BLOCK: &'static str = "ssh_configuration";

    fn schema() -> Vec<AttributeSchema> {
        vec![
            AttributeSchema::new("service_type", AttributeType::enumeration(SshServiceType::ALL))
                .with_default(SshServiceType::Standard.as_str()),
            string("hostname"),
            AttributeSchema::new("port", types::port()).optional(),
            AttributeSchema::new(
                "authentication_type",
                AttributeType::enumeration(SshAuthenticationType::ALL),
            )
            .optional()
            .computed()
            .with_description("Defaults to border0_certificate for the standard service type"),
            AttributeSchema::new(
                "username_provider",
                AttributeType::enumeration(UsernameProvider::ALL),
            )
            .optional()
            .computed()
            .with_description("Defaults to prompt_client"),
            string("username"),
            string("password").sensitive(),
            string("private_key").sensitive(),
            string("ec2_instance_id"),
            string("ec2_instance_region"),
            AttributeSchema::new("ssm_target_type", AttributeType::enumeration(SsmTargetType::ALL))
                .optional()
                .computed(),
            string("ecs_cluster_region"),
            string("ecs_cluster_name"),
            string("ecs_service_name"),
            AttributeSchema::new(
                "kubectl_exec_target_type",
                AttributeType::enumeration(KubectlExecTargetType::ALL),
            )
            .optional()
            .computed(),
            string("kubeconfig_path"),
            string("master_url"),
            AttributeSchema::new("namespace_allowlist", AttributeType::string_set()).optional(),
            string("eks_cluster_name"),
            string("eks_cluster_region"),
            AttributeSchema::new("container_name_allowlist", AttributeType::string_set())
                .optional(),
            aws_credentials::schema(),
        ]
    }

    fn flatten(block: &Block<'_>) -> TranslateResult<SshServiceConfiguration> {
        let service_type = discriminator(block, "service_type", SshServiceType::Standard)?;
        let context = format!("ssh service type {service_type}");
        let mut config = SshServiceConfiguration::new(service_type);

        match service_type {
            SshServiceType::Standard => {
                let authentication_type = discriminator(
                    block,
                    "authentication_type",
                    SshAuthenticationType::Border0Certificate,
                )?;
                let (username_provider, username) = username(block, &context)?;
                let mut standard = StandardSshServiceConfiguration {
                    hostname: required(block, "hostname", &context)?,
                    port: required_port(block, "port", &context)?,
                    ssh_authentication_type: authentication_type,
                    username_and_password_auth_configuration: None,
                    private_key_auth_configuration: None,
                    border0_certificate_auth_configuration: None,
                };
                match authentication_type {
                    SshAuthenticationType::UsernameAndPassword => {
                        standard.username_and_password_auth_configuration =
                            Some(UsernameAndPasswordAuth {
                                username_provider,
                                username,
                                password: block.get_string("password"),
                            });
                    }
                    SshAuthenticationType::PrivateKey => {
                        standard.private_key_auth_configuration = Some(PrivateKeyAuth {
                            username_provider,
                            username,
                            private_key: block.get_string("private_key"),
                        });
                    }
                    SshAuthenticationType::Border0Certificate => {
                        standard.border0_certificate_auth_configuration =
                            Some(Border0CertificateAuth {
                                username_provider,
                                username,
                            });
                    }
                }
                config.standard_ssh_service_configuration = Some(standard);
            }
            SshServiceType::AwsEc2InstanceConnect => {
                let (username_provider, username) = username(block, &context)?;
                config.aws_ec2_instance_connect_ssh_service_configuration =
                    Some(AwsEc2InstanceConnectSshServiceConfiguration {
                        hostname: required(block, "hostname", &context)?,
                        port: required_port(block, "port", &context)?,
                        username_provider,
                        username,
                        ec2_instance_id: required(block, "ec2_instance_id", &context)?,
                        ec2_instance_region: required(block, "ec2_instance_region", &context)?,
                        aws_credentials: aws_credentials::flatten(block),
                    });
            }
            SshServiceType::AwsSsm => {
                let target_type = discriminator(block, "ssm_target_type", SsmTargetType::Ec2)?;
                let mut ssm = AwsSsmSshServiceConfiguration {
                    ssm_target_type: target_type,
                    aws_ssm_ec2_target_configuration: None,
                    aws_ssm_ecs_target_configuration: None,
                };
                match target_type {
                    SsmTargetType::Ec2 => {
                        ssm.aws_ssm_ec2_target_configuration = Some(AwsSsmEc2Target {
                            ec2_instance_id: required(block, "ec2_instance_id", &context)?,
                            ec2_instance_region: required(block, "ec2_instance_region", &context)?,
                            aws_credentials: aws_credentials::flatten(block),
                        });
                    }
                    SsmTargetType::Ecs => {
                        ssm.aws_ssm_ecs_target_configuration = Some(AwsSsmEcsTarget {
                            ecs_cluster_region: required(block, "ecs_cluster_region", &context)?,
                            ecs_cluster_name: required(block, "ecs_cluster_name", &context)?,
                            ecs_service_name: required(block, "ecs_service_name", &context)?,
                            aws_credentials: aws_credentials::flatten(block),
                        });
                    }
                }
                config.aws_ssm_ssh_service_configuration = Some(ssm);
            }
            SshServiceType::ConnectorBuiltIn => {
                let (username_provider, username) = username(block, &context)?;
                config.built_in_ssh_service_configuration = Some(BuiltInSshServiceConfiguration {
                    username_provider,
                    username,
                });
            }
            SshServiceType::KubectlExec => {
                let target_type = discriminator(
                    block,
                    "kubectl_exec_target_type",
                    KubectlExecTargetType::Standard,
                )?;
                let mut kubectl = KubectlExecSshServiceConfiguration {
                    kubectl_exec_target_type: target_type,
                    namespace_allowlist: block.get_strings("namespace_allowlist"),
                    standard_kubectl_exec_target_configuration: None,
                    aws_eks_kubectl_exec_target_configuration: None,
                };
                match target_type {
                    KubectlExecTargetType::Standard => {
                        kubectl.standard_kubectl_exec_target_configuration =
                            Some(StandardKubectlExecTarget {
                                kubeconfig_path: block.get_string("kubeconfig_path"),
                                master_url: block.get_string("master_url"),
                            });
                    }
                    KubectlExecTargetType::AwsEks => {
                        kubectl.aws_eks_kubectl_exec_target_configuration =
                            Some(AwsEksKubectlExecTarget {
                                eks_cluster_name: required(block, "eks_cluster_name", &context)?,
                                eks_cluster_region: required(
                                    block,
                                    "eks_cluster_region",
                                    &context,
                                )?,
                                aws_credentials: aws_credentials::flatten(block),
                            });
                    }
                }
                config.kubectl_exec_ssh_service_configuration = Some(kubectl);
            }
            SshServiceType::DockerExec => {
                config.docker_exec_ssh_service_configuration =
                    Some(DockerExecSshServiceConfiguration {
                        container_name_allowlist: block.get_strings("container_name_allowlist"),
                    });
            }
        }

        Ok(config)
    }

    fn inflate(
        upstream: &SshServiceConfiguration,
        existing: Option<&Block<'_>>,
    ) -> TranslateResult<BlockBuilder> {
        let service_type = upstream.ssh_service_type;
        let missing = || TranslateError::MissingConfig(service_type.to_string());
        let block = BlockBuilder::new().set("service_type", service_type.as_str());

        let block = match service_type {
            SshServiceType::Standard => {
                let standard = upstream
                    .standard_ssh_service_configuration
                    .as_ref()
                    .ok_or_else(missing)?;
                let auth_type = standard.ssh_authentication_type;
                let auth_missing = || TranslateError::MissingConfig(auth_type.to_string());
                let block = block
                    .set("hostname", &standard.hostname)
                    .set("port", standard.port)
                    .set("authentication_type", auth_type.as_str());

                match auth_type {
                    SshAuthenticationType::UsernameAndPassword => {
                        let auth = standard
                            .username_and_password_auth_configuration
                            .as_ref()
                            .ok_or_else(auth_missing)?;
                        set_username(block, auth.username_provider, auth.username.as_ref()).opt(
                            "password",
                            secret(auth.password.as_deref(), existing, "password"),
                        )
                    }
                    SshAuthenticationType::PrivateKey => {
                        let auth = standard
                            .private_key_auth_configuration
                            .as_ref()
                            .ok_or_else(auth_missing)?;
                        set_username(block, auth.username_provider, auth.username.as_ref()).opt(
                            "private_key",
                            secret(auth.private_key.as_deref(), existing, "private_key"),
                        )
                    }
                    SshAuthenticationType::Border0Certificate => {
                        let auth = standard
                            .border0_certificate_auth_configuration
                            .as_ref()
                            .ok_or_else(auth_missing)?;
                        set_username(block, auth.username_provider, auth.username.as_ref())
                    }
                }
            }
            SshServiceType::AwsEc2InstanceConnect => {
                let ec2 = upstream
                    .aws_ec2_instance_connect_ssh_service_configuration
                    .as_ref()
                    .ok_or_else(missing)?;
                set_username(block, ec2.username_provider, ec2.username.as_ref())
                    .set("hostname", &ec2.hostname)
                    .set("port", ec2.port)
                    .set("ec2_instance_id", &ec2.ec2_instance_id)
                    .set("ec2_instance_region", &ec2.ec2_instance_region)
                    .block(
                        aws_credentials::BLOCK,
                        aws_credentials::inflate(ec2.aws_credentials.as_ref(), existing),
                    )
            }
            SshServiceType::AwsSsm => {
                let ssm = upstream
                    .aws_ssm_ssh_service_configuration
                    .as_ref()
                    .ok_or_else(missing)?;
                let target_missing =
                    || TranslateError::MissingConfig(ssm.ssm_target_type.to_string());
                let block = block.set("ssm_target_type", ssm.ssm_target_type.as_str());
                match ssm.ssm_target_type {
                    SsmTargetType::Ec2 => {
                        let ec2 = ssm
                            .aws_ssm_ec2_target_configuration
                            .as_ref()
                            .ok_or_else(target_missing)?;
                        block
                            .set("ec2_instance_id", &ec2.ec2_instance_id)
                            .set("ec2_instance_region", &ec2.ec2_instance_region)
                            .block(
                                aws_credentials::BLOCK,
                                aws_credentials::inflate(ec2.aws_credentials.as_ref(), existing),
                            )
                    }
                    SsmTargetType::Ecs => {
                        let ecs = ssm
                            .aws_ssm_ecs_target_configuration
                            .as_ref()
                            .ok_or_else(target_missing)?;
                        block
                            .set("ecs_cluster_region", &ecs.ecs_cluster_region)
                            .set("ecs_cluster_name", &ecs.ecs_cluster_name)
                            .set("ecs_service_name", &ecs.ecs_service_name)
                            .block(
                                aws_credentials::BLOCK,
                                aws_credentials::inflate(ecs.aws_credentials.as_ref(), existing),
                            )
                    }
                }
            }
            SshServiceType::ConnectorBuiltIn => {
                let built_in = upstream
                    .built_in_ssh_service_configuration
                    .as_ref()
                    .ok_or_else(missing)?;
                set_username(block, built_in.username_provider, built_in.username.as_ref())
            }
            SshServiceType::KubectlExec => {
                let kubectl = upstream
                    .kubectl_exec_ssh_service_configuration
                    .as_ref()
                    .ok_or_else(missing)?;
                let target_type = kubectl.kubectl_exec_target_type;
                let target_missing = || TranslateError::MissingConfig(target_type.to_string());
                let block = block
                    .set("kubectl_exec_target_type", target_type.as_str())
                    .string_set("namespace_allowlist", &kubectl.namespace_allowlist);
                match target_type {
                    KubectlExecTargetType::Standard => {
                        let standard = kubectl
                            .standard_kubectl_exec_target_configuration
                            .as_ref()
                            .ok_or_else(target_missing)?;
                        block
                            .opt("kubeconfig_path", standard.kubeconfig_path.as_ref())
                            .opt("master_url", standard.master_url.as_ref())
                    }
                    KubectlExecTargetType::AwsEks => {
                        let eks = kubectl
                            .aws_eks_kubectl_exec_target_configuration
                            .as_ref()
                            .ok_or_else(target_missing)?;
                        block
                            .set("eks_cluster_name", &eks.eks_cluster_name)
                            .set("eks_cluster_region", &eks.eks_cluster_region)
                            .block(
                                aws_credentials::BLOCK,
                                aws_credentials::inflate(eks.aws_credentials.as_ref(), existing),
                            )
                    }
                }
            }
            SshServiceType::DockerExec => {
                let docker = upstream
                    .docker_exec_ssh_service_configuration
                    .as_ref()
                    .ok_or_else(missing)?;
                block.string_set("container_name_allowlist", &docker.container_name_allowlist)
            }
        };

        Ok(block)
    }
}
