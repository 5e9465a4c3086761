//! Upstream service configuration of a socket
//!
//! The platform sends one `*_service_configuration` object per socket,
//! selected by `service_type`. Nested objects follow the same pattern: a
//! discriminator field names the sibling object that carries the details.

use serde::{Deserialize, Serialize};

use super::SocketType;

string_enum!(SshServiceType, "ssh service type" {
    Standard => "standard",
    AwsEc2InstanceConnect => "aws_ec2_instance_connect",
    AwsSsm => "aws_ssm",
    ConnectorBuiltIn => "connector_built_in",
    KubectlExec => "kubectl_exec",
    DockerExec => "docker_exec",
});

string_enum!(SshAuthenticationType, "ssh authentication type" {
    Border0Certificate => "border0_certificate",
    PrivateKey => "private_key",
    UsernameAndPassword => "username_and_password",
});

string_enum!(UsernameProvider, "username provider" {
    Defined => "defined",
    PromptClient => "prompt_client",
    UseConnectorUser => "use_connector_user",
});

string_enum!(SsmTargetType, "ssm target type" {
    Ec2 => "ec2",
    Ecs => "ecs",
});

string_enum!(KubectlExecTargetType, "kubectl exec target type" {
    Standard => "standard",
    AwsEks => "aws_eks",
});

string_enum!(DatabaseServiceType, "database service type" {
    Standard => "standard",
    AwsRds => "aws_rds",
    GcpCloudSql => "gcp_cloudsql",
});

string_enum!(DatabaseAuthenticationType, "database authentication type" {
    UsernameAndPassword => "username_and_password",
    Tls => "tls",
    Iam => "iam",
});

string_enum!(DatabaseProtocol, "database protocol" {
    Mysql => "mysql",
    Postgres => "postgres",
});

string_enum!(HttpServiceType, "http service type" {
    Standard => "standard",
    ConnectorFileServer => "connector_file_server",
});

string_enum!(TlsServiceType, "tls service type" {
    Standard => "standard",
    Vpn => "vpn",
    HttpProxy => "http_proxy",
});

string_enum!(KubernetesServiceType, "kubernetes service type" {
    Standard => "standard",
    AwsEks => "aws_eks",
});

/// Top-level upstream configuration, one member populated per socket type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfiguration {
    pub service_type: SocketType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_service_configuration: Option<SshServiceConfiguration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_service_configuration: Option<DatabaseServiceConfiguration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_service_configuration: Option<HttpServiceConfiguration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_service_configuration: Option<TlsServiceConfiguration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubernetes_service_configuration: Option<KubernetesServiceConfiguration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rdp_service_configuration: Option<HostPort>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vnc_service_configuration: Option<HostPort>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vpn_service_configuration: Option<VpnServiceConfiguration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet_router_service_configuration: Option<SubnetRouterServiceConfiguration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_s3_service_configuration: Option<AwsS3ServiceConfiguration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snowflake_service_configuration: Option<SnowflakeServiceConfiguration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elasticsearch_service_configuration: Option<ElasticsearchServiceConfiguration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_node_service_configuration: Option<ExitNodeServiceConfiguration>,
}

impl ServiceConfiguration {
    /// An empty configuration for the given socket type
    pub fn new(service_type: SocketType) -> Self {
        Self {
            service_type,
            ssh_service_configuration: None,
            database_service_configuration: None,
            http_service_configuration: None,
            tls_service_configuration: None,
            kubernetes_service_configuration: None,
            rdp_service_configuration: None,
            vnc_service_configuration: None,
            vpn_service_configuration: None,
            subnet_router_service_configuration: None,
            aws_s3_service_configuration: None,
            snowflake_service_configuration: None,
            elasticsearch_service_configuration: None,
            exit_node_service_configuration: None,
        }
    }
}

/// Plain hostname and port target
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostPort {
    pub hostname: String,
    pub port: u16,
}

/// Static AWS credentials or a named profile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwsCredentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_access_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
}

// SSH

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SshServiceConfiguration {
    pub ssh_service_type: SshServiceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard_ssh_service_configuration: Option<StandardSshServiceConfiguration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_ec2_instance_connect_ssh_service_configuration:
        Option<AwsEc2InstanceConnectSshServiceConfiguration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_ssm_ssh_service_configuration: Option<AwsSsmSshServiceConfiguration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub built_in_ssh_service_configuration: Option<BuiltInSshServiceConfiguration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubectl_exec_ssh_service_configuration: Option<KubectlExecSshServiceConfiguration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docker_exec_ssh_service_configuration: Option<DockerExecSshServiceConfiguration>,
}

impl SshServiceConfiguration {
    pub fn new(ssh_service_type: SshServiceType) -> Self {
        Self {
            ssh_service_type,
            standard_ssh_service_configuration: None,
            aws_ec2_instance_connect_ssh_service_configuration: None,
            aws_ssm_ssh_service_configuration: None,
            built_in_ssh_service_configuration: None,
            kubectl_exec_ssh_service_configuration: None,
            docker_exec_ssh_service_configuration: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardSshServiceConfiguration {
    pub hostname: String,
    pub port: u16,
    pub ssh_authentication_type: SshAuthenticationType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username_and_password_auth_configuration: Option<UsernameAndPasswordAuth>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key_auth_configuration: Option<PrivateKeyAuth>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border0_certificate_auth_configuration: Option<Border0CertificateAuth>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsernameAndPasswordAuth {
    pub username_provider: UsernameProvider,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrivateKeyAuth {
    pub username_provider: UsernameProvider,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Border0CertificateAuth {
    pub username_provider: UsernameProvider,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AwsEc2InstanceConnectSshServiceConfiguration {
    pub hostname: String,
    pub port: u16,
    pub username_provider: UsernameProvider,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub ec2_instance_id: String,
    pub ec2_instance_region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_credentials: Option<AwsCredentials>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AwsSsmSshServiceConfiguration {
    pub ssm_target_type: SsmTargetType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_ssm_ec2_target_configuration: Option<AwsSsmEc2Target>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_ssm_ecs_target_configuration: Option<AwsSsmEcsTarget>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AwsSsmEc2Target {
    pub ec2_instance_id: String,
    pub ec2_instance_region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_credentials: Option<AwsCredentials>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AwsSsmEcsTarget {
    pub ecs_cluster_region: String,
    pub ecs_cluster_name: String,
    pub ecs_service_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_credentials: Option<AwsCredentials>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuiltInSshServiceConfiguration {
    pub username_provider: UsernameProvider,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KubectlExecSshServiceConfiguration {
    pub kubectl_exec_target_type: KubectlExecTargetType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub namespace_allowlist: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard_kubectl_exec_target_configuration: Option<StandardKubectlExecTarget>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_eks_kubectl_exec_target_configuration: Option<AwsEksKubectlExecTarget>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardKubectlExecTarget {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubeconfig_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AwsEksKubectlExecTarget {
    pub eks_cluster_name: String,
    pub eks_cluster_region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_credentials: Option<AwsCredentials>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DockerExecSshServiceConfiguration {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub container_name_allowlist: Vec<String>,
}

// Database

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseServiceConfiguration {
    pub database_service_type: DatabaseServiceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard: Option<StandardDatabaseServiceConfiguration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_rds: Option<AwsRdsDatabaseServiceConfiguration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gcp_cloudsql: Option<GcpCloudSqlDatabaseServiceConfiguration>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardDatabaseServiceConfiguration {
    pub hostname: String,
    pub port: u16,
    pub protocol: DatabaseProtocol,
    pub authentication_type: DatabaseAuthenticationType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username_and_password_auth_configuration: Option<DatabaseUsernameAndPasswordAuth>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_auth_configuration: Option<DatabaseTlsAuth>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AwsRdsDatabaseServiceConfiguration {
    pub hostname: String,
    pub port: u16,
    pub protocol: DatabaseProtocol,
    pub authentication_type: DatabaseAuthenticationType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username_and_password_auth_configuration: Option<DatabaseUsernameAndPasswordAuth>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iam_auth_configuration: Option<AwsRdsIamAuth>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GcpCloudSqlDatabaseServiceConfiguration {
    pub cloudsql_connector_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard: Option<GcpCloudSqlStandardConfiguration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connector: Option<GcpCloudSqlConnectorConfiguration>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GcpCloudSqlStandardConfiguration {
    pub hostname: String,
    pub port: u16,
    pub protocol: DatabaseProtocol,
    pub authentication_type: DatabaseAuthenticationType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username_and_password_auth_configuration: Option<DatabaseUsernameAndPasswordAuth>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_auth_configuration: Option<DatabaseTlsAuth>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GcpCloudSqlConnectorConfiguration {
    pub instance_id: String,
    pub protocol: DatabaseProtocol,
    pub authentication_type: DatabaseAuthenticationType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gcp_credentials_json: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username_and_password_auth_configuration: Option<DatabaseUsernameAndPasswordAuth>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseUsernameAndPasswordAuth {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseTlsAuth {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub certificate: String,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub ca_certificate: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwsRdsIamAuth {
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_credentials: Option<AwsCredentials>,
}

// HTTP

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpServiceConfiguration {
    pub http_service_type: HttpServiceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard_http_service_configuration: Option<StandardHttpServiceConfiguration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_server_http_service_configuration: Option<FileServerHttpServiceConfiguration>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardHttpServiceConfiguration {
    pub hostname: String,
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_header: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileServerHttpServiceConfiguration {
    #[serde(default)]
    pub top_level_directory: String,
}

// TLS

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TlsServiceConfiguration {
    pub tls_service_type: TlsServiceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard_tls_service_configuration: Option<HostPort>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vpn_tls_service_configuration: Option<VpnTlsServiceConfiguration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_proxy_tls_service_configuration: Option<HttpProxyTlsServiceConfiguration>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VpnTlsServiceConfiguration {
    pub vpn_subnet: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub routes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpProxyTlsServiceConfiguration {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub host_allowlist: Vec<String>,
}

// Kubernetes

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KubernetesServiceConfiguration {
    pub kubernetes_service_type: KubernetesServiceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard_kubernetes_service_configuration: Option<StandardKubernetesServiceConfiguration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_eks_kubernetes_service_configuration: Option<AwsEksKubernetesServiceConfiguration>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardKubernetesServiceConfiguration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubeconfig_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_authority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_certificate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default)]
    pub impersonation_enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwsEksKubernetesServiceConfiguration {
    pub eks_cluster_name: String,
    pub eks_cluster_region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_credentials: Option<AwsCredentials>,
    #[serde(default)]
    pub impersonation_enabled: bool,
}

// Leaf services

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VpnServiceConfiguration {
    pub dhcp_pool_subnet: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub advertised_routes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubnetRouterServiceConfiguration {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ipv4_cidr_ranges: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ipv6_cidr_ranges: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AwsS3ServiceConfiguration {
    pub bucket: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_credentials: Option<AwsCredentials>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnowflakeServiceConfiguration {
    pub account: String,
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElasticsearchServiceConfiguration {
    pub protocol: String,
    pub hostname: String,
    pub port: u16,
    #[serde(default)]
    pub authentication_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Exit nodes carry no configuration of their own
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitNodeServiceConfiguration {}
