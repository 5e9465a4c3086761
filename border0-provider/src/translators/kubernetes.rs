//! Kubernetes sockets

use border0_client::types::{
    AwsEksKubernetesServiceConfiguration, KubernetesServiceConfiguration, KubernetesServiceType,
    StandardKubernetesServiceConfiguration,
};
use border0_core::attributes::{Attributes, Block, BlockBuilder};
use border0_core::schema::{AttributeSchema, AttributeType};

use super::{
    TranslateError, TranslateResult, Translator, aws_credentials, discriminator, required, secret,
};

pub struct Kubernetes;

const STANDARD_FIELDS: [&str; 4] = [
    "kubeconfig_path",
    "context",
    "server",
    "certificate_authority",
];

impl Translator for Kubernetes {
    type Upstream = KubernetesServiceConfiguration;

    const BLOCK: &'static str = "kubernetes_configuration";

    fn schema() -> Vec<AttributeSchema> {
        let mut attributes = vec![
            AttributeSchema::new(
                "service_type",
                AttributeType::enumeration(KubernetesServiceType::ALL),
            )
            .with_default(KubernetesServiceType::Standard.as_str()),
            AttributeSchema::new("impersonation_enabled", AttributeType::Bool).with_default(false),
            AttributeSchema::new("client_certificate", AttributeType::String).optional(),
            AttributeSchema::new("client_key", AttributeType::String)
                .optional()
                .sensitive(),
            AttributeSchema::new("token", AttributeType::String)
                .optional()
                .sensitive(),
            AttributeSchema::new("eks_cluster_name", AttributeType::String).optional(),
            AttributeSchema::new("eks_cluster_region", AttributeType::String).optional(),
            aws_credentials::schema(),
        ];
        attributes.extend(
            STANDARD_FIELDS
                .iter()
                .map(|name| AttributeSchema::new(*name, AttributeType::String).optional()),
        );
        attributes
    }

    fn flatten(block: &Block<'_>) -> TranslateResult<KubernetesServiceConfiguration> {
        let service_type = discriminator(block, "service_type", KubernetesServiceType::Standard)?;
        let context = format!("kubernetes service type {service_type}");
        let impersonation_enabled = block.get_bool_or("impersonation_enabled", false);
        let mut config = KubernetesServiceConfiguration {
            kubernetes_service_type: service_type,
            standard_kubernetes_service_configuration: None,
            aws_eks_kubernetes_service_configuration: None,
        };

        match service_type {
            KubernetesServiceType::Standard => {
                config.standard_kubernetes_service_configuration =
                    Some(StandardKubernetesServiceConfiguration {
                        kubeconfig_path: block.get_string("kubeconfig_path"),
                        context: block.get_string("context"),
                        server: block.get_string("server"),
                        certificate_authority: block.get_string("certificate_authority"),
                        client_certificate: block.get_string("client_certificate"),
                        client_key: block.get_string("client_key"),
                        token: block.get_string("token"),
                        impersonation_enabled,
                    });
            }
            KubernetesServiceType::AwsEks => {
                config.aws_eks_kubernetes_service_configuration =
                    Some(AwsEksKubernetesServiceConfiguration {
                        eks_cluster_name: required(block, "eks_cluster_name", &context)?,
                        eks_cluster_region: required(block, "eks_cluster_region", &context)?,
                        aws_credentials: aws_credentials::flatten(block),
                        impersonation_enabled,
                    });
            }
        }

        Ok(config)
    }

    fn inflate(
        upstream: &KubernetesServiceConfiguration,
        existing: Option<&Block<'_>>,
    ) -> TranslateResult<BlockBuilder> {
        let service_type = upstream.kubernetes_service_type;
        let missing = || TranslateError::MissingConfig(service_type.to_string());
        let block = BlockBuilder::new().set("service_type", service_type.as_str());

        let block = match service_type {
            KubernetesServiceType::Standard => {
                let standard = upstream
                    .standard_kubernetes_service_configuration
                    .as_ref()
                    .ok_or_else(missing)?;
                block
                    .set("impersonation_enabled", standard.impersonation_enabled)
                    .opt("kubeconfig_path", standard.kubeconfig_path.as_ref())
                    .opt("context", standard.context.as_ref())
                    .opt("server", standard.server.as_ref())
                    .opt("certificate_authority", standard.certificate_authority.as_ref())
                    .opt("client_certificate", standard.client_certificate.as_ref())
                    .opt(
                        "client_key",
                        secret(standard.client_key.as_deref(), existing, "client_key"),
                    )
                    .opt("token", secret(standard.token.as_deref(), existing, "token"))
            }
            KubernetesServiceType::AwsEks => {
                let eks = upstream
                    .aws_eks_kubernetes_service_configuration
                    .as_ref()
                    .ok_or_else(missing)?;
                block
                    .set("impersonation_enabled", eks.impersonation_enabled)
                    .set("eks_cluster_name", &eks.eks_cluster_name)
                    .set("eks_cluster_region", &eks.eks_cluster_region)
                    .block(
                        aws_credentials::BLOCK,
                        aws_credentials::inflate(eks.aws_credentials.as_ref(), existing),
                    )
            }
        };

        Ok(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translators::tests::with_block;
    use border0_core::resource::Value;

    #[test]
    fn impersonation_defaults_off() {
        let attrs = with_block(
            Kubernetes::BLOCK,
            BlockBuilder::new().set("kubeconfig_path", "/root/.kube/config"),
        );
        let upstream = Kubernetes::flatten(&attrs.get_block(Kubernetes::BLOCK).unwrap()).unwrap();
        let standard = upstream
            .standard_kubernetes_service_configuration
            .as_ref()
            .unwrap();
        assert!(!standard.impersonation_enabled);

        let block = Kubernetes::inflate(&upstream, None).unwrap().build();
        assert_eq!(block["impersonation_enabled"], Value::Bool(false));
        assert_eq!(block["kubeconfig_path"], Value::from("/root/.kube/config"));
    }

    #[test]
    fn eks_round_trips() {
        let attrs = with_block(
            Kubernetes::BLOCK,
            BlockBuilder::new()
                .set("service_type", "aws_eks")
                .set("impersonation_enabled", true)
                .set("eks_cluster_name", "prod")
                .set("eks_cluster_region", "us-east-2")
                .block(
                    "aws_credentials",
                    Some(
                        BlockBuilder::new()
                            .set("access_key_id", "AKIA")
                            .set("secret_access_key", "secret"),
                    ),
                ),
        );
        let upstream = Kubernetes::flatten(&attrs.get_block(Kubernetes::BLOCK).unwrap()).unwrap();
        let inflated = with_block(Kubernetes::BLOCK, Kubernetes::inflate(&upstream, None).unwrap());
        assert_eq!(inflated, attrs);
    }
}
