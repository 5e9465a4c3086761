//! The platform API as seen by resource controllers

use async_trait::async_trait;

use crate::error::ClientResult;
use crate::types::{
    Connector, ConnectorToken, Group, Page, Policy, ServiceAccount, ServiceAccountToken, Socket,
    User,
};

/// Typed operations against the Border0 API
///
/// Implementations must be shareable across concurrent resource
/// operations. A missing entity is reported as
/// [`ClientError::NotFound`](crate::ClientError::NotFound).
#[async_trait]
pub trait Requester: Send + Sync {
    // Sockets

    async fn socket(&self, id: &str) -> ClientResult<Socket>;
    async fn create_socket(&self, socket: &Socket) -> ClientResult<Socket>;
    async fn update_socket(&self, socket: &Socket) -> ClientResult<Socket>;
    async fn delete_socket(&self, id: &str) -> ClientResult<()>;

    // Policies

    async fn policy(&self, id: &str) -> ClientResult<Policy>;
    async fn create_policy(&self, policy: &Policy) -> ClientResult<Policy>;
    async fn update_policy(&self, policy: &Policy) -> ClientResult<Policy>;
    async fn delete_policy(&self, id: &str) -> ClientResult<()>;
    async fn attach_policy_to_socket(&self, policy_id: &str, socket_id: &str) -> ClientResult<()>;
    async fn remove_policy_from_socket(&self, policy_id: &str, socket_id: &str)
    -> ClientResult<()>;
    /// Ids of the policies attached to a socket
    async fn socket_policy_ids(&self, socket_id: &str) -> ClientResult<Vec<String>>;

    // Connectors

    async fn connector(&self, id: &str) -> ClientResult<Connector>;
    async fn create_connector(&self, connector: &Connector) -> ClientResult<Connector>;
    async fn update_connector(&self, connector: &Connector) -> ClientResult<Connector>;
    async fn delete_connector(&self, id: &str) -> ClientResult<()>;

    async fn create_connector_token(&self, token: &ConnectorToken)
    -> ClientResult<ConnectorToken>;
    async fn connector_tokens(&self, connector_id: &str) -> ClientResult<Vec<ConnectorToken>>;
    async fn delete_connector_token(&self, connector_id: &str, token_id: &str)
    -> ClientResult<()>;

    // Users

    async fn user(&self, id: &str) -> ClientResult<User>;
    async fn create_user(&self, user: &User, notify_by_email: bool) -> ClientResult<User>;
    async fn update_user(&self, user: &User) -> ClientResult<User>;
    async fn delete_user(&self, id: &str) -> ClientResult<()>;
    async fn users(&self, page: u32, page_size: u32) -> ClientResult<Page<User>>;

    // Groups

    async fn group(&self, id: &str) -> ClientResult<Group>;
    async fn create_group(&self, group: &Group) -> ClientResult<Group>;
    async fn update_group(&self, group: &Group) -> ClientResult<Group>;
    /// Replace the full member list of a group
    async fn update_group_memberships(
        &self,
        group: &Group,
        member_ids: &[String],
    ) -> ClientResult<Group>;
    async fn delete_group(&self, id: &str) -> ClientResult<()>;
    async fn groups(&self, page: u32, page_size: u32) -> ClientResult<Page<Group>>;

    // Service accounts

    async fn service_account(&self, name: &str) -> ClientResult<ServiceAccount>;
    async fn create_service_account(
        &self,
        account: &ServiceAccount,
    ) -> ClientResult<ServiceAccount>;
    async fn update_service_account(
        &self,
        account: &ServiceAccount,
    ) -> ClientResult<ServiceAccount>;
    async fn delete_service_account(&self, name: &str) -> ClientResult<()>;

    async fn create_service_account_token(
        &self,
        service_account_name: &str,
        token: &ServiceAccountToken,
    ) -> ClientResult<ServiceAccountToken>;
    async fn service_account_tokens(
        &self,
        service_account_name: &str,
    ) -> ClientResult<Vec<ServiceAccountToken>>;
    async fn delete_service_account_token(
        &self,
        service_account_name: &str,
        token_id: &str,
    ) -> ClientResult<()>;
}
