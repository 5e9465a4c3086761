//! HTTP implementation of [`Requester`]

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{ClientError, ClientResult};
use crate::requester::Requester;
use crate::types::{
    Connector, ConnectorToken, Group, Page, Policy, ServiceAccount, ServiceAccountToken, Socket,
    User,
};

/// Platform endpoint used when nothing else is configured
pub const DEFAULT_API_URL: &str = "https://api.border0.com/api/v1";

const TOKEN_HEADER: &str = "x-access-token";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Deserialize)]
struct List<T> {
    #[serde(default = "Vec::new")]
    list: Vec<T>,
}

#[derive(Deserialize)]
struct IdOnly {
    id: String,
}

/// Client for the Border0 REST API
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(base_url: &str, token: &str) -> ClientResult<Self> {
        Self::with_timeout(base_url, token, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, token: &str, timeout: Duration) -> ClientResult<Self> {
        let url = Url::parse(base_url)
            .map_err(|e| ClientError::Configuration(format!("invalid api_url {base_url}: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ClientError::Configuration(format!(
                "invalid api_url {base_url}: scheme must be http or https"
            )));
        }
        if token.is_empty() {
            return Err(ClientError::Configuration("token is empty".to_string()));
        }

        let mut token_value = HeaderValue::from_str(token)
            .map_err(|_| ClientError::Configuration("token is not a valid header".to_string()))?;
        token_value.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(TOKEN_HEADER, token_value);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("border0-provider/", env!("CARGO_PKG_VERSION"))),
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a request and return the raw body of a successful response
    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> ClientResult<String> {
        let url = format!("{}{}", self.base_url, path);
        debug!("{method} {path}");

        let mut request = self.http.request(method.clone(), &url);
        if let Some(bytes) = body {
            request = request
                .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
                .body(bytes);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        if status.is_success() {
            Ok(text)
        } else {
            debug!("{method} {path} failed with status {}", status.as_u16());
            Err(ClientError::from_response(status.as_u16(), &text))
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let text = self.execute(Method::GET, path, None).await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn send<B, T>(&self, method: Method, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let bytes = serde_json::to_vec(body)?;
        let text = self.execute(method, path, Some(bytes)).await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn send_discard<B>(&self, method: Method, path: &str, body: &B) -> ClientResult<()>
    where
        B: Serialize + ?Sized + Sync,
    {
        let bytes = serde_json::to_vec(body)?;
        self.execute(method, path, Some(bytes)).await?;
        Ok(())
    }

    async fn delete(&self, path: &str) -> ClientResult<()> {
        self.execute(Method::DELETE, path, None).await?;
        Ok(())
    }

    async fn change_socket_attachment(
        &self,
        action: &str,
        policy_id: &str,
        socket_id: &str,
    ) -> ClientResult<()> {
        let body = json!({ "actions": [{ "action": action, "id": socket_id }] });
        self.send_discard(
            Method::PUT,
            &format!("/policy/{policy_id}/socket_attachments"),
            &body,
        )
        .await
    }
}

#[async_trait]
impl Requester for ApiClient {
    async fn socket(&self, id: &str) -> ClientResult<Socket> {
        self.get(&format!("/socket/{id}")).await
    }

    async fn create_socket(&self, socket: &Socket) -> ClientResult<Socket> {
        self.send(Method::POST, "/socket", socket).await
    }

    async fn update_socket(&self, socket: &Socket) -> ClientResult<Socket> {
        self.send(Method::PUT, &format!("/socket/{}", socket.socket_id), socket)
            .await
    }

    async fn delete_socket(&self, id: &str) -> ClientResult<()> {
        self.delete(&format!("/socket/{id}")).await
    }

    async fn policy(&self, id: &str) -> ClientResult<Policy> {
        self.get(&format!("/policy/{id}")).await
    }

    async fn create_policy(&self, policy: &Policy) -> ClientResult<Policy> {
        self.send(Method::POST, "/policies", policy).await
    }

    async fn update_policy(&self, policy: &Policy) -> ClientResult<Policy> {
        self.send(Method::PUT, &format!("/policy/{}", policy.id), policy)
            .await
    }

    async fn delete_policy(&self, id: &str) -> ClientResult<()> {
        self.delete(&format!("/policy/{id}")).await
    }

    async fn attach_policy_to_socket(&self, policy_id: &str, socket_id: &str) -> ClientResult<()> {
        self.change_socket_attachment("add", policy_id, socket_id)
            .await
    }

    async fn remove_policy_from_socket(
        &self,
        policy_id: &str,
        socket_id: &str,
    ) -> ClientResult<()> {
        self.change_socket_attachment("remove", policy_id, socket_id)
            .await
    }

    async fn socket_policy_ids(&self, socket_id: &str) -> ClientResult<Vec<String>> {
        let policies: Vec<IdOnly> = self.get(&format!("/socket/{socket_id}/policy")).await?;
        Ok(policies.into_iter().map(|p| p.id).collect())
    }

    async fn connector(&self, id: &str) -> ClientResult<Connector> {
        self.get(&format!("/connector/{id}")).await
    }

    async fn create_connector(&self, connector: &Connector) -> ClientResult<Connector> {
        self.send(Method::POST, "/connector", connector).await
    }

    async fn update_connector(&self, connector: &Connector) -> ClientResult<Connector> {
        self.send(Method::PUT, "/connector", connector).await
    }

    async fn delete_connector(&self, id: &str) -> ClientResult<()> {
        self.delete(&format!("/connector/{id}")).await
    }

    async fn create_connector_token(
        &self,
        token: &ConnectorToken,
    ) -> ClientResult<ConnectorToken> {
        self.send(Method::POST, "/connector/token", token).await
    }

    async fn connector_tokens(&self, connector_id: &str) -> ClientResult<Vec<ConnectorToken>> {
        let tokens: List<ConnectorToken> = self
            .get(&format!("/connector/{connector_id}/tokens"))
            .await?;
        Ok(tokens.list)
    }

    async fn delete_connector_token(&self, connector_id: &str, token_id: &str) -> ClientResult<()> {
        self.delete(&format!("/connector/{connector_id}/token/{token_id}"))
            .await
    }

    async fn user(&self, id: &str) -> ClientResult<User> {
        self.get(&format!("/organizations/iam/users/{id}")).await
    }

    async fn create_user(&self, user: &User, notify_by_email: bool) -> ClientResult<User> {
        self.send(
            Method::POST,
            &format!("/organizations/iam/users?notify_by_email={notify_by_email}"),
            user,
        )
        .await
    }

    async fn update_user(&self, user: &User) -> ClientResult<User> {
        self.send(
            Method::PUT,
            &format!("/organizations/iam/users/{}", user.id),
            user,
        )
        .await
    }

    async fn delete_user(&self, id: &str) -> ClientResult<()> {
        self.delete(&format!("/organizations/iam/users/{id}")).await
    }

    async fn users(&self, page: u32, page_size: u32) -> ClientResult<Page<User>> {
        self.get(&format!(
            "/organizations/iam/users?page={page}&page_size={page_size}"
        ))
        .await
    }

    async fn group(&self, id: &str) -> ClientResult<Group> {
        self.get(&format!("/organizations/iam/groups/{id}")).await
    }

    async fn create_group(&self, group: &Group) -> ClientResult<Group> {
        let body = json!({ "display_name": group.display_name });
        self.send(Method::POST, "/organizations/iam/groups", &body)
            .await
    }

    async fn update_group(&self, group: &Group) -> ClientResult<Group> {
        let body = json!({ "display_name": group.display_name });
        self.send(
            Method::PUT,
            &format!("/organizations/iam/groups/{}", group.id),
            &body,
        )
        .await
    }

    async fn update_group_memberships(
        &self,
        group: &Group,
        member_ids: &[String],
    ) -> ClientResult<Group> {
        let body = json!({ "members": member_ids });
        self.send(
            Method::PUT,
            &format!("/organizations/iam/groups/{}/members", group.id),
            &body,
        )
        .await
    }

    async fn delete_group(&self, id: &str) -> ClientResult<()> {
        self.delete(&format!("/organizations/iam/groups/{id}")).await
    }

    async fn groups(&self, page: u32, page_size: u32) -> ClientResult<Page<Group>> {
        self.get(&format!(
            "/organizations/iam/groups?page={page}&page_size={page_size}"
        ))
        .await
    }

    async fn service_account(&self, name: &str) -> ClientResult<ServiceAccount> {
        self.get(&format!("/organizations/iam/service_accounts/{name}"))
            .await
    }

    async fn create_service_account(
        &self,
        account: &ServiceAccount,
    ) -> ClientResult<ServiceAccount> {
        self.send(Method::POST, "/organizations/iam/service_accounts", account)
            .await
    }

    async fn update_service_account(
        &self,
        account: &ServiceAccount,
    ) -> ClientResult<ServiceAccount> {
        self.send(
            Method::PUT,
            &format!("/organizations/iam/service_accounts/{}", account.name),
            account,
        )
        .await
    }

    async fn delete_service_account(&self, name: &str) -> ClientResult<()> {
        self.delete(&format!("/organizations/iam/service_accounts/{name}"))
            .await
    }

    async fn create_service_account_token(
        &self,
        service_account_name: &str,
        token: &ServiceAccountToken,
    ) -> ClientResult<ServiceAccountToken> {
        self.send(
            Method::POST,
            &format!("/organizations/iam/service_accounts/{service_account_name}/tokens"),
            token,
        )
        .await
    }

    async fn service_account_tokens(
        &self,
        service_account_name: &str,
    ) -> ClientResult<Vec<ServiceAccountToken>> {
        let tokens: List<ServiceAccountToken> = self
            .get(&format!(
                "/organizations/iam/service_accounts/{service_account_name}/tokens"
            ))
            .await?;
        Ok(tokens.list)
    }

    async fn delete_service_account_token(
        &self,
        service_account_name: &str,
        token_id: &str,
    ) -> ClientResult<()> {
        self.delete(&format!(
            "/organizations/iam/service_accounts/{service_account_name}/tokens/{token_id}"
        ))
        .await
    }
}
