//! In-memory [`Requester`] for controller tests
//!
//! Every call is recorded with its arguments. Entities get sequential ids
//! (`id1`, `id2`, ...), missing entities answer `NotFound`, and any method
//! can be made to fail with a given status.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use border0_client::types::{
    Connector, ConnectorToken, Group, GroupMember, Page, Pagination, Policy, ServiceAccount,
    ServiceAccountToken, Socket, User,
};
use border0_client::{ClientError, ClientResult, Requester};
use serde::Serialize;
use serde_json::{Value as Json, json};

use crate::config::ProviderMeta;

/// One recorded API call
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub method: &'static str,
    pub body: Json,
}

/// Entities held by the mock
#[derive(Debug, Default)]
pub struct MockState {
    next_id: u32,
    pub calls: Vec<Call>,
    pub failures: HashMap<&'static str, (u16, String)>,
    pub sockets: HashMap<String, Socket>,
    pub policies: HashMap<String, Policy>,
    /// socket id to attached policy ids
    pub attachments: HashMap<String, Vec<String>>,
    pub connectors: HashMap<String, Connector>,
    pub connector_tokens: Vec<ConnectorToken>,
    pub users: Vec<User>,
    pub groups: Vec<Group>,
    pub service_accounts: HashMap<String, ServiceAccount>,
    /// service account name to its tokens
    pub service_account_tokens: HashMap<String, Vec<ServiceAccountToken>>,
}

impl MockState {
    fn new_id(&mut self) -> String {
        self.next_id += 1;
        format!("id{}", self.next_id)
    }
}

#[derive(Debug, Default)]
pub struct MockRequester {
    state: Mutex<MockState>,
}

impl MockRequester {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Provider metadata backed by this mock, without read-after-write delay
    pub fn meta(self: &Arc<Self>) -> ProviderMeta {
        ProviderMeta::new(self.clone(), Duration::ZERO)
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    /// Make every later call of `method` fail
    pub fn fail(&self, method: &'static str, status: u16, message: &str) {
        self.state()
            .failures
            .insert(method, (status, message.to_string()));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    pub fn methods(&self) -> Vec<&'static str> {
        self.state().calls.iter().map(|c| c.method).collect()
    }

    /// Recorded calls that modify the platform
    pub fn writes(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| {
                ["create_", "update_", "delete_", "attach_", "remove_"]
                    .iter()
                    .any(|prefix| c.method.starts_with(prefix))
            })
            .collect()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    /// Add a user directly, returning its id
    pub fn insert_user(&self, display_name: &str, email: &str) -> String {
        let mut state = self.state();
        let id = state.new_id();
        state.users.push(User {
            id: id.clone(),
            display_name: display_name.to_string(),
            email: email.to_string(),
            role: "member".to_string(),
        });
        id
    }

    /// Add a group directly, returning its id
    pub fn insert_group(&self, display_name: &str) -> String {
        let mut state = self.state();
        let id = state.new_id();
        state.groups.push(Group {
            id: id.clone(),
            display_name: display_name.to_string(),
            members: Vec::new(),
        });
        id
    }

    fn begin(&self, method: &'static str, body: Json) -> ClientResult<MutexGuard<'_, MockState>> {
        let mut state = self.state();
        state.calls.push(Call { method, body });
        match state.failures.get(method) {
            Some((status, message)) => Err(ClientError::from_response(*status, message)),
            None => Ok(state),
        }
    }
}

fn body<T: Serialize>(value: &T) -> Json {
    serde_json::to_value(value).unwrap()
}

fn not_found(kind: &str, id: &str) -> ClientError {
    ClientError::NotFound(format!("{kind} {id} not found"))
}

fn page_of<T: Clone>(items: &[T], page: u32, page_size: u32) -> Page<T> {
    let size = page_size.max(1) as usize;
    let total_pages = items.len().div_ceil(size).max(1) as u32;
    let start = (page.saturating_sub(1) as usize) * size;
    Page {
        list: items.iter().skip(start).take(size).cloned().collect(),
        pagination: Pagination {
            current_page: page,
            total_pages,
        },
    }
}

#[async_trait]
impl Requester for MockRequester {
    async fn socket(&self, id: &str) -> ClientResult<Socket> {
        let state = self.begin("socket", json!({ "id": id }))?;
        state.sockets.get(id).cloned().ok_or_else(|| not_found("socket", id))
    }

    async fn create_socket(&self, socket: &Socket) -> ClientResult<Socket> {
        let mut state = self.begin("create_socket", body(socket))?;
        let mut created = socket.clone();
        created.socket_id = state.new_id();
        state.sockets.insert(created.socket_id.clone(), created.clone());
        Ok(created)
    }

    async fn update_socket(&self, socket: &Socket) -> ClientResult<Socket> {
        let mut state = self.begin("update_socket", body(socket))?;
        let slot = state
            .sockets
            .get_mut(&socket.socket_id)
            .ok_or_else(|| not_found("socket", &socket.socket_id))?;
        *slot = socket.clone();
        Ok(socket.clone())
    }

    async fn delete_socket(&self, id: &str) -> ClientResult<()> {
        let mut state = self.begin("delete_socket", json!({ "id": id }))?;
        state.attachments.remove(id);
        state.sockets.remove(id).map(|_| ()).ok_or_else(|| not_found("socket", id))
    }

    async fn policy(&self, id: &str) -> ClientResult<Policy> {
        let state = self.begin("policy", json!({ "id": id }))?;
        state.policies.get(id).cloned().ok_or_else(|| not_found("policy", id))
    }

    async fn create_policy(&self, policy: &Policy) -> ClientResult<Policy> {
        let mut state = self.begin("create_policy", body(policy))?;
        let mut created = policy.clone();
        created.id = state.new_id();
        state.policies.insert(created.id.clone(), created.clone());
        Ok(created)
    }

    async fn update_policy(&self, policy: &Policy) -> ClientResult<Policy> {
        let mut state = self.begin("update_policy", body(policy))?;
        let slot = state
            .policies
            .get_mut(&policy.id)
            .ok_or_else(|| not_found("policy", &policy.id))?;
        *slot = policy.clone();
        Ok(policy.clone())
    }

    async fn delete_policy(&self, id: &str) -> ClientResult<()> {
        let mut state = self.begin("delete_policy", json!({ "id": id }))?;
        state.policies.remove(id).map(|_| ()).ok_or_else(|| not_found("policy", id))
    }

    async fn attach_policy_to_socket(&self, policy_id: &str, socket_id: &str) -> ClientResult<()> {
        let mut state = self.begin(
            "attach_policy_to_socket",
            json!({ "policy_id": policy_id, "socket_id": socket_id }),
        )?;
        if !state.policies.contains_key(policy_id) {
            return Err(not_found("policy", policy_id));
        }
        if !state.sockets.contains_key(socket_id) {
            return Err(not_found("socket", socket_id));
        }
        let attached = state.attachments.entry(socket_id.to_string()).or_default();
        if !attached.iter().any(|p| p == policy_id) {
            attached.push(policy_id.to_string());
        }
        Ok(())
    }

    async fn remove_policy_from_socket(
        &self,
        policy_id: &str,
        socket_id: &str,
    ) -> ClientResult<()> {
        let mut state = self.begin(
            "remove_policy_from_socket",
            json!({ "policy_id": policy_id, "socket_id": socket_id }),
        )?;
        let attached = state
            .attachments
            .get_mut(socket_id)
            .ok_or_else(|| not_found("socket", socket_id))?;
        let before = attached.len();
        attached.retain(|p| p != policy_id);
        if attached.len() == before {
            return Err(not_found("policy attachment", policy_id));
        }
        Ok(())
    }

    async fn socket_policy_ids(&self, socket_id: &str) -> ClientResult<Vec<String>> {
        let state = self.begin("socket_policy_ids", json!({ "socket_id": socket_id }))?;
        if !state.sockets.contains_key(socket_id) {
            return Err(not_found("socket", socket_id));
        }
        Ok(state.attachments.get(socket_id).cloned().unwrap_or_default())
    }

    async fn connector(&self, id: &str) -> ClientResult<Connector> {
        let state = self.begin("connector", json!({ "id": id }))?;
        state.connectors.get(id).cloned().ok_or_else(|| not_found("connector", id))
    }

    async fn create_connector(&self, connector: &Connector) -> ClientResult<Connector> {
        let mut state = self.begin("create_connector", body(connector))?;
        let mut created = connector.clone();
        created.connector_id = state.new_id();
        state
            .connectors
            .insert(created.connector_id.clone(), created.clone());
        Ok(created)
    }

    async fn update_connector(&self, connector: &Connector) -> ClientResult<Connector> {
        let mut state = self.begin("update_connector", body(connector))?;
        let slot = state
            .connectors
            .get_mut(&connector.connector_id)
            .ok_or_else(|| not_found("connector", &connector.connector_id))?;
        *slot = connector.clone();
        Ok(connector.clone())
    }

    async fn delete_connector(&self, id: &str) -> ClientResult<()> {
        let mut state = self.begin("delete_connector", json!({ "id": id }))?;
        state
            .connectors
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| not_found("connector", id))
    }

    async fn create_connector_token(
        &self,
        token: &ConnectorToken,
    ) -> ClientResult<ConnectorToken> {
        let mut state = self.begin("create_connector_token", body(token))?;
        if !state.connectors.contains_key(&token.connector_id) {
            return Err(not_found("connector", &token.connector_id));
        }
        let mut created = token.clone();
        created.id = state.new_id();
        created.token = None;
        state.connector_tokens.push(created.clone());
        created.token = Some(format!("secret-{}", created.id));
        Ok(created)
    }

    async fn connector_tokens(&self, connector_id: &str) -> ClientResult<Vec<ConnectorToken>> {
        let state = self.begin("connector_tokens", json!({ "connector_id": connector_id }))?;
        if !state.connectors.contains_key(connector_id) {
            return Err(not_found("connector", connector_id));
        }
        Ok(state
            .connector_tokens
            .iter()
            .filter(|t| t.connector_id == connector_id)
            .cloned()
            .collect())
    }

    async fn delete_connector_token(
        &self,
        connector_id: &str,
        token_id: &str,
    ) -> ClientResult<()> {
        let mut state = self.begin(
            "delete_connector_token",
            json!({ "connector_id": connector_id, "id": token_id }),
        )?;
        let before = state.connector_tokens.len();
        state
            .connector_tokens
            .retain(|t| !(t.connector_id == connector_id && t.id == token_id));
        if state.connector_tokens.len() == before {
            return Err(not_found("connector token", token_id));
        }
        Ok(())
    }

    async fn user(&self, id: &str) -> ClientResult<User> {
        let state = self.begin("user", json!({ "id": id }))?;
        state
            .users
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or_else(|| not_found("user", id))
    }

    async fn create_user(&self, user: &User, notify_by_email: bool) -> ClientResult<User> {
        let mut state = self.begin(
            "create_user",
            json!({ "user": body(user), "notify_by_email": notify_by_email }),
        )?;
        let mut created = user.clone();
        created.id = state.new_id();
        state.users.push(created.clone());
        Ok(created)
    }

    async fn update_user(&self, user: &User) -> ClientResult<User> {
        let mut state = self.begin("update_user", body(user))?;
        let slot = state
            .users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or_else(|| not_found("user", &user.id))?;
        *slot = user.clone();
        Ok(user.clone())
    }

    async fn delete_user(&self, id: &str) -> ClientResult<()> {
        let mut state = self.begin("delete_user", json!({ "id": id }))?;
        let before = state.users.len();
        state.users.retain(|u| u.id != id);
        if state.users.len() == before {
            return Err(not_found("user", id));
        }
        Ok(())
    }

    async fn users(&self, page: u32, page_size: u32) -> ClientResult<Page<User>> {
        let state = self.begin("users", json!({ "page": page, "page_size": page_size }))?;
        Ok(page_of(&state.users, page, page_size))
    }

    async fn group(&self, id: &str) -> ClientResult<Group> {
        let state = self.begin("group", json!({ "id": id }))?;
        state
            .groups
            .iter()
            .find(|g| g.id == id)
            .cloned()
            .ok_or_else(|| not_found("group", id))
    }

    async fn create_group(&self, group: &Group) -> ClientResult<Group> {
        let mut state = self.begin("create_group", body(group))?;
        let created = Group {
            id: state.new_id(),
            display_name: group.display_name.clone(),
            members: Vec::new(),
        };
        state.groups.push(created.clone());
        Ok(created)
    }

    async fn update_group(&self, group: &Group) -> ClientResult<Group> {
        let mut state = self.begin("update_group", body(group))?;
        let slot = state
            .groups
            .iter_mut()
            .find(|g| g.id == group.id)
            .ok_or_else(|| not_found("group", &group.id))?;
        slot.display_name = group.display_name.clone();
        Ok(slot.clone())
    }

    async fn update_group_memberships(
        &self,
        group: &Group,
        member_ids: &[String],
    ) -> ClientResult<Group> {
        let mut state = self.begin(
            "update_group_memberships",
            json!({ "id": group.id, "members": member_ids }),
        )?;
        let members: Vec<GroupMember> = member_ids
            .iter()
            .map(|id| {
                let user = state.users.iter().find(|u| &u.id == id);
                GroupMember {
                    id: id.clone(),
                    display_name: user.map(|u| u.display_name.clone()).unwrap_or_default(),
                    email: user.map(|u| u.email.clone()).unwrap_or_default(),
                }
            })
            .collect();
        let slot = state
            .groups
            .iter_mut()
            .find(|g| g.id == group.id)
            .ok_or_else(|| not_found("group", &group.id))?;
        slot.members = members;
        Ok(slot.clone())
    }

    async fn delete_group(&self, id: &str) -> ClientResult<()> {
        let mut state = self.begin("delete_group", json!({ "id": id }))?;
        let before = state.groups.len();
        state.groups.retain(|g| g.id != id);
        if state.groups.len() == before {
            return Err(not_found("group", id));
        }
        Ok(())
    }

    async fn groups(&self, page: u32, page_size: u32) -> ClientResult<Page<Group>> {
        let state = self.begin("groups", json!({ "page": page, "page_size": page_size }))?;
        Ok(page_of(&state.groups, page, page_size))
    }

    async fn service_account(&self, name: &str) -> ClientResult<ServiceAccount> {
        let state = self.begin("service_account", json!({ "name": name }))?;
        state
            .service_accounts
            .get(name)
            .cloned()
            .ok_or_else(|| not_found("service account", name))
    }

    async fn create_service_account(
        &self,
        account: &ServiceAccount,
    ) -> ClientResult<ServiceAccount> {
        let mut state = self.begin("create_service_account", body(account))?;
        state
            .service_accounts
            .insert(account.name.clone(), account.clone());
        Ok(account.clone())
    }

    async fn update_service_account(
        &self,
        account: &ServiceAccount,
    ) -> ClientResult<ServiceAccount> {
        let mut state = self.begin("update_service_account", body(account))?;
        let slot = state
            .service_accounts
            .get_mut(&account.name)
            .ok_or_else(|| not_found("service account", &account.name))?;
        *slot = account.clone();
        Ok(account.clone())
    }

    async fn delete_service_account(&self, name: &str) -> ClientResult<()> {
        let mut state = self.begin("delete_service_account", json!({ "name": name }))?;
        state.service_account_tokens.remove(name);
        state
            .service_accounts
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| not_found("service account", name))
    }

    async fn create_service_account_token(
        &self,
        service_account_name: &str,
        token: &ServiceAccountToken,
    ) -> ClientResult<ServiceAccountToken> {
        let mut state = self.begin(
            "create_service_account_token",
            json!({ "service_account_name": service_account_name, "token": body(token) }),
        )?;
        if !state.service_accounts.contains_key(service_account_name) {
            return Err(not_found("service account", service_account_name));
        }
        let mut created = token.clone();
        created.id = state.new_id();
        created.token = None;
        state
            .service_account_tokens
            .entry(service_account_name.to_string())
            .or_default()
            .push(created.clone());
        created.token = Some(format!("secret-{}", created.id));
        Ok(created)
    }

    async fn service_account_tokens(
        &self,
        service_account_name: &str,
    ) -> ClientResult<Vec<ServiceAccountToken>> {
        let state = self.begin(
            "service_account_tokens",
            json!({ "service_account_name": service_account_name }),
        )?;
        if !state.service_accounts.contains_key(service_account_name) {
            return Err(not_found("service account", service_account_name));
        }
        Ok(state
            .service_account_tokens
            .get(service_account_name)
            .cloned()
            .unwrap_or_default())
    }

    async fn delete_service_account_token(
        &self,
        service_account_name: &str,
        token_id: &str,
    ) -> ClientResult<()> {
        let mut state = self.begin(
            "delete_service_account_token",
            json!({ "service_account_name": service_account_name, "id": token_id }),
        )?;
        let tokens = state
            .service_account_tokens
            .get_mut(service_account_name)
            .ok_or_else(|| not_found("service account", service_account_name))?;
        let before = tokens.len();
        tokens.retain(|t| t.id != token_id);
        if tokens.len() == before {
            return Err(not_found("service account token", token_id));
        }
        Ok(())
    }
}
