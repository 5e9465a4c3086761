//! Name to id lookups for groups and users
//!
//! Both list every entity page by page, keep the ones whose name is asked
//! for and return the ids as a set. Names without a match are dropped.

use std::collections::HashSet;
use std::future::Future;

use async_trait::async_trait;
use border0_client::ClientResult;
use border0_client::types::Page;
use border0_core::attributes::{Attributes, ResourceData};
use border0_core::provider::ProviderResult;
use border0_core::resource::Value;
use border0_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

use super::{DataSource, checksum};
use crate::config::ProviderMeta;
use crate::resources::api_error;

const PAGE_SIZE: u32 = 100;

pub struct GroupNamesToIds;

pub struct UserEmailsToIds;

/// Collect every page of a listing
async fn all_pages<T, F, Fut>(mut fetch: F) -> ClientResult<Vec<T>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = ClientResult<Page<T>>>,
{
    let mut items = Vec::new();
    let mut page = 1;
    loop {
        let mut current = fetch(page).await?;
        log::debug!(
            "Fetched page {} of {}",
            current.pagination.current_page,
            current.pagination.total_pages
        );
        items.append(&mut current.list);
        match current.next_page() {
            Some(next) => page = next,
            None => return Ok(items),
        }
    }
}

fn lookup_schema(kind: &str, input: &str, description: &str) -> ResourceSchema {
    ResourceSchema::new(kind)
        .with_description(description)
        .attribute(AttributeSchema::new(input, AttributeType::string_set()).required())
        .attribute(AttributeSchema::new("ids", AttributeType::string_set()).computed())
}

/// Store the matching ids and derive the id from them
fn set_ids(data: &mut ResourceData, mut ids: Vec<String>) -> ProviderResult<()> {
    ids.sort();
    ids.dedup();
    data.set_id(checksum(&ids.join(",")));
    data.set("ids", Value::string_set(ids))
}

#[async_trait]
impl DataSource for GroupNamesToIds {
    fn schema(&self) -> ResourceSchema {
        lookup_schema(
            "group_names_to_ids",
            "names",
            "Ids of the groups with the given display names",
        )
    }

    async fn read(&self, meta: &ProviderMeta, data: &mut ResourceData) -> ProviderResult<()> {
        let names: HashSet<String> = data.get_strings("names").into_iter().collect();
        let groups = all_pages(|page| meta.requester().groups(page, PAGE_SIZE))
            .await
            .map_err(|e| api_error(data, "list groups", e))?;

        let ids = groups
            .into_iter()
            .filter(|group| names.contains(&group.display_name))
            .map(|group| group.id)
            .collect();
        set_ids(data, ids)
    }
}

#[async_trait]
impl DataSource for UserEmailsToIds {
    fn schema(&self) -> ResourceSchema {
        lookup_schema(
            "user_emails_to_ids",
            "emails",
            "Ids of the users with the given email addresses",
        )
    }

    async fn read(&self, meta: &ProviderMeta, data: &mut ResourceData) -> ProviderResult<()> {
        let emails: HashSet<String> = data.get_strings("emails").into_iter().collect();
        let users = all_pages(|page| meta.requester().users(page, PAGE_SIZE))
            .await
            .map_err(|e| api_error(data, "list users", e))?;

        let ids = users
            .into_iter()
            .filter(|user| emails.contains(&user.email))
            .map(|user| user.id)
            .collect();
        set_ids(data, ids)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use super::*;
    use crate::testing::MockRequester;
    use serde_json::json;

    async fn lookup(
        source: &dyn DataSource,
        mock: &Arc<MockRequester>,
        input: &str,
        values: &[&str],
    ) -> ResourceData {
        let config = HashMap::from([(
            input.to_string(),
            Value::string_set(values.iter().copied()),
        )]);
        let mut data = ResourceData::for_data_source(Arc::new(source.schema()), config);
        source.read(&mock.meta(), &mut data).await.unwrap();
        data
    }

    #[tokio::test]
    async fn groups_by_name_across_pages() {
        let mock = MockRequester::new();
        let mut wanted = Vec::new();
        for i in 0..150 {
            let id = mock.insert_group(&format!("group-{i}"));
            if i == 3 || i == 120 {
                wanted.push(id);
            }
        }

        let data = lookup(
            &GroupNamesToIds,
            &mock,
            "names",
            &["group-120", "missing", "group-3"],
        )
        .await;
        assert_eq!(data.attribute("ids"), Some(&Value::string_set(wanted.clone())));
        assert_eq!(mock.methods(), vec!["groups", "groups"]);
        assert_eq!(mock.calls()[1].body, json!({"page": 2, "page_size": 100}));

        wanted.sort();
        assert_eq!(data.id(), Some(checksum(&wanted.join(",")).as_str()));
    }

    #[tokio::test]
    async fn input_order_does_not_matter() {
        let mock = MockRequester::new();
        mock.insert_user("Jane", "jane@example.com");
        mock.insert_user("John", "john@example.com");

        let a = lookup(
            &UserEmailsToIds,
            &mock,
            "emails",
            &["jane@example.com", "john@example.com"],
        )
        .await;
        let b = lookup(
            &UserEmailsToIds,
            &mock,
            "emails",
            &["john@example.com", "jane@example.com", "nobody@example.com"],
        )
        .await;
        assert_eq!(a.id(), b.id());
        assert_eq!(a.attribute("ids"), Some(&Value::string_set(["id1", "id2"])));
        assert_eq!(b.attribute("ids"), a.attribute("ids"));
    }

    #[tokio::test]
    async fn no_match_is_an_empty_set() {
        let mock = MockRequester::new();
        mock.insert_user("Jane", "jane@example.com");
        let data = lookup(&UserEmailsToIds, &mock, "emails", &["nobody@example.com"]).await;
        assert!(data.attribute("ids").is_none());
        assert_eq!(data.id(), Some(checksum("").as_str()));
    }
}
