use async_trait::async_trait;
use border0_client::types::Group;
use border0_core::attributes::{Attributes, ResourceData};
use border0_core::provider::{ProviderError, ProviderResult};
use border0_core::resource::Value;
use border0_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types, validate_uuid};

use super::{ResourceController, api_error, deleted, found};
use crate::config::ProviderMeta;

pub struct GroupController;

fn group_from(data: &ResourceData) -> Group {
    Group {
        id: data.id().unwrap_or_default().to_string(),
        display_name: data.get_string("display_name").unwrap_or_default(),
        members: Vec::new(),
    }
}

/// Configured member ids, sorted for a stable request body
fn members(data: &ResourceData) -> Vec<String> {
    let mut members = data.get_strings("members");
    members.sort();
    members
}

#[async_trait]
impl ResourceController for GroupController {
    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new("group")
            .with_description("A group of users, referenced by policies")
            .attribute(AttributeSchema::new("display_name", AttributeType::String).required())
            .attribute(
                AttributeSchema::new("members", AttributeType::Set(Box::new(types::uuid())))
                    .optional()
                    .with_description("User ids; omitting the set removes every member"),
            )
    }

    fn validate(&self, data: &ResourceData) -> ProviderResult<()> {
        for member in data.get_strings("members") {
            validate_uuid(&member).map_err(|e| {
                ProviderError::new(format!("Invalid group member: {e}"))
                    .for_resource(data.resource_id())
            })?;
        }
        Ok(())
    }

    async fn read(&self, meta: &ProviderMeta, data: &mut ResourceData) -> ProviderResult<()> {
        let id = data.require_id()?.to_string();
        let result = meta.requester().group(&id).await;
        let Some(group) = found(data, result, "read group")? else {
            return Ok(());
        };

        let member_ids = group.member_ids();
        data.set_values([
            ("display_name", Value::from(group.display_name)),
            ("members", Value::string_set(member_ids)),
        ])
    }

    async fn create(&self, meta: &ProviderMeta, data: &mut ResourceData) -> ProviderResult<()> {
        let created = meta
            .requester()
            .create_group(&group_from(data))
            .await
            .map_err(|e| api_error(data, "create group", e))?;
        log::debug!("Created group {}", created.id);
        data.set_id(created.id.clone());

        let members = members(data);
        if !members.is_empty()
            && let Err(err) = meta
                .requester()
                .update_group_memberships(&created, &members)
                .await
        {
            let err = api_error(data, "update group memberships", err);
            // leave nothing behind for the host to lose track of
            return match meta.requester().delete_group(&created.id).await {
                Ok(()) => {
                    data.clear_id();
                    Err(err)
                }
                Err(cleanup) => Err(err.with_related(api_error(
                    data,
                    "delete group during cleanup",
                    cleanup,
                ))),
            };
        }

        self.read(meta, data).await
    }

    async fn update(&self, meta: &ProviderMeta, data: &mut ResourceData) -> ProviderResult<()> {
        let group = group_from(data);
        if data.has_change("members") {
            meta.requester()
                .update_group_memberships(&group, &members(data))
                .await
                .map_err(|e| api_error(data, "update group memberships", e))?;
        }
        if data.has_change("display_name") {
            meta.requester()
                .update_group(&group)
                .await
                .map_err(|e| api_error(data, "update group", e))?;
        }
        self.read(meta, data).await
    }

    async fn delete(&self, meta: &ProviderMeta, data: &mut ResourceData) -> ProviderResult<()> {
        let id = data.require_id()?.to_string();
        let result = meta.requester().delete_group(&id).await;
        deleted(data, result, "delete group")
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use super::*;
    use crate::testing::MockRequester;
    use border0_core::differ::{Diff, diff};
    use serde_json::json;

    const ALICE: &str = "11111111-1111-4111-8111-111111111111";
    const BOB: &str = "22222222-2222-4222-8222-222222222222";

    fn config(display_name: &str, members: &[&str]) -> HashMap<String, Value> {
        HashMap::from([
            ("display_name".to_string(), Value::from(display_name)),
            ("members".to_string(), Value::string_set(members.iter().copied())),
        ])
    }

    #[tokio::test]
    async fn members_set_then_cleared() {
        let mock = MockRequester::new();
        let meta = mock.meta();
        let schema = Arc::new(GroupController.schema());

        let mut data = ResourceData::for_create(schema.clone(), config("G", &[BOB, ALICE]));
        GroupController.validate(&data).unwrap();
        GroupController.create(&meta, &mut data).await.unwrap();
        assert_eq!(
            mock.methods(),
            vec!["create_group", "update_group_memberships", "group"]
        );
        assert_eq!(mock.calls()[1].body, json!({"id": "id1", "members": [ALICE, BOB]}));
        let state = data.into_state();
        assert_eq!(state.attributes, config("G", &[ALICE, BOB]));

        // clearing members and renaming: memberships first, then the group
        let desired = config("G2", &[]);
        let plan = diff(&schema, Some(&desired), Some(&state));
        let Diff::Update {
            planned,
            changed_attributes,
        } = plan
        else {
            panic!("expected update, got {plan:?}");
        };
        assert_eq!(changed_attributes, vec!["display_name", "members"]);

        mock.clear_calls();
        let mut data = ResourceData::for_update(schema, "id1", state.attributes, planned);
        GroupController.update(&meta, &mut data).await.unwrap();
        let writes = mock.writes();
        assert_eq!(writes.len(), 2);
        assert_eq!(writes[0].method, "update_group_memberships");
        assert_eq!(writes[0].body, json!({"id": "id1", "members": []}));
        assert_eq!(writes[1].method, "update_group");
        assert!(data.attribute("members").is_none());
    }

    #[tokio::test]
    async fn invalid_member_fails_before_any_call() {
        let mock = MockRequester::new();
        let schema = Arc::new(GroupController.schema());
        let data = ResourceData::for_create(schema.clone(), config("G", &[ALICE, "u-1111"]));

        let err = GroupController.validate(&data).unwrap_err();
        assert!(err.to_string().contains("Invalid UUID 'u-1111'"), "{err}");
        assert!(schema.validate(&config("G", &["u-1111"])).is_err());
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn failed_memberships_delete_the_group() {
        let mock = MockRequester::new();
        mock.fail("update_group_memberships", 500, "boom");
        let meta = mock.meta();
        let schema = Arc::new(GroupController.schema());

        let mut data = ResourceData::for_create(schema, config("G", &[ALICE]));
        let err = GroupController.create(&meta, &mut data).await.unwrap_err();
        assert!(err.to_string().contains("Failed to update group memberships"));
        assert_eq!(
            mock.methods(),
            vec!["create_group", "update_group_memberships", "delete_group"]
        );
        assert!(mock.state().groups.is_empty());
        assert!(data.id().is_none());
    }

    #[tokio::test]
    async fn failed_cleanup_reports_both_errors() {
        let mock = MockRequester::new();
        mock.fail("update_group_memberships", 500, "boom");
        mock.fail("delete_group", 500, "still boom");
        let meta = mock.meta();
        let schema = Arc::new(GroupController.schema());

        let mut data = ResourceData::for_create(schema, config("G", &[ALICE]));
        let err = GroupController.create(&meta, &mut data).await.unwrap_err();
        let summaries: Vec<String> = err.diagnostics().into_iter().map(|d| d.summary).collect();
        assert_eq!(
            summaries,
            vec![
                "[group.id1] Failed to update group memberships",
                "[group.id1] Failed to delete group during cleanup",
            ]
        );
    }

    #[tokio::test]
    async fn group_without_members_skips_memberships() {
        let mock = MockRequester::new();
        let meta = mock.meta();
        let schema = Arc::new(GroupController.schema());
        let mut data = ResourceData::for_create(schema, config("G", &[]));
        GroupController.create(&meta, &mut data).await.unwrap();
        assert_eq!(mock.methods(), vec!["create_group", "group"]);
    }
}
