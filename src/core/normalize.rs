//! Entity normalizer
//!
//! Projects a raw `GetAccountAuthorizationDetails` document into the four
//! typed collections of an [`AuthorizationModel`]. Projection is field by
//! field and never fails on shape: missing or ill-typed fields fall back to
//! their defaults, and nested documents (trust policies, policy versions,
//! inline policies) pass through untouched.

use super::entity::{
    AttachedPolicy, Entity, EntityKind, Group, Policy, PolicyVersion, Role, User,
};
use super::model::{AuthorizationModel, EntityMap};
use crate::error::{AtlasError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Top-level list keys of the export
pub const USER_LIST_KEY: &str = "UserDetailList";
pub const ROLE_LIST_KEY: &str = "RoleDetailList";
pub const POLICY_LIST_KEY: &str = "Policies";
pub const GROUP_LIST_KEY: &str = "GroupDetailList";

/// What to do when two elements of one list share an ID
///
/// Elements without an ID are all keyed under the empty string, so they
/// collide with each other the same way.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateIdPolicy {
    /// Keep the last record seen, at the position of the first
    #[default]
    Overwrite,
    /// Fail normalization with [`AtlasError::DuplicateId`]
    Reject,
}

/// Options for [`normalize_with`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeOptions {
    pub duplicate_ids: DuplicateIdPolicy,
}

/// Normalize a raw export with default options
///
/// Never fails: duplicate IDs overwrite earlier records.
pub fn normalize(raw: &Value) -> AuthorizationModel {
    let mut users = EntityMap::new();
    let mut roles = EntityMap::new();
    let mut policies = EntityMap::new();
    let mut groups = EntityMap::new();

    for element in elements(raw, list_key(EntityKind::User)) {
        note_replaced(users.insert(project_user(element)));
    }
    for element in elements(raw, list_key(EntityKind::Role)) {
        note_replaced(roles.insert(project_role(element)));
    }
    for element in elements(raw, list_key(EntityKind::Policy)) {
        note_replaced(policies.insert(project_policy(element)));
    }
    for element in elements(raw, list_key(EntityKind::Group)) {
        note_replaced(groups.insert(project_group(element)));
    }

    finish(users, roles, policies, groups)
}

/// Normalize a raw export under explicit options
pub fn normalize_with(raw: &Value, options: &NormalizeOptions) -> Result<AuthorizationModel> {
    match options.duplicate_ids {
        DuplicateIdPolicy::Overwrite => Ok(normalize(raw)),
        DuplicateIdPolicy::Reject => {
            let users = collect_strict(raw, list_key(EntityKind::User), project_user)?;
            let roles = collect_strict(raw, list_key(EntityKind::Role), project_role)?;
            let policies = collect_strict(raw, list_key(EntityKind::Policy), project_policy)?;
            let groups = collect_strict(raw, list_key(EntityKind::Group), project_group)?;
            Ok(finish(users, roles, policies, groups))
        }
    }
}

fn finish(
    users: EntityMap<User>,
    roles: EntityMap<Role>,
    policies: EntityMap<Policy>,
    groups: EntityMap<Group>,
) -> AuthorizationModel {
    debug!(
        users = users.len(),
        roles = roles.len(),
        policies = policies.len(),
        groups = groups.len(),
        "Normalized authorization export"
    );
    AuthorizationModel::new(users, roles, policies, groups)
}

fn note_replaced<T: Entity>(replaced: Option<T>) {
    if let Some(old) = replaced {
        warn!(kind = %T::KIND, id = old.id(), "Duplicate id in export, keeping last record");
    }
}

fn collect_strict<T: Entity>(
    raw: &Value,
    key: &str,
    project: fn(&Map<String, Value>) -> T,
) -> Result<EntityMap<T>> {
    let mut map = EntityMap::new();
    for element in elements(raw, key) {
        let entity = project(element);
        if map.contains(entity.id()) {
            return Err(AtlasError::DuplicateId {
                kind: T::KIND,
                id: entity.id().to_string(),
            });
        }
        map.insert(entity);
    }
    Ok(map)
}

/// Object elements of a top-level list; anything else is skipped
fn elements<'a>(raw: &'a Value, key: &str) -> impl Iterator<Item = &'a Map<String, Value>> + 'a {
    raw.get(key)
        .and_then(Value::as_array)
        .map(|list| list.as_slice())
        .unwrap_or_default()
        .iter()
        .filter_map(Value::as_object)
}

fn id_field(element: &Map<String, Value>, key: &str) -> String {
    string_field(element, key).unwrap_or_default()
}

fn string_field(element: &Map<String, Value>, key: &str) -> Option<String> {
    element.get(key).and_then(Value::as_str).map(str::to_string)
}

fn list_field(element: &Map<String, Value>, key: &str) -> Vec<Value> {
    element
        .get(key)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

fn object_field(element: &Map<String, Value>, key: &str) -> Value {
    match element.get(key) {
        Some(value) if value.is_object() => value.clone(),
        _ => Value::Object(Map::new()),
    }
}

fn string_list_field(element: &Map<String, Value>, key: &str) -> Vec<String> {
    element
        .get(key)
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn attachments_field(element: &Map<String, Value>) -> Vec<AttachedPolicy> {
    element
        .get("AttachedManagedPolicies")
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(Value::as_object)
                .map(|attachment| AttachedPolicy {
                    policy_arn: string_field(attachment, "PolicyArn"),
                    policy_name: string_field(attachment, "PolicyName"),
                })
                .collect()
        })
        .unwrap_or_default()
}

fn versions_field(element: &Map<String, Value>) -> Vec<PolicyVersion> {
    element
        .get("PolicyVersionList")
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(Value::as_object)
                .map(|version| PolicyVersion {
                    version_id: string_field(version, "VersionId"),
                    document: version.get("Document").cloned(),
                    is_default_version: version.get("IsDefaultVersion").and_then(Value::as_bool),
                    create_date: string_field(version, "CreateDate"),
                })
                .collect()
        })
        .unwrap_or_default()
}

fn project_user(element: &Map<String, Value>) -> User {
    User {
        user_id: id_field(element, "UserId"),
        user_name: string_field(element, "UserName"),
        arn: string_field(element, "Arn"),
        create_date: string_field(element, "CreateDate"),
        attached_managed_policies: attachments_field(element),
        group_list: string_list_field(element, "GroupList"),
        user_policy_list: list_field(element, "UserPolicyList"),
        tags: list_field(element, "Tags"),
    }
}

fn project_role(element: &Map<String, Value>) -> Role {
    Role {
        role_id: id_field(element, "RoleId"),
        role_name: string_field(element, "RoleName"),
        arn: string_field(element, "Arn"),
        create_date: string_field(element, "CreateDate"),
        assume_role_policy_document: object_field(element, "AssumeRolePolicyDocument"),
        attached_managed_policies: attachments_field(element),
        role_policy_list: list_field(element, "RolePolicyList"),
        tags: list_field(element, "Tags"),
    }
}

fn project_policy(element: &Map<String, Value>) -> Policy {
    Policy {
        policy_id: id_field(element, "PolicyId"),
        policy_name: string_field(element, "PolicyName"),
        arn: string_field(element, "Arn"),
        create_date: string_field(element, "CreateDate"),
        default_version_id: string_field(element, "DefaultVersionId"),
        policy_version_list: versions_field(element),
        attachment_count: element.get("AttachmentCount").and_then(Value::as_u64),
        is_attachable: element.get("IsAttachable").and_then(Value::as_bool),
        description: string_field(element, "Description").unwrap_or_default(),
    }
}

fn project_group(element: &Map<String, Value>) -> Group {
    Group {
        group_id: id_field(element, "GroupId"),
        group_name: string_field(element, "GroupName"),
        arn: string_field(element, "Arn"),
        create_date: string_field(element, "CreateDate"),
        attached_managed_policies: attachments_field(element),
        group_policy_list: list_field(element, "GroupPolicyList"),
    }
}

/// Top-level key holding the list of `kind`
pub fn list_key(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::User => USER_LIST_KEY,
        EntityKind::Role => ROLE_LIST_KEY,
        EntityKind::Policy => POLICY_LIST_KEY,
        EntityKind::Group => GROUP_LIST_KEY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_and_absent_lists() {
        for raw in [
            json!({}),
            json!({"UserDetailList": [], "RoleDetailList": [], "Policies": [], "GroupDetailList": []}),
            json!({"UserDetailList": null, "Policies": "oops"}),
            json!([1, 2, 3]),
            json!(null),
        ] {
            let model = normalize(&raw);
            assert!(model.is_empty(), "expected empty model for {}", raw);
        }
    }

    #[test]
    fn test_user_fields_are_defaulted() {
        let raw = json!({"UserDetailList": [{"UserId": "AIDA1", "UserName": "alice"}]});
        let model = normalize(&raw);
        let user = model.user("AIDA1").unwrap();

        assert_eq!(user.user_name.as_deref(), Some("alice"));
        assert!(user.arn.is_none());
        assert!(user.attached_managed_policies.is_empty());
        assert!(user.group_list.is_empty());
        assert!(user.user_policy_list.is_empty());
        assert!(user.tags.is_empty());
    }

    #[test]
    fn test_role_trust_document_defaults_to_object() {
        let raw = json!({"RoleDetailList": [
            {"RoleId": "AROA1"},
            {"RoleId": "AROA2", "AssumeRolePolicyDocument": "not-a-document"}
        ]});
        let model = normalize(&raw);
        assert_eq!(model.role("AROA1").unwrap().assume_role_policy_document, json!({}));
        assert_eq!(model.role("AROA2").unwrap().assume_role_policy_document, json!({}));
    }

    #[test]
    fn test_policy_fields_projected() {
        let raw = json!({"Policies": [{
            "PolicyId": "ANPA1",
            "PolicyName": "Admin",
            "Arn": "arn:aws:iam::1:policy/Admin",
            "DefaultVersionId": "v1",
            "PolicyVersionList": [{"VersionId": "v1", "Document": {"Statement": []}, "IsDefaultVersion": true}],
            "AttachmentCount": 3,
            "IsAttachable": true
        }]});
        let model = normalize(&raw);
        let policy = model.policy("ANPA1").unwrap();

        assert_eq!(policy.attachment_count, Some(3));
        assert_eq!(policy.is_attachable, Some(true));
        assert_eq!(policy.description, "");
        assert_eq!(policy.policy_version_list.len(), 1);
        assert_eq!(policy.default_document(), Some(&json!({"Statement": []})));
    }

    #[test]
    fn test_missing_ids_share_empty_key() {
        let raw = json!({"GroupDetailList": [
            {"GroupName": "first"},
            {"GroupId": "", "GroupName": "second"},
            {"GroupId": 17, "GroupName": "third"}
        ]});
        let model = normalize(&raw);
        assert_eq!(model.groups().len(), 1);
        assert_eq!(model.group("").unwrap().group_name.as_deref(), Some("third"));
    }

    #[test]
    fn test_duplicate_ids_overwrite_in_place() {
        let raw = json!({"UserDetailList": [
            {"UserId": "A", "UserName": "old"},
            {"UserId": "B", "UserName": "bob"},
            {"UserId": "A", "UserName": "new"}
        ]});
        let model = normalize(&raw);
        let names: Vec<_> = model
            .users()
            .iter()
            .map(|u| u.user_name.as_deref().unwrap())
            .collect();
        assert_eq!(names, vec!["new", "bob"]);
    }

    #[test]
    fn test_duplicate_ids_rejected_when_strict() {
        let raw = json!({"Policies": [{"PolicyId": "P"}, {"PolicyId": "P"}]});
        let options = NormalizeOptions {
            duplicate_ids: DuplicateIdPolicy::Reject,
        };
        match normalize_with(&raw, &options) {
            Err(AtlasError::DuplicateId { kind, id }) => {
                assert_eq!(kind, EntityKind::Policy);
                assert_eq!(id, "P");
            }
            other => panic!("expected DuplicateId, got {:?}", other),
        }

        let unique = json!({"Policies": [{"PolicyId": "P"}, {"PolicyId": "Q"}]});
        assert_eq!(normalize_with(&unique, &options).unwrap().policies().len(), 2);
    }

    #[test]
    fn test_ill_typed_list_entries_skipped() {
        let raw = json!({"UserDetailList": [
            "garbage",
            {"UserId": "U", "GroupList": ["dev", 5, null], "AttachedManagedPolicies": [7, {"PolicyArn": "arn:p"}]}
        ]});
        let model = normalize(&raw);
        let user = model.user("U").unwrap();
        assert_eq!(model.users().len(), 1);
        assert_eq!(user.group_list, vec!["dev".to_string()]);
        assert_eq!(user.attached_managed_policies.len(), 1);
        assert_eq!(user.attached_managed_policies[0].policy_arn.as_deref(), Some("arn:p"));
    }

    #[test]
    fn test_list_key_names() {
        assert_eq!(list_key(EntityKind::Policy), "Policies");
        assert_eq!(list_key(EntityKind::Group), "GroupDetailList");
    }
}
