//! Relationship resolver
//!
//! Joins the normalized collections the way the export encodes them:
//! - Attachment: ARN equality between `AttachedManagedPolicies[].PolicyArn`
//!   and `Policy.Arn`
//! - Membership: name equality between `User.GroupList[]` and
//!   `Group.GroupName`
//! - Trust: `Allow` statements of a role's trust policy naming the user's
//!   ARN or `*`
//!
//! The resolver borrows a model and holds nothing else. Every query is a pure
//! function of the model and its arguments, so any number of resolvers may
//! run concurrently over one snapshot.

use super::entity::{AttachmentSubject, Entity, EntityKind, Group, Policy, Role, User};
use super::iam::TrustPolicy;
use super::model::AuthorizationModel;
use crate::error::{AtlasError, Result};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// Users, roles and groups attached to one policy
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AttachedEntities<'a> {
    pub users: Vec<&'a User>,
    pub roles: Vec<&'a Role>,
    pub groups: Vec<&'a Group>,
}

impl AttachedEntities<'_> {
    pub fn len(&self) -> usize {
        self.users.len() + self.roles.len() + self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Neighbourhood of one entity in the relationship graph
///
/// Each entity appears at most once per list.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RelatedEntities<'a> {
    pub users: Vec<&'a User>,
    pub groups: Vec<&'a Group>,
    pub roles: Vec<&'a Role>,
    pub policies: Vec<&'a Policy>,
}

impl<'a> RelatedEntities<'a> {
    fn add_user(&mut self, user: &'a User) {
        push_unique(&mut self.users, user);
    }

    fn add_group(&mut self, group: &'a Group) {
        push_unique(&mut self.groups, group);
    }

    fn add_role(&mut self, role: &'a Role) {
        push_unique(&mut self.roles, role);
    }

    fn add_policies(&mut self, policies: impl IntoIterator<Item = &'a Policy>) {
        for policy in policies {
            push_unique(&mut self.policies, policy);
        }
    }
}

fn push_unique<'a, T: Entity>(list: &mut Vec<&'a T>, entity: &'a T) {
    if !list.iter().any(|existing| existing.id() == entity.id()) {
        list.push(entity);
    }
}

/// A user with its groups, policies and assumable roles
#[derive(Debug, Clone, Serialize)]
pub struct UserDetails<'a> {
    pub user: &'a User,
    pub groups: Vec<&'a Group>,
    pub policies: Vec<&'a Policy>,
    pub assumable_roles: Vec<&'a Role>,
}

/// A role with its policies and the users trusted to assume it
#[derive(Debug, Clone, Serialize)]
pub struct RoleDetails<'a> {
    pub role: &'a Role,
    pub policies: Vec<&'a Policy>,
    pub trusted_users: Vec<&'a User>,
}

/// A policy with its default document and attached entities
#[derive(Debug, Clone, Serialize)]
pub struct PolicyDetails<'a> {
    pub policy: &'a Policy,
    pub default_document: Option<&'a Value>,
    pub attached: AttachedEntities<'a>,
}

/// A group with its policies and members
#[derive(Debug, Clone, Serialize)]
pub struct GroupDetails<'a> {
    pub group: &'a Group,
    pub policies: Vec<&'a Policy>,
    pub members: Vec<&'a User>,
}

/// Stateless query surface over one [`AuthorizationModel`]
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    model: &'a AuthorizationModel,
}

impl<'a> Resolver<'a> {
    pub fn new(model: &'a AuthorizationModel) -> Self {
        Resolver { model }
    }

    pub fn model(&self) -> &'a AuthorizationModel {
        self.model
    }

    /// Policies attached to a user, role or group
    ///
    /// One entry per attachment, in listed order. Attachments whose ARN
    /// matches no policy are dropped; repeated attachments repeat.
    pub fn policies_of<S: AttachmentSubject>(&self, subject: &S) -> Vec<&'a Policy> {
        subject
            .attached_managed_policies()
            .iter()
            .filter_map(|attachment| attachment.policy_arn.as_deref())
            .filter_map(|arn| self.model.policy_by_arn(arn))
            .collect()
    }

    /// Entities attached to `policy`, each at most once, in collection order
    pub fn attached_entities_of(&self, policy: &Policy) -> AttachedEntities<'a> {
        match policy.arn() {
            Some(arn) => self.attached_entities_of_arn(arn),
            None => AttachedEntities::default(),
        }
    }

    /// Entities whose attachments reference `policy_arn`
    pub fn attached_entities_of_arn(&self, policy_arn: &str) -> AttachedEntities<'a> {
        AttachedEntities {
            users: attached_to(self.model.users().iter(), policy_arn),
            roles: attached_to(self.model.roles().iter(), policy_arn),
            groups: attached_to(self.model.groups().iter(), policy_arn),
        }
    }

    /// Whether `user` may assume `role` under the role's trust policy
    pub fn can_assume(&self, user: &User, role: &Role) -> bool {
        TrustPolicy::new(&role.assume_role_policy_document).allows(user.arn())
    }

    /// Roles `user` may assume, in role collection order
    ///
    /// Every role is evaluated on its own and appears at most once.
    pub fn assumable_roles_for(&self, user: &User) -> Vec<&'a Role> {
        let roles: Vec<&'a Role> = self
            .model
            .roles()
            .iter()
            .filter(|role| self.can_assume(user, role))
            .collect();
        debug!(user = user.id(), count = roles.len(), "Resolved assumable roles");
        roles
    }

    /// Users allowed to assume `role`, in user collection order
    pub fn principals_for_role(&self, role: &Role) -> Vec<&'a User> {
        let trust = TrustPolicy::new(&role.assume_role_policy_document);
        self.model
            .users()
            .iter()
            .filter(|user| trust.allows(user.arn()))
            .collect()
    }

    /// Users whose `GroupList` names `group`
    pub fn users_of(&self, group: &Group) -> Vec<&'a User> {
        let Some(name) = group.name() else {
            return Vec::new();
        };
        self.model
            .users()
            .iter()
            .filter(|user| user.group_list.iter().any(|member_of| member_of == name))
            .collect()
    }

    /// Groups named in `user.GroupList`, first match per name
    ///
    /// Names matching no group are dropped.
    pub fn groups_of(&self, user: &User) -> Vec<&'a Group> {
        user.group_list
            .iter()
            .filter_map(|name| self.model.group_by_name(name))
            .collect()
    }

    /// Document of the policy's default version
    pub fn default_document<'p>(&self, policy: &'p Policy) -> Option<&'p Value> {
        policy.default_document()
    }

    /// Direct policies of `user` followed by those of its groups, deduplicated
    pub fn effective_policies_of(&self, user: &User) -> Vec<&'a Policy> {
        let mut related = RelatedEntities::default();
        related.add_policies(self.policies_of(user));
        for group in self.groups_of(user) {
            related.add_policies(self.policies_of(group));
        }
        related.policies
    }

    /// Graph neighbourhood of the entity `kind`/`id`
    pub fn related_entities(&self, kind: EntityKind, id: &str) -> Result<RelatedEntities<'a>> {
        let mut related = RelatedEntities::default();
        match kind {
            EntityKind::User => {
                let user = self.require_user(id)?;
                related.add_user(user);
                let groups = self.groups_of(user);
                for &group in &groups {
                    related.add_group(group);
                }
                related.add_policies(self.policies_of(user));
                for group in groups {
                    related.add_policies(self.policies_of(group));
                }
                for role in self.assumable_roles_for(user) {
                    related.add_role(role);
                    related.add_policies(self.policies_of(role));
                }
            }
            EntityKind::Group => {
                let group = self.require_group(id)?;
                related.add_group(group);
                for user in self.users_of(group) {
                    related.add_user(user);
                }
                related.add_policies(self.policies_of(group));
            }
            EntityKind::Role => {
                let role = self.require_role(id)?;
                related.add_role(role);
                related.add_policies(self.policies_of(role));
                for user in self.principals_for_role(role) {
                    related.add_user(user);
                }
            }
            EntityKind::Policy => {
                let policy = self.require_policy(id)?;
                related.add_policies([policy]);
                let attached = self.attached_entities_of(policy);
                for user in attached.users {
                    related.add_user(user);
                }
                for group in attached.groups {
                    related.add_group(group);
                }
                for role in attached.roles {
                    related.add_role(role);
                }
            }
        }
        Ok(related)
    }

    pub fn user_details(&self, id: &str) -> Result<UserDetails<'a>> {
        let user = self.require_user(id)?;
        Ok(UserDetails {
            user,
            groups: self.groups_of(user),
            policies: self.policies_of(user),
            assumable_roles: self.assumable_roles_for(user),
        })
    }

    pub fn role_details(&self, id: &str) -> Result<RoleDetails<'a>> {
        let role = self.require_role(id)?;
        Ok(RoleDetails {
            role,
            policies: self.policies_of(role),
            trusted_users: self.principals_for_role(role),
        })
    }

    pub fn policy_details(&self, id: &str) -> Result<PolicyDetails<'a>> {
        let policy = self.require_policy(id)?;
        Ok(PolicyDetails {
            policy,
            default_document: policy.default_document(),
            attached: self.attached_entities_of(policy),
        })
    }

    pub fn group_details(&self, id: &str) -> Result<GroupDetails<'a>> {
        let group = self.require_group(id)?;
        Ok(GroupDetails {
            group,
            policies: self.policies_of(group),
            members: self.users_of(group),
        })
    }

    fn require_user(&self, id: &str) -> Result<&'a User> {
        self.model
            .user(id)
            .ok_or_else(|| AtlasError::not_found(EntityKind::User, id))
    }

    fn require_role(&self, id: &str) -> Result<&'a Role> {
        self.model
            .role(id)
            .ok_or_else(|| AtlasError::not_found(EntityKind::Role, id))
    }

    fn require_policy(&self, id: &str) -> Result<&'a Policy> {
        self.model
            .policy(id)
            .ok_or_else(|| AtlasError::not_found(EntityKind::Policy, id))
    }

    fn require_group(&self, id: &str) -> Result<&'a Group> {
        self.model
            .group(id)
            .ok_or_else(|| AtlasError::not_found(EntityKind::Group, id))
    }
}

fn attached_to<'a, T: AttachmentSubject + 'a>(
    entities: impl Iterator<Item = &'a T>,
    policy_arn: &str,
) -> Vec<&'a T> {
    entities
        .filter(|entity| entity.is_attached_to(policy_arn))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::normalize::normalize;
    use serde_json::json;

    fn sample() -> AuthorizationModel {
        normalize(&json!({
            "UserDetailList": [
                {
                    "UserId": "AIDAU",
                    "UserName": "U",
                    "Arn": "arn:aws:iam::1:user/U",
                    "GroupList": ["G1", "ghost"],
                    "AttachedManagedPolicies": [
                        {"PolicyArn": "arn:aws:iam::1:policy/Direct", "PolicyName": "Direct"},
                        {"PolicyArn": "arn:aws:iam::1:policy/Missing", "PolicyName": "Missing"}
                    ]
                },
                {"UserId": "AIDAV", "UserName": "V", "Arn": "arn:aws:iam::1:user/V"}
            ],
            "GroupDetailList": [
                {
                    "GroupId": "AGPA1",
                    "GroupName": "G1",
                    "Arn": "arn:aws:iam::1:group/G1",
                    "AttachedManagedPolicies": [
                        {"PolicyArn": "arn:aws:iam::1:policy/Shared"},
                        {"PolicyArn": "arn:aws:iam::1:policy/Direct"}
                    ]
                }
            ],
            "RoleDetailList": [
                {
                    "RoleId": "AROAR",
                    "RoleName": "R",
                    "Arn": "arn:aws:iam::1:role/R",
                    "AssumeRolePolicyDocument": {"Statement": [
                        {"Effect": "Allow", "Principal": {"AWS": ["arn:aws:iam::1:user/U"]}},
                        {"Effect": "Allow", "Principal": {"AWS": "arn:aws:iam::1:user/U"}}
                    ]},
                    "AttachedManagedPolicies": [{"PolicyArn": "arn:aws:iam::1:policy/Shared"}]
                },
                {
                    "RoleId": "AROAD",
                    "RoleName": "Denied",
                    "Arn": "arn:aws:iam::1:role/Denied",
                    "AssumeRolePolicyDocument": {"Statement": [
                        {"Effect": "Deny", "Principal": {"AWS": "*"}}
                    ]}
                }
            ],
            "Policies": [
                {"PolicyId": "ANPAD", "PolicyName": "Direct", "Arn": "arn:aws:iam::1:policy/Direct"},
                {"PolicyId": "ANPAS", "PolicyName": "Shared", "Arn": "arn:aws:iam::1:policy/Shared"}
            ]
        }))
    }

    fn ids<T: Entity>(entities: &[&T]) -> Vec<String> {
        entities.iter().map(|e| e.id().to_string()).collect()
    }

    #[test]
    fn test_policies_of_drops_dangling_attachments() {
        let model = sample();
        let resolver = model.resolver();
        let user = model.user("AIDAU").unwrap();
        assert_eq!(ids(&resolver.policies_of(user)), vec!["ANPAD"]);
    }

    #[test]
    fn test_attached_entities_of_policy() {
        let model = sample();
        let resolver = model.resolver();
        let shared = model.policy("ANPAS").unwrap();
        let attached = resolver.attached_entities_of(shared);

        assert!(attached.users.is_empty());
        assert_eq!(ids(&attached.roles), vec!["AROAR"]);
        assert_eq!(ids(&attached.groups), vec!["AGPA1"]);
        assert_eq!(attached.len(), 2);
    }

    #[test]
    fn test_assumable_roles_listed_once() {
        let model = sample();
        let resolver = model.resolver();

        let u = model.user("AIDAU").unwrap();
        let v = model.user("AIDAV").unwrap();
        assert_eq!(ids(&resolver.assumable_roles_for(u)), vec!["AROAR"]);
        assert!(resolver.assumable_roles_for(v).is_empty());
    }

    #[test]
    fn test_principals_for_role() {
        let model = sample();
        let resolver = model.resolver();
        let role = model.role("AROAR").unwrap();
        assert_eq!(ids(&resolver.principals_for_role(role)), vec!["AIDAU"]);

        let denied = model.role("AROAD").unwrap();
        assert!(resolver.principals_for_role(denied).is_empty());
    }

    #[test]
    fn test_membership_both_directions() {
        let model = sample();
        let resolver = model.resolver();
        let user = model.user("AIDAU").unwrap();
        let group = model.group("AGPA1").unwrap();

        assert_eq!(ids(&resolver.groups_of(user)), vec!["AGPA1"]);
        assert_eq!(ids(&resolver.users_of(group)), vec!["AIDAU"]);
    }

    #[test]
    fn test_effective_policies_deduplicated() {
        let model = sample();
        let resolver = model.resolver();
        let user = model.user("AIDAU").unwrap();
        assert_eq!(
            ids(&resolver.effective_policies_of(user)),
            vec!["ANPAD", "ANPAS"]
        );
    }

    #[test]
    fn test_related_entities_of_user() {
        let model = sample();
        let related = model
            .resolver()
            .related_entities(EntityKind::User, "AIDAU")
            .unwrap();

        assert_eq!(ids(&related.users), vec!["AIDAU"]);
        assert_eq!(ids(&related.groups), vec!["AGPA1"]);
        assert_eq!(ids(&related.roles), vec!["AROAR"]);
        assert_eq!(ids(&related.policies), vec!["ANPAD", "ANPAS"]);
    }

    #[test]
    fn test_related_entities_of_role_and_policy() {
        let model = sample();
        let resolver = model.resolver();

        let role = resolver.related_entities(EntityKind::Role, "AROAR").unwrap();
        assert_eq!(ids(&role.users), vec!["AIDAU"]);
        assert_eq!(ids(&role.policies), vec!["ANPAS"]);

        let policy = resolver.related_entities(EntityKind::Policy, "ANPAD").unwrap();
        assert_eq!(ids(&policy.users), vec!["AIDAU"]);
        assert_eq!(ids(&policy.groups), vec!["AGPA1"]);
        assert!(policy.roles.is_empty());
    }

    #[test]
    fn test_details_not_found() {
        let model = sample();
        let resolver = model.resolver();

        match resolver.user_details("nobody") {
            Err(AtlasError::NotFound { kind, id }) => {
                assert_eq!(kind, EntityKind::User);
                assert_eq!(id, "nobody");
            }
            other => panic!("expected NotFound, got {:?}", other.map(|d| d.user.user_id.clone())),
        }
        assert!(resolver.group_details("nope").is_err());
        assert!(resolver.related_entities(EntityKind::Policy, "nope").is_err());
    }

    #[test]
    fn test_policy_details() {
        let model = sample();
        let details = model.resolver().policy_details("ANPAS").unwrap();
        assert!(details.default_document.is_none());
        assert_eq!(details.attached.len(), 2);
    }
}
